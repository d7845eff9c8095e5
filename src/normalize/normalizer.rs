//! Response normalizer implementation

use super::types::{PageInfo, RESPONSE_DATA, RESPONSE_RESULTS};
use crate::error::{Error, Result};
use crate::feeds::{ExtractContext, Extractor, FeedRegistry, XmlExtractFn};
use crate::partition::PartitionValue;
use crate::sink::{DiscardPhotoSink, PhotoSink};
use crate::types::{RawResponse, Record};
use crate::xml::{discover_namespace, find_descendant, find_text, Namespace};
use roxmltree::{Document, Node};
use tracing::{debug, info};

/// Turns raw responses into records, one feed at a time
///
/// Stateless per call: the feed table is read-only and the photo sink is
/// the only collaborator. Safe to share across threads.
pub struct Normalizer {
    registry: FeedRegistry,
    photo_sink: Box<dyn PhotoSink>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Normalizer")
            .field("feeds", &self.registry.len())
            .finish_non_exhaustive()
    }
}

impl Normalizer {
    /// Normalizer over the built-in feeds, discarding photos
    pub fn new() -> Self {
        Self {
            registry: FeedRegistry::new(),
            photo_sink: Box::new(DiscardPhotoSink),
        }
    }

    /// Use a different feed table
    #[must_use]
    pub fn with_registry(mut self, registry: FeedRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Send decoded worker photos to `sink`
    #[must_use]
    pub fn with_photo_sink(mut self, sink: impl PhotoSink + 'static) -> Self {
        self.photo_sink = Box::new(sink);
        self
    }

    /// The feed table
    pub fn registry(&self) -> &FeedRegistry {
        &self.registry
    }

    /// Normalize one response of `feed`
    ///
    /// A non-success status fails with [`Error::HttpStatus`] before the body
    /// is read. Data errors from the extraction function come back as
    /// [`Error::MalformedPayload`] naming the feed.
    pub fn normalize(&self, feed: &str, response: &RawResponse) -> Result<Vec<Record>> {
        let descriptor = self.registry.get(feed)?;
        if !response.is_success() {
            return Err(Error::http_status(response.status, response.text_lossy()));
        }

        let ctx = ExtractContext {
            feed: descriptor.name,
            photo_sink: self.photo_sink.as_ref(),
        };
        let records = match descriptor.extractor {
            Extractor::Xml(extract) => extract_payload(extract, response, &ctx),
            Extractor::Raw(extract) => extract(response, &ctx),
        }
        .map_err(|e| e.into_malformed(feed))?;

        info!(feed, records = records.len(), "Normalized response");
        Ok(records)
    }

    /// Normalize one sub-request's response, stamping the partition's values
    /// onto every record that lacks them
    pub fn normalize_partition(
        &self,
        feed: &str,
        response: &RawResponse,
        partition: &PartitionValue,
    ) -> Result<Vec<Record>> {
        let mut records = self.normalize(feed, response)?;
        for record in &mut records {
            for (key, value) in &partition.values {
                record
                    .entry(key.clone())
                    .or_insert_with(|| value.clone());
            }
        }
        debug!(feed, partition = %partition.id, "Stamped partition values");
        Ok(records)
    }
}

/// Locate `Response_Data` and hand it to an XML extraction function
///
/// A well-formed document without the wrapper is an empty page.
fn extract_payload(
    extract: XmlExtractFn,
    response: &RawResponse,
    ctx: &ExtractContext<'_>,
) -> Result<Vec<Record>> {
    let doc = Document::parse(response.text()?)?;
    let root = doc.root_element();
    let ns = discover_namespace(root)?;

    let Some(payload) = find_descendant(root, RESPONSE_DATA, &ns) else {
        debug!(feed = ctx.feed, "No Response_Data in response");
        return Ok(Vec::new());
    };
    debug!(
        feed = ctx.feed,
        namespace = ns.uri().unwrap_or_default(),
        "Located payload"
    );
    extract(payload, &ns, ctx)
}

/// Read the paging counters of a SOAP response
///
/// `None` when the response carries no `Response_Results` element.
pub fn page_info(response: &RawResponse) -> Result<Option<PageInfo>> {
    let doc = Document::parse(response.text()?)?;
    let root = doc.root_element();
    let ns = discover_namespace(root)?;

    let Some(results) = find_descendant(root, RESPONSE_RESULTS, &ns) else {
        return Ok(None);
    };
    Ok(Some(PageInfo {
        total_results: counter(results, "Total_Results", &ns)?,
        total_pages: counter(results, "Total_Pages", &ns)?,
        page_results: counter(results, "Page_Results", &ns)?,
        page: counter(results, "Page", &ns)?,
    }))
}

/// Counters may be rendered as decimals (`3.0`)
fn counter(results: Node<'_, '_>, name: &str, ns: &Namespace) -> Result<Option<u64>> {
    let Some(text) = find_text(Some(results), name, ns) else {
        return Ok(None);
    };
    let text = text.trim();
    let parsed = text.parse::<u64>().ok().or_else(|| {
        text.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0 && v.fract() == 0.0)
            .map(|v| v as u64)
    });
    parsed.map(Some).ok_or_else(|| {
        Error::extraction(
            format!("{RESPONSE_RESULTS}/{name}"),
            format!("expected a page counter, found '{text}'"),
        )
    })
}
