//! Feed dispatch table and per-feed extraction functions
//!
//! # Overview
//!
//! Every feed is a static [`FeedDescriptor`]: a name, the request template
//! it is fetched with (report feeds have none), an extraction function and
//! the way the feed is sliced into sub-requests.
//!
//! Extraction functions come in two calling conventions:
//! - [`Extractor::Xml`] receives the located `Response_Data` subtree and the
//!   document's namespace context
//! - [`Extractor::Raw`] receives the raw response (CSV and custom report
//!   bodies that do not nest under `Response_Data`)
//!
//! Both return an owned list of records, empty for a sparse page. Data
//! errors raised here are tagged with the feed name by the normalizer.

mod jobs;
mod locations;
mod organizations;
mod reference_data;
mod references;
mod reports;
mod workers;

pub use references::REFERENCE_CATEGORIES;
pub use reports::{detect_history_variant, HistoryVariant, COMPENSATION_VARIANTS, JOB_VARIANTS};

use crate::error::{Error, Result};
use crate::sink::PhotoSink;
use crate::types::{JsonValue, RawResponse, Record};
use crate::xml::{data_block, find, find_all, reference_block, Field, Namespace};
use roxmltree::Node;

/// Extraction over a located `Response_Data` subtree
pub type XmlExtractFn =
    fn(Node<'_, '_>, &Namespace, &ExtractContext<'_>) -> Result<Vec<Record>>;

/// Extraction over the raw response body
pub type RawExtractFn = fn(&RawResponse, &ExtractContext<'_>) -> Result<Vec<Record>>;

/// An extraction function in one of the two calling conventions
#[derive(Debug, Clone, Copy)]
pub enum Extractor {
    /// Called with the `Response_Data` subtree
    Xml(XmlExtractFn),
    /// Called with the raw response
    Raw(RawExtractFn),
}

/// How a feed fans out into sub-requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slicing {
    /// One paged request stream
    None,
    /// One sub-request per worker
    Workers,
    /// One sub-request per reference category token
    ReferenceCategories,
    /// One sub-request per worker and calendar day
    WorkerDays,
}

/// Static description of one feed
#[derive(Debug, Clone, Copy)]
pub struct FeedDescriptor {
    /// Unique feed name
    pub name: &'static str,
    /// Request template file, `None` for report feeds
    pub request_template: Option<&'static str>,
    /// Extraction function
    pub extractor: Extractor,
    /// Fan-out policy
    pub slicing: Slicing,
}

/// Per-call context handed to extraction functions
#[derive(Clone, Copy)]
pub struct ExtractContext<'a> {
    /// Feed being extracted
    pub feed: &'a str,
    /// Destination for decoded photos
    pub photo_sink: &'a dyn PhotoSink,
}

/// All feeds, in catalog order
pub static FEEDS: &[FeedDescriptor] = &[
    FeedDescriptor {
        name: "workers",
        request_template: Some("workers.xml"),
        extractor: Extractor::Xml(workers::extract_workers),
        slicing: Slicing::None,
    },
    FeedDescriptor {
        name: "worker_details",
        request_template: Some("worker_details.xml"),
        extractor: Extractor::Xml(workers::extract_worker_details),
        slicing: Slicing::Workers,
    },
    FeedDescriptor {
        name: "worker_details_history",
        request_template: Some("worker_details_history.xml"),
        extractor: Extractor::Xml(workers::extract_worker_details),
        slicing: Slicing::WorkerDays,
    },
    FeedDescriptor {
        name: "worker_details_photo",
        request_template: Some("worker_details_photo.xml"),
        extractor: Extractor::Xml(workers::extract_worker_photo),
        slicing: Slicing::Workers,
    },
    FeedDescriptor {
        name: "organization_hierarchies",
        request_template: Some("organization_hierarchies.xml"),
        extractor: Extractor::Xml(organizations::extract_organizations),
        slicing: Slicing::None,
    },
    FeedDescriptor {
        name: "ethnicities",
        request_template: Some("ethnicities.xml"),
        extractor: Extractor::Xml(reference_data::extract_ethnicities),
        slicing: Slicing::None,
    },
    FeedDescriptor {
        name: "gender_identities",
        request_template: Some("gender_identities.xml"),
        extractor: Extractor::Xml(reference_data::extract_gender_identities),
        slicing: Slicing::None,
    },
    FeedDescriptor {
        name: "locations",
        request_template: Some("locations.xml"),
        extractor: Extractor::Xml(locations::extract_locations),
        slicing: Slicing::None,
    },
    FeedDescriptor {
        name: "job_profiles",
        request_template: Some("job_profiles.xml"),
        extractor: Extractor::Xml(jobs::extract_job_profiles),
        slicing: Slicing::None,
    },
    FeedDescriptor {
        name: "positions",
        request_template: Some("positions.xml"),
        extractor: Extractor::Xml(jobs::extract_positions),
        slicing: Slicing::None,
    },
    FeedDescriptor {
        name: "sexual_orientations",
        request_template: Some("sexual_orientations.xml"),
        extractor: Extractor::Xml(reference_data::extract_sexual_orientations),
        slicing: Slicing::None,
    },
    FeedDescriptor {
        name: "references",
        request_template: Some("references.xml"),
        extractor: Extractor::Xml(references::extract_references),
        slicing: Slicing::ReferenceCategories,
    },
    FeedDescriptor {
        name: "base_snapshot_report",
        request_template: None,
        extractor: Extractor::Raw(reports::extract_snapshot_report),
        slicing: Slicing::None,
    },
    FeedDescriptor {
        name: "base_historical_report_compensation",
        request_template: None,
        extractor: Extractor::Raw(reports::extract_compensation_history),
        slicing: Slicing::None,
    },
    FeedDescriptor {
        name: "base_historical_report_job",
        request_template: None,
        extractor: Extractor::Raw(reports::extract_job_history),
        slicing: Slicing::None,
    },
];

// ============================================================================
// Registry
// ============================================================================

/// Read-only lookup over a feed table
#[derive(Debug, Clone, Copy)]
pub struct FeedRegistry {
    feeds: &'static [FeedDescriptor],
}

impl Default for FeedRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedRegistry {
    /// Registry over the built-in feeds
    pub fn new() -> Self {
        Self { feeds: FEEDS }
    }

    /// Registry over a custom table
    pub fn with_feeds(feeds: &'static [FeedDescriptor]) -> Self {
        Self { feeds }
    }

    /// Look up a feed
    pub fn find(&self, name: &str) -> Option<&'static FeedDescriptor> {
        self.feeds.iter().find(|f| f.name == name)
    }

    /// Look up a feed, failing with [`Error::UnknownFeed`]
    pub fn get(&self, name: &str) -> Result<&'static FeedDescriptor> {
        self.find(name).ok_or_else(|| Error::unknown_feed(name))
    }

    /// Request template of a feed, failing for report feeds
    pub fn request_template(&self, name: &str) -> Result<&'static str> {
        self.get(name)?
            .request_template
            .ok_or_else(|| Error::NoRequestTemplate {
                feed: name.to_string(),
            })
    }

    /// Iterate feeds in catalog order
    pub fn iter(&self) -> impl Iterator<Item = &'static FeedDescriptor> {
        self.feeds.iter()
    }

    /// Feed names in catalog order
    pub fn names(&self) -> Vec<&'static str> {
        self.feeds.iter().map(|f| f.name).collect()
    }

    /// Number of feeds
    pub fn len(&self) -> usize {
        self.feeds.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.feeds.is_empty()
    }
}

// ============================================================================
// Shared entity extraction
// ============================================================================

/// The repeated-entity layout shared by most feeds:
/// `<Element><Element_Reference/><Element_Data/></Element>`
pub(crate) struct EntityShape {
    pub element: &'static str,
    pub reference: &'static str,
    pub data: &'static str,
    pub fields: &'static [Field],
}

/// Extract one `{reference, data}` record per entity element
///
/// An entity element holding bare text instead of child elements is a
/// structural mismatch.
pub(crate) fn extract_entities(
    payload: Node<'_, '_>,
    ns: &Namespace,
    shape: &EntityShape,
) -> Result<Vec<Record>> {
    find_all(Some(payload), shape.element, ns)
        .into_iter()
        .map(|entity| -> Result<Record> {
            ensure_element_content(entity, shape.element)?;

            let mut record = Record::new();
            record.insert(
                shape.reference.to_string(),
                reference_block(find(Some(entity), shape.reference, ns), ns),
            );
            record.insert(
                shape.data.to_string(),
                data_block(find(Some(entity), shape.data, ns), shape.fields, ns),
            );
            Ok(record)
        })
        .collect()
}

/// Fail if `node` carries text where child elements are expected
pub(crate) fn ensure_element_content(node: Node<'_, '_>, path: &str) -> Result<()> {
    let has_elements = node.children().any(|c| c.is_element());
    let text = node.text().map(str::trim).unwrap_or_default();
    if !has_elements && !text.is_empty() {
        return Err(Error::extraction(
            path,
            format!("expected element content, found text '{}'", truncate(text, 40)),
        ));
    }
    Ok(())
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Convert a converted element into a record; anything but an object is a mismatch
pub(crate) fn into_record(value: JsonValue, path: &str) -> Result<Record> {
    match value {
        JsonValue::Object(record) => Ok(record),
        other => Err(Error::extraction(
            path,
            format!("expected an element, found {other}"),
        )),
    }
}
