//! Worker feeds: the worker list, per-worker detail and history, and photos

use super::{ensure_element_content, into_record, ExtractContext};
use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue, Record};
use crate::xml::{find, find_all, find_text, reference_block, to_value, Namespace};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use roxmltree::Node;
use tracing::debug;

const WORKER: &str = "Worker";
const WORKER_DATA: &str = "Worker_Data";
const EMPLOYMENT_DATA: &str = "Employment_Data";
const STATUS_DATA: &str = "Worker_Data/Employment_Data/Worker_Status_Data";

/// Status dates lifted to the top of each worker record
const LIFTED_DATES: &[&str] = &["Original_Hire_Date", "Hire_Date", "Termination_Date"];

/// One record per `Worker`, with status dates lifted and employment data
/// dropped
pub(super) fn extract_workers(
    payload: Node<'_, '_>,
    ns: &Namespace,
    _ctx: &ExtractContext<'_>,
) -> Result<Vec<Record>> {
    find_all(Some(payload), WORKER, ns)
        .into_iter()
        .map(|worker| -> Result<Record> {
            ensure_element_content(worker, WORKER)?;
            let mut record = into_record(to_value(worker), WORKER)?;

            let status = find(Some(worker), STATUS_DATA, ns);
            for date in LIFTED_DATES {
                record.insert(
                    (*date).to_string(),
                    find_text(status, date, ns).map_or(JsonValue::Null, JsonValue::String),
                );
            }

            if let Some(JsonValue::Object(data)) = record.get_mut(WORKER_DATA) {
                data.remove(EMPLOYMENT_DATA);
            }
            Ok(record)
        })
        .collect()
}

/// The first `Worker` converted in full
///
/// Detail requests name one worker, so later matches are ignored.
pub(super) fn extract_worker_details(
    payload: Node<'_, '_>,
    ns: &Namespace,
    _ctx: &ExtractContext<'_>,
) -> Result<Vec<Record>> {
    let Some(worker) = find(Some(payload), WORKER, ns) else {
        return Ok(Vec::new());
    };
    ensure_element_content(worker, WORKER)?;
    Ok(vec![into_record(to_value(worker), WORKER)?])
}

/// The first `Worker`'s photo, decoded and handed to the photo sink
///
/// The record carries the sink's locator under `Photo_Data/Image` instead of
/// the image bytes.
pub(super) fn extract_worker_photo(
    payload: Node<'_, '_>,
    ns: &Namespace,
    ctx: &ExtractContext<'_>,
) -> Result<Vec<Record>> {
    let Some(worker) = find(Some(payload), WORKER, ns) else {
        return Ok(Vec::new());
    };
    let Some(worker_data) = find(Some(worker), WORKER_DATA, ns) else {
        return Ok(Vec::new());
    };

    let worker_id = find_text(Some(worker_data), "Worker_ID", ns);
    let photo = find(Some(worker_data), "Photo_Data", ns);
    let filename = find_text(photo, "Filename", ns).filter(|f| !f.trim().is_empty());
    let image = find_text(photo, "Image", ns).filter(|i| !i.trim().is_empty());

    let locator = match (&filename, image) {
        (Some(filename), Some(image)) => {
            let bytes = decode_image(&image)?;
            debug!(
                feed = ctx.feed,
                worker_id = worker_id.as_deref().unwrap_or_default(),
                bytes = bytes.len(),
                "Decoded worker photo"
            );
            ctx.photo_sink
                .store(worker_id.as_deref(), filename, &bytes)
                .map_err(Error::from)?
        }
        _ => None,
    };

    let mut photo_data = JsonObject::new();
    photo_data.insert("Filename".into(), optional(filename));
    photo_data.insert("Image".into(), optional(locator));

    let mut data = JsonObject::new();
    data.insert("Photo_Data".into(), JsonValue::Object(photo_data));
    data.insert(
        "User_ID".into(),
        optional(find_text(Some(worker_data), "User_ID", ns)),
    );
    data.insert("Worker_ID".into(), optional(worker_id));

    let mut record = Record::new();
    record.insert(
        "Worker_Reference".into(),
        reference_block(find(Some(worker), "Worker_Reference", ns), ns),
    );
    record.insert("Worker_Data".into(), JsonValue::Object(data));
    record.insert(
        "Worker_Descriptor".into(),
        optional(find_text(Some(worker), "Worker_Descriptor", ns)),
    );
    Ok(vec![record])
}

fn decode_image(encoded: &str) -> Result<Vec<u8>> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD.decode(compact).map_err(|e| {
        Error::extraction("Worker_Data/Photo_Data/Image", format!("invalid base64: {e}"))
    })
}

fn optional(value: Option<String>) -> JsonValue {
    value.map_or(JsonValue::Null, JsonValue::String)
}
