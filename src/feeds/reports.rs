//! Custom report feeds
//!
//! The snapshot report is CSV. The two historical reports are XML exports
//! whose history group element is named after however the tenant built the
//! report, so the variant is detected from the raw body before walking.

use super::{ensure_element_content, into_record, ExtractContext};
use crate::error::Result;
use crate::types::{JsonValue, RawResponse, Record};
use crate::xml::{
    data_block, discover_namespace, find, find_all, find_descendants, reference_block, Field,
};
use roxmltree::Document;
use tracing::debug;

/// One naming of a history group and its record reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryVariant {
    /// Repeated group element inside each `Report_Entry`
    pub group: &'static str,
    /// Reference element inside each group
    pub record: &'static str,
}

/// Known compensation history namings, in detection order
pub const COMPENSATION_VARIANTS: &[HistoryVariant] = &[
    HistoryVariant {
        group: "Compensation_History_-_Previous_System_group",
        record: "Compensation_History_Record_from_Previous_System",
    },
    HistoryVariant {
        group: "Job_History_from_Previous_System_group",
        record: "Job_Position_History_Record_from_Previous_System",
    },
];

/// Known job history namings, in detection order
pub const JOB_VARIANTS: &[HistoryVariant] = &[
    HistoryVariant {
        group: "Job_History_from_Previous_System_group",
        record: "Job_Position_History_Record_from_Previous_System",
    },
    HistoryVariant {
        group: "Job_History_from_Previous_System_group",
        record: "History_Record",
    },
];

/// First variant whose group and record names both occur in `body`
pub fn detect_history_variant(
    body: &str,
    variants: &[HistoryVariant],
) -> Option<HistoryVariant> {
    variants
        .iter()
        .find(|v| body.contains(v.group) && body.contains(v.record))
        .copied()
}

// ============================================================================
// Snapshot (CSV)
// ============================================================================

/// One record per CSV row, keyed by header; every value is a string
pub(super) fn extract_snapshot_report(
    response: &RawResponse,
    _ctx: &ExtractContext<'_>,
) -> Result<Vec<Record>> {
    let body = strip_bom(response.text()?);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(body.as_bytes());
    let headers = reader.headers()?.clone();

    reader
        .records()
        .map(|row| -> Result<Record> {
            let row = row?;
            Ok(headers
                .iter()
                .zip(row.iter())
                .map(|(header, value)| {
                    (header.to_string(), JsonValue::String(value.to_string()))
                })
                .collect())
        })
        .collect()
}

fn strip_bom(body: &str) -> &str {
    body.strip_prefix('\u{feff}').unwrap_or(body)
}

// ============================================================================
// Historical (XML)
// ============================================================================

const COMPENSATION_ENTRY: &[Field] = &[Field::Text("Employee_ID"), Field::Reference("Worker")];

const COMPENSATION_ITEM: &[Field] = &[
    Field::Text("Worker_History_Name"),
    Field::Text("Effective_Date"),
    Field::Text("Reason"),
    Field::Text("Amount"),
    Field::Text("Amount_Change"),
    Field::Reference("Currency"),
    Field::Reference("Frequency"),
];

const ALL_POSITIONS_GROUP: &[Field] = &[
    Field::Text("Business_Title"),
    Field::Reference("Position"),
    Field::Reference("Position_Worker_Type"),
    Field::Reference("Time_Type"),
    Field::Reference("Position_Manager"),
];

const JOB_ENTRY: &[Field] = &[
    Field::Text("Employee_ID"),
    Field::Blocks("All_Positions_group", ALL_POSITIONS_GROUP),
    Field::Text("Hire_Date"),
    Field::Text("Original_Hire_Date"),
    Field::Text("Termination_Reason"),
    Field::Text("termination_date"),
    Field::Text("termination_regret"),
    Field::Reference("Termination_Category"),
    Field::Reference("Worker"),
];

const JOB_ITEM: &[Field] = &[
    Field::Text("Compensation"),
    Field::Text("Department"),
    Field::Text("Effective_Date"),
    Field::Text("Function"),
    Field::Text("Hourly_Salaried"),
    Field::Text("Job_Title"),
    Field::Text("Location"),
    Field::Text("Manager"),
    Field::Text("Reason"),
    Field::Text("Salary_Grade"),
    Field::Text("Worker_History_Name"),
];

/// A historical report layout: entry fields plus one history item per group
struct HistoryReport {
    variants: &'static [HistoryVariant],
    entry: &'static [Field],
    item: &'static [Field],
}

const COMPENSATION_REPORT: HistoryReport = HistoryReport {
    variants: COMPENSATION_VARIANTS,
    entry: COMPENSATION_ENTRY,
    item: COMPENSATION_ITEM,
};

const JOB_REPORT: HistoryReport = HistoryReport {
    variants: JOB_VARIANTS,
    entry: JOB_ENTRY,
    item: JOB_ITEM,
};

pub(super) fn extract_compensation_history(
    response: &RawResponse,
    ctx: &ExtractContext<'_>,
) -> Result<Vec<Record>> {
    extract_history(response, ctx, &COMPENSATION_REPORT)
}

pub(super) fn extract_job_history(
    response: &RawResponse,
    ctx: &ExtractContext<'_>,
) -> Result<Vec<Record>> {
    extract_history(response, ctx, &JOB_REPORT)
}

/// One record per `Report_Entry`
///
/// The body must parse as XML. When no known variant is present the result
/// is empty.
fn extract_history(
    response: &RawResponse,
    ctx: &ExtractContext<'_>,
    report: &HistoryReport,
) -> Result<Vec<Record>> {
    let body = strip_bom(response.text()?);
    let doc = Document::parse(body)?;
    let ns = discover_namespace(doc.root_element())?;

    let Some(variant) = detect_history_variant(body, report.variants) else {
        debug!(feed = ctx.feed, "No known history group in report");
        return Ok(Vec::new());
    };
    debug!(
        feed = ctx.feed,
        group = variant.group,
        record = variant.record,
        "Detected history variant"
    );

    find_descendants(doc.root_element(), "Report_Entry", &ns)
        .into_iter()
        .map(|entry| -> Result<Record> {
            ensure_element_content(entry, "Report_Entry")?;
            let mut record =
                into_record(data_block(Some(entry), report.entry, &ns), "Report_Entry")?;

            let history = find_all(Some(entry), variant.group, &ns)
                .into_iter()
                .map(|group| -> Result<JsonValue> {
                    let mut item =
                        into_record(data_block(Some(group), report.item, &ns), variant.group)?;
                    item.insert(
                        variant.record.to_string(),
                        reference_block(find(Some(group), variant.record, &ns), &ns),
                    );
                    Ok(JsonValue::Object(item))
                })
                .collect::<Result<Vec<_>>>()?;

            record.insert(variant.group.to_string(), JsonValue::Array(history));
            Ok(record)
        })
        .collect()
}
