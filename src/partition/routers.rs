//! Partition router implementations
//!
//! Each router handles one slicing policy of the feed table.

use super::types::{
    PartitionRouter, PartitionValue, Slice, AS_OF_FIELD, DATE_FORMAT, SUBCATEGORY_FIELD,
    WORKER_ID_FIELD,
};
use crate::error::{Error, Result};
use crate::feeds::REFERENCE_CATEGORIES;
use crate::state::WorkerCheckpoints;
use crate::types::{JsonValue, Record};
use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::{debug, info, warn};

// ============================================================================
// List Router
// ============================================================================

/// List-based partition router
///
/// Creates partitions from a static list of values. The slice count is
/// the list length, known without calling the remote system.
#[derive(Debug, Clone)]
pub struct ListRouter {
    /// List of partition values
    values: Vec<String>,
    /// Field name for partition
    partition_field: String,
}

impl ListRouter {
    /// Create a new list router
    pub fn new(values: Vec<String>, partition_field: impl Into<String>) -> Self {
        Self {
            values,
            partition_field: partition_field.into(),
        }
    }

    /// One partition per reference category token
    pub fn reference_categories() -> Self {
        Self::new(
            REFERENCE_CATEGORIES.iter().map(ToString::to_string).collect(),
            SUBCATEGORY_FIELD,
        )
    }
}

impl PartitionRouter for ListRouter {
    fn partitions(&self) -> Result<Vec<PartitionValue>> {
        Ok(self
            .values
            .iter()
            .map(|v| {
                PartitionValue::new(v.clone()).with_string(self.partition_field.clone(), v.clone())
            })
            .collect())
    }

    fn partition_field(&self) -> &str {
        &self.partition_field
    }
}

// ============================================================================
// Worker Router
// ============================================================================

/// One partition per distinct worker in the `workers` feed output
#[derive(Debug, Clone, Default)]
pub struct WorkerRouter {
    worker_ids: Vec<String>,
}

impl WorkerRouter {
    /// Create a router over known worker IDs
    pub fn new(worker_ids: Vec<String>) -> Self {
        Self { worker_ids }
    }

    /// Collect worker IDs from normalized worker records
    ///
    /// Records without an identifier are skipped.
    pub fn from_records(records: &[Record]) -> Self {
        let worker_ids = records
            .iter()
            .filter_map(|record| {
                let id = worker_id(record);
                if id.is_none() {
                    debug!("Skipping worker record without an identifier");
                }
                id
            })
            .collect();
        Self { worker_ids }
    }
}

impl PartitionRouter for WorkerRouter {
    fn partitions(&self) -> Result<Vec<PartitionValue>> {
        let mut seen = HashSet::new();
        Ok(self
            .worker_ids
            .iter()
            .filter(|id| seen.insert((*id).clone()))
            .map(|id| PartitionValue::new(id.clone()).with_string(WORKER_ID_FIELD, id.clone()))
            .collect())
    }

    fn partition_field(&self) -> &str {
        WORKER_ID_FIELD
    }
}

// ============================================================================
// Worker-Day Router
// ============================================================================

/// A worker's employment window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerTimeline {
    /// Worker identifier used in detail requests
    pub worker_id: String,
    /// First day of employment
    pub hire_date: Option<NaiveDate>,
    /// Last day of employment
    pub termination_date: Option<NaiveDate>,
}

impl WorkerTimeline {
    /// Create a timeline
    pub fn new(
        worker_id: impl Into<String>,
        hire_date: Option<NaiveDate>,
        termination_date: Option<NaiveDate>,
    ) -> Self {
        Self {
            worker_id: worker_id.into(),
            hire_date,
            termination_date,
        }
    }

    /// Read a timeline from a `workers` feed record
    ///
    /// Uses the lifted `Hire_Date` and `Termination_Date` fields. Vendor
    /// dates may carry a zone suffix (`2020-01-01-08:00`).
    pub fn from_record(record: &Record) -> Result<Self> {
        let worker_id = worker_id(record)
            .ok_or_else(|| Error::partition("workers", "record has no worker identifier"))?;
        let hire_date = record_date(record, "Hire_Date")?;
        let termination_date = record_date(record, "Termination_Date")?;
        Ok(Self::new(worker_id, hire_date, termination_date))
    }
}

/// Slices produced by one expansion plus the successor checkpoints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceExpansion {
    /// One slice per worker and calendar day, worker-major
    pub slices: Vec<Slice>,
    /// Checkpoints to persist once the slices are fetched
    pub checkpoints: WorkerCheckpoints,
}

/// Daily as-of slices for the worker detail history feed
///
/// Every calendar day from `max(resume point, hire date)` through
/// `min(termination date, today)` is one slice, both ends inclusive.
#[derive(Debug, Clone)]
pub struct WorkerDayRouter {
    workers: Vec<WorkerTimeline>,
    checkpoints: WorkerCheckpoints,
    today: NaiveDate,
}

impl WorkerDayRouter {
    /// Create a router over known timelines
    pub fn new(
        workers: Vec<WorkerTimeline>,
        checkpoints: WorkerCheckpoints,
        today: NaiveDate,
    ) -> Self {
        Self {
            workers,
            checkpoints,
            today,
        }
    }

    /// Create a router from `workers` feed records
    ///
    /// Records without an identifier or with unparseable dates are skipped
    /// with a warning.
    pub fn from_records(
        records: &[Record],
        checkpoints: WorkerCheckpoints,
        today: NaiveDate,
    ) -> Self {
        let workers = records
            .iter()
            .filter_map(|record| match WorkerTimeline::from_record(record) {
                Ok(timeline) => Some(timeline),
                Err(e) => {
                    warn!(
                        worker_id = worker_id(record).as_deref().unwrap_or("<none>"),
                        error = %e,
                        "Skipping worker without usable slices"
                    );
                    None
                }
            })
            .collect();
        Self::new(workers, checkpoints, today)
    }

    /// Days to fetch for one worker
    fn days(&self, worker: &WorkerTimeline) -> Vec<NaiveDate> {
        let Some(hire_date) = worker.hire_date else {
            warn!(worker_id = %worker.worker_id, "Worker has no hire date, skipping");
            return Vec::new();
        };

        let start = self
            .checkpoints
            .resume_point(&worker.worker_id)
            .map_or(hire_date, |resume| resume.max(hire_date));
        let end = worker
            .termination_date
            .map_or(self.today, |term| term.min(self.today));

        if start > end {
            return Vec::new();
        }
        start.iter_days().take_while(|day| *day <= end).collect()
    }

    /// Timelines in order, first one per worker
    ///
    /// A worker listed twice is sliced once.
    fn unique_workers(&self) -> impl Iterator<Item = &WorkerTimeline> {
        let mut seen = HashSet::new();
        self.workers
            .iter()
            .filter(move |worker| seen.insert(worker.worker_id.as_str()))
    }

    /// Slices for every worker, worker-major
    pub fn slices(&self) -> Vec<Slice> {
        self.unique_workers()
            .flat_map(|worker| {
                self.days(worker)
                    .into_iter()
                    .map(|day| Slice::new(worker.worker_id.clone(), day))
            })
            .collect()
    }

    /// Consume the router, returning slices and the checkpoints that follow
    /// them
    ///
    /// A worker's next resume point is the day after its last slice.
    /// Workers without slices keep their previous checkpoint.
    pub fn expand(self) -> SliceExpansion {
        let mut slices = Vec::new();
        let mut checkpoints = self.checkpoints.clone();
        for worker in self.unique_workers() {
            let days = self.days(worker);
            if let Some(last) = days.last() {
                let next = last.succ_opt().unwrap_or(*last);
                checkpoints = checkpoints.with_resume_point(worker.worker_id.clone(), next);
            }
            slices.extend(
                days.into_iter()
                    .map(|day| Slice::new(worker.worker_id.clone(), day)),
            );
        }

        info!(
            workers = self.workers.len(),
            slices = slices.len(),
            today = %self.today,
            "Expanded worker history slices"
        );
        SliceExpansion {
            slices,
            checkpoints,
        }
    }
}

impl PartitionRouter for WorkerDayRouter {
    fn partitions(&self) -> Result<Vec<PartitionValue>> {
        Ok(self.slices().iter().map(Slice::to_partition).collect())
    }

    fn partition_field(&self) -> &str {
        AS_OF_FIELD
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Worker identifier of a worker record
///
/// Prefers `Worker_Data/Worker_ID`, then the `Employee_ID` entry of
/// `Worker_Reference`.
pub fn worker_id(record: &Record) -> Option<String> {
    let from_data = record
        .get("Worker_Data")
        .and_then(|data| data.get("Worker_ID"))
        .and_then(JsonValue::as_str);
    if let Some(id) = from_data {
        return Some(id.to_string());
    }

    record
        .get("Worker_Reference")
        .and_then(|reference| reference.get("ID"))
        .and_then(JsonValue::as_array)?
        .iter()
        .find(|entry| entry.get("-type").and_then(JsonValue::as_str) == Some("Employee_ID"))
        .and_then(|entry| entry.get("#content"))
        .and_then(JsonValue::as_str)
        .map(ToString::to_string)
}

fn record_date(record: &Record, key: &str) -> Result<Option<NaiveDate>> {
    match record.get(key).and_then(JsonValue::as_str) {
        Some(value) => parse_vendor_date(value).map(Some),
        None => Ok(None),
    }
}

/// Parse a date that may carry a zone suffix, `2020-01-01-08:00` or
/// `2020-01-01Z`
pub fn parse_vendor_date(value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    let date = value.get(..10).unwrap_or(value);
    NaiveDate::parse_from_str(date, DATE_FORMAT)
        .map_err(|e| Error::partition("workers", format!("invalid date '{value}': {e}")))
}
