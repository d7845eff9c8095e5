//! Partition routing module
//!
//! Supports: reference category lists, per-worker fan-out, worker-day
//! history slices
//!
//! # Overview
//!
//! Partitions split one feed into sub-requests. Each partition carries the
//! values its request template needs (`worker_id`, `as_of_effective_date`,
//! `reference_subcategory_type`); the normalizer stamps the same values onto
//! the records of each sub-result so fan-out merges into one stream.

mod routers;
mod types;

pub use routers::{
    parse_vendor_date, worker_id, ListRouter, SliceExpansion, WorkerDayRouter, WorkerRouter,
    WorkerTimeline,
};
pub use types::{
    PartitionRouter, PartitionValue, Slice, AS_OF_FIELD, DATE_FORMAT, SUBCATEGORY_FIELD,
    WORKER_ID_FIELD,
};
