//! State types for tracking sync progress
//!
//! These types are serialized to JSON and persisted between runs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Per-worker resume dates for the history feed
///
/// Immutable from the caller's point of view: slice expansion takes a map by
/// value and hands back its successor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerCheckpoints(BTreeMap<String, NaiveDate>);

impl WorkerCheckpoints {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// First date still to be fetched for a worker
    pub fn resume_point(&self, worker_id: &str) -> Option<NaiveDate> {
        self.0.get(worker_id).copied()
    }

    /// A copy of this map with one worker's resume point replaced
    #[must_use]
    pub fn with_resume_point(mut self, worker_id: impl Into<String>, date: NaiveDate) -> Self {
        self.0.insert(worker_id.into(), date);
        self
    }

    /// Iterate `(worker_id, resume_point)` pairs in worker order
    pub fn iter(&self) -> impl Iterator<Item = (&str, NaiveDate)> {
        self.0.iter().map(|(id, date)| (id.as_str(), *date))
    }

    /// Number of workers with a checkpoint
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no worker has a checkpoint
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, NaiveDate)> for WorkerCheckpoints {
    fn from_iter<T: IntoIterator<Item = (String, NaiveDate)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Complete state for the connector
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// Per-feed state
    #[serde(default)]
    pub streams: BTreeMap<String, StreamState>,
}

impl State {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Get state for a feed
    pub fn get_stream(&self, feed: &str) -> Option<&StreamState> {
        self.streams.get(feed)
    }

    /// Get mutable state for a feed, creating if needed
    pub fn get_stream_mut(&mut self, feed: &str) -> &mut StreamState {
        self.streams.entry(feed.to_string()).or_default()
    }

    /// Worker checkpoints of a feed (empty when none were saved)
    pub fn checkpoints(&self, feed: &str) -> WorkerCheckpoints {
        self.get_stream(feed)
            .map(|s| s.checkpoints.clone())
            .unwrap_or_default()
    }
}

/// State for a single feed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamState {
    /// Resume dates for worker-day slicing
    #[serde(default, skip_serializing_if = "WorkerCheckpoints::is_empty")]
    pub checkpoints: WorkerCheckpoints,

    /// Partitions fully fetched in the current run
    ///
    /// Cleared whenever a new partition listing starts a run.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub completed_partitions: BTreeSet<String>,
}

impl StreamState {
    /// Create a new empty feed state
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if a partition is completed
    pub fn is_partition_completed(&self, partition_id: &str) -> bool {
        self.completed_partitions.contains(partition_id)
    }

    /// Mark a partition as completed
    pub fn mark_partition_completed(&mut self, partition_id: &str) {
        self.completed_partitions.insert(partition_id.to_string());
    }
}
