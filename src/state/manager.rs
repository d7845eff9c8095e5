//! State manager implementation
//!
//! Provides file-based state persistence with atomic writes.

use super::types::{State, WorkerCheckpoints};
use crate::error::{Error, Result};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tracing::debug;

/// State manager for persisting and loading state
#[derive(Debug, Clone)]
pub struct StateManager {
    /// Path to the state file (empty for in-memory)
    path: PathBuf,
    /// Current state
    state: State,
    /// Whether to save on every update
    auto_save: bool,
}

impl StateManager {
    /// Create a state manager for `path` with empty state
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            state: State::new(),
            auto_save: true,
        }
    }

    /// Create a state manager with auto-save disabled
    pub fn without_auto_save(path: impl AsRef<Path>) -> Self {
        Self {
            auto_save: false,
            ..Self::new(path)
        }
    }

    /// Create an in-memory state manager (no file persistence)
    pub fn in_memory() -> Self {
        Self {
            path: PathBuf::new(),
            state: State::new(),
            auto_save: false,
        }
    }

    /// Create a state manager from a file, loading existing state if present
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let state = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| Error::state(format!("Failed to read state file: {e}")))?;
            parse_state(&contents)?
        } else {
            State::new()
        };
        debug!(path = %path.display(), feeds = state.streams.len(), "Loaded state");

        Ok(Self {
            path,
            state,
            auto_save: true,
        })
    }

    /// Create a state manager from inline JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self {
            state: parse_state(json)?,
            ..Self::in_memory()
        })
    }

    /// Save current state to file
    pub fn save(&self) -> Result<()> {
        if self.is_in_memory() {
            return Ok(());
        }
        self.save_to_file(&self.path)
    }

    /// Save state to a specific file path
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let contents = self.to_json_pretty()?;

        // Write to temp file first, then rename for atomicity
        let path = path.as_ref();
        let temp_path = path.with_extension("tmp");
        std::fs::write(&temp_path, &contents)
            .map_err(|e| Error::state(format!("Failed to write state file: {e}")))?;
        std::fs::rename(&temp_path, path)
            .map_err(|e| Error::state(format!("Failed to rename state file: {e}")))?;

        debug!(path = %path.display(), "Saved state");
        Ok(())
    }

    /// Current state
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Export state as JSON string
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.state)
            .map_err(|e| Error::state(format!("Failed to serialize state: {e}")))
    }

    /// Export state as pretty-printed JSON string
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.state)
            .map_err(|e| Error::state(format!("Failed to serialize state: {e}")))
    }

    /// Worker checkpoints of a feed
    pub fn checkpoints(&self, feed: &str) -> WorkerCheckpoints {
        self.state.checkpoints(feed)
    }

    /// Replace a feed's worker checkpoints
    pub fn set_checkpoints(&mut self, feed: &str, checkpoints: WorkerCheckpoints) -> Result<()> {
        self.state.get_stream_mut(feed).checkpoints = checkpoints;
        self.auto_save()
    }

    /// Record that `worker_id` was fetched as of `fetched`
    ///
    /// The resume point moves to the following day. It never moves back, so
    /// re-fetching an older day leaves it alone. Returns whether it moved.
    pub fn advance_checkpoint(
        &mut self,
        feed: &str,
        worker_id: &str,
        fetched: NaiveDate,
    ) -> Result<bool> {
        let next = fetched.succ_opt().unwrap_or(fetched);
        let current = self.checkpoints(feed);
        if current.resume_point(worker_id).is_some_and(|resume| resume >= next) {
            return Ok(false);
        }

        self.state.get_stream_mut(feed).checkpoints = current.with_resume_point(worker_id, next);
        debug!(feed, worker_id, resume = %next, "Advanced checkpoint");
        self.auto_save()?;
        Ok(true)
    }

    /// Check if a partition is completed
    pub fn is_partition_completed(&self, feed: &str, partition_id: &str) -> bool {
        self.state
            .get_stream(feed)
            .is_some_and(|s| s.is_partition_completed(partition_id))
    }

    /// Mark a partition as completed
    pub fn mark_partition_completed(&mut self, feed: &str, partition_id: &str) -> Result<()> {
        self.state
            .get_stream_mut(feed)
            .mark_partition_completed(partition_id);
        self.auto_save()
    }

    /// Forget a feed's completed partitions, starting a new run
    ///
    /// Checkpoints are kept.
    pub fn clear_completed_partitions(&mut self, feed: &str) -> Result<()> {
        let Some(stream) = self.state.streams.get_mut(feed) else {
            return Ok(());
        };
        if stream.completed_partitions.is_empty() {
            return Ok(());
        }
        stream.completed_partitions.clear();
        self.auto_save()
    }

    /// Clear state for a specific feed
    pub fn clear_stream(&mut self, feed: &str) -> Result<()> {
        self.state.streams.remove(feed);
        self.auto_save()
    }

    /// Get the state file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if using in-memory mode
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str().is_empty()
    }

    fn auto_save(&self) -> Result<()> {
        if self.auto_save {
            self.save()?;
        }
        Ok(())
    }
}

fn parse_state(json: &str) -> Result<State> {
    serde_json::from_str(json).map_err(|e| Error::state(format!("Failed to parse state: {e}")))
}
