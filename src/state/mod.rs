//! State management module
//!
//! Persists per-worker resume dates for the history feed and completed
//! partitions between sync runs.
//!
//! # Overview
//!
//! - `WorkerCheckpoints` - immutable per-worker resume map
//! - `State` - per-feed state
//! - `StateManager` - JSON file persistence with atomic writes

mod manager;
mod types;

pub use manager::StateManager;
pub use types::{State, StreamState, WorkerCheckpoints};
