// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]

//! # Workday HR Connector
//!
//! Turns Workday Human Resources SOAP responses and custom report payloads
//! into flat, predictable JSON records, and builds the SOAP requests that
//! fetch them.
//!
//! ## Features
//!
//! - **Request Templates**: WS-Security envelopes from cached XML templates
//! - **Namespace-Aware Walking**: lookups resolve the vendor namespace per document
//! - **Feed Dispatch**: one extraction function per feed, XML or raw payloads
//! - **Fan-Out**: reference categories, per-worker and per-worker-day slices
//! - **Incremental State**: immutable per-worker checkpoints in a JSON state file
//! - **Output**: JSON-lines record messages and Parquet files
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use workday_connector::{Normalizer, RawResponse, Result};
//!
//! fn main() -> Result<()> {
//!     let body = std::fs::read("locations_page_1.xml")?;
//!     let records = Normalizer::new().normalize("locations", &RawResponse::ok(body))?;
//!     for record in records {
//!         println!("{}", serde_json::Value::Object(record));
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          Normalizer                             │
//! │  normalize(feed, response) → Vec<Record>                        │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬─────────────┐
//! │ Template │   XML     │    Feeds      │ Partition │   Output    │
//! ├──────────┼───────────┼───────────────┼───────────┼─────────────┤
//! │ Envelope │ Namespace │ Workers       │ Reference │ JSON lines  │
//! │ Header   │ Find/IDs  │ Organizations │ Workers   │ Arrow       │
//! │ Body     │ Fields    │ Reports (CSV) │ Days      │ Parquet     │
//! └──────────┴───────────┴───────────────┴───────────┴─────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the connector
pub mod error;

/// Common types and type aliases
pub mod types;

/// Connector configuration
pub mod config;

/// Namespace-aware XML walking
pub mod xml;

/// Request template engine
pub mod template;

/// Feed descriptors and extraction functions
pub mod feeds;

/// Photo sinks
pub mod sink;

/// Response normalization and dispatch
pub mod normalize;

/// Partition routing
pub mod partition;

/// State management and checkpointing
pub mod state;

/// JSON-lines and Parquet output
pub mod output;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, ErrorCategory, Result};
pub use types::*;

// Re-export commonly used types
pub use config::{ConnectorConfig, Credentials};
pub use feeds::{FeedDescriptor, FeedRegistry};
pub use normalize::{page_info, Normalizer, PageInfo};
pub use partition::{WorkerDayRouter, WorkerTimeline};
pub use state::{StateManager, WorkerCheckpoints};
pub use template::{RequestParams, RequestTemplates};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
