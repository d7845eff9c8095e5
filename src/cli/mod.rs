//! CLI module
//!
//! Command-line interface for the connector.
//!
//! # Commands
//!
//! - `feeds` - List feeds and how they fan out
//! - `request` - Build a request envelope
//! - `normalize` - Turn a saved response into records
//! - `partitions` - List sub-requests; `normalize` commits fetched ones

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat, PartitionArgs};
pub use runner::Runner;
