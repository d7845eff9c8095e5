//! Output module
//!
//! Handles record emission as JSON lines and as Parquet files.
//!
//! # Overview
//!
//! This module provides utilities for:
//! - Writing `RECORD` / `STATE` / `LOG` messages as line-delimited JSON
//! - Inferring Arrow schemas from nested records
//! - Converting records to Arrow RecordBatches
//! - Writing Parquet files

mod messages;
mod schema;
mod writer;

pub use messages::{LogMessage, Message, MessageWriter, RecordMessage};
pub use schema::{arrow_to_records, infer_schema, records_to_arrow};
pub use writer::{write_records_to_parquet, ParquetWriter, ParquetWriterConfig};
