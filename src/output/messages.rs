//! Line-delimited JSON messages
//!
//! Records and checkpoint state go to stdout (or any writer) one JSON
//! message per line, in the `RECORD` / `STATE` / `LOG` envelope the harness
//! consumes.

use crate::error::Result;
use crate::types::{JsonValue, Record};
use chrono::Utc;
use serde::Serialize;
use std::io::Write;

/// One output line
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum Message {
    /// A normalized record
    Record {
        /// Record payload
        record: RecordMessage,
    },
    /// Checkpoint state to persist
    State {
        /// State payload
        state: JsonValue,
    },
    /// Log line
    Log {
        /// Log payload
        log: LogMessage,
    },
}

/// Payload of a `RECORD` message
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordMessage {
    /// Feed the record belongs to
    pub stream: String,
    /// The record
    pub data: Record,
    /// Emission time, milliseconds since the epoch
    pub emitted_at: i64,
}

/// Payload of a `LOG` message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogMessage {
    /// `INFO`, `WARN`, ...
    pub level: String,
    /// Log text
    pub message: String,
}

impl Message {
    /// Create a record message stamped with the current time
    pub fn record(stream: impl Into<String>, data: Record) -> Self {
        Self::Record {
            record: RecordMessage {
                stream: stream.into(),
                data,
                emitted_at: Utc::now().timestamp_millis(),
            },
        }
    }

    /// Create a state message
    pub fn state(state: JsonValue) -> Self {
        Self::State { state }
    }

    /// Create a log message
    pub fn log(level: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Log {
            log: LogMessage {
                level: level.into(),
                message: message.into(),
            },
        }
    }

    /// Check if this is a record message
    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record { .. })
    }
}

/// Writes messages as JSON lines
#[derive(Debug)]
pub struct MessageWriter<W: Write> {
    out: W,
    records_written: usize,
}

impl<W: Write> MessageWriter<W> {
    /// Wrap a writer
    pub fn new(out: W) -> Self {
        Self {
            out,
            records_written: 0,
        }
    }

    /// Write one message
    pub fn write(&mut self, message: &Message) -> Result<()> {
        serde_json::to_writer(&mut self.out, message)?;
        self.out.write_all(b"\n")?;
        if message.is_record() {
            self.records_written += 1;
        }
        Ok(())
    }

    /// Write every record of one feed, returning how many were written
    pub fn write_records(&mut self, stream: &str, records: Vec<Record>) -> Result<usize> {
        let count = records.len();
        for record in records {
            self.write(&Message::record(stream, record))?;
        }
        Ok(count)
    }

    /// Records written so far
    pub fn records_written(&self) -> usize {
        self.records_written
    }

    /// Flush and return the inner writer
    pub fn into_inner(mut self) -> Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}
