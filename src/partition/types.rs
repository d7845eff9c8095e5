//! Partition types and traits
//!
//! Defines the core partition abstractions and the value keys shared with
//! the request template engine.

use crate::error::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Partition key carrying a worker identifier
pub const WORKER_ID_FIELD: &str = "worker_id";

/// Partition key carrying an as-of effective date (`%Y-%m-%d`)
pub const AS_OF_FIELD: &str = "as_of_effective_date";

/// Partition key carrying a reference category token
pub const SUBCATEGORY_FIELD: &str = "reference_subcategory_type";

/// Date format of `as_of_effective_date` values
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A single partition value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionValue {
    /// Unique identifier for this partition
    pub id: String,
    /// Values to inject into request templates and stamp onto records
    pub values: HashMap<String, Value>,
}

impl PartitionValue {
    /// Create a new partition value
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            values: HashMap::new(),
        }
    }

    /// Add a value to the partition
    #[must_use]
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Add a string value
    #[must_use]
    pub fn with_string(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), Value::String(value.into()));
        self
    }

    /// Get a value by key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Get a string value by key
    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }
}

/// One (worker, as-of date) unit of work for the history feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slice {
    /// Worker the snapshot is requested for
    pub worker_id: String,
    /// Effective date of the snapshot
    pub as_of: NaiveDate,
}

impl Slice {
    /// Create a slice
    pub fn new(worker_id: impl Into<String>, as_of: NaiveDate) -> Self {
        Self {
            worker_id: worker_id.into(),
            as_of,
        }
    }

    /// The partition value handed to the template engine
    pub fn to_partition(&self) -> PartitionValue {
        let date = self.as_of.format(DATE_FORMAT).to_string();
        PartitionValue::new(format!("{}_{date}", self.worker_id))
            .with_string(WORKER_ID_FIELD, self.worker_id.clone())
            .with_string(AS_OF_FIELD, date)
    }
}

/// Trait for partition routers
pub trait PartitionRouter: Send + Sync {
    /// Generate partition values
    fn partitions(&self) -> Result<Vec<PartitionValue>>;

    /// Get the partition field name (for template interpolation)
    fn partition_field(&self) -> &str;
}
