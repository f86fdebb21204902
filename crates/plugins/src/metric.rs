//! Metric identifiers and collected values.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifies a metric a collector can produce.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetricType {
    /// Slash-separated namespace, e.g. `/builtin/clock/unix_seconds`.
    pub namespace: String,
    #[serde(default)]
    pub version: i32,
}

impl MetricType {
    pub fn new(namespace: impl Into<String>, version: i32) -> Self {
        Self {
            namespace: namespace.into(),
            version,
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.version)
    }
}

/// One collected value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub namespace: String,
    pub version: i32,
    pub data: Value,
    pub timestamp: DateTime<Utc>,
}

impl Metric {
    /// Stamp a value for `metric_type` with the current time.
    pub fn new(metric_type: &MetricType, data: Value) -> Self {
        Self {
            namespace: metric_type.namespace.clone(),
            version: metric_type.version,
            data,
            timestamp: Utc::now(),
        }
    }
}
