//! Plugin-level error type.

use thiserror::Error;

use crate::MetricType;

/// Errors returned by collector and publisher plugins.
///
/// These never abort a workflow run: the dispatcher records them on the
/// job's completion and moves on.
#[derive(Debug, Error)]
pub enum PluginError {
    /// The collector could not produce values.
    #[error("collection failed: {0}")]
    Collect(String),

    /// The collector does not know this metric type.
    #[error("unknown metric type '{0}'")]
    UnknownMetric(MetricType),

    /// The publisher could not deliver values.
    #[error("publish failed: {0}")]
    Publish(String),

    #[error("unsupported content type '{0}'")]
    UnsupportedContentType(String),

    /// A required config entry is absent or has the wrong type.
    #[error("missing config value '{0}'")]
    MissingConfig(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
