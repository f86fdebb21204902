//! Built-in plugins shipped with the binary.
//!
//! - [`ClockCollector`] reports the wall clock as metrics.
//! - [`JsonLinesPublisher`] writes metrics as JSON lines to stdout or a file.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::{Metric, MetricProvider, MetricPublisher, MetricType, PluginError, PublishTarget};

pub const UNIX_SECONDS: &str = "/builtin/clock/unix_seconds";
pub const UNIX_MILLIS: &str = "/builtin/clock/unix_millis";

/// Collects the current time.
#[derive(Debug, Default, Clone)]
pub struct ClockCollector;

#[async_trait]
impl MetricProvider for ClockCollector {
    fn metric_types(&self) -> Vec<MetricType> {
        vec![MetricType::new(UNIX_SECONDS, 1), MetricType::new(UNIX_MILLIS, 1)]
    }

    async fn collect(&self, metric_types: &[MetricType]) -> Result<Vec<Metric>, PluginError> {
        let now = Utc::now();
        metric_types
            .iter()
            .map(|mt| {
                let data = match mt.namespace.as_str() {
                    UNIX_SECONDS => Value::from(now.timestamp()),
                    UNIX_MILLIS => Value::from(now.timestamp_millis()),
                    _ => return Err(PluginError::UnknownMetric(mt.clone())),
                };
                Ok(Metric::new(mt, data))
            })
            .collect()
    }
}

/// Writes one JSON object per metric.
///
/// Destinations: `stdout`, or `file` with a `path` config entry (appended to).
#[derive(Debug, Default, Clone)]
pub struct JsonLinesPublisher;

impl JsonLinesPublisher {
    fn render(metrics: &[Metric]) -> Result<Vec<u8>, PluginError> {
        let mut out = Vec::new();
        for metric in metrics {
            serde_json::to_writer(&mut out, metric)?;
            out.push(b'\n');
        }
        Ok(out)
    }
}

#[async_trait]
impl MetricPublisher for JsonLinesPublisher {
    async fn publish(&self, target: &PublishTarget, metrics: &[Metric]) -> Result<(), PluginError> {
        if target.content_type != "json" {
            return Err(PluginError::UnsupportedContentType(target.content_type.clone()));
        }
        let body = Self::render(metrics)?;

        match target.name.as_str() {
            "stdout" => {
                let mut stdout = tokio::io::stdout();
                stdout.write_all(&body).await?;
                stdout.flush().await?;
            }
            "file" => {
                let path = target
                    .string("path")
                    .ok_or_else(|| PluginError::MissingConfig("path".into()))?;
                let mut file = tokio::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .await?;
                file.write_all(&body).await?;
                file.flush().await?;
            }
            other => {
                return Err(PluginError::Publish(format!("no destination named '{other}'")));
            }
        }

        debug!("published {} metrics to '{}'", metrics.len(), target.name);
        Ok(())
    }
}
