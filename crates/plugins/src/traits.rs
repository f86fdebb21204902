//! The collaborator traits every metric plugin must fulfil.

use async_trait::async_trait;

use crate::{Metric, MetricType, PluginError, PublishTarget};

/// Supplies the catalog of available metric types and collects their values.
///
/// Defined here (in the plugins crate) so both the engine and individual
/// collectors can import it without a circular dependency.
#[async_trait]
pub trait MetricProvider: Send + Sync {
    /// Every metric type this provider can collect.
    fn metric_types(&self) -> Vec<MetricType>;

    /// Collect one value per requested metric type.
    async fn collect(&self, metric_types: &[MetricType]) -> Result<Vec<Metric>, PluginError>;
}

/// Delivers collected metrics to a named destination.
#[async_trait]
pub trait MetricPublisher: Send + Sync {
    async fn publish(&self, target: &PublishTarget, metrics: &[Metric]) -> Result<(), PluginError>;
}
