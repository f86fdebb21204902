//! `MockCollector` and `MockPublisher` — test doubles for the plugin traits.
//!
//! Useful in unit and integration tests where a real plugin is either
//! unavailable or irrelevant.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

use crate::{Metric, MetricProvider, MetricPublisher, MetricType, PluginError, PublishTarget};

/// Behaviour injected into a mock at construction time.
pub enum MockBehaviour {
    /// Succeed; collectors emit this value for every requested type.
    ReturnValue(Value),
    /// Fail with the given message.
    Fail(String),
}

/// A mock collector that records every request and returns a
/// programmer-specified result.
pub struct MockCollector {
    /// Catalog reported by `metric_types`.
    pub available: Vec<MetricType>,
    pub behaviour: MockBehaviour,
    /// All requested type lists (in call order).
    pub calls: Arc<Mutex<Vec<Vec<MetricType>>>>,
}

impl MockCollector {
    /// Create a mock that emits `value` for every requested type.
    pub fn returning(available: Vec<MetricType>, value: Value) -> Self {
        Self {
            available,
            behaviour: MockBehaviour::ReturnValue(value),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock that always fails.
    pub fn failing(msg: impl Into<String>) -> Self {
        Self {
            available: Vec::new(),
            behaviour: MockBehaviour::Fail(msg.into()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of times `collect` has been called.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl MetricProvider for MockCollector {
    fn metric_types(&self) -> Vec<MetricType> {
        self.available.clone()
    }

    async fn collect(&self, metric_types: &[MetricType]) -> Result<Vec<Metric>, PluginError> {
        self.calls.lock().unwrap().push(metric_types.to_vec());

        match &self.behaviour {
            MockBehaviour::ReturnValue(v) => Ok(metric_types
                .iter()
                .map(|mt| Metric::new(mt, v.clone()))
                .collect()),
            MockBehaviour::Fail(msg) => Err(PluginError::Collect(msg.clone())),
        }
    }
}

/// A mock publisher that records every target and batch it receives.
pub struct MockPublisher {
    pub behaviour: MockBehaviour,
    pub calls: Arc<Mutex<Vec<(PublishTarget, Vec<Metric>)>>>,
}

impl MockPublisher {
    pub fn accepting() -> Self {
        Self {
            behaviour: MockBehaviour::ReturnValue(json!(null)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(msg: impl Into<String>) -> Self {
        Self {
            behaviour: MockBehaviour::Fail(msg.into()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of times `publish` has been called.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Targets seen so far, in call order.
    pub fn targets(&self) -> Vec<PublishTarget> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(target, _)| target.clone())
            .collect()
    }
}

#[async_trait]
impl MetricPublisher for MockPublisher {
    async fn publish(&self, target: &PublishTarget, metrics: &[Metric]) -> Result<(), PluginError> {
        self.calls
            .lock()
            .unwrap()
            .push((target.clone(), metrics.to_vec()));

        match &self.behaviour {
            MockBehaviour::ReturnValue(_) => Ok(()),
            MockBehaviour::Fail(msg) => Err(PluginError::Publish(msg.clone())),
        }
    }
}
