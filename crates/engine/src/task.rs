//! Task descriptor consumed by [`Workflow::start`](crate::Workflow::start).

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use plugins::{MetricProvider, MetricPublisher, MetricType};

use crate::dispatch::WorkDispatcher;

/// The metric collaborators a run threads through every step.
#[derive(Clone)]
pub struct MetricServices {
    pub provider: Arc<dyn MetricProvider>,
    pub publisher: Arc<dyn MetricPublisher>,
}

impl MetricServices {
    pub fn new(provider: Arc<dyn MetricProvider>, publisher: Arc<dyn MetricPublisher>) -> Self {
        Self { provider, publisher }
    }
}

impl fmt::Debug for MetricServices {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricServices").finish_non_exhaustive()
    }
}

/// Everything one run needs besides the step tree.
#[derive(Clone)]
pub struct Task {
    pub id: Uuid,
    /// Metric types the root collect job gathers.
    pub metric_types: Vec<MetricType>,
    /// Collection deadline, enforced by the dispatcher.
    pub deadline: Duration,
    pub metrics: MetricServices,
    pub dispatcher: Arc<dyn WorkDispatcher>,
}

impl Task {
    pub fn new(
        metric_types: Vec<MetricType>,
        deadline: Duration,
        metrics: MetricServices,
        dispatcher: Arc<dyn WorkDispatcher>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            metric_types,
            deadline,
            metrics,
            dispatcher,
        }
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("metric_types", &self.metric_types)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}
