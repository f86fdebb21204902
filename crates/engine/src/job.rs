//! Job model — the typed envelope a stage hands to the work dispatcher.
//!
//! Jobs travel as `Arc<Job>`: a child step receives a handle to its parent's
//! dispatched job, and siblings each get their own clone of that handle.
//! The only mutable part of a job is its write-once [`Completion`] slot,
//! filled by whoever actually executes it.

use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use plugins::{Metric, MetricProvider, MetricPublisher, MetricType, PublishTarget};

use crate::error::EngineError;
use crate::step::StepKind;

// ---------------------------------------------------------------------------
// JobKind
// ---------------------------------------------------------------------------

/// Which stage produced a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    Collect,
    Publish,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobKind::Collect => f.write_str("collect"),
            JobKind::Publish => f.write_str("publish"),
        }
    }
}

// ---------------------------------------------------------------------------
// Completion
// ---------------------------------------------------------------------------

/// Outcome of executing a job.  The engine itself never reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    pub completed_at: DateTime<Utc>,
    /// Metrics collected (collect jobs) or delivered (publish jobs).
    pub metrics: Vec<Metric>,
    pub errors: Vec<String>,
}

impl Completion {
    pub fn succeeded(metrics: Vec<Metric>) -> Self {
        Self {
            completed_at: Utc::now(),
            metrics,
            errors: Vec::new(),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            completed_at: Utc::now(),
            metrics: Vec::new(),
            errors: vec![error.into()],
        }
    }

    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Fields every job carries regardless of kind.
#[derive(Debug)]
struct JobMeta {
    id: Uuid,
    created_at: DateTime<Utc>,
    deadline: Duration,
    completion: OnceLock<Completion>,
}

impl JobMeta {
    fn new(deadline: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            deadline,
            completion: OnceLock::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// CollectJob
// ---------------------------------------------------------------------------

/// Root job of a run: collect a set of metric types before a deadline.
pub struct CollectJob {
    meta: JobMeta,
    metric_types: Vec<MetricType>,
    provider: Arc<dyn MetricProvider>,
}

impl CollectJob {
    /// Build the root job.  An empty `metric_types` list is the caller's
    /// problem; nothing here rejects it.
    pub fn new(
        metric_types: Vec<MetricType>,
        deadline: Duration,
        provider: Arc<dyn MetricProvider>,
    ) -> Self {
        Self {
            meta: JobMeta::new(deadline),
            metric_types,
            provider,
        }
    }

    pub fn metric_types(&self) -> &[MetricType] {
        &self.metric_types
    }

    async fn execute(&self) -> Completion {
        let deadline = self.meta.deadline;
        match tokio::time::timeout(deadline, self.provider.collect(&self.metric_types)).await {
            Ok(Ok(metrics)) => Completion::succeeded(metrics),
            Ok(Err(e)) => Completion::failed(e.to_string()),
            Err(_) => Completion::failed(format!("collection exceeded deadline of {deadline:?}")),
        }
    }
}

impl fmt::Debug for CollectJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectJob")
            .field("meta", &self.meta)
            .field("metric_types", &self.metric_types)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// PublishJob
// ---------------------------------------------------------------------------

/// Publish the metrics of an upstream collect job to one destination.
pub struct PublishJob {
    meta: JobMeta,
    parent: Arc<Job>,
    target: PublishTarget,
    publisher: Arc<dyn MetricPublisher>,
}

impl PublishJob {
    /// Build a publish job fed by `parent`.
    ///
    /// # Errors
    /// [`EngineError::UnexpectedJobKind`] unless `parent` is a collect job.
    pub fn new(
        parent: Arc<Job>,
        target: PublishTarget,
        publisher: Arc<dyn MetricPublisher>,
    ) -> Result<Self, EngineError> {
        match parent.as_ref() {
            Job::Collect(collect) => Ok(Self {
                meta: JobMeta::new(collect.meta.deadline),
                parent,
                target,
                publisher,
            }),
            Job::Publish(_) => Err(EngineError::UnexpectedJobKind {
                step: StepKind::Publish,
                job: parent.kind(),
            }),
        }
    }

    /// The collect job this one publishes from.
    pub fn parent(&self) -> &Arc<Job> {
        &self.parent
    }

    pub fn target(&self) -> &PublishTarget {
        &self.target
    }

    async fn execute(&self) -> Completion {
        let Some(upstream) = self.parent.completion() else {
            return Completion::failed("upstream collect job has not completed");
        };
        if !upstream.is_success() {
            return Completion::failed(format!(
                "upstream collect job failed: {}",
                upstream.errors.join("; ")
            ));
        }

        let deadline = self.meta.deadline;
        let publish = self.publisher.publish(&self.target, &upstream.metrics);
        match tokio::time::timeout(deadline, publish).await {
            Ok(Ok(())) => Completion::succeeded(upstream.metrics.clone()),
            Ok(Err(e)) => Completion::failed(e.to_string()),
            Err(_) => Completion::failed(format!("publish exceeded deadline of {deadline:?}")),
        }
    }
}

impl fmt::Debug for PublishJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublishJob")
            .field("meta", &self.meta)
            .field("parent", &self.parent.id())
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

/// A unit of work, tagged by the stage that produced it.
#[derive(Debug)]
pub enum Job {
    Collect(CollectJob),
    Publish(PublishJob),
}

impl Job {
    pub fn kind(&self) -> JobKind {
        match self {
            Job::Collect(_) => JobKind::Collect,
            Job::Publish(_) => JobKind::Publish,
        }
    }

    fn meta(&self) -> &JobMeta {
        match self {
            Job::Collect(job) => &job.meta,
            Job::Publish(job) => &job.meta,
        }
    }

    pub fn id(&self) -> Uuid {
        self.meta().id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.meta().created_at
    }

    pub fn deadline(&self) -> Duration {
        self.meta().deadline
    }

    pub fn as_collect(&self) -> Option<&CollectJob> {
        match self {
            Job::Collect(job) => Some(job),
            _ => None,
        }
    }

    pub fn as_publish(&self) -> Option<&PublishJob> {
        match self {
            Job::Publish(job) => Some(job),
            _ => None,
        }
    }

    /// The recorded outcome, once someone has executed the job.
    pub fn completion(&self) -> Option<&Completion> {
        self.meta().completion.get()
    }

    /// Record the outcome.  Returns `false` if one was already recorded;
    /// the first outcome wins.
    pub fn complete(&self, completion: Completion) -> bool {
        self.meta().completion.set(completion).is_ok()
    }

    /// Execute the job against its plugin and record the outcome.
    ///
    /// Meant for dispatchers; the engine never calls this.  Plugin failures
    /// and deadline overruns end up in the completion's `errors`.  A job that
    /// already has a completion is not executed again, so a handle forwarded
    /// by a process step does not collect or publish twice.
    pub async fn run(&self) {
        if self.completion().is_some() {
            debug!("{} job {} already completed, skipping", self.kind(), self.id());
            return;
        }
        debug!("running {} job {}", self.kind(), self.id());
        let completion = match self {
            Job::Collect(job) => job.execute().await,
            Job::Publish(job) => job.execute().await,
        };
        if !completion.is_success() {
            warn!("{} job {} failed: {:?}", self.kind(), self.id(), completion.errors);
        }
        if !self.complete(completion) {
            warn!("{} job {} was already completed", self.kind(), self.id());
        }
    }
}
