//! The work-dispatch contract and an inline implementation.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::job::Job;

/// Executes (or schedules) jobs on behalf of the engine.
///
/// The engine awaits each `work` future before it creates any child job,
/// and hands the returned handle to every child.  Whether the work has
/// physically finished when the future resolves is up to the implementation:
/// a dispatcher that queues the job and returns immediately gives up any
/// ordering guarantee between siblings.
#[async_trait]
pub trait WorkDispatcher: Send + Sync {
    async fn work(&self, job: Arc<Job>) -> Arc<Job>;
}

/// Runs every job to completion on the calling task.
///
/// Gives strictly sequential, depth-first execution: a child's job always
/// sees its parent's completion.
#[derive(Debug, Default, Clone)]
pub struct InlineDispatcher;

#[async_trait]
impl WorkDispatcher for InlineDispatcher {
    async fn work(&self, job: Arc<Job>) -> Arc<Job> {
        job.run().await;
        debug!("{} job {} finished inline", job.kind(), job.id());
        job
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::CollectJob;
    use plugins::mock::MockCollector;
    use plugins::MetricType;
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn inline_dispatch_completes_and_returns_same_job() {
        let collector = Arc::new(MockCollector::returning(Vec::new(), json!(1)));
        let job = Arc::new(Job::Collect(CollectJob::new(
            vec![MetricType::new("/a", 1)],
            Duration::from_secs(1),
            collector.clone(),
        )));

        let done = InlineDispatcher.work(Arc::clone(&job)).await;

        assert!(Arc::ptr_eq(&done, &job));
        assert!(done.completion().unwrap().is_success());
        assert_eq!(collector.call_count(), 1);
    }
}
