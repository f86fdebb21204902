//! Workflow engine.
//!
//! [`Workflow::start`] drives one run of a step tree:
//! 1. Builds the root collect job from the task descriptor.
//! 2. Dispatches it via the task's [`WorkDispatcher`].
//! 3. Walks the tree depth-first, pre-order.  Each step derives its job from
//!    the parent's dispatched job, dispatches it, then recurses into its
//!    children in declaration order.
//!
//! A kind mismatch between a step and its upstream job aborts the run on
//! the spot.  Everything else (plugin failures, deadlines, retries) belongs
//! to the dispatcher.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span, info, instrument, Instrument};
use uuid::Uuid;

use crate::definition::WorkflowDefinition;
use crate::dispatch::WorkDispatcher;
use crate::error::EngineError;
use crate::job::Job;
use crate::step::{Step, StepId, StepTree};
use crate::task::{MetricServices, Task};

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Lifecycle of a workflow.
///
/// The engine only ever moves `Created → Started`; completion and failure
/// are reported by the surrounding system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    #[default]
    Created,
    Started,
    Completed,
    Failed,
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkflowState::Created => "created",
            WorkflowState::Started => "started",
            WorkflowState::Completed => "completed",
            WorkflowState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Summary of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub run_id: Uuid,
    /// Jobs handed to the dispatcher; one per step.
    pub dispatched: usize,
}

type StepFuture<'a> = Pin<Box<dyn Future<Output = Result<usize, EngineError>> + Send + 'a>>;

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

/// A step tree plus its lifecycle state.
#[derive(Debug)]
pub struct Workflow {
    id: Uuid,
    tree: StepTree,
    state: WorkflowState,
}

impl Workflow {
    pub fn new(tree: StepTree) -> Self {
        Self {
            id: Uuid::new_v4(),
            tree,
            state: WorkflowState::Created,
        }
    }

    pub fn from_definition(definition: &WorkflowDefinition) -> Result<Self, EngineError> {
        Ok(Self::new(StepTree::from_definition(definition)?))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    pub fn tree(&self) -> &StepTree {
        &self.tree
    }

    /// Run the whole tree once for `task`.
    ///
    /// # Errors
    /// [`EngineError::UnexpectedJobKind`] if a step cannot consume its
    /// upstream job.  The run stops at that step; nothing below it or after
    /// it is dispatched.
    #[instrument(skip(self, task), fields(workflow_id = %self.id, task_id = %task.id))]
    pub async fn start(&mut self, task: &Task) -> Result<RunReport, EngineError> {
        self.state = WorkflowState::Started;
        let run_id = Uuid::new_v4();
        info!(
            "starting run {} over {} steps ({} metric types, deadline {:?})",
            run_id,
            self.tree.node_count(),
            task.metric_types.len(),
            task.deadline
        );

        let Some(Step::Collect(root_step)) = self.tree.step(self.tree.root()) else {
            unreachable!("step tree root is always a collect step");
        };
        let root_job = root_step.create_job(
            task.metric_types.clone(),
            task.deadline,
            Arc::clone(&task.metrics.provider),
        );
        debug!("dispatching collect job {}", root_job.id());
        let root_job = task.dispatcher.work(root_job).await;

        let mut dispatched = 1;
        for &child in self.tree.steps(self.tree.root()) {
            dispatched += process_step(
                &self.tree,
                child,
                Arc::clone(&root_job),
                task.dispatcher.as_ref(),
                &task.metrics,
            )
            .await?;
        }

        info!("run {} dispatched {} jobs", run_id, dispatched);
        Ok(RunReport { run_id, dispatched })
    }
}

/// Create, dispatch, and recurse for one step.  Returns the number of jobs
/// dispatched for the subtree rooted at `id`.
fn process_step<'a>(
    tree: &'a StepTree,
    id: StepId,
    parent_job: Arc<Job>,
    dispatcher: &'a dyn WorkDispatcher,
    metrics: &'a MetricServices,
) -> StepFuture<'a> {
    let Some(step) = tree.step(id) else {
        return Box::pin(std::future::ready(Err(EngineError::UnknownStep(id))));
    };
    let span = debug_span!("step", id = %id, kind = %step.kind());

    Box::pin(
        async move {
            let job = step.create_job(&parent_job, metrics)?;
            debug!("dispatching {} job {}", job.kind(), job.id());
            let job = dispatcher.work(job).await;

            let mut dispatched = 1;
            for &child in tree.steps(id) {
                dispatched +=
                    process_step(tree, child, Arc::clone(&job), dispatcher, metrics).await?;
            }
            Ok::<_, EngineError>(dispatched)
        }
        .instrument(span),
    )
}
