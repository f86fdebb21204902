//! `engine` crate — job model, step tree, and the workflow engine.
//!
//! A [`Workflow`] owns a [`StepTree`] rooted at a collect step.  Each run
//! walks the tree depth-first and hands one [`Job`] per step to an external
//! [`WorkDispatcher`].

pub mod definition;
pub mod dispatch;
pub mod error;
pub mod job;
pub mod step;
pub mod task;
pub mod workflow;

pub use definition::{CollectDefinition, StepDefinition, WorkflowDefinition};
pub use dispatch::{InlineDispatcher, WorkDispatcher};
pub use error::EngineError;
pub use job::{CollectJob, Completion, Job, JobKind, PublishJob};
pub use step::{CollectStep, ProcessStep, PublishStep, Step, StepId, StepKind, StepTree};
pub use task::{MetricServices, Task};
pub use workflow::{RunReport, Workflow, WorkflowState};
