//! Engine-level error types.

use thiserror::Error;

use crate::job::JobKind;
use crate::step::{StepId, StepKind};

/// Errors produced by the workflow engine (tree building + runs).
#[derive(Debug, Error)]
pub enum EngineError {
    // ------ Tree building errors ------

    /// A step id that does not belong to this tree.
    #[error("step {0} is not part of this workflow")]
    UnknownStep(StepId),

    /// Collect steps may only appear as the root of a tree.
    #[error("a collect step can only be the root of a workflow")]
    CollectStepNotRoot,

    /// The workflow definition could not be parsed.
    #[error("invalid workflow definition: {0}")]
    Definition(#[from] serde_json::Error),

    // ------ Run errors ------

    /// A step was handed an upstream job it has no way to consume.
    ///
    /// This aborts the whole run; it is never retried.
    #[error("{step} step cannot create a job from an upstream {job} job")]
    UnexpectedJobKind { step: StepKind, job: JobKind },
}
