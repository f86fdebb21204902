//! Declarative workflow definitions.
//!
//! A definition is the JSON form of a step tree:
//!
//! ```json
//! {
//!   "collect": {
//!     "metrics": [{ "namespace": "/builtin/clock/unix_seconds", "version": 1 }],
//!     "steps": [
//!       { "kind": "process", "steps": [
//!         { "kind": "publish", "name": "file", "version": 1,
//!           "content_type": "json", "config": { "path": "/tmp/metrics.jsonl" } }
//!       ] }
//!     ]
//!   }
//! }
//! ```
//!
//! The root is always the collect stage, so a collect step cannot be
//! declared anywhere below it.

use serde::{Deserialize, Serialize};

use plugins::{ConfigMap, MetricType, PublishTarget};

use crate::error::EngineError;
use crate::step::{ProcessStep, PublishStep, Step, StepId, StepTree};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDefinition {
    pub collect: CollectDefinition,
}

impl WorkflowDefinition {
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// The root collect stage and everything downstream of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectDefinition {
    /// Metric types a task built from this definition collects.
    #[serde(default)]
    pub metrics: Vec<MetricType>,
    #[serde(default)]
    pub steps: Vec<StepDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepDefinition {
    Process {
        #[serde(default)]
        steps: Vec<StepDefinition>,
    },
    Publish {
        name: String,
        version: i32,
        content_type: String,
        #[serde(default)]
        config: ConfigMap,
        #[serde(default)]
        steps: Vec<StepDefinition>,
    },
}

impl StepDefinition {
    fn to_step(&self) -> Step {
        match self {
            StepDefinition::Process { .. } => Step::Process(ProcessStep),
            StepDefinition::Publish {
                name,
                version,
                content_type,
                config,
                ..
            } => Step::Publish(PublishStep::new(PublishTarget::new(
                name.clone(),
                *version,
                content_type.clone(),
                config.clone(),
            ))),
        }
    }

    fn children(&self) -> &[StepDefinition] {
        match self {
            StepDefinition::Process { steps } | StepDefinition::Publish { steps, .. } => steps,
        }
    }
}

impl StepTree {
    /// Build a tree from a definition, preserving declaration order.
    pub fn from_definition(definition: &WorkflowDefinition) -> Result<Self, EngineError> {
        let mut tree = StepTree::new();
        let root = tree.root();
        for child in &definition.collect.steps {
            attach(&mut tree, root, child)?;
        }
        Ok(tree)
    }
}

fn attach(tree: &mut StepTree, parent: StepId, definition: &StepDefinition) -> Result<(), EngineError> {
    let id = tree.add_step(parent, definition.to_step())?;
    for child in definition.children() {
        attach(tree, id, child)?;
    }
    Ok(())
}
