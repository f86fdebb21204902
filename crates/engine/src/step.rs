//! Steps and the step tree.
//!
//! A workflow is a rooted tree of steps stored in an arena: the root collect
//! step lives at [`StepId`] 0 and every other step is addressed by the id
//! returned from [`StepTree::add_step`].  The tree shape is the workflow
//! definition; sibling order is execution order.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use plugins::{MetricProvider, MetricType, PublishTarget};

use crate::error::EngineError;
use crate::job::{CollectJob, Job, PublishJob};
use crate::task::MetricServices;

// ---------------------------------------------------------------------------
// StepKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Collect,
    Process,
    Publish,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepKind::Collect => f.write_str("collect"),
            StepKind::Process => f.write_str("process"),
            StepKind::Publish => f.write_str("publish"),
        }
    }
}

// ---------------------------------------------------------------------------
// Step variants
// ---------------------------------------------------------------------------

/// Root stage: builds the job every other stage derives from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectStep;

impl CollectStep {
    /// The root has no upstream job, so it takes the task's inputs directly.
    pub fn create_job(
        &self,
        metric_types: Vec<MetricType>,
        deadline: Duration,
        provider: Arc<dyn MetricProvider>,
    ) -> Arc<Job> {
        Arc::new(Job::Collect(CollectJob::new(metric_types, deadline, provider)))
    }
}

/// Processing stage.  Currently forwards its upstream job untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessStep;

impl ProcessStep {
    pub fn create_job(&self, upstream: &Arc<Job>) -> Arc<Job> {
        Arc::clone(upstream)
    }
}

/// Publishing stage with a destination fixed at build time.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishStep {
    target: PublishTarget,
}

impl PublishStep {
    pub fn new(target: PublishTarget) -> Self {
        Self { target }
    }

    pub fn target(&self) -> &PublishTarget {
        &self.target
    }

    /// # Errors
    /// [`EngineError::UnexpectedJobKind`] unless `upstream` is a collect job.
    pub fn create_job(
        &self,
        upstream: &Arc<Job>,
        metrics: &MetricServices,
    ) -> Result<Arc<Job>, EngineError> {
        let job = PublishJob::new(
            Arc::clone(upstream),
            self.target.clone(),
            Arc::clone(&metrics.publisher),
        )?;
        Ok(Arc::new(Job::Publish(job)))
    }
}

/// One pipeline stage.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Collect(CollectStep),
    Process(ProcessStep),
    Publish(PublishStep),
}

impl Step {
    pub fn kind(&self) -> StepKind {
        match self {
            Step::Collect(_) => StepKind::Collect,
            Step::Process(_) => StepKind::Process,
            Step::Publish(_) => StepKind::Publish,
        }
    }

    /// Turn the parent's dispatched job into this step's job.
    ///
    /// # Errors
    /// [`EngineError::UnexpectedJobKind`] when the pairing of this step and
    /// the upstream job kind is not supported.  A collect step never has an
    /// upstream job, so reaching it here is always a mismatch.
    pub fn create_job(
        &self,
        upstream: &Arc<Job>,
        metrics: &MetricServices,
    ) -> Result<Arc<Job>, EngineError> {
        match self {
            Step::Process(step) => Ok(step.create_job(upstream)),
            Step::Publish(step) => step.create_job(upstream, metrics),
            Step::Collect(_) => Err(EngineError::UnexpectedJobKind {
                step: StepKind::Collect,
                job: upstream.kind(),
            }),
        }
    }
}

impl From<ProcessStep> for Step {
    fn from(step: ProcessStep) -> Self {
        Step::Process(step)
    }
}

impl From<PublishStep> for Step {
    fn from(step: PublishStep) -> Self {
        Step::Publish(step)
    }
}

impl From<CollectStep> for Step {
    fn from(step: CollectStep) -> Self {
        Step::Collect(step)
    }
}

// ---------------------------------------------------------------------------
// StepTree
// ---------------------------------------------------------------------------

/// Handle to a step inside one [`StepTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StepId(usize);

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct StepNode {
    step: Step,
    parent: Option<StepId>,
    children: Vec<StepId>,
}

/// Arena-backed tree of steps rooted at a collect step.
///
/// Steps can only be appended, never removed or re-parented, so the tree is
/// acyclic by construction.
#[derive(Debug, Clone)]
pub struct StepTree {
    nodes: Vec<StepNode>,
}

impl Default for StepTree {
    fn default() -> Self {
        Self::new()
    }
}

impl StepTree {
    /// A tree holding only the root collect step.
    pub fn new() -> Self {
        Self {
            nodes: vec![StepNode {
                step: Step::Collect(CollectStep),
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn root(&self) -> StepId {
        StepId(0)
    }

    /// Append `step` as the last child of `parent` and return its handle.
    ///
    /// # Errors
    /// - [`EngineError::UnknownStep`] if `parent` is not in this tree.
    /// - [`EngineError::CollectStepNotRoot`] if `step` is a collect step.
    pub fn add_step(&mut self, parent: StepId, step: impl Into<Step>) -> Result<StepId, EngineError> {
        let step = step.into();
        if matches!(step, Step::Collect(_)) {
            return Err(EngineError::CollectStepNotRoot);
        }
        if parent.0 >= self.nodes.len() {
            return Err(EngineError::UnknownStep(parent));
        }

        let id = StepId(self.nodes.len());
        self.nodes.push(StepNode {
            step,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    /// Children of `id` in declaration order.  Empty for ids from another tree.
    pub fn steps(&self, id: StepId) -> &[StepId] {
        self.nodes
            .get(id.0)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn step(&self, id: StepId) -> Option<&Step> {
        self.nodes.get(id.0).map(|node| &node.step)
    }

    /// Number of steps, root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Every step id in depth-first pre-order, i.e. the order a run visits them.
    pub fn preorder(&self) -> Vec<StepId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.steps(id).iter().rev().copied());
        }
        order
    }

    /// Nesting depth of `id` below the root (root = 0).
    pub fn depth(&self, id: StepId) -> Option<usize> {
        if id.0 >= self.nodes.len() {
            return None;
        }
        let mut depth = 0;
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            depth += 1;
            current = parent;
        }
        Some(depth)
    }

    /// The step `id` was attached under; `None` for the root.
    pub fn parent(&self, id: StepId) -> Option<StepId> {
        self.nodes.get(id.0).and_then(|node| node.parent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plugins::mock::{MockCollector, MockPublisher};
    use plugins::ConfigMap;
    use serde_json::json;

    fn publish(name: &str) -> PublishStep {
        PublishStep::new(PublishTarget::new(name, 1, "json", ConfigMap::new()))
    }

    fn services() -> MetricServices {
        MetricServices::new(
            Arc::new(MockCollector::returning(Vec::new(), json!(0))),
            Arc::new(MockPublisher::accepting()),
        )
    }

    fn root_job() -> Arc<Job> {
        CollectStep.create_job(
            vec![MetricType::new("/a", 1)],
            Duration::from_secs(1),
            Arc::new(MockCollector::returning(Vec::new(), json!(0))),
        )
    }

    #[test]
    fn add_step_returns_child_in_call_order() {
        let mut tree = StepTree::new();
        let root = tree.root();

        let a = tree.add_step(root, publish("a")).unwrap();
        let b = tree.add_step(root, ProcessStep).unwrap();
        let a1 = tree.add_step(a, ProcessStep).unwrap();

        assert_eq!(tree.steps(root), &[a, b]);
        assert_eq!(tree.steps(a), &[a1]);
        assert!(tree.steps(b).is_empty());
        assert_eq!(tree.step(a), Some(&Step::Publish(publish("a"))));
        assert_eq!(tree.node_count(), 4);
    }

    #[test]
    fn collect_step_cannot_be_nested() {
        let mut tree = StepTree::new();
        let root = tree.root();
        assert!(matches!(
            tree.add_step(root, CollectStep),
            Err(EngineError::CollectStepNotRoot)
        ));
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn foreign_parent_is_rejected() {
        let mut big = StepTree::new();
        let root = big.root();
        let child = big.add_step(root, ProcessStep).unwrap();

        let mut small = StepTree::new();
        assert!(matches!(
            small.add_step(child, ProcessStep),
            Err(EngineError::UnknownStep(id)) if id == child
        ));
        assert!(small.steps(child).is_empty());
    }

    #[test]
    fn preorder_follows_declaration_order() {
        // root → [A → [A1, A2], B]
        let mut tree = StepTree::new();
        let root = tree.root();
        let a = tree.add_step(root, ProcessStep).unwrap();
        let b = tree.add_step(root, publish("b")).unwrap();
        let a1 = tree.add_step(a, publish("a1")).unwrap();
        let a2 = tree.add_step(a, publish("a2")).unwrap();

        assert_eq!(tree.preorder(), vec![root, a, a1, a2, b]);
        assert_eq!(tree.depth(a2), Some(2));
        assert_eq!(tree.depth(root), Some(0));
    }

    #[test]
    fn parent_is_recorded_when_attached() {
        let mut tree = StepTree::new();
        let root = tree.root();
        let a = tree.add_step(root, ProcessStep).unwrap();
        let a1 = tree.add_step(a, publish("a1")).unwrap();

        assert_eq!(tree.parent(root), None);
        assert_eq!(tree.parent(a), Some(root));
        assert_eq!(tree.parent(a1), Some(a));
        assert_eq!(tree.depth(a1), Some(2));

        let other = StepTree::new();
        assert_eq!(other.parent(a1), None);
        assert_eq!(other.depth(a1), None);
    }

    #[test]
    fn process_step_is_identity() {
        let upstream = root_job();
        let job = Step::Process(ProcessStep)
            .create_job(&upstream, &services())
            .unwrap();
        assert!(Arc::ptr_eq(&job, &upstream));
    }

    #[test]
    fn publish_step_copies_its_target() {
        let upstream = root_job();
        let job = Step::Publish(publish("file"))
            .create_job(&upstream, &services())
            .unwrap();

        let publish_job = job.as_publish().expect("publish job");
        assert_eq!(publish_job.target(), publish("file").target());
        assert!(Arc::ptr_eq(publish_job.parent(), &upstream));
    }

    #[test]
    fn publish_step_rejects_publish_upstream() {
        let metrics = services();
        let upstream = Step::Publish(publish("first"))
            .create_job(&root_job(), &metrics)
            .unwrap();

        let result = Step::Publish(publish("second")).create_job(&upstream, &metrics);
        assert!(matches!(result, Err(EngineError::UnexpectedJobKind { .. })));
    }

    #[test]
    fn collect_step_never_takes_upstream() {
        let result = Step::Collect(CollectStep).create_job(&root_job(), &services());
        assert!(matches!(
            result,
            Err(EngineError::UnexpectedJobKind { step: StepKind::Collect, .. })
        ));
    }
}
