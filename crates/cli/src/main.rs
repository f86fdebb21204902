//! `metric-pipeline` CLI entry-point.
//!
//! Available sub-commands:
//! - `validate` — check a task manifest and print its step tree.
//! - `run`      — run a task manifest once with the built-in plugins.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing::info;

use engine::{InlineDispatcher, MetricServices, Step, Task, Workflow, WorkflowDefinition};
use plugins::builtin::{ClockCollector, JsonLinesPublisher};

#[derive(Parser)]
#[command(
    name = "metric-pipeline",
    about = "Collect, process and publish metrics through a step tree",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a task manifest and print its steps in execution order.
    Validate {
        /// Path to the task manifest JSON file.
        path: PathBuf,
    },
    /// Run a task manifest once.
    Run {
        /// Path to the task manifest JSON file.
        path: PathBuf,
        /// Override the manifest's collection deadline.
        #[arg(long)]
        deadline_secs: Option<u64>,
    },
}

fn default_deadline_secs() -> u64 {
    5
}

/// On-disk task manifest: a workflow plus its run settings.
#[derive(Debug, Deserialize)]
struct TaskManifest {
    #[serde(default = "default_deadline_secs")]
    deadline_secs: u64,
    workflow: WorkflowDefinition,
}

impl TaskManifest {
    fn parse(content: &str) -> Result<Self> {
        let manifest: TaskManifest =
            serde_json::from_str(content).context("invalid task manifest")?;
        if manifest.workflow.collect.metrics.is_empty() {
            bail!("the collect stage must list at least one metric type");
        }
        Ok(manifest)
    }

    fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read file {}", path.display()))?;
        Self::parse(&content)
    }
}

fn describe(step: &Step) -> String {
    match step {
        Step::Publish(publish) => {
            let target = publish.target();
            format!(
                "publish {} v{} ({})",
                target.name, target.version, target.content_type
            )
        }
        other => other.kind().to_string(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Validate { path } => {
            let manifest = TaskManifest::load(&path)?;
            let workflow = Workflow::from_definition(&manifest.workflow)?;
            let tree = workflow.tree();

            println!("Workflow is valid. Steps in execution order:");
            for id in tree.preorder() {
                if let (Some(step), Some(depth)) = (tree.step(id), tree.depth(id)) {
                    println!("{}{}", "  ".repeat(depth), describe(step));
                }
            }
        }
        Command::Run { path, deadline_secs } => {
            let manifest = TaskManifest::load(&path)?;
            let mut workflow = Workflow::from_definition(&manifest.workflow)?;

            let deadline = Duration::from_secs(deadline_secs.unwrap_or(manifest.deadline_secs));
            let metrics = MetricServices::new(Arc::new(ClockCollector), Arc::new(JsonLinesPublisher));
            let task = Task::new(
                manifest.workflow.collect.metrics.clone(),
                deadline,
                metrics,
                Arc::new(InlineDispatcher),
            );

            let report = workflow.start(&task).await?;
            info!(
                "run {} finished: {} jobs dispatched",
                report.run_id, report.dispatched
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_deadline_defaults_to_five_seconds() {
        let manifest = TaskManifest::parse(
            r#"{ "workflow": { "collect": {
                "metrics": [{ "namespace": "/builtin/clock/unix_seconds", "version": 1 }]
            } } }"#,
        )
        .unwrap();
        assert_eq!(manifest.deadline_secs, 5);
    }

    #[test]
    fn manifest_without_metrics_is_rejected() {
        let err = TaskManifest::parse(r#"{ "workflow": { "collect": {} } }"#).unwrap_err();
        assert!(err.to_string().contains("at least one metric type"));
    }

    #[test]
    fn publish_steps_are_described_with_their_target() {
        let step = Step::Publish(engine::PublishStep::new(plugins::PublishTarget::new(
            "file",
            1,
            "json",
            plugins::ConfigMap::new(),
        )));
        assert_eq!(describe(&step), "publish file v1 (json)");
        assert_eq!(describe(&Step::Process(engine::ProcessStep)), "process");
    }
}
