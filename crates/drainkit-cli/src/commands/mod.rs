pub mod query;
pub mod report;

use std::path::Path;

use drainkit_admission::{DrainEvaluator, DrainPolicy};
use drainkit_core::OutputFormat;
use drainkit_state::ClusterSnapshot;

/// Everything a subcommand needs: the loaded snapshot and how to render.
pub struct Context {
    pub snapshot: ClusterSnapshot,
    pub policy: DrainPolicy,
    pub format: OutputFormat,
}

impl Context {
    pub fn load(path: &Path, policy: DrainPolicy, format: OutputFormat) -> anyhow::Result<Self> {
        let snapshot = ClusterSnapshot::from_json_file(path)?;
        Ok(Self {
            snapshot,
            policy,
            format,
        })
    }

    pub fn evaluator(&self) -> DrainEvaluator<'_, ClusterSnapshot> {
        DrainEvaluator::new(&self.snapshot).with_policy(self.policy)
    }
}

#[cfg(test)]
pub(crate) fn test_context(format: OutputFormat) -> Context {
    use drainkit_core::{Computer, Executable, Execution, Executor, JobState, Node, QueuedJob};

    let snapshot = ClusterSnapshot::new()
        .with_node(
            Node::new("n1").with_label("gpu").with_computer(
                Computer::online().with_executor(Executor::running(Executable::Build(
                    Execution::running("lib", 6, "n1"),
                ))),
            ),
        )
        .with_node(Node::new("n2").with_computer(Computer::online()))
        .with_build(Execution::finished("lib", 5, "n1"))
        .with_job(
            QueuedJob::project(1, "render", JobState::Buildable)
                .caused_by("lib", 5)
                .with_required_label("gpu"),
        )
        .with_job(QueuedJob::project(2, "fresh", JobState::Buildable))
        .with_job(QueuedJob::plain(3, "cleanup", JobState::Buildable));

    Context {
        snapshot,
        policy: DrainPolicy::default(),
        format,
    }
}
