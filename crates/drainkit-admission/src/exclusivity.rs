//! Whether a node can be retired without stranding work.

use tracing::debug;

use drainkit_core::{ClusterView, Computer, Executor, Node};

use crate::evaluator::DrainEvaluator;

/// Whether any fixed or one-off executor of `computer` is busy.
pub fn is_busy(computer: &Computer) -> bool {
    computer.all_executors().any(Executor::is_busy)
}

impl<'v, V: ClusterView> DrainEvaluator<'v, V> {
    /// Whether some queued job can run nowhere but on `node`.
    pub fn has_exclusive_queued_job(&self, node: &Node) -> bool {
        match self
            .view
            .queued_jobs()
            .find(|job| !self.other_node_can_build(job, node))
        {
            Some(job) => {
                debug!(
                    node = node.display_name(),
                    job = job.id,
                    "queued job exclusive to node"
                );
                true
            }
            None => false,
        }
    }
}
