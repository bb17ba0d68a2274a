//! Node affinity — could some *other* online node run this job?
//!
//! Buildable jobs get an exact capability check against every other
//! online node. Jobs still in their quiet period cannot be matched yet,
//! so they are assumed portable unless a finished upstream build ran on
//! the node in question; downstream work then stays with its trigger.

use tracing::{debug, trace};

use drainkit_core::config::UnresolvedState;
use drainkit_core::{ClusterView, Computer, JobState, Node, QueuedJob};

use crate::evaluator::DrainEvaluator;

impl<'v, V: ClusterView> DrainEvaluator<'v, V> {
    /// Whether an online node other than `excluded` can take `job`.
    ///
    /// `excluded` is never itself a candidate, however capable it is.
    pub fn other_node_can_build(&self, job: &QueuedJob, excluded: &Node) -> bool {
        match job.state {
            JobState::Buildable | JobState::Pending => {
                self.other_online_node_can_take(job, excluded)
            }
            JobState::Waiting => !self.is_affine_to(job, excluded),
            JobState::Blocked => {
                let other = self.policy.unresolved_state == UnresolvedState::OtherCapable;
                trace!(
                    job = job.id,
                    state = ?job.state,
                    other,
                    "affinity undetermined; applying policy default"
                );
                other
            }
        }
    }

    fn other_online_node_can_take(&self, job: &QueuedJob, excluded: &Node) -> bool {
        for node in self.view.all_nodes() {
            if node.name == excluded.name {
                continue;
            }
            if !node.to_computer().is_some_and(Computer::is_online) {
                continue;
            }
            match self.view.can_take(node, job) {
                Ok(()) => {
                    debug!(
                        job = job.id,
                        excluded = excluded.display_name(),
                        candidate = node.display_name(),
                        "another node can take job"
                    );
                    return true;
                }
                Err(veto) => trace!(job = job.id, %veto, "candidate vetoed"),
            }
        }
        false
    }

    /// A waiting job is affine to `node` if one of its finished upstream builds ran there.
    fn is_affine_to(&self, job: &QueuedJob, node: &Node) -> bool {
        let upstream = self
            .resolved_upstream(job)
            .find(|build| build.is_finished() && build.built_on == node.name);

        match upstream {
            Some(build) => {
                debug!(
                    job = job.id,
                    node = node.display_name(),
                    upstream = %build.project,
                    number = build.number,
                    "waiting job affine to node of its trigger"
                );
                true
            }
            None => false,
        }
    }
}
