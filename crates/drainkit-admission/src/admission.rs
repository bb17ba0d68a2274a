//! Admission filter — which queued jobs may still start during drain.
//!
//! Non-project tasks are never gated. A project build is admitted only
//! if at least one of its upstream builds has already finished; brand
//! new, uncaused builds are held back. Per node, a job is additionally
//! admitted only when no other node could take it instead.

use std::collections::BTreeSet;

use tracing::debug;

use drainkit_core::{ClusterView, JobId, NO_NODE_RESTRICTION, Node, QueuedJob, Task};

use crate::evaluator::DrainEvaluator;

impl<'v, V: ClusterView> DrainEvaluator<'v, V> {
    /// Whether `job` may run somewhere in the cluster.
    pub fn is_globally_permitted(&self, job: &QueuedJob) -> bool {
        match &job.task {
            Task::Plain { .. } => true,
            Task::Project { full_name } => {
                let permitted = self.resolved_upstream(job).any(|build| build.is_finished());
                if !permitted {
                    debug!(
                        job = job.id,
                        project = %full_name,
                        "held back: no finished upstream build"
                    );
                }
                permitted
            }
        }
    }

    /// Ids of every queued job permitted to run somewhere.
    pub fn globally_permitted_ids(&self) -> BTreeSet<JobId> {
        self.permitted_jobs().map(|job| job.id).collect()
    }

    /// Project names of permitted project builds. Plain tasks are omitted.
    pub fn globally_permitted_project_names(&self) -> BTreeSet<String> {
        project_names(self.permitted_jobs())
    }

    /// Ids of permitted jobs that only `node_name` should take.
    ///
    /// [`NO_NODE_RESTRICTION`] returns the global set unchanged. An unknown
    /// node gets nothing.
    pub fn permitted_ids_for_node(&self, node_name: &str) -> BTreeSet<JobId> {
        if node_name == NO_NODE_RESTRICTION {
            return self.globally_permitted_ids();
        }
        match self.view.node(node_name) {
            Some(node) => self.permitted_ids_on(node),
            None => {
                debug!(node = node_name, "unknown node; nothing permitted");
                BTreeSet::new()
            }
        }
    }

    /// Project-name form of [`permitted_ids_for_node`](Self::permitted_ids_for_node).
    pub fn permitted_project_names_for_node(&self, node_name: &str) -> BTreeSet<String> {
        if node_name == NO_NODE_RESTRICTION {
            return self.globally_permitted_project_names();
        }
        match self.view.node(node_name) {
            Some(node) => project_names(self.permitted_jobs_on(node)),
            None => BTreeSet::new(),
        }
    }

    /// Ids of permitted jobs for which no node other than `node` is a candidate.
    ///
    /// Takes a resolved node, so the built-in node can be addressed too.
    pub fn permitted_ids_on(&self, node: &Node) -> BTreeSet<JobId> {
        self.permitted_jobs_on(node).map(|job| job.id).collect()
    }

    /// Project-name form of [`permitted_ids_on`](Self::permitted_ids_on).
    pub fn permitted_project_names_on(&self, node: &Node) -> BTreeSet<String> {
        project_names(self.permitted_jobs_on(node))
    }

    /// Queued jobs permitted somewhere, in queue order. One pass over the queue.
    fn permitted_jobs(&self) -> impl Iterator<Item = &'v QueuedJob> {
        let view: &'v V = self.view;
        view.queued_jobs().filter(move |job| self.is_globally_permitted(job))
    }

    fn permitted_jobs_on(&self, node: &Node) -> impl Iterator<Item = &'v QueuedJob> {
        self.permitted_jobs().filter(move |job| !self.other_node_can_build(job, node))
    }
}

fn project_names<'a>(jobs: impl Iterator<Item = &'a QueuedJob>) -> BTreeSet<String> {
    jobs.filter_map(QueuedJob::project_name)
        .map(str::to_string)
        .collect()
}
