//! Upstream lineage of queued jobs.
//!
//! A job's upstream causes name a project and a build number. Either may
//! have been deleted since the job was enqueued; such causes simply
//! contribute nothing.

use std::collections::BTreeSet;

use tracing::trace;

use drainkit_core::{ClusterView, Execution, QueuedJob};

use crate::evaluator::DrainEvaluator;

/// Names of every upstream project recorded on `job`, resolved or not.
pub fn upstream_project_names(job: &QueuedJob) -> BTreeSet<String> {
    job.upstream_causes()
        .map(|(project, _)| project.to_string())
        .collect()
}

impl<'v, V: ClusterView> DrainEvaluator<'v, V> {
    /// The builds that triggered `job`. Dangling causes are skipped.
    pub fn upstream_builds(&self, job: &QueuedJob) -> BTreeSet<&'v Execution> {
        self.resolved_upstream(job).collect()
    }

    /// Lazily resolve upstream causes in enqueue order, for short-circuiting scans.
    pub(crate) fn resolved_upstream(
        &self,
        job: &QueuedJob,
    ) -> impl Iterator<Item = &'v Execution> {
        let view = self.view;
        job.upstream_causes().filter_map(move |(project, number)| {
            let build = view.build(project, number);
            if build.is_none() {
                trace!(job = job.id, project, number, "upstream build no longer resolves");
            }
            build
        })
    }
}
