//! Read-only contract between the drain kernel and the host runtime.
//!
//! A [`ClusterView`] is one consistent snapshot of the queue, the node
//! registry and the project/build index. Hosts hand the kernel a view
//! taken under a single read-lock scope per top-level query; the kernel
//! never mutates it and never re-acquires it mid-scan.

use crate::types::{BuildNumber, Execution, JobId, Node, QueuedJob, Veto};

/// Node name that resolves to the built-in controller node in node lookups.
pub const BUILT_IN_NODE_NAME: &str = "";

/// How the built-in node is shown in logs and reports. Reserved for it.
pub const BUILT_IN_DISPLAY_NAME: &str = "(built-in)";

/// Node name that means "no node restriction" to the per-node admission filter.
///
/// Same spelling as [`BUILT_IN_NODE_NAME`], different meaning; callers of the
/// per-node filter cannot address the built-in node by name.
pub const NO_NODE_RESTRICTION: &str = "";

/// Snapshot of cluster state as seen by the kernel.
pub trait ClusterView {
    /// Every job in the queue.
    fn queued_jobs(&self) -> impl Iterator<Item = &QueuedJob>;

    /// Look up a queued job by id.
    fn queued_job(&self, id: JobId) -> Option<&QueuedJob>;

    /// Registered agent nodes, excluding the built-in node.
    fn nodes(&self) -> impl Iterator<Item = &Node>;

    /// The built-in controller node.
    fn built_in_node(&self) -> &Node;

    /// Look up an agent node by name.
    fn node(&self, name: &str) -> Option<&Node>;

    /// Look up build `number` of the project with full name `project`.
    ///
    /// `None` when either the project or the build no longer exists.
    fn build(&self, project: &str, number: BuildNumber) -> Option<&Execution>;

    /// Resolve a node name, mapping [`BUILT_IN_NODE_NAME`] to the built-in node.
    fn resolve_node(&self, name: &str) -> Option<&Node> {
        if name == BUILT_IN_NODE_NAME {
            Some(self.built_in_node())
        } else {
            self.node(name)
        }
    }

    /// Agent nodes followed by the built-in node.
    fn all_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes().chain(std::iter::once(self.built_in_node()))
    }

    /// Capability check used by the kernel. Hosts with richer placement
    /// rules override this; the default defers to [`Node::can_take`].
    fn can_take(&self, node: &Node, job: &QueuedJob) -> Result<(), Veto> {
        node.can_take(job)
    }
}
