//! Drain reports — everything a drain controller polls, in one pass.

use std::collections::BTreeSet;

use serde::Serialize;

use drainkit_core::{ClusterView, Computer, JobId, Node};

use crate::evaluator::DrainEvaluator;
use crate::exclusivity::is_busy;
use crate::running::running_projects_of;

/// Drain state of a single node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeDrainReport {
    pub node: String,
    pub online: bool,
    pub busy: bool,
    /// Some queued job can run nowhere else.
    pub has_exclusive_job: bool,
    /// Permitted jobs only this node should take.
    pub permitted_ids: BTreeSet<JobId>,
    pub permitted_projects: BTreeSet<String>,
    pub running_projects: BTreeSet<String>,
}

impl NodeDrainReport {
    /// Nothing running here and nothing queued that needs this node.
    pub fn can_retire(&self) -> bool {
        !self.busy && !self.has_exclusive_job
    }
}

/// Drain state of the whole cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterDrainReport {
    pub permitted_ids: BTreeSet<JobId>,
    pub permitted_projects: BTreeSet<String>,
    pub running_projects: BTreeSet<String>,
    /// Agent nodes in registry order, then the built-in node.
    pub nodes: Vec<NodeDrainReport>,
}

impl ClusterDrainReport {
    /// No build running and no queued job still admitted.
    pub fn is_drained(&self) -> bool {
        self.running_projects.is_empty() && self.permitted_ids.is_empty()
    }
}

impl<'v, V: ClusterView> DrainEvaluator<'v, V> {
    /// Report for the node named `node_name` (empty name: the built-in node).
    pub fn node_report(&self, node_name: &str) -> Option<NodeDrainReport> {
        self.view
            .resolve_node(node_name)
            .map(|node| self.report_for(node))
    }

    pub fn cluster_report(&self) -> ClusterDrainReport {
        let permitted_ids = self.globally_permitted_ids();
        ClusterDrainReport {
            permitted_projects: self.globally_permitted_project_names(),
            permitted_ids,
            running_projects: self.running_project_names(),
            nodes: self.view.all_nodes().map(|node| self.report_for(node)).collect(),
        }
    }

    fn report_for(&self, node: &Node) -> NodeDrainReport {
        let computer = node.to_computer();
        let permitted_ids = self.permitted_ids_on(node);
        let permitted_projects = self.permitted_project_names_on(node);

        NodeDrainReport {
            node: node.display_name().to_string(),
            online: computer.is_some_and(Computer::is_online),
            busy: computer.is_some_and(is_busy),
            has_exclusive_job: self.has_exclusive_queued_job(node),
            permitted_ids,
            permitted_projects,
            running_projects: running_projects_of(node).map(str::to_string).collect(),
        }
    }
}

/// Human-readable rendering of a node report.
pub fn format_node_report(report: &NodeDrainReport) -> String {
    let mut out = String::new();
    let state = match (report.online, report.busy) {
        (false, _) => "offline",
        (true, true) => "busy",
        (true, false) => "idle",
    };
    out.push_str(&format!("Node {} ({state})\n", report.node));
    out.push_str(&format!("  exclusive job queued: {}\n", yes_no(report.has_exclusive_job)));
    out.push_str(&format!("  can retire:           {}\n", yes_no(report.can_retire())));
    out.push_str(&format!("  permitted ids:        {}\n", join(&report.permitted_ids)));
    out.push_str(&format!("  permitted projects:   {}\n", join(&report.permitted_projects)));
    out.push_str(&format!("  running projects:     {}\n", join(&report.running_projects)));
    out
}

/// Human-readable rendering of a cluster report.
pub fn format_cluster_report(report: &ClusterDrainReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("Drained: {}\n", yes_no(report.is_drained())));
    out.push_str(&format!("Permitted ids:      {}\n", join(&report.permitted_ids)));
    out.push_str(&format!("Permitted projects: {}\n", join(&report.permitted_projects)));
    out.push_str(&format!("Running projects:   {}\n\n", join(&report.running_projects)));
    for node in &report.nodes {
        out.push_str(&format_node_report(node));
    }
    out
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}

fn join<T: ToString>(items: &BTreeSet<T>) -> String {
    if items.is_empty() {
        return "-".to_string();
    }
    items.iter().map(T::to_string).collect::<Vec<_>>().join(", ")
}
