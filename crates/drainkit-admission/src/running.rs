//! Projects with a build currently occupying an executor.

use std::collections::BTreeSet;

use drainkit_core::{ClusterView, Executable, Node};

use crate::evaluator::DrainEvaluator;

impl<'v, V: ClusterView> DrainEvaluator<'v, V> {
    /// Running project names across every node, built-in included.
    pub fn running_project_names(&self) -> BTreeSet<String> {
        self.view
            .all_nodes()
            .flat_map(|node| running_projects_of(node))
            .map(str::to_string)
            .collect()
    }

    /// Running project names on one node. An empty name means the built-in
    /// node; an unknown name yields an empty set.
    pub fn running_project_names_on(&self, node_name: &str) -> BTreeSet<String> {
        self.view
            .resolve_node(node_name)
            .into_iter()
            .flat_map(|node| running_projects_of(node))
            .map(str::to_string)
            .collect()
    }
}

/// Project names of builds on the node's fixed and one-off executors.
pub(crate) fn running_projects_of(node: &Node) -> impl Iterator<Item = &str> {
    node.to_computer()
        .into_iter()
        .flat_map(|computer| computer.all_executors())
        .filter_map(|executor| match &executor.current {
            Some(Executable::Build(build)) => Some(build.project.as_str()),
            Some(Executable::Task { .. }) | None => None,
        })
}
