//! ClusterSnapshot — an owned, point-in-time copy of cluster state.
//!
//! Hosts capture one of these from their live registries (or load one
//! from a JSON file) and hand it to the kernel through [`ClusterView`].
//! Builds are indexed by project full name and build number so upstream
//! lookups behave like the host's project/build index.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use drainkit_core::{
    BUILT_IN_DISPLAY_NAME, BuildNumber, ClusterView, Execution, JobId, Node, QueuedJob,
};

use crate::error::{StateError, StateResult};

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Point-in-time state of queue, nodes and builds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterSnapshot {
    /// The built-in controller node. Without a computer it never takes work.
    #[serde(default = "built_in_without_computer")]
    pub built_in: Node,
    /// Agent nodes in registration order.
    #[serde(default)]
    pub nodes: Vec<Node>,
    /// Project full name → build number → execution.
    #[serde(default)]
    pub projects: BTreeMap<String, BTreeMap<BuildNumber, Execution>>,
    /// Queued jobs in queue order.
    #[serde(default)]
    pub queue: Vec<QueuedJob>,
}

fn built_in_without_computer() -> Node {
    Node::new(drainkit_core::BUILT_IN_NODE_NAME)
}

impl Default for ClusterSnapshot {
    fn default() -> Self {
        Self {
            built_in: built_in_without_computer(),
            nodes: Vec::new(),
            projects: BTreeMap::new(),
            queue: Vec::new(),
        }
    }
}

impl ClusterSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the built-in node. Its name is forced to the built-in sentinel.
    pub fn with_built_in(mut self, mut node: Node) -> Self {
        node.name = drainkit_core::BUILT_IN_NODE_NAME.to_string();
        self.built_in = node;
        self
    }

    pub fn with_node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    /// Record a build in the project/build index.
    pub fn with_build(mut self, execution: Execution) -> Self {
        self.projects
            .entry(execution.project.clone())
            .or_default()
            .insert(execution.number, execution);
        self
    }

    pub fn with_job(mut self, job: QueuedJob) -> Self {
        self.queue.push(job);
        self
    }

    /// Drop a project and all of its builds, leaving queued causes dangling.
    pub fn remove_project(&mut self, full_name: &str) -> bool {
        self.projects.remove(full_name).is_some()
    }

    /// Drop a queued job, as if it left the queue.
    pub fn remove_job(&mut self, id: JobId) -> Option<QueuedJob> {
        let pos = self.queue.iter().position(|j| j.id == id)?;
        Some(self.queue.remove(pos))
    }

    /// Check structural invariants the host registries guarantee.
    pub fn validate(&self) -> StateResult<()> {
        let mut ids = HashSet::new();
        for job in &self.queue {
            if !ids.insert(job.id) {
                return Err(StateError::Invalid(format!("duplicate queue id {}", job.id)));
            }
        }

        if !self.built_in.is_built_in() {
            return Err(StateError::Invalid(format!(
                "built-in node must have an empty name, got {:?}",
                self.built_in.name
            )));
        }

        let mut names = HashSet::new();
        for node in &self.nodes {
            if node.is_built_in() {
                return Err(StateError::Invalid(
                    "agent node with empty name (reserved for the built-in node)".to_string(),
                ));
            }
            if node.name == BUILT_IN_DISPLAY_NAME {
                return Err(StateError::Invalid(format!(
                    "agent node name {BUILT_IN_DISPLAY_NAME} is reserved for the built-in node"
                )));
            }
            if !names.insert(node.name.as_str()) {
                return Err(StateError::Invalid(format!("duplicate node name {}", node.name)));
            }
        }

        for (project, builds) in &self.projects {
            for (number, build) in builds {
                if &build.project != project || build.number != *number {
                    return Err(StateError::Invalid(format!(
                        "build {}#{} indexed under {project}#{number}",
                        build.project, build.number
                    )));
                }
            }
        }

        Ok(())
    }

    /// Parse and validate a snapshot from JSON.
    pub fn from_json_str(json: &str) -> StateResult<Self> {
        let snapshot: ClusterSnapshot = serde_json::from_str(json).map_err(map_err!(Parse))?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Load and validate a snapshot file.
    pub fn from_json_file(path: &Path) -> StateResult<Self> {
        let content = std::fs::read_to_string(path).map_err(map_err!(Io))?;
        let snapshot = Self::from_json_str(&content)?;
        debug!(
            ?path,
            nodes = snapshot.nodes.len(),
            queued = snapshot.queue.len(),
            "snapshot loaded"
        );
        Ok(snapshot)
    }

    pub fn to_json_string(&self) -> StateResult<String> {
        serde_json::to_string_pretty(self).map_err(map_err!(Serialize))
    }
}

impl ClusterView for ClusterSnapshot {
    fn queued_jobs(&self) -> impl Iterator<Item = &QueuedJob> {
        self.queue.iter()
    }

    fn queued_job(&self, id: JobId) -> Option<&QueuedJob> {
        self.queue.iter().find(|j| j.id == id)
    }

    fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    fn built_in_node(&self) -> &Node {
        &self.built_in
    }

    fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.name == name)
    }

    fn build(&self, project: &str, number: BuildNumber) -> Option<&Execution> {
        self.projects.get(project)?.get(&number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drainkit_core::{Computer, JobState};
    use std::io::Write;

    fn sample() -> ClusterSnapshot {
        ClusterSnapshot::new()
            .with_node(Node::new("n1").with_computer(Computer::online()))
            .with_build(Execution::finished("upstream", 5, "n1"))
            .with_job(
                QueuedJob::project(1, "downstream", JobState::Buildable).caused_by("upstream", 5),
            )
    }

    #[test]
    fn lookups_resolve_nodes_builds_and_jobs() {
        let snap = sample();
        assert_eq!(snap.node("n1").map(|n| n.name.as_str()), Some("n1"));
        assert!(snap.node("n2").is_none());
        assert!(snap.build("upstream", 5).is_some());
        assert!(snap.build("upstream", 6).is_none());
        assert!(snap.build("missing", 5).is_none());
        assert_eq!(snap.queued_job(1).map(|j| j.id), Some(1));
        assert!(snap.queued_job(2).is_none());
    }

    #[test]
    fn empty_name_resolves_to_built_in() {
        let snap = sample();
        let node = snap.resolve_node("").unwrap();
        assert!(node.is_built_in());
        assert!(snap.node("").is_none());
    }

    #[test]
    fn all_nodes_ends_with_built_in() {
        let snap = sample();
        let names: Vec<&str> = snap.all_nodes().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["n1", ""]);
    }

    #[test]
    fn with_built_in_forces_sentinel_name() {
        let snap = ClusterSnapshot::new().with_built_in(Node::new("controller"));
        assert!(snap.built_in.is_built_in());
    }

    #[test]
    fn remove_project_leaves_dangling_cause() {
        let mut snap = sample();
        assert!(snap.remove_project("upstream"));
        assert!(snap.build("upstream", 5).is_none());
        assert_eq!(snap.queue.len(), 1);
    }

    #[test]
    fn remove_job_drops_from_queue() {
        let mut snap = sample();
        assert_eq!(snap.remove_job(1).map(|j| j.id), Some(1));
        assert!(snap.remove_job(1).is_none());
    }

    #[test]
    fn validate_rejects_duplicate_ids() {
        let snap = sample().with_job(QueuedJob::plain(1, "dup", JobState::Waiting));
        let err = snap.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate queue id 1"));
    }

    #[test]
    fn validate_rejects_duplicate_and_empty_node_names() {
        let dup = sample().with_node(Node::new("n1"));
        assert!(matches!(dup.validate(), Err(StateError::Invalid(_))));

        let empty = sample().with_node(Node::new(""));
        assert!(matches!(empty.validate(), Err(StateError::Invalid(_))));
    }

    #[test]
    fn validate_rejects_named_built_in() {
        let mut snap = sample();
        snap.built_in.name = "controller".to_string();
        assert!(matches!(snap.validate(), Err(StateError::Invalid(_))));
    }

    #[test]
    fn json_with_named_built_in_is_rejected() {
        let json = r#"{
            "built_in": { "name": "controller", "computer": { "online": true } },
            "projects": { "P": { "5": {
                "project": "P", "number": 5, "running": false, "built_on": ""
            } } },
            "queue": [ {
                "id": 1,
                "task": { "kind": "project", "full_name": "J" },
                "state": "waiting",
                "causes": [ { "type": "upstream", "project": "P", "build": 5 } ]
            } ]
        }"#;
        let err = ClusterSnapshot::from_json_str(json).unwrap_err();
        assert!(err.to_string().contains("controller"));

        let fixed = json.replace(r#""name": "controller""#, r#""name": """#);
        let snap = ClusterSnapshot::from_json_str(&fixed).unwrap();
        assert!(snap.resolve_node("").is_some_and(Node::is_built_in));
    }

    #[test]
    fn validate_rejects_agent_named_like_built_in() {
        let snap = sample().with_node(Node::new(BUILT_IN_DISPLAY_NAME));
        let err = snap.validate().unwrap_err();
        assert!(err.to_string().contains("reserved"));
    }

    #[test]
    fn validate_rejects_misindexed_build() {
        let mut snap = sample();
        snap.projects
            .entry("upstream".to_string())
            .or_default()
            .insert(9, Execution::finished("upstream", 5, "n1"));
        assert!(snap.validate().is_err());
    }

    #[test]
    fn json_roundtrip_through_file() {
        let snap = sample();
        let json = snap.to_json_string().unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let loaded = ClusterSnapshot::from_json_file(file.path()).unwrap();
        assert_eq!(loaded, snap);
    }

    #[test]
    fn minimal_json_defaults() {
        let snap = ClusterSnapshot::from_json_str("{}").unwrap();
        assert!(snap.built_in.is_built_in());
        assert!(snap.built_in.computer.is_none());
        assert!(snap.queue.is_empty());
    }

    #[test]
    fn malformed_json_is_parse_error() {
        assert!(matches!(
            ClusterSnapshot::from_json_str("{ nope"),
            Err(StateError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ClusterSnapshot::from_json_file(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, StateError::Io(_)));
    }
}
