//! Domain types for a cluster snapshot.
//!
//! These mirror the host runtime's view of nodes, executors, running and
//! finished executions, and the pending-job queue at a single instant.
//! The kernel only ever reads them. All types are serializable so a
//! snapshot can be captured to (and replayed from) a JSON file.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of a queued job, unique within one queue snapshot.
pub type JobId = u64;

/// Build number within a project.
pub type BuildNumber = u64;

// ── Nodes ─────────────────────────────────────────────────────────

/// How a node treats jobs that do not name it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeMode {
    /// Take any job whose label requirements it satisfies.
    #[default]
    Normal,
    /// Only take jobs that carry a label expression matching this node.
    Exclusive,
}

/// A worker node registered with the cluster.
///
/// The built-in controller node has an empty name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    #[serde(default)]
    pub labels: BTreeSet<String>,
    #[serde(default)]
    pub mode: NodeMode,
    #[serde(default = "default_true")]
    pub accepting_tasks: bool,
    /// Live connection to the node; `None` when it was never brought up.
    #[serde(default)]
    pub computer: Option<Computer>,
}

fn default_true() -> bool {
    true
}

impl Node {
    /// Create a normal-mode node that accepts tasks and has no computer yet.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            labels: BTreeSet::new(),
            mode: NodeMode::Normal,
            accepting_tasks: true,
            computer: None,
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.labels.insert(label.to_string());
        self
    }

    pub fn with_mode(mut self, mode: NodeMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_computer(mut self, computer: Computer) -> Self {
        self.computer = Some(computer);
        self
    }

    pub fn to_computer(&self) -> Option<&Computer> {
        self.computer.as_ref()
    }

    pub fn is_built_in(&self) -> bool {
        self.name.is_empty()
    }

    /// Name used in logs and reports; the built-in node has no name of its own.
    pub fn display_name(&self) -> &str {
        if self.is_built_in() {
            crate::view::BUILT_IN_DISPLAY_NAME
        } else {
            &self.name
        }
    }

    /// Whether the node carries `label`. A node's own name is an implicit label.
    pub fn has_label(&self, label: &str) -> bool {
        (!self.name.is_empty() && self.name == label) || self.labels.contains(label)
    }

    /// Capability check: can this node take `job` right now?
    pub fn can_take(&self, job: &QueuedJob) -> Result<(), Veto> {
        if !self.accepting_tasks {
            return Err(Veto::NotAcceptingTasks {
                node: self.display_name().to_string(),
            });
        }

        if job.required_labels.is_empty() {
            if self.mode == NodeMode::Exclusive {
                return Err(Veto::ExclusiveNode {
                    node: self.display_name().to_string(),
                });
            }
            return Ok(());
        }

        match job.required_labels.iter().find(|l| !self.has_label(l)) {
            Some(label) => Err(Veto::MissingLabel {
                node: self.display_name().to_string(),
                label: label.clone(),
            }),
            None => Ok(()),
        }
    }
}

/// Reason a node refuses a job.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Veto {
    #[error("node {node} is not accepting tasks")]
    NotAcceptingTasks { node: String },

    #[error("node {node} does not carry label {label}")]
    MissingLabel { node: String, label: String },

    #[error("node {node} only takes jobs tied to it")]
    ExclusiveNode { node: String },
}

// ── Computers & executors ─────────────────────────────────────────

/// The runtime side of a node: connectivity and execution slots.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Computer {
    pub online: bool,
    #[serde(default)]
    pub executors: Vec<Executor>,
    /// Transient slots for lightweight tasks, outside the fixed executor count.
    #[serde(default)]
    pub one_off_executors: Vec<Executor>,
}

impl Computer {
    pub fn online() -> Self {
        Self {
            online: true,
            ..Self::default()
        }
    }

    pub fn offline() -> Self {
        Self::default()
    }

    pub fn with_executor(mut self, executor: Executor) -> Self {
        self.executors.push(executor);
        self
    }

    pub fn with_one_off_executor(mut self, executor: Executor) -> Self {
        self.one_off_executors.push(executor);
        self
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    /// Fixed executors followed by one-off executors.
    pub fn all_executors(&self) -> impl Iterator<Item = &Executor> {
        self.executors.iter().chain(self.one_off_executors.iter())
    }
}

/// A single execution slot.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Executor {
    pub busy: bool,
    /// What the slot is running. A busy slot may not have one yet while it starts up.
    #[serde(default)]
    pub current: Option<Executable>,
}

impl Executor {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn running(executable: Executable) -> Self {
        Self {
            busy: true,
            current: Some(executable),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }
}

/// Work occupying an executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Executable {
    /// A build of a project.
    Build(Execution),
    /// Anything else: maintenance tasks, flyweight steps.
    Task { name: String },
}

// ── Executions ────────────────────────────────────────────────────

/// A running or finished build of a project.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Execution {
    /// Full name of the owning project.
    pub project: String,
    pub number: BuildNumber,
    pub running: bool,
    /// Name of the node the build ran on (empty for the built-in node).
    #[serde(default)]
    pub built_on: String,
}

impl Execution {
    pub fn running(project: &str, number: BuildNumber, built_on: &str) -> Self {
        Self {
            project: project.to_string(),
            number,
            running: true,
            built_on: built_on.to_string(),
        }
    }

    pub fn finished(project: &str, number: BuildNumber, built_on: &str) -> Self {
        Self {
            running: false,
            ..Self::running(project, number, built_on)
        }
    }

    pub fn is_finished(&self) -> bool {
        !self.running
    }
}

// ── Queue ─────────────────────────────────────────────────────────

/// What a queued job will run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Task {
    /// A build of a project; the only kind gated by drain.
    Project { full_name: String },
    /// Any other task.
    Plain { name: String },
}

impl Task {
    pub fn project_name(&self) -> Option<&str> {
        match self {
            Task::Project { full_name } => Some(full_name),
            Task::Plain { .. } => None,
        }
    }
}

/// Where a job currently sits in the queue lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Inside its quiet period; assignment constraints may still change.
    Waiting,
    /// Held for a reason outside drain (e.g. concurrent build limit).
    Blocked,
    /// Constraints resolved; ready to be assigned an executor.
    Buildable,
    /// Buildable and already handed to an executor that has not started it.
    Pending,
}

/// Recorded reason a job was enqueued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Cause {
    User { user_id: String },
    Timer,
    Remote { note: String },
    /// Triggered by build `build` of project `project`.
    Upstream { project: String, build: BuildNumber },
}

/// A job waiting in the cluster-wide queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedJob {
    pub id: JobId,
    pub task: Task,
    pub state: JobState,
    #[serde(default)]
    pub causes: Vec<Cause>,
    /// Labels a node must carry to take this job.
    #[serde(default)]
    pub required_labels: BTreeSet<String>,
}

impl QueuedJob {
    pub fn project(id: JobId, full_name: &str, state: JobState) -> Self {
        Self {
            id,
            task: Task::Project {
                full_name: full_name.to_string(),
            },
            state,
            causes: Vec::new(),
            required_labels: BTreeSet::new(),
        }
    }

    pub fn plain(id: JobId, name: &str, state: JobState) -> Self {
        Self {
            task: Task::Plain {
                name: name.to_string(),
            },
            ..Self::project(id, "", state)
        }
    }

    pub fn with_cause(mut self, cause: Cause) -> Self {
        self.causes.push(cause);
        self
    }

    pub fn caused_by(self, project: &str, build: BuildNumber) -> Self {
        self.with_cause(Cause::Upstream {
            project: project.to_string(),
            build,
        })
    }

    pub fn with_required_label(mut self, label: &str) -> Self {
        self.required_labels.insert(label.to_string());
        self
    }

    pub fn project_name(&self) -> Option<&str> {
        self.task.project_name()
    }

    /// `(project, build)` of every upstream cause, in enqueue order.
    pub fn upstream_causes(&self) -> impl Iterator<Item = (&str, BuildNumber)> {
        self.causes.iter().filter_map(|c| match c {
            Cause::Upstream { project, build } => Some((project.as_str(), *build)),
            _ => None,
        })
    }
}
