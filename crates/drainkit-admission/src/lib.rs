//! drainkit admission kernel — who may still run while the cluster drains.
//!
//! During a lenient shutdown new, unrelated work is held back, but jobs
//! chained to an already-finished build are still admitted, and a node
//! is only retired once no queued job depends on it exclusively. This
//! crate makes those decisions against one [`ClusterView`] snapshot. It
//! does not execute, enqueue, or take nodes offline.
//!
//! # Components
//!
//! - **`upstream`** — resolves the builds that triggered a queued job
//! - **`affinity`** — can any *other* online node run a job?
//! - **`admission`** — jobs permitted cluster-wide and per node
//! - **`running`** — projects with a build in progress
//! - **`exclusivity`** — does retiring a node strand a queued job?
//! - **`report`** — per-node and cluster drain summaries
//!
//! Every query is a pure function of the view it was handed: results are
//! returned as owned, ordered sets and nothing is cached between calls.
//!
//! [`ClusterView`]: drainkit_core::ClusterView

pub mod admission;
pub mod affinity;
pub mod evaluator;
pub mod exclusivity;
pub mod report;
pub mod running;
pub mod upstream;

pub use evaluator::{DrainEvaluator, DrainPolicy};
pub use exclusivity::is_busy;
pub use report::{ClusterDrainReport, NodeDrainReport, format_cluster_report, format_node_report};
pub use upstream::upstream_project_names;
