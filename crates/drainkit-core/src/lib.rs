//! drainkit-core — shared vocabulary for the drain admission kernel.
//!
//! Holds the snapshot data model (nodes, executors, executions, queued
//! jobs), the [`ClusterView`] contract the kernel reads through, and the
//! `drainkit.toml` configuration.

pub mod config;
pub mod types;
pub mod view;

pub use config::{DrainConfig, OutputFormat, UnresolvedState};
pub use types::*;
pub use view::{BUILT_IN_DISPLAY_NAME, BUILT_IN_NODE_NAME, ClusterView, NO_NODE_RESTRICTION};
