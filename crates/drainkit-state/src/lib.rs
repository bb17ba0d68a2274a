//! drainkit-state — cluster snapshots for the drain kernel.
//!
//! Provides [`ClusterSnapshot`], an owned, serializable implementation of
//! [`drainkit_core::ClusterView`], and [`SharedCluster`], the read-lock
//! scope hosts take once per top-level query.
//!
//! # Architecture
//!
//! ```text
//! SharedCluster (Arc<RwLock<..>>)
//!   └── ClusterSnapshot
//!       ├── built-in node + agent nodes (by name)
//!       ├── projects → builds (by number)
//!       └── queue (enqueue order)
//! ```

pub mod error;
pub mod shared;
pub mod snapshot;

pub use error::{StateError, StateResult};
pub use shared::SharedCluster;
pub use snapshot::ClusterSnapshot;
