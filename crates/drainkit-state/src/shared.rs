//! SharedCluster — the lock scope for one top-level kernel query.
//!
//! The live snapshot sits behind a `std::sync::RwLock`. A caller takes
//! the read guard once, runs every scan of its query against it, and
//! drops it. Writers install whole new snapshots; nothing mutates a
//! snapshot in place while it is being read.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

use tracing::debug;

use crate::snapshot::ClusterSnapshot;

/// Thread-safe handle to the current cluster snapshot.
#[derive(Clone, Default)]
pub struct SharedCluster {
    inner: Arc<RwLock<ClusterSnapshot>>,
}

impl SharedCluster {
    pub fn new(snapshot: ClusterSnapshot) -> Self {
        Self {
            inner: Arc::new(RwLock::new(snapshot)),
        }
    }

    /// Acquire the read scope. Hold it for exactly one top-level query.
    ///
    /// A poisoned lock still guards a whole snapshot (writers only swap),
    /// so the guard is recovered rather than propagated.
    pub fn read(&self) -> RwLockReadGuard<'_, ClusterSnapshot> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `query` against one consistent snapshot.
    pub fn evaluate<R>(&self, query: impl FnOnce(&ClusterSnapshot) -> R) -> R {
        let guard = self.read();
        query(&guard)
    }

    /// Install a fresh snapshot, returning the previous one.
    pub fn replace(&self, snapshot: ClusterSnapshot) -> ClusterSnapshot {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        debug!(
            nodes = snapshot.nodes.len(),
            queued = snapshot.queue.len(),
            "cluster snapshot replaced"
        );
        std::mem::replace(&mut *guard, snapshot)
    }
}
