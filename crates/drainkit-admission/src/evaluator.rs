//! The evaluator handle every query hangs off.

use drainkit_core::ClusterView;
use drainkit_core::config::{PolicyConfig, UnresolvedState};

/// Tunable parts of the drain decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainPolicy {
    /// Affinity answer for jobs that are neither buildable nor waiting.
    pub unresolved_state: UnresolvedState,
}

impl DrainPolicy {
    pub fn from_config(config: &PolicyConfig) -> Self {
        Self {
            unresolved_state: config.unresolved_state,
        }
    }
}

/// Answers drain queries against one borrowed snapshot.
///
/// Construct one per lock scope: the borrow of `view` *is* the scope, so
/// every scan a query performs sees the same queue and node registry.
pub struct DrainEvaluator<'v, V> {
    pub(crate) view: &'v V,
    pub(crate) policy: DrainPolicy,
}

impl<'v, V: ClusterView> DrainEvaluator<'v, V> {
    /// Evaluate `view` with the default policy.
    pub fn new(view: &'v V) -> Self {
        Self {
            view,
            policy: DrainPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: DrainPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> DrainPolicy {
        self.policy
    }
}
