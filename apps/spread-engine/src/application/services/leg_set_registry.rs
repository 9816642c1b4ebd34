//! Leg-Set Registry
//!
//! Serializes runs on identical leg sets within one process. Runs in other
//! processes are not seen; the guard's working-order lookup is the only
//! protection there.

use std::collections::{BTreeSet, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::domain::option_position::CanonicalLegKey;

type LegSet = BTreeSet<CanonicalLegKey>;

/// The set stays consistent across a panic, so a poisoned lock is reused.
fn lock(active: &Mutex<HashSet<LegSet>>) -> MutexGuard<'_, HashSet<LegSet>> {
    active.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Process-wide set of leg sets currently being executed.
#[derive(Debug, Clone, Default)]
pub struct LegSetRegistry {
    active: Arc<Mutex<HashSet<LegSet>>>,
}

impl LegSetRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `legs`; `None` if another run already holds them.
    #[must_use]
    pub fn try_acquire(&self, legs: LegSet) -> Option<LegSetGuard> {
        if !lock(&self.active).insert(legs.clone()) {
            return None;
        }
        Some(LegSetGuard {
            active: Arc::clone(&self.active),
            legs,
        })
    }

    /// True if `legs` is currently claimed.
    #[must_use]
    pub fn is_active(&self, legs: &LegSet) -> bool {
        lock(&self.active).contains(legs)
    }
}

/// Releases its leg set when dropped.
#[derive(Debug)]
pub struct LegSetGuard {
    active: Arc<Mutex<HashSet<LegSet>>>,
    legs: LegSet,
}

impl Drop for LegSetGuard {
    fn drop(&mut self) {
        lock(&self.active).remove(&self.legs);
    }
}
