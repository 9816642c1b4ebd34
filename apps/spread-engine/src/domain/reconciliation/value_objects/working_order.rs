//! Working Order

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::OrderStatus;
use crate::domain::option_position::CanonicalLegKey;
use crate::domain::shared::BrokerId;

/// A broker order reduced to its identity and leg set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingOrder {
    /// Broker order id.
    pub id: BrokerId,
    /// Every leg's canonical key.
    pub keys: BTreeSet<CanonicalLegKey>,
    /// Broker status.
    pub status: OrderStatus,
}

impl WorkingOrder {
    /// True when this order trades exactly `target` (no more, no fewer legs).
    #[must_use]
    pub fn matches(&self, target: &BTreeSet<CanonicalLegKey>) -> bool {
        self.status.is_working() && &self.keys == target
    }
}
