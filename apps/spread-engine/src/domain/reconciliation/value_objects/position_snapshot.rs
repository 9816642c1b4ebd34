//! Position Snapshot

use std::collections::HashMap;

use rust_decimal::Decimal;
use crate::domain::option_position::CanonicalLegKey;

/// Point-in-time signed quantities per contract (positive long, negative short).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionSnapshot {
    quantities: HashMap<CanonicalLegKey, Decimal>,
}

impl PositionSnapshot {
    /// Empty snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `qty` to the entry for `key`, dropping it if the sum nets to zero.
    pub fn accumulate(&mut self, key: CanonicalLegKey, qty: Decimal) {
        let entry = self.quantities.entry(key).or_insert(Decimal::ZERO);
        *entry += qty;
        if entry.is_zero() {
            self.quantities.remove(&key);
        }
    }

    /// Signed quantity held for `key` (zero when absent).
    #[must_use]
    pub fn quantity(&self, key: &CanonicalLegKey) -> Decimal {
        self.quantities.get(key).copied().unwrap_or(Decimal::ZERO)
    }

    /// Number of contracts with a nonzero position.
    #[must_use]
    pub fn len(&self) -> usize {
        self.quantities.len()
    }

    /// True when no positions are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.quantities.is_empty()
    }
}

impl FromIterator<(CanonicalLegKey, Decimal)> for PositionSnapshot {
    fn from_iter<I: IntoIterator<Item = (CanonicalLegKey, Decimal)>>(iter: I) -> Self {
        let mut snapshot = Self::new();
        for (key, qty) in iter {
            snapshot.accumulate(key, qty);
        }
        snapshot
    }
}
