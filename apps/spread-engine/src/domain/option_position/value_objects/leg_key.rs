//! Canonical Leg Key

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{OptionRight, Strike};

/// Identity of one tradable contract within an expiry cycle.
///
/// The root is deliberately excluded: brokers report the same contract
/// under several root spellings, but expiry, right, and strike never vary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CanonicalLegKey {
    /// Expiration date.
    pub expiration: NaiveDate,
    /// Call or put.
    pub right: OptionRight,
    /// Strike in thousandths.
    pub strike: Strike,
}

impl CanonicalLegKey {
    /// Create a new key.
    #[must_use]
    pub const fn new(expiration: NaiveDate, right: OptionRight, strike: Strike) -> Self {
        Self {
            expiration,
            right,
            strike,
        }
    }

    /// Expiry as `YYMMDD`.
    #[must_use]
    pub fn expiry_code(&self) -> String {
        self.expiration.format("%y%m%d").to_string()
    }
}

impl fmt::Display for CanonicalLegKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{:08}",
            self.expiry_code(),
            self.right.code(),
            self.strike.mills()
        )
    }
}
