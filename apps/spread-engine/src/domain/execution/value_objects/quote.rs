//! Quote Value Object

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Top-of-book bid and ask for one contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Best bid.
    pub bid: Decimal,
    /// Best ask.
    pub ask: Decimal,
}

impl Quote {
    /// Create a new quote.
    #[must_use]
    pub const fn new(bid: Decimal, ask: Decimal) -> Self {
        Self { bid, ask }
    }

    /// Midpoint of an uncrossed market with a live offer.
    ///
    /// A zero bid is a real quote (far wings routinely show 0.00 x 0.05);
    /// a missing or zero ask is not.
    #[must_use]
    pub fn mid(&self) -> Option<Decimal> {
        if self.bid >= Decimal::ZERO && self.ask > Decimal::ZERO && self.ask >= self.bid {
            Some((self.bid + self.ask) / Decimal::TWO)
        } else {
            None
        }
    }
}
