//! Trading Signal
//!
//! The externally supplied decision: which expiry, which inner strikes,
//! and two category scores that pick credit or debit.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::option_position::{SpreadSide, Strike};

/// Forces the structure side regardless of the signal's scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SideOverride {
    /// Follow the signal.
    #[default]
    Auto,
    /// Always credit.
    Credit,
    /// Always debit.
    Debit,
}

/// One trading signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeSignal {
    /// Date the signal was issued.
    pub signal_date: Option<NaiveDate>,
    /// Expiration to trade.
    pub expiration: NaiveDate,
    /// Put-side inner strike.
    pub inner_put: Strike,
    /// Call-side inner strike.
    pub inner_call: Strike,
    /// First category score.
    pub cat1: Option<Decimal>,
    /// Second category score.
    pub cat2: Option<Decimal>,
}

impl TradeSignal {
    /// Side implied by the scores: credit unless `cat2 < cat1`.
    #[must_use]
    pub fn implied_side(&self) -> SpreadSide {
        match (self.cat1, self.cat2) {
            (Some(cat1), Some(cat2)) if cat2 < cat1 => SpreadSide::Debit,
            _ => SpreadSide::Credit,
        }
    }

    /// Side after applying `side_override`.
    #[must_use]
    pub fn side(&self, side_override: SideOverride) -> SpreadSide {
        match side_override {
            SideOverride::Auto => self.implied_side(),
            SideOverride::Credit => SpreadSide::Credit,
            SideOverride::Debit => SpreadSide::Debit,
        }
    }
}
