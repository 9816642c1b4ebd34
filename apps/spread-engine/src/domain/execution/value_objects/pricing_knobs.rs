//! Pricing Knobs

use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Tunables for the repricing loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingKnobs {
    /// Price increment accepted by the exchange.
    pub tick: Decimal,
    /// Concession from mid (subtracted from credits, added to debits).
    pub edge: Decimal,
    /// Lowest net price ever submitted.
    pub min_price: Decimal,
    /// Highest net price ever submitted, if bounded.
    pub max_price: Option<Decimal>,
    /// Price used when any leg lacks a two-sided quote.
    pub fallback_price: Option<Decimal>,
    /// Poll cycles before giving up.
    pub max_cycles: u32,
    /// Sleep between cycles.
    pub poll_interval: Duration,
    /// Wall-clock budget for the whole loop.
    pub time_budget: Duration,
    /// Consecutive failed cycles tolerated before aborting.
    pub max_consecutive_failures: u32,
}

impl Default for PricingKnobs {
    fn default() -> Self {
        Self {
            tick: dec!(0.05),
            edge: dec!(0.05),
            min_price: dec!(0.05),
            max_price: None,
            fallback_price: None,
            max_cycles: 24,
            poll_interval: Duration::from_secs(10),
            time_budget: Duration::from_secs(240),
            max_consecutive_failures: 5,
        }
    }
}

impl PricingKnobs {
    /// Set the tick size.
    #[must_use]
    pub const fn with_tick(mut self, tick: Decimal) -> Self {
        self.tick = tick;
        self
    }

    /// Set the edge from mid.
    #[must_use]
    pub const fn with_edge(mut self, edge: Decimal) -> Self {
        self.edge = edge;
        self
    }

    /// Set the price bounds.
    #[must_use]
    pub const fn with_bounds(mut self, min_price: Decimal, max_price: Option<Decimal>) -> Self {
        self.min_price = min_price;
        self.max_price = max_price;
        self
    }

    /// Set the fallback price.
    #[must_use]
    pub const fn with_fallback_price(mut self, price: Decimal) -> Self {
        self.fallback_price = Some(price);
        self
    }

    /// Set cycle limit, poll interval, and time budget.
    #[must_use]
    pub const fn with_schedule(
        mut self,
        max_cycles: u32,
        poll_interval: Duration,
        time_budget: Duration,
    ) -> Self {
        self.max_cycles = max_cycles;
        self.poll_interval = poll_interval;
        self.time_budget = time_budget;
        self
    }
}
