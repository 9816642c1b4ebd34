//! Repricing loop settings.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::execution::{PricingKnobs, TradingWindow, TradingWindowError};

/// Execution configuration, in config units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Price increment.
    #[serde(default = "default_tick")]
    pub tick: Decimal,
    /// Concession from mid.
    #[serde(default = "default_tick")]
    pub edge: Decimal,
    /// Lowest submitted net price.
    #[serde(default = "default_tick")]
    pub min_price: Decimal,
    /// Highest submitted net price.
    #[serde(default)]
    pub max_price: Option<Decimal>,
    /// Net price used when quotes are missing.
    #[serde(default)]
    pub fallback_price: Option<Decimal>,
    /// Cycle limit.
    #[serde(default = "default_max_cycles")]
    pub max_cycles: u32,
    /// Seconds between cycles.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Seconds before the loop gives up.
    #[serde(default = "default_time_budget_secs")]
    pub time_budget_secs: u64,
    /// Consecutive failed cycles tolerated.
    #[serde(default = "default_max_consecutive_failures")]
    pub max_consecutive_failures: u32,
    /// How far back working orders are listed, in hours.
    #[serde(default = "default_order_lookback_hours")]
    pub order_lookback_hours: u64,
    /// Local-time window outside which runs are skipped; unset trades any time.
    #[serde(default)]
    pub trading_window: Option<TradingWindowConfig>,
}

/// Scheduled trading window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingWindowConfig {
    /// Opening bound, `HH:MM` or `HH:MM:SS`.
    #[serde(default = "default_window_start")]
    pub start: String,
    /// Closing bound, inclusive.
    #[serde(default = "default_window_end")]
    pub end: String,
    /// IANA timezone the bounds are read in.
    #[serde(default = "default_window_timezone")]
    pub timezone: String,
    /// Skip Saturdays and Sundays.
    #[serde(default = "default_weekdays_only")]
    pub weekdays_only: bool,
}

impl Default for TradingWindowConfig {
    fn default() -> Self {
        Self {
            start: default_window_start(),
            end: default_window_end(),
            timezone: default_window_timezone(),
            weekdays_only: default_weekdays_only(),
        }
    }
}

impl TradingWindowConfig {
    /// Parse into a window.
    pub fn to_window(&self) -> Result<TradingWindow, TradingWindowError> {
        TradingWindow::parse(&self.start, &self.end, &self.timezone, self.weekdays_only)
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            tick: default_tick(),
            edge: default_tick(),
            min_price: default_tick(),
            max_price: None,
            fallback_price: None,
            max_cycles: default_max_cycles(),
            poll_interval_secs: default_poll_interval_secs(),
            time_budget_secs: default_time_budget_secs(),
            max_consecutive_failures: default_max_consecutive_failures(),
            order_lookback_hours: default_order_lookback_hours(),
            trading_window: None,
        }
    }
}

impl ExecutionConfig {
    /// Loop knobs.
    #[must_use]
    pub fn knobs(&self) -> PricingKnobs {
        let mut knobs = PricingKnobs::default()
            .with_tick(self.tick)
            .with_edge(self.edge)
            .with_bounds(self.min_price, self.max_price)
            .with_schedule(
                self.max_cycles,
                Duration::from_secs(self.poll_interval_secs),
                Duration::from_secs(self.time_budget_secs),
            );
        if let Some(price) = self.fallback_price {
            knobs = knobs.with_fallback_price(price);
        }
        knobs.max_consecutive_failures = self.max_consecutive_failures;
        knobs
    }

    /// Parsed trading window, if one is configured.
    pub fn trading_window(&self) -> Result<Option<TradingWindow>, TradingWindowError> {
        self.trading_window
            .as_ref()
            .map(TradingWindowConfig::to_window)
            .transpose()
    }

    /// Working-order lookback window.
    #[must_use]
    pub const fn order_lookback(&self) -> Duration {
        Duration::from_secs(self.order_lookback_hours * 3600)
    }
}

fn default_tick() -> Decimal {
    Decimal::new(5, 2)
}

const fn default_max_cycles() -> u32 {
    24
}

const fn default_poll_interval_secs() -> u64 {
    10
}

const fn default_time_budget_secs() -> u64 {
    240
}

const fn default_max_consecutive_failures() -> u32 {
    5
}

const fn default_order_lookback_hours() -> u64 {
    24
}

fn default_window_start() -> String {
    "16:08".to_string()
}

fn default_window_end() -> String {
    "16:14".to_string()
}

fn default_window_timezone() -> String {
    "America/New_York".to_string()
}

const fn default_weekdays_only() -> bool {
    true
}
