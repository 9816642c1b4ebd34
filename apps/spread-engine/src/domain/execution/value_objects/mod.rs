//! Execution Value Objects

mod execution_state;
mod pricing_knobs;
mod quote;
mod report;
mod trading_window;

pub use execution_state::{ExecutionMode, ExecutionState};
pub use pricing_knobs::PricingKnobs;
pub use quote::Quote;
pub use report::{ExecutionOutcome, ExecutionReport, ReasonCode};
pub use trading_window::{TradingWindow, TradingWindowError};
