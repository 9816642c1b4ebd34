//! Execution Bounded Context
//!
//! State and pure pricing rules for the repricing loop. The loop itself
//! lives in the application layer because it talks to the broker; this
//! module only decides prices and records progress.

pub mod services;
pub mod value_objects;

pub use services::{fair_price, leg_mids, price_moved, round_to_tick};
pub use value_objects::{
    ExecutionMode, ExecutionOutcome, ExecutionReport, ExecutionState, PricingKnobs, Quote,
    ReasonCode, TradingWindow, TradingWindowError,
};
