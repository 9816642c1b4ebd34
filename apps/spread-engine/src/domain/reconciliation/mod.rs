//! Reconciliation Bounded Context
//!
//! Compares the structure we want against what the broker already holds
//! (positions and working orders) and decides whether to open, reprice,
//! or stand aside.

pub mod services;
pub mod value_objects;

pub use services::{
    GuardDecision, GuardEvaluation, LegAlignment, LegState, RepriceReason, SkipReason, classify,
    evaluate, units_open,
};
pub use value_objects::{OrderStatus, PositionSnapshot, WorkingOrder};
