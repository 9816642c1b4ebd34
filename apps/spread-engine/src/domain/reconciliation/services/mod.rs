//! Reconciliation Domain Services

mod guard;

pub use guard::{
    GuardDecision, GuardEvaluation, LegAlignment, LegState, RepriceReason, SkipReason, classify,
    evaluate, units_open,
};
