//! Execution Report

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ExecutionState;
use crate::domain::shared::BrokerId;

/// Terminal outcome of the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionOutcome {
    /// Remainder reached zero.
    Success,
    /// Budget or cycle limit hit.
    Timeout,
    /// Unrecoverable error or unsafe book.
    Abort,
}

/// Machine-readable reason attached to every outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    /// Target quantity is fully held.
    Filled,
    /// Wall-clock budget exhausted.
    DeadlineExceeded,
    /// Cycle limit exhausted.
    MaxCycles,
    /// Positions moved against the structure mid-run.
    WouldClose,
    /// The broker rejected a request in a way retries cannot fix.
    PermanentBrokerError,
    /// Too many consecutive transient failures.
    TransientRetriesExhausted,
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = match self {
            Self::Filled => "FILLED",
            Self::DeadlineExceeded => "DEADLINE_EXCEEDED",
            Self::MaxCycles => "MAX_CYCLES",
            Self::WouldClose => "WOULD_CLOSE",
            Self::PermanentBrokerError => "PERMANENT_BROKER_ERROR",
            Self::TransientRetriesExhausted => "TRANSIENT_RETRIES_EXHAUSTED",
        };
        f.write_str(code)
    }
}

/// Result of one execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// Success, timeout, or abort.
    pub outcome: ExecutionOutcome,
    /// Why.
    pub reason: ReasonCode,
    /// Units still unopened.
    pub remainder: u32,
    /// Units filled during this loop.
    pub filled_qty: u32,
    /// Last net price submitted.
    pub last_price: Option<Decimal>,
    /// Last order id placed or replaced.
    pub last_order_id: Option<BrokerId>,
    /// Cycles used.
    pub cycles: u32,
    /// Free-form detail (error text for aborts).
    pub detail: Option<String>,
    /// Loop start.
    pub started_at: DateTime<Utc>,
    /// Loop end.
    pub finished_at: DateTime<Utc>,
}

impl ExecutionReport {
    /// Close out `state` with an outcome.
    #[must_use]
    pub fn from_state(
        state: &ExecutionState,
        outcome: ExecutionOutcome,
        reason: ReasonCode,
        detail: Option<String>,
    ) -> Self {
        Self {
            outcome,
            reason,
            remainder: state.remainder,
            filled_qty: state.filled_qty(),
            last_price: state.last_submitted_price,
            last_order_id: state.last_order_id.clone(),
            cycles: state.cycle_count,
            detail,
            started_at: state.started_at,
            finished_at: Utc::now(),
        }
    }

    /// True for [`ExecutionOutcome::Success`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcome == ExecutionOutcome::Success
    }
}
