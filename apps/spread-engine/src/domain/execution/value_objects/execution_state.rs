//! Execution State

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::option_position::Structure;
use crate::domain::shared::BrokerId;

/// Whether the loop started from scratch or inherited an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionMode {
    /// No prior order or fill for this structure.
    New,
    /// A working order or partial fill already exists.
    Reprice,
}

/// Mutable progress of one execution. Created per trading decision and
/// dropped on the terminal outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionState {
    /// Units the run is trying to hold in total.
    pub target_qty: u32,
    /// Desired structure (quantity on the legs is ignored).
    pub structure: Structure,
    /// New or reprice.
    pub mode: ExecutionMode,
    /// Remainder when the loop began.
    pub initial_remainder: u32,
    /// Most recent remainder observed.
    pub remainder: u32,
    /// Most recent order id placed or replaced by this run.
    pub last_order_id: Option<BrokerId>,
    /// Most recent net price submitted by this run.
    pub last_submitted_price: Option<Decimal>,
    /// Cycles started.
    pub cycle_count: u32,
    /// Consecutive cycles that failed with a transient error.
    pub consecutive_failures: u32,
    /// Wall-clock start.
    pub started_at: DateTime<Utc>,
}

impl ExecutionState {
    /// Start tracking an execution.
    #[must_use]
    pub fn new(structure: Structure, target_qty: u32, mode: ExecutionMode, remainder: u32) -> Self {
        Self {
            target_qty,
            structure,
            mode,
            initial_remainder: remainder,
            remainder,
            last_order_id: None,
            last_submitted_price: None,
            cycle_count: 0,
            consecutive_failures: 0,
            started_at: Utc::now(),
        }
    }

    /// Units filled since the loop began.
    #[must_use]
    pub const fn filled_qty(&self) -> u32 {
        self.initial_remainder.saturating_sub(self.remainder)
    }

    /// Record a submission.
    pub fn record_submission(&mut self, order_id: BrokerId, price: Decimal) {
        self.last_order_id = Some(order_id);
        self.last_submitted_price = Some(price);
    }
}
