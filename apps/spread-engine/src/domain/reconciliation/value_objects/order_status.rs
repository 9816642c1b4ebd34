//! Broker Order Status

use serde::{Deserialize, Serialize};

/// Order lifecycle status as reported by the broker.
///
/// Unrecognized statuses deserialize to [`OrderStatus::Unknown`] and count
/// as working: an order the engine cannot classify still blocks a fresh
/// submission on the same legs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Received, not yet acknowledged.
    New,
    /// Live at the exchange.
    Working,
    /// Accepted, waiting for the session to open.
    Queued,
    /// Waiting on an activation condition.
    PendingActivation,
    /// Open (generic broker spelling).
    Open,
    /// Accepted but not yet routed.
    Accepted,
    /// Waiting on a parent order.
    AwaitingParentOrder,
    /// Waiting on a trigger condition.
    AwaitingCondition,
    /// Held for manual review.
    AwaitingManualReview,
    /// Cancel requested, not yet confirmed.
    PendingCancel,
    /// Replace requested, not yet confirmed.
    PendingReplace,
    /// Completely filled.
    Filled,
    /// Canceled.
    Canceled,
    /// Rejected.
    Rejected,
    /// Expired.
    Expired,
    /// Replaced by a newer order.
    Replaced,
    /// Any status this engine does not model.
    #[serde(other)]
    Unknown,
}

impl OrderStatus {
    /// True when the order can still fill and so blocks a fresh submission.
    #[must_use]
    pub const fn is_working(self) -> bool {
        !self.is_terminal()
    }

    /// True when the order can never fill again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Filled | Self::Canceled | Self::Rejected | Self::Expired | Self::Replaced
        )
    }
}
