//! Reconciliation Guard
//!
//! Decides NEW / REPRICE_EXISTING / SKIP for a desired structure from a
//! fresh position snapshot and the matching working orders. The decision
//! is recomputed from scratch on every call and never consults memory of
//! earlier calls, so re-running after a partial fill cannot resubmit the
//! filled portion.
//!
//! | Legs | Working order | Decision |
//! |------|---------------|----------|
//! | any leg opposite | any | SKIP `WOULD_CLOSE` |
//! | all zero | none | NEW, remainder = target |
//! | all aligned, nonzero | none | NEW (target - open) or SKIP `AT_OR_ABOVE_TARGET` |
//! | anything else | any | REPRICE_EXISTING, remainder = target - open |

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::domain::option_position::{CanonicalLegKey, LegIntent, LegRole, Structure};
use crate::domain::reconciliation::value_objects::{PositionSnapshot, WorkingOrder};
use crate::domain::shared::BrokerId;

/// Why the guard declined to trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkipReason {
    /// At least one leg is held in the opposite direction; opening would
    /// partially close an existing position.
    WouldClose,
    /// Fully aligned positions already cover the target.
    AtOrAboveTarget,
}

/// Why the guard chose to continue an existing attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RepriceReason {
    /// A matching order is already working.
    WorkingOrder,
    /// Some legs are filled and some are not.
    PartialOverlap,
}

/// Guard outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GuardDecision {
    /// Open a fresh order for `remainder` units.
    New {
        /// Units still to open.
        remainder: u32,
    },
    /// Continue working toward `remainder` units.
    RepriceExisting {
        /// Units still to open.
        remainder: u32,
        /// What made this an existing attempt.
        reason: RepriceReason,
    },
    /// Do nothing.
    Skip {
        /// Why.
        reason: SkipReason,
    },
}

impl GuardDecision {
    /// Units still to open (zero for skips).
    #[must_use]
    pub const fn remainder(&self) -> u32 {
        match self {
            Self::New { remainder } | Self::RepriceExisting { remainder, .. } => *remainder,
            Self::Skip { .. } => 0,
        }
    }

    /// Short uppercase label for logs and audit records.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::New { .. } => "NEW",
            Self::RepriceExisting { .. } => "REPRICE_EXISTING",
            Self::Skip { .. } => "SKIP",
        }
    }

    /// Reason code, if the decision carries one.
    #[must_use]
    pub const fn reason_code(&self) -> Option<&'static str> {
        match self {
            Self::New { .. } => None,
            Self::RepriceExisting { reason, .. } => Some(match reason {
                RepriceReason::WorkingOrder => "WORKING_ORDER",
                RepriceReason::PartialOverlap => "PARTIAL_OVERLAP",
            }),
            Self::Skip { reason } => Some(match reason {
                SkipReason::WouldClose => "WOULD_CLOSE",
                SkipReason::AtOrAboveTarget => "AT_OR_ABOVE_TARGET",
            }),
        }
    }
}

/// Per-leg comparison of desired direction and live quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LegAlignment {
    /// No position in this contract.
    Flat,
    /// Held in the direction the leg would open.
    Aligned,
    /// Held against the direction the leg would open.
    Opposite,
}

/// One leg's live state as seen by the guard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegState {
    /// Contract.
    pub key: CanonicalLegKey,
    /// Desired direction.
    pub role: LegRole,
    /// Signed live quantity.
    pub current_qty: Decimal,
    /// Classification.
    pub alignment: LegAlignment,
}

/// Full guard result, including the evidence behind the decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardEvaluation {
    /// The decision.
    pub decision: GuardDecision,
    /// Whole structure units already open in the desired direction.
    pub units_open: u32,
    /// Per-leg evidence.
    pub legs: Vec<LegState>,
    /// Ids of matching working orders.
    pub working_order_ids: Vec<BrokerId>,
}

/// Classify a leg against its live quantity.
#[must_use]
pub fn classify(role: LegRole, current_qty: Decimal) -> LegAlignment {
    if current_qty.is_zero() {
        return LegAlignment::Flat;
    }
    let held_long = current_qty.is_sign_positive();
    match (role, held_long) {
        (LegRole::OpenLong, true) | (LegRole::OpenShort, false) => LegAlignment::Aligned,
        _ => LegAlignment::Opposite,
    }
}

/// Whole units open across all legs: the smallest directional quantity,
/// floored, never negative.
#[must_use]
pub fn units_open(legs: &[LegIntent], snapshot: &PositionSnapshot) -> u32 {
    legs.iter()
        .map(|leg| {
            let directional = snapshot.quantity(leg.key()) * Decimal::from(leg.role.sign());
            directional.floor().max(Decimal::ZERO)
        })
        .min()
        .and_then(|units| units.to_u32())
        .unwrap_or(0)
}

/// Evaluate the guard for `structure` at `target_qty` units.
///
/// `working` may contain unrelated orders; only those whose leg set equals
/// the structure's leg set count.
#[must_use]
pub fn evaluate(
    structure: &Structure,
    target_qty: u32,
    snapshot: &PositionSnapshot,
    working: &[WorkingOrder],
) -> GuardEvaluation {
    let target_keys = structure.leg_keys();
    let working_order_ids: Vec<BrokerId> = working
        .iter()
        .filter(|order| order.matches(&target_keys))
        .map(|order| order.id.clone())
        .collect();

    let legs: Vec<LegState> = structure
        .legs()
        .iter()
        .map(|leg| {
            let current_qty = snapshot.quantity(leg.key());
            LegState {
                key: *leg.key(),
                role: leg.role,
                current_qty,
                alignment: classify(leg.role, current_qty),
            }
        })
        .collect();

    let units = units_open(structure.legs(), snapshot);
    let any_opposite = legs.iter().any(|l| l.alignment == LegAlignment::Opposite);
    let all_flat = legs.iter().all(|l| l.alignment == LegAlignment::Flat);
    let all_aligned = legs.iter().all(|l| l.alignment == LegAlignment::Aligned);
    let no_working = working_order_ids.is_empty();

    let decision = if any_opposite {
        GuardDecision::Skip {
            reason: SkipReason::WouldClose,
        }
    } else if all_flat && no_working {
        GuardDecision::New {
            remainder: target_qty,
        }
    } else if all_aligned && no_working {
        if units >= target_qty {
            GuardDecision::Skip {
                reason: SkipReason::AtOrAboveTarget,
            }
        } else {
            GuardDecision::New {
                remainder: target_qty - units,
            }
        }
    } else {
        GuardDecision::RepriceExisting {
            remainder: target_qty.saturating_sub(units),
            reason: if no_working {
                RepriceReason::PartialOverlap
            } else {
                RepriceReason::WorkingOrder
            },
        }
    };

    GuardEvaluation {
        decision,
        units_open: units,
        legs,
        working_order_ids,
    }
}
