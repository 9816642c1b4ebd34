//! Sizing
//!
//! Converts account equity into a contract count and snaps credit wing
//! widths to the strike grid.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::domain::option_position::{SpreadSide, Strike};

/// Strike grid for credit wing widths, in points.
pub const WIDTH_GRID_POINTS: i64 = 5;

/// Credit wing width used when none is configured, in points.
pub const DEFAULT_CREDIT_WIDTH_POINTS: i64 = 20;

/// Debit wings are always this wide, in points.
pub const DEBIT_WIDTH_POINTS: i64 = 5;

/// How many units to open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SizingRule {
    /// Always the same count.
    Fixed {
        /// Units per run.
        quantity: u32,
    },
    /// Scale with account cash.
    PerEquity {
        /// Cash backing one unit of a grid-width structure.
        dollars_per_unit: Decimal,
    },
}

impl Default for SizingRule {
    fn default() -> Self {
        Self::Fixed { quantity: 1 }
    }
}

impl SizingRule {
    /// True when the rule needs the account's cash balance.
    #[must_use]
    pub const fn needs_cash(&self) -> bool {
        matches!(self, Self::PerEquity { .. })
    }

    /// Units to open for a structure of `side` and `width` given `cash`.
    ///
    /// Credit structures scale inversely with width (a 20-wide wing uses
    /// four grid units of cash); debits ignore width. Never below one.
    #[must_use]
    pub fn units(&self, cash: Decimal, side: SpreadSide, width: Strike) -> u32 {
        let dollars_per_unit = match self {
            Self::Fixed { quantity } => return (*quantity).max(1),
            Self::PerEquity { dollars_per_unit } => *dollars_per_unit,
        };
        if dollars_per_unit <= Decimal::ZERO || cash <= Decimal::ZERO {
            return 1;
        }
        let raw = match side {
            SpreadSide::Credit => {
                let grid_units = width.to_decimal() / Decimal::from(WIDTH_GRID_POINTS);
                let per_unit = dollars_per_unit * grid_units;
                if per_unit <= Decimal::ZERO {
                    return 1;
                }
                (cash / per_unit).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            }
            SpreadSide::Debit => (cash / dollars_per_unit).floor(),
        };
        raw.to_u32().unwrap_or(u32::MAX).max(1)
    }
}

/// Snap a credit wing width up to the grid; `None` yields the default.
#[must_use]
pub fn credit_width(requested_points: Option<Decimal>) -> Strike {
    let grid = Decimal::from(WIDTH_GRID_POINTS);
    let points = requested_points
        .filter(|p| *p > Decimal::ZERO)
        .map_or(Decimal::from(DEFAULT_CREDIT_WIDTH_POINTS), |p| {
            ((p / grid).ceil() * grid).max(grid)
        });
    Strike::from_decimal(points).unwrap_or(Strike::from_points(DEFAULT_CREDIT_WIDTH_POINTS))
}

/// Wing width for `side`.
#[must_use]
pub fn width_for(side: SpreadSide, requested_credit_points: Option<Decimal>) -> Strike {
    match side {
        SpreadSide::Credit => credit_width(requested_credit_points),
        SpreadSide::Debit => Strike::from_points(DEBIT_WIDTH_POINTS),
    }
}
