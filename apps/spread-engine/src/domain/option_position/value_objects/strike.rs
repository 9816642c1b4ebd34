//! Strike Value Object
//!
//! Strikes are fixed-point integers counting thousandths of a point, so two
//! strikes compare equal exactly when their symbols encode the same digits.

use std::fmt;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Option strike in thousandths of a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Strike(i64);

impl Strike {
    /// Thousandths per whole strike point.
    pub const MILLS_PER_POINT: i64 = 1_000;

    /// Largest strike that fits eight symbol digits (99 999.999).
    pub const MAX: Self = Self(99_999_999);

    /// Zero strike.
    pub const ZERO: Self = Self(0);

    /// Create from a count of thousandths.
    #[must_use]
    pub const fn from_mills(mills: i64) -> Self {
        Self(mills)
    }

    /// Create from whole points.
    #[must_use]
    pub const fn from_points(points: i64) -> Self {
        Self(points * Self::MILLS_PER_POINT)
    }

    /// Create from a decimal price, rounding to the nearest thousandth.
    #[must_use]
    pub fn from_decimal(value: Decimal) -> Option<Self> {
        value
            .checked_mul(Decimal::from(Self::MILLS_PER_POINT))?
            .round_dp_with_strategy(0, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
            .to_i64()
            .map(Self)
    }

    /// Strike in thousandths.
    #[must_use]
    pub const fn mills(self) -> i64 {
        self.0
    }

    /// Strike as a decimal number of points.
    #[must_use]
    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, 3).normalize()
    }

    /// True when the strike can be written into a symbol.
    #[must_use]
    pub const fn is_representable(self) -> bool {
        self.0 >= 0 && self.0 <= Self::MAX.0
    }

    /// True for strictly positive strikes (used for widths).
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Checked addition.
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Checked subtraction.
    #[must_use]
    pub const fn checked_sub(self, other: Self) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }
}

impl fmt::Display for Strike {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn from_points_scales_to_thousandths() {
        assert_eq!(Strike::from_points(5800).mills(), 5_800_000);
    }

    #[test]
    fn from_decimal_rounds_to_nearest_thousandth() {
        assert_eq!(Strike::from_decimal(dec!(5800.5)), Some(Strike::from_mills(5_800_500)));
        assert_eq!(Strike::from_decimal(dec!(12.3456)), Some(Strike::from_mills(12_346)));
    }

    #[test]
    fn display_strips_trailing_zeros() {
        assert_eq!(Strike::from_points(5800).to_string(), "5800");
        assert_eq!(Strike::from_mills(5_800_500).to_string(), "5800.5");
    }

    #[test]
    fn representable_range() {
        assert!(Strike::ZERO.is_representable());
        assert!(Strike::MAX.is_representable());
        assert!(!Strike::from_mills(-1).is_representable());
        assert!(!Strike::from_mills(100_000_000).is_representable());
    }

    #[test]
    fn checked_arithmetic() {
        let inner = Strike::from_points(100);
        let width = Strike::from_points(5);
        assert_eq!(inner.checked_sub(width), Some(Strike::from_points(95)));
        assert_eq!(inner.checked_add(width), Some(Strike::from_points(105)));
    }
}
