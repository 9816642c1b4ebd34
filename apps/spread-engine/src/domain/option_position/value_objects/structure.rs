//! Spread Structure Value Objects

use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{CanonicalLegKey, LegIntent, LegRole, OptionRight, Strike};

/// Whether the structure is opened for a net credit or a net debit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpreadSide {
    /// Shorts nearer the money; receives premium.
    Credit,
    /// Longs nearer the money; pays premium.
    Debit,
}

impl SpreadSide {
    /// Role of the leg nearer the money in each wing.
    #[must_use]
    pub const fn inner_role(self) -> LegRole {
        match self {
            Self::Credit => LegRole::OpenShort,
            Self::Debit => LegRole::OpenLong,
        }
    }

    /// True for credit structures.
    #[must_use]
    pub const fn is_credit(self) -> bool {
        matches!(self, Self::Credit)
    }
}

impl fmt::Display for SpreadSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Credit => write!(f, "CREDIT"),
            Self::Debit => write!(f, "DEBIT"),
        }
    }
}

/// Where the short strikes of a credit condor sit relative to the signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShortPlacement {
    /// Shorts at the signal's inner strikes.
    #[default]
    SameShorts,
    /// Shorts moved outward from the inner strikes by `offset`.
    PushedOut {
        /// Distance each short moves away from the money.
        offset: Strike,
    },
}

/// A fully oriented multi-leg structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Structure {
    /// Two-leg single-wing spread.
    Vertical {
        /// Credit or debit.
        side: SpreadSide,
        /// Wing right.
        right: OptionRight,
        /// Distance between the strikes.
        width: Strike,
        /// Legs ordered by strike.
        legs: [LegIntent; 2],
    },
    /// Four-leg put wing plus call wing.
    IronCondor {
        /// Credit or debit.
        side: SpreadSide,
        /// Put wing width.
        put_width: Strike,
        /// Call wing width.
        call_width: Strike,
        /// Short strike placement.
        placement: ShortPlacement,
        /// Put wing then call wing, each ordered by strike.
        legs: [LegIntent; 4],
    },
}

impl Structure {
    /// Credit or debit.
    #[must_use]
    pub const fn side(&self) -> SpreadSide {
        match self {
            Self::Vertical { side, .. } | Self::IronCondor { side, .. } => *side,
        }
    }

    /// All legs in strike order.
    #[must_use]
    pub fn legs(&self) -> &[LegIntent] {
        match self {
            Self::Vertical { legs, .. } => legs,
            Self::IronCondor { legs, .. } => legs,
        }
    }

    /// Quantity carried on the legs.
    #[must_use]
    pub fn quantity(&self) -> u32 {
        self.legs().first().map_or(0, |leg| leg.quantity)
    }

    /// Same structure with every leg resized to `quantity`.
    #[must_use]
    pub fn with_quantity(&self, quantity: u32) -> Self {
        let mut resized = self.clone();
        let legs: &mut [LegIntent] = match &mut resized {
            Self::Vertical { legs, .. } => legs,
            Self::IronCondor { legs, .. } => legs,
        };
        for leg in legs {
            leg.quantity = quantity;
        }
        resized
    }

    /// Set of canonical leg keys, used to match working orders.
    #[must_use]
    pub fn leg_keys(&self) -> BTreeSet<CanonicalLegKey> {
        self.legs().iter().map(|leg| *leg.key()).collect()
    }

    /// Expiration shared by all legs.
    #[must_use]
    pub fn expiration(&self) -> Option<NaiveDate> {
        self.legs().first().map(|leg| leg.symbol.expiration())
    }

    /// True for four-leg condors.
    #[must_use]
    pub const fn is_condor(&self) -> bool {
        matches!(self, Self::IronCondor { .. })
    }

    /// Human-readable identity, e.g. `251219:P5795-5800:C5900-5905`.
    #[must_use]
    pub fn canonical_key(&self) -> String {
        let expiry = self
            .legs()
            .first()
            .map(|leg| leg.key().expiry_code())
            .unwrap_or_default();
        let wing = |legs: &[LegIntent]| -> String {
            legs.iter()
                .map(|leg| leg.symbol.strike().to_string())
                .collect::<Vec<_>>()
                .join("-")
        };
        match self {
            Self::Vertical { right, legs, .. } => {
                format!("{expiry}:{}{}", right.code(), wing(legs))
            }
            Self::IronCondor { legs, .. } => {
                format!("{expiry}:P{}:C{}", wing(&legs[..2]), wing(&legs[2..]))
            }
        }
    }
}

impl fmt::Display for Structure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = if self.is_condor() {
            "IRON_CONDOR"
        } else {
            "VERTICAL"
        };
        write!(
            f,
            "{} {} {} x{}",
            self.side(),
            kind,
            self.canonical_key(),
            self.quantity()
        )
    }
}
