//! Leg Intent Value Object

use serde::{Deserialize, Serialize};

use super::{CanonicalLegKey, OptionSymbol};

/// Opening direction for a leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LegRole {
    /// Buy to open.
    OpenLong,
    /// Sell to open.
    OpenShort,
}

impl LegRole {
    /// Sign of the position this leg creates (+1 long, -1 short).
    #[must_use]
    pub const fn sign(self) -> i64 {
        match self {
            Self::OpenLong => 1,
            Self::OpenShort => -1,
        }
    }

    /// The opposite role.
    #[must_use]
    pub const fn flip(self) -> Self {
        match self {
            Self::OpenLong => Self::OpenShort,
            Self::OpenShort => Self::OpenLong,
        }
    }
}

impl std::fmt::Display for LegRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenLong => write!(f, "BUY"),
            Self::OpenShort => write!(f, "SELL"),
        }
    }
}

/// A single desired leg of a structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegIntent {
    /// Contract to trade.
    pub symbol: OptionSymbol,
    /// Opening direction.
    pub role: LegRole,
    /// Contracts per structure unit times units.
    pub quantity: u32,
}

impl LegIntent {
    /// Create a new leg intent.
    #[must_use]
    pub const fn new(symbol: OptionSymbol, role: LegRole, quantity: u32) -> Self {
        Self {
            symbol,
            role,
            quantity,
        }
    }

    /// Canonical key of the leg's contract.
    #[must_use]
    pub const fn key(&self) -> &CanonicalLegKey {
        self.symbol.key()
    }
}
