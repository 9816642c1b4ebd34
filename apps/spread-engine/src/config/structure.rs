//! Structure shape and sizing settings.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::application::{StructureKind, StructureSettings};
use crate::domain::option_position::{ShortPlacement, Strike};
use crate::domain::signal::SideOverride;
use crate::domain::sizing::SizingRule;

/// What to build from each signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructureConfig {
    /// Option root (e.g. `SPXW`).
    #[serde(default = "default_root")]
    pub root: String,
    /// Structure shape.
    #[serde(default)]
    pub kind: StructureKind,
    /// Credit wing width in points; snapped up to the 5-point grid.
    #[serde(default)]
    pub credit_width: Option<Decimal>,
    /// Points each credit short moves away from the money; zero keeps the
    /// signal's strikes.
    #[serde(default)]
    pub push_out: Decimal,
    /// Side override (`AUTO`, `CREDIT`, `DEBIT`).
    #[serde(default)]
    pub side: SideOverride,
}

impl Default for StructureConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            kind: StructureKind::default(),
            credit_width: None,
            push_out: Decimal::ZERO,
            side: SideOverride::default(),
        }
    }
}

impl StructureConfig {
    /// Short placement for credit condors.
    #[must_use]
    pub fn placement(&self) -> ShortPlacement {
        match Strike::from_decimal(self.push_out) {
            Some(offset) if offset.is_positive() => ShortPlacement::PushedOut { offset },
            _ => ShortPlacement::SameShorts,
        }
    }
}

/// Sizing mode names accepted in config.
pub const SIZING_MODES: [&str; 2] = ["fixed", "per_equity"];

/// Contract count settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizingConfig {
    /// `fixed` or `per_equity`.
    #[serde(default = "default_mode")]
    pub mode: String,
    /// Units per run in `fixed` mode.
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    /// Cash per grid-width unit in `per_equity` mode.
    #[serde(default = "default_dollars_per_unit")]
    pub dollars_per_unit: Decimal,
    /// Cash figure used instead of the broker balance.
    #[serde(default)]
    pub cash_override: Option<Decimal>,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            quantity: default_quantity(),
            dollars_per_unit: default_dollars_per_unit(),
            cash_override: None,
        }
    }
}

impl SizingConfig {
    /// Sizing rule; unknown modes were rejected by validation and fall
    /// back to fixed sizing here.
    #[must_use]
    pub fn rule(&self) -> SizingRule {
        match self.mode.as_str() {
            "per_equity" => SizingRule::PerEquity {
                dollars_per_unit: self.dollars_per_unit,
            },
            _ => SizingRule::Fixed {
                quantity: self.quantity,
            },
        }
    }
}

/// Combine structure and sizing sections into run settings.
#[must_use]
pub fn structure_settings(structure: &StructureConfig, sizing: &SizingConfig) -> StructureSettings {
    StructureSettings {
        root: structure.root.clone(),
        kind: structure.kind,
        credit_width: structure.credit_width,
        placement: structure.placement(),
        side_override: structure.side,
        sizing: sizing.rule(),
        cash_override: sizing.cash_override,
    }
}

fn default_root() -> String {
    "SPXW".to_string()
}

fn default_mode() -> String {
    "fixed".to_string()
}

const fn default_quantity() -> u32 {
    1
}

fn default_dollars_per_unit() -> Decimal {
    Decimal::from(4000)
}
