//! Option Position Bounded Context
//!
//! Canonical option identifiers and multi-leg spread construction:
//! - OSI-style symbol parsing and building (lossless fixed-point strikes)
//! - Leg orientation for credit and debit wings
//! - Vertical and iron condor structures

pub mod errors;
pub mod services;
pub mod value_objects;

pub use errors::{CodecError, OptionPositionError};
pub use services::{CondorSpec, VerticalSpec, build_condor, build_vertical};
pub use value_objects::{
    CanonicalLegKey, LegIntent, LegRole, OptionRight, OptionSymbol, ShortPlacement, SpreadSide,
    Strike, Structure,
};
