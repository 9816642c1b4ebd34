//! Option Position Value Objects

mod leg;
mod leg_key;
mod occ_symbol;
mod option_right;
mod strike;
mod structure;

pub use leg::{LegIntent, LegRole};
pub use leg_key::CanonicalLegKey;
pub use occ_symbol::OptionSymbol;
pub use option_right::OptionRight;
pub use strike::Strike;
pub use structure::{ShortPlacement, SpreadSide, Structure};
