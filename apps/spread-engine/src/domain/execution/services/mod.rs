//! Execution Domain Services

mod fair_price;

pub use fair_price::{fair_price, leg_mids, price_moved, round_to_tick};
