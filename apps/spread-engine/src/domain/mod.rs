//! Domain Layer
//!
//! Pure business logic with no I/O. Everything here is deterministic and
//! can be exercised without a broker or a clock.
//!
//! # Bounded Contexts
//!
//! - [`option_position`]: Option symbol codec, leg orientation, spread structures
//! - [`reconciliation`]: Position snapshots, working orders, NEW/REPRICE/SKIP guard
//! - [`execution`]: Repricing state, pricing knobs, fair price, outcome reports
//! - [`sizing`]: Contract count and wing width from account equity
//! - [`signal`]: Trading signal and credit/debit side selection

pub mod execution;
pub mod option_position;
pub mod reconciliation;
pub mod shared;
pub mod signal;
pub mod sizing;
