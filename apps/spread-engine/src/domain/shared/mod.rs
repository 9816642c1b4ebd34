//! Shared Kernel
//!
//! Types used across bounded contexts.

pub mod identifiers;

pub use identifiers::{BrokerId, RunId};
