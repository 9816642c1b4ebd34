//! Application Services

mod leg_set_registry;
mod snapshot;

pub use leg_set_registry::{LegSetGuard, LegSetRegistry};
pub use snapshot::{SnapshotService, aggregate_positions, resolve_leg_key, to_working_order};
