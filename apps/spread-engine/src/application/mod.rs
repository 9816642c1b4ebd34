//! Application Layer
//!
//! Orchestrates domain logic against the outside world:
//!
//! - **Ports**: Broker, signal, and audit interfaces
//! - **Services**: Snapshot aggregation and in-process leg-set locking
//! - **Use Cases**: Reconcile a structure, execute it, and run the full open sequence

pub mod ports;
pub mod services;
pub mod use_cases;

pub use ports::*;
pub use use_cases::*;
