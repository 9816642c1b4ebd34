//! Observability module.
//!
//! Structured logging through `tracing`. Every run logs a `run_id`, and the
//! repricing loop logs cycle, remainder, price, and order id on each step.

mod logging;

pub use logging::{LoggingError, build_filter, init_logging};
