//! Broker Adapters
//!
//! Implementations of `BrokerPort`: the Schwab trader API for live runs and
//! an in-memory paper broker for dry runs and tests.

mod paper;
pub mod retry;
pub mod schwab;

pub use paper::{FillPolicy, PaperBroker, PaperCallCounts, PaperOperation};
pub use retry::RetryPolicy;
pub use schwab::{SchwabBrokerAdapter, SchwabConfig, SchwabError};
