//! Infrastructure Layer
//!
//! Adapters behind the application ports.
//!
//! - [`broker`]: Schwab REST adapter, paper broker, HTTP retry policy
//! - [`signal`]: GammaWizard signal client
//! - [`audit`]: Audit sinks (tracing event, JSON lines file)

pub mod audit;
pub mod broker;
pub mod signal;
