//! Schwab Trader API Adapter
//!
//! [`BrokerPort`](crate::application::ports::BrokerPort) over the Schwab
//! trader and market data REST APIs:
//! - Bearer-token auth (token acquisition happens elsewhere)
//! - Retry with exponential backoff on 429/5xx, `Retry-After` honored
//! - Account hash resolved once per adapter

mod adapter;
mod api_types;
mod config;
mod error;
mod http_client;

pub use adapter::SchwabBrokerAdapter;
pub use config::{DEFAULT_BASE_URL, SchwabConfig};
pub use error::SchwabError;
