//! Broker selection and connection settings.

use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::infrastructure::broker::{FillPolicy, RetryPolicy, SchwabConfig};

/// Which broker the binary talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrokerKind {
    /// In-memory account; nothing leaves the process.
    #[default]
    Paper,
    /// Schwab Trader API.
    Schwab,
}

/// Broker configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Selected broker.
    #[serde(default)]
    pub kind: BrokerKind,
    /// Schwab settings, used when `kind` is `schwab`.
    #[serde(default)]
    pub schwab: SchwabSettings,
    /// Paper account settings, used when `kind` is `paper`.
    #[serde(default)]
    pub paper: PaperSettings,
    /// Retry policy for broker HTTP calls.
    #[serde(default)]
    pub retry: RetrySettings,
}

/// Schwab connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchwabSettings {
    /// API host.
    #[serde(default = "default_schwab_base_url")]
    pub base_url: String,
    /// OAuth access token.
    #[serde(default)]
    pub access_token: String,
    /// Account hash, resolved from the account list when empty.
    #[serde(default)]
    pub account_hash: String,
    /// Plain account number used to pick among several accounts.
    #[serde(default)]
    pub account_number: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Cap on orders per listing.
    #[serde(default = "default_max_orders")]
    pub max_orders: u32,
}

impl Default for SchwabSettings {
    fn default() -> Self {
        Self {
            base_url: default_schwab_base_url(),
            access_token: String::new(),
            account_hash: String::new(),
            account_number: String::new(),
            timeout_secs: default_timeout_secs(),
            max_orders: default_max_orders(),
        }
    }
}

impl SchwabSettings {
    /// Adapter configuration with the shared retry policy applied.
    #[must_use]
    pub fn to_adapter_config(&self, retry: &RetrySettings) -> SchwabConfig {
        let mut config = SchwabConfig::new(self.access_token.clone())
            .with_base_url(self.base_url.clone())
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_retry(retry.to_policy());
        if !self.account_hash.trim().is_empty() {
            config = config.with_account_hash(self.account_hash.trim());
        }
        if !self.account_number.trim().is_empty() {
            config = config.with_account_number(self.account_number.trim());
        }
        config.max_orders = self.max_orders;
        config
    }
}

/// How the paper account fills orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaperFill {
    /// Orders rest until canceled.
    #[default]
    Never,
    /// Orders fill when placed.
    Immediately,
}

/// Paper account settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaperSettings {
    /// Opening cash balance.
    #[serde(default)]
    pub cash: Decimal,
    /// Fill behavior.
    #[serde(default)]
    pub fill: PaperFill,
}

impl PaperSettings {
    /// Fill policy for the paper broker.
    #[must_use]
    pub const fn fill_policy(&self) -> FillPolicy {
        match self.fill {
            PaperFill::Never => FillPolicy::Never,
            PaperFill::Immediately => FillPolicy::Immediately,
        }
    }
}

/// Retry settings in config units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Attempts including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// First retry delay in milliseconds.
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    /// Delay cap in milliseconds.
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl RetrySettings {
    /// Runtime retry policy.
    #[must_use]
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
            .with_max_attempts(self.max_attempts)
            .with_backoff(
                Duration::from_millis(self.initial_backoff_ms),
                Duration::from_millis(self.max_backoff_ms),
            )
    }
}

fn default_schwab_base_url() -> String {
    crate::infrastructure::broker::schwab::DEFAULT_BASE_URL.to_string()
}

const fn default_timeout_secs() -> u64 {
    20
}

const fn default_max_orders() -> u32 {
    200
}

const fn default_max_attempts() -> u32 {
    5
}

const fn default_initial_backoff_ms() -> u64 {
    500
}

const fn default_max_backoff_ms() -> u64 {
    10_000
}
