//! Schwab adapter configuration.

use std::time::Duration;

use crate::infrastructure::broker::retry::RetryPolicy;

/// Production API host.
pub const DEFAULT_BASE_URL: &str = "https://api.schwabapi.com";

/// Configuration for the Schwab broker adapter.
#[derive(Debug, Clone)]
pub struct SchwabConfig {
    /// API host, without a trailing slash.
    pub base_url: String,
    /// OAuth access token.
    pub access_token: String,
    /// Account hash; looked up from the account list when absent.
    pub account_hash: Option<String>,
    /// Plain account number used to pick the hash when several accounts exist.
    pub account_number: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Retry policy for transient failures.
    pub retry: RetryPolicy,
    /// Cap on orders returned by one listing.
    pub max_orders: u32,
}

impl SchwabConfig {
    /// Create a configuration for the production host.
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            access_token: access_token.into(),
            account_hash: None,
            account_number: None,
            timeout: Duration::from_secs(20),
            retry: RetryPolicy::default(),
            max_orders: 200,
        }
    }

    /// Point at another host (tests, proxies).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Use a known account hash.
    #[must_use]
    pub fn with_account_hash(mut self, hash: impl Into<String>) -> Self {
        self.account_hash = Some(hash.into());
        self
    }

    /// Pick the account by number.
    #[must_use]
    pub fn with_account_number(mut self, number: impl Into<String>) -> Self {
        self.account_number = Some(number.into());
        self
    }

    /// Set the HTTP timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}
