//! Retry policy and backoff for broker HTTP calls.
//!
//! | Retried | Not retried |
//! |---------|-------------|
//! | 429 (honors `Retry-After`) | 400, 422 (order invalid) |
//! | 408, 500, 502, 503, 504 | 401, 403 (credentials) |
//! | connect errors, timeouts | 404 (unknown order) |

use std::time::Duration;

use rand::Rng;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};

/// Bounded exponential backoff with jitter.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Attempts including the first one.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_backoff: Duration,
    /// Upper bound on any single delay.
    pub max_backoff: Duration,
    /// Growth factor per attempt.
    pub multiplier: f64,
    /// Random spread as a fraction of the delay (0.2 = ±20%).
    pub jitter_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(10),
            multiplier: 2.0,
            jitter_factor: 0.2,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            multiplier: 1.0,
            jitter_factor: 0.0,
        }
    }

    /// Set the attempt count.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Set initial and maximum delay.
    #[must_use]
    pub const fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_backoff = initial;
        self.max_backoff = max;
        self
    }

    /// Start a fresh backoff sequence for one request.
    #[must_use]
    pub fn backoff(&self) -> Backoff {
        Backoff {
            attempt: 0,
            policy: self.clone(),
        }
    }
}

/// Backoff state for one logical request.
#[derive(Debug)]
pub struct Backoff {
    attempt: u32,
    policy: RetryPolicy,
}

impl Backoff {
    /// Delay before the next retry, or `None` once attempts are used up.
    pub fn next_backoff(&mut self) -> Option<Duration> {
        self.attempt += 1;
        if self.attempt >= self.policy.max_attempts {
            return None;
        }
        let exponent = i32::try_from(self.attempt - 1).unwrap_or(i32::MAX);
        let base = self.policy.initial_backoff.as_secs_f64() * self.policy.multiplier.powi(exponent);
        let capped = base.min(self.policy.max_backoff.as_secs_f64());
        Some(Duration::from_secs_f64(self.jitter(capped)))
    }

    /// Like [`Self::next_backoff`] but a server-supplied delay wins.
    pub fn next_after(&mut self, retry_after: Option<Duration>) -> Option<Duration> {
        let computed = self.next_backoff()?;
        Some(retry_after.unwrap_or(computed))
    }

    /// Attempts made so far.
    #[must_use]
    pub const fn attempt(&self) -> u32 {
        self.attempt
    }

    fn jitter(&self, secs: f64) -> f64 {
        let spread = secs * self.policy.jitter_factor;
        if spread <= 0.0 {
            return secs;
        }
        let low = (secs - spread).max(0.0);
        rand::rng().random_range(low..=secs + spread)
    }
}

/// How a failed HTTP status should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// 429.
    RateLimited,
    /// Worth retrying after a delay.
    Retryable,
    /// Fail now.
    Permanent,
}

/// Classify a non-success status.
#[must_use]
pub const fn classify_status(status: StatusCode) -> StatusClass {
    match status.as_u16() {
        429 => StatusClass::RateLimited,
        408 | 500 | 502 | 503 | 504 => StatusClass::Retryable,
        _ => StatusClass::Permanent,
    }
}

/// `Retry-After` in whole seconds, if present.
#[must_use]
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
