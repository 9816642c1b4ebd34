//! Schwab-specific error types.

use thiserror::Error;

use crate::application::ports::BrokerError;

/// Errors from the Schwab adapter.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchwabError {
    /// Client could not be built or a request could not be sent.
    #[error("Network error: {0}")]
    Network(String),

    /// Response body did not match the expected shape.
    #[error("JSON parsing error: {0}")]
    JsonParse(String),

    /// 401/403, or no token configured.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// 429 after retries.
    #[error("Rate limited")]
    RateLimited {
        /// Server-suggested delay.
        retry_after_secs: Option<u64>,
    },

    /// 408/5xx after retries.
    #[error("Server error {status}: {message}")]
    Server {
        /// HTTP status.
        status: u16,
        /// Response body.
        message: String,
    },

    /// 400/422.
    #[error("Order rejected: {0}")]
    OrderRejected(String),

    /// 404.
    #[error("Not found: {path}")]
    NotFound {
        /// Request path.
        path: String,
    },

    /// Any other non-success status.
    #[error("API error {status}: {message}")]
    Api {
        /// HTTP status.
        status: u16,
        /// Response body.
        message: String,
    },

    /// Account list did not contain the requested account.
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Order accepted but no id could be found in the response.
    #[error("Order response carried no order id")]
    MissingOrderId,
}

impl From<SchwabError> for BrokerError {
    fn from(err: SchwabError) -> Self {
        match err {
            SchwabError::Network(message) => Self::ConnectionError { message },
            SchwabError::RateLimited { retry_after_secs } => Self::RateLimited { retry_after_secs },
            SchwabError::Server { status, message } => Self::ServerError { status, message },
            SchwabError::AuthenticationFailed(message) => Self::AuthenticationFailed { message },
            SchwabError::OrderRejected(reason) => Self::OrderRejected { reason },
            SchwabError::NotFound { path } => Self::OrderNotFound {
                order_id: path.rsplit('/').next().unwrap_or_default().to_string(),
            },
            err @ (SchwabError::JsonParse(_)
            | SchwabError::Api { .. }
            | SchwabError::AccountNotFound(_)
            | SchwabError::MissingOrderId) => Self::InvalidResponse {
                message: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_errors_stay_transient() {
        let rate: BrokerError = SchwabError::RateLimited {
            retry_after_secs: Some(3),
        }
        .into();
        assert_eq!(
            rate,
            BrokerError::RateLimited {
                retry_after_secs: Some(3)
            }
        );
        let server: BrokerError = SchwabError::Server {
            status: 502,
            message: "bad gateway".to_string(),
        }
        .into();
        assert!(server.is_transient());
        let network: BrokerError = SchwabError::Network("reset".to_string()).into();
        assert!(network.is_transient());
    }

    #[test]
    fn not_found_carries_order_id() {
        let err: BrokerError = SchwabError::NotFound {
            path: "/trader/v1/accounts/H/orders/1001".to_string(),
        }
        .into();
        assert_eq!(
            err,
            BrokerError::OrderNotFound {
                order_id: "1001".to_string()
            }
        );
    }

    #[test]
    fn rejections_are_permanent() {
        let err: BrokerError = SchwabError::OrderRejected("bad price".to_string()).into();
        assert!(err.is_permanent());
        let err: BrokerError = SchwabError::AuthenticationFailed("expired".to_string()).into();
        assert!(err.is_permanent());
        let err: BrokerError = SchwabError::MissingOrderId.into();
        assert!(matches!(err, BrokerError::InvalidResponse { .. }));
    }
}
