//! Signal Port (Driven Port)

use async_trait::async_trait;

use crate::domain::signal::TradeSignal;

/// Signal provider errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignalError {
    /// Provider unreachable or returned a server error.
    #[error("Signal provider unavailable: {message}")]
    Unavailable {
        /// Error details.
        message: String,
    },

    /// Token rejected.
    #[error("Signal provider rejected credentials")]
    Unauthorized,

    /// Response held no trade record.
    #[error("Signal response contains no trade")]
    NoTradePayload,

    /// Trade record present but unusable.
    #[error("Malformed signal: {message}")]
    Malformed {
        /// Error details.
        message: String,
    },
}

impl SignalError {
    /// Reason code for audit records.
    #[must_use]
    pub const fn reason_code(&self) -> &'static str {
        match self {
            Self::Unavailable { .. } | Self::Unauthorized => "SIGNAL_UNAVAILABLE",
            Self::NoTradePayload => "NO_TRADE_PAYLOAD",
            Self::Malformed { .. } => "MALFORMED_SIGNAL",
        }
    }
}

/// Port for the trading signal source.
#[async_trait]
pub trait SignalPort: Send + Sync {
    /// Most recent signal.
    async fn latest_signal(&self) -> Result<TradeSignal, SignalError>;
}
