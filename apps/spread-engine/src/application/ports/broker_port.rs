//! Broker Port (Driven Port)
//!
//! Order entry, positions, and quotes for multi-leg option structures.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::execution::Quote;
use crate::domain::option_position::{CanonicalLegKey, OptionSymbol, Structure};
use crate::domain::reconciliation::OrderStatus;
use crate::domain::shared::BrokerId;

/// Structured contract fields some brokers send alongside the symbol.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentFields {
    /// Expiration (ISO date or timestamp).
    pub expiration: Option<String>,
    /// `CALL`/`PUT`.
    pub put_call: Option<String>,
    /// Strike price.
    pub strike: Option<Decimal>,
}

/// One position line as reported by the broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerPosition {
    /// Broker symbol text.
    pub symbol: String,
    /// Asset class (`OPTION`, `EQUITY`, ...).
    pub asset_type: String,
    /// Long contracts.
    pub long_quantity: Decimal,
    /// Short contracts (positive number).
    pub short_quantity: Decimal,
    /// Structured fallback fields.
    pub instrument: InstrumentFields,
}

impl BrokerPosition {
    /// True for option positions.
    #[must_use]
    pub fn is_option(&self) -> bool {
        self.asset_type.eq_ignore_ascii_case("OPTION")
    }

    /// Signed quantity: long minus short.
    #[must_use]
    pub fn net_quantity(&self) -> Decimal {
        self.long_quantity - self.short_quantity
    }
}

/// One leg of a broker order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerOrderLeg {
    /// Broker symbol text.
    pub symbol: String,
    /// Structured fallback fields.
    pub instrument: InstrumentFields,
}

/// A broker order as listed by the broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokerOrder {
    /// Broker order id.
    pub id: BrokerId,
    /// Lifecycle status.
    pub status: OrderStatus,
    /// Legs.
    pub legs: Vec<BrokerOrderLeg>,
    /// Limit price, if any.
    pub price: Option<Decimal>,
}

/// Time window for order listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderWindow {
    /// Inclusive start.
    pub from: DateTime<Utc>,
    /// Inclusive end.
    pub to: DateTime<Utc>,
}

impl OrderWindow {
    /// Window ending now and reaching back `lookback`.
    #[must_use]
    pub fn lookback(lookback: Duration) -> Self {
        let to = Utc::now();
        let from = chrono::Duration::from_std(lookback)
            .ok()
            .and_then(|d| to.checked_sub_signed(d))
            .unwrap_or(to);
        Self { from, to }
    }
}

/// Net-priced multi-leg order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpreadOrderRequest {
    /// Structure with leg quantities set to the order size.
    pub structure: Structure,
    /// Positive net price (credit received or debit paid).
    pub price: Decimal,
}

impl SpreadOrderRequest {
    /// Order `quantity` units of `structure` at `price`.
    #[must_use]
    pub fn net(structure: &Structure, quantity: u32, price: Decimal) -> Self {
        Self {
            structure: structure.with_quantity(quantity),
            price,
        }
    }

    /// Units ordered.
    #[must_use]
    pub fn quantity(&self) -> u32 {
        self.structure.quantity()
    }
}

/// Broker port error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BrokerError {
    /// Rate limited after retries.
    #[error("Rate limited by broker")]
    RateLimited {
        /// Server-suggested delay.
        retry_after_secs: Option<u64>,
    },

    /// Network failure or timeout.
    #[error("Broker connection error: {message}")]
    ConnectionError {
        /// Error details.
        message: String,
    },

    /// 5xx or 408 that outlived retries.
    #[error("Broker server error {status}: {message}")]
    ServerError {
        /// HTTP status.
        status: u16,
        /// Error details.
        message: String,
    },

    /// Credentials rejected.
    #[error("Broker authentication failed: {message}")]
    AuthenticationFailed {
        /// Error details.
        message: String,
    },

    /// Order rejected by broker.
    #[error("Order rejected: {reason}")]
    OrderRejected {
        /// Rejection reason.
        reason: String,
    },

    /// Order not found.
    #[error("Order not found: {order_id}")]
    OrderNotFound {
        /// The missing order ID.
        order_id: String,
    },

    /// Response body could not be understood.
    #[error("Invalid broker response: {message}")]
    InvalidResponse {
        /// Error details.
        message: String,
    },
}

impl BrokerError {
    /// True when retrying the same request later may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::ConnectionError { .. } | Self::ServerError { .. }
        )
    }

    /// True when retrying cannot help.
    #[must_use]
    pub const fn is_permanent(&self) -> bool {
        !self.is_transient()
    }
}

/// Port for broker interactions.
#[async_trait]
pub trait BrokerPort: Send + Sync {
    /// All positions in the account.
    async fn get_positions(&self) -> Result<Vec<BrokerPosition>, BrokerError>;

    /// Orders entered within `window`, any status.
    async fn list_orders(&self, window: OrderWindow) -> Result<Vec<BrokerOrder>, BrokerError>;

    /// Top-of-book for one contract.
    async fn get_quote(&self, symbol: &OptionSymbol) -> Result<Quote, BrokerError>;

    /// Top-of-book for several contracts; missing contracts are omitted.
    async fn get_quotes(
        &self,
        symbols: &[OptionSymbol],
    ) -> Result<HashMap<CanonicalLegKey, Quote>, BrokerError> {
        let mut quotes = HashMap::with_capacity(symbols.len());
        for symbol in symbols {
            quotes.insert(*symbol.key(), self.get_quote(symbol).await?);
        }
        Ok(quotes)
    }

    /// Submit a new order; returns its broker id.
    async fn place_order(&self, order: &SpreadOrderRequest) -> Result<BrokerId, BrokerError>;

    /// Replace a working order; returns the replacement's id.
    async fn replace_order(
        &self,
        order_id: &BrokerId,
        order: &SpreadOrderRequest,
    ) -> Result<BrokerId, BrokerError>;

    /// Cancel a working order.
    async fn cancel_order(&self, order_id: &BrokerId) -> Result<(), BrokerError>;

    /// Cash available for sizing.
    async fn get_account_cash(&self) -> Result<Decimal, BrokerError>;
}
