//! Schwab API request and response types.
//!
//! Field names follow Schwab's camelCase JSON. Response types are lenient:
//! anything the engine does not need is optional or ignored.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::application::ports::{
    BrokerOrder, BrokerOrderLeg, BrokerPosition, InstrumentFields, SpreadOrderRequest,
};
use crate::domain::execution::Quote;
use crate::domain::option_position::{LegRole, Structure};
use crate::domain::reconciliation::OrderStatus;
use crate::domain::shared::BrokerId;

// ============================================================================
// Order Request Types
// ============================================================================

/// Net-priced multi-leg order body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchwabOrderRequest {
    /// `NET_CREDIT` or `NET_DEBIT`.
    pub order_type: &'static str,
    /// Trading session.
    pub session: &'static str,
    /// Net limit price, two decimals.
    pub price: String,
    /// Time in force.
    pub duration: &'static str,
    /// Always `SINGLE`.
    pub order_strategy_type: &'static str,
    /// `VERTICAL` or `IRON_CONDOR`.
    pub complex_order_strategy_type: &'static str,
    /// Legs.
    pub order_leg_collection: Vec<SchwabOrderLeg>,
}

/// One leg of an order body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchwabOrderLeg {
    /// `BUY_TO_OPEN` / `SELL_TO_OPEN`.
    pub instruction: &'static str,
    /// Contracts.
    pub quantity: u32,
    /// Contract.
    pub instrument: SchwabOrderInstrument,
}

/// Contract reference in an order body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchwabOrderInstrument {
    /// Padded option symbol.
    pub symbol: String,
    /// Always `OPTION`.
    pub asset_type: &'static str,
}

impl From<&SpreadOrderRequest> for SchwabOrderRequest {
    fn from(request: &SpreadOrderRequest) -> Self {
        let structure = &request.structure;
        Self {
            order_type: if structure.side().is_credit() {
                "NET_CREDIT"
            } else {
                "NET_DEBIT"
            },
            session: "NORMAL",
            price: format!("{:.2}", request.price),
            duration: "DAY",
            order_strategy_type: "SINGLE",
            complex_order_strategy_type: match structure {
                Structure::Vertical { .. } => "VERTICAL",
                Structure::IronCondor { .. } => "IRON_CONDOR",
            },
            order_leg_collection: structure
                .legs()
                .iter()
                .map(|leg| SchwabOrderLeg {
                    instruction: match leg.role {
                        LegRole::OpenLong => "BUY_TO_OPEN",
                        LegRole::OpenShort => "SELL_TO_OPEN",
                    },
                    quantity: leg.quantity,
                    instrument: SchwabOrderInstrument {
                        symbol: leg.symbol.to_string(),
                        asset_type: "OPTION",
                    },
                })
                .collect(),
        }
    }
}

// ============================================================================
// Account Types
// ============================================================================

/// Entry of `GET /accounts/accountNumbers`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchwabAccountNumber {
    /// Plain account number.
    pub account_number: String,
    /// Opaque hash used in URLs.
    pub hash_value: String,
}

/// `GET /accounts/{hash}` envelope.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchwabAccountResponse {
    /// Account body.
    pub securities_account: SchwabSecuritiesAccount,
}

/// Account body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchwabSecuritiesAccount {
    /// Positions, present when requested with `fields=positions`.
    #[serde(default)]
    pub positions: Vec<SchwabPosition>,
    /// Start-of-day balances.
    #[serde(default)]
    pub initial_balances: Option<SchwabBalances>,
    /// Live balances.
    #[serde(default)]
    pub current_balances: Option<SchwabBalances>,
}

impl SchwabSecuritiesAccount {
    /// Opening cash: first of cash balance, cash available for trading,
    /// liquidation value; start-of-day figures before live ones.
    #[must_use]
    pub fn opening_cash(&self) -> Option<Decimal> {
        [&self.initial_balances, &self.current_balances]
            .into_iter()
            .flatten()
            .find_map(SchwabBalances::cash)
    }
}

/// Balance block.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchwabBalances {
    /// Settled cash.
    #[serde(default)]
    pub cash_balance: Option<Decimal>,
    /// Cash usable for new trades.
    #[serde(default)]
    pub cash_available_for_trading: Option<Decimal>,
    /// Account value.
    #[serde(default)]
    pub liquidation_value: Option<Decimal>,
}

impl SchwabBalances {
    fn cash(&self) -> Option<Decimal> {
        self.cash_balance
            .or(self.cash_available_for_trading)
            .or(self.liquidation_value)
    }
}

/// Position line.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchwabPosition {
    /// Long contracts.
    #[serde(default)]
    pub long_quantity: Decimal,
    /// Short contracts.
    #[serde(default)]
    pub short_quantity: Decimal,
    /// Contract.
    pub instrument: SchwabInstrument,
}

/// Contract as reported in positions and orders.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchwabInstrument {
    /// Symbol text.
    #[serde(default)]
    pub symbol: String,
    /// Asset class.
    #[serde(default)]
    pub asset_type: String,
    /// `CALL`/`PUT`.
    #[serde(default)]
    pub put_call: Option<String>,
    /// Expiration date or timestamp.
    #[serde(default)]
    pub expiration_date: Option<String>,
    /// Strike.
    #[serde(default)]
    pub strike_price: Option<Decimal>,
}

impl SchwabInstrument {
    fn fields(&self) -> InstrumentFields {
        InstrumentFields {
            expiration: self.expiration_date.clone(),
            put_call: self.put_call.clone(),
            strike: self.strike_price,
        }
    }
}

impl From<SchwabPosition> for BrokerPosition {
    fn from(position: SchwabPosition) -> Self {
        Self {
            instrument: position.instrument.fields(),
            symbol: position.instrument.symbol,
            asset_type: position.instrument.asset_type,
            long_quantity: position.long_quantity,
            short_quantity: position.short_quantity,
        }
    }
}

// ============================================================================
// Order Response Types
// ============================================================================

/// Order as listed by `GET /accounts/{hash}/orders`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchwabOrder {
    /// Numeric (occasionally string) order id.
    #[serde(default)]
    pub order_id: serde_json::Value,
    /// Status.
    pub status: OrderStatus,
    /// Net limit price.
    #[serde(default)]
    pub price: Option<Decimal>,
    /// Legs.
    #[serde(default)]
    pub order_leg_collection: Vec<SchwabOrderLegResponse>,
}

/// Leg of a listed order.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchwabOrderLegResponse {
    /// Contract.
    #[serde(default)]
    pub instrument: SchwabInstrument,
}

impl SchwabOrder {
    /// Convert to the port type; `None` when the id is unusable.
    #[must_use]
    pub fn into_broker_order(self) -> Option<BrokerOrder> {
        let id = id_text(&self.order_id)?;
        Some(BrokerOrder {
            id: BrokerId::new(id),
            status: self.status,
            legs: self
                .order_leg_collection
                .into_iter()
                .map(|leg| BrokerOrderLeg {
                    instrument: leg.instrument.fields(),
                    symbol: leg.instrument.symbol,
                })
                .collect(),
            price: self.price,
        })
    }
}

/// Order id from a JSON number or string.
#[must_use]
pub fn id_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

// ============================================================================
// Market Data Types
// ============================================================================

/// One entry of `GET /marketdata/v1/quotes`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchwabQuoteEntry {
    /// Quote block; some responses inline the fields instead.
    #[serde(default)]
    pub quote: Option<SchwabQuote>,
    /// Inline fields.
    #[serde(flatten)]
    pub inline: SchwabQuote,
}

/// Top-of-book fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchwabQuote {
    /// Best bid.
    #[serde(default, alias = "bid")]
    pub bid_price: Option<Decimal>,
    /// Best ask.
    #[serde(default, alias = "ask")]
    pub ask_price: Option<Decimal>,
}

impl SchwabQuoteEntry {
    /// Bid and ask, when both are present.
    #[must_use]
    pub fn to_quote(&self) -> Option<Quote> {
        let block = self.quote.as_ref().unwrap_or(&self.inline);
        Some(Quote::new(block.bid_price?, block.ask_price?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::option_position::{OptionRight, SpreadSide, Strike, VerticalSpec, build_vertical};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn order_body_matches_wire_format() {
        let structure = build_vertical(&VerticalSpec {
            root: "SPXW".to_string(),
            expiration: NaiveDate::from_ymd_opt(2025, 12, 19).unwrap(),
            right: OptionRight::Put,
            inner: Strike::from_points(5800),
            width: Strike::from_points(5),
            side: SpreadSide::Credit,
            quantity: 1,
        })
        .unwrap();
        let request = SpreadOrderRequest::net(&structure, 3, dec!(1.5));

        let body = serde_json::to_value(SchwabOrderRequest::from(&request)).unwrap();

        assert_eq!(body["orderType"], "NET_CREDIT");
        assert_eq!(body["price"], "1.50");
        assert_eq!(body["complexOrderStrategyType"], "VERTICAL");
        let legs = body["orderLegCollection"].as_array().unwrap();
        assert_eq!(legs[0]["instruction"], "BUY_TO_OPEN");
        assert_eq!(legs[0]["quantity"], 3);
        assert_eq!(legs[0]["instrument"]["symbol"], "SPXW  251219P05795000");
        assert_eq!(legs[1]["instruction"], "SELL_TO_OPEN");
    }

    #[test]
    fn opening_cash_prefers_initial_balances() {
        let account: SchwabAccountResponse = serde_json::from_value(serde_json::json!({
            "securitiesAccount": {
                "initialBalances": {"liquidationValue": 52000.5},
                "currentBalances": {"cashBalance": 1000}
            }
        }))
        .unwrap();
        assert_eq!(account.securities_account.opening_cash(), Some(dec!(52000.5)));
    }

    #[test]
    fn order_ids_accept_numbers_and_strings() {
        assert_eq!(id_text(&serde_json::json!(1004)), Some("1004".to_string()));
        assert_eq!(id_text(&serde_json::json!(" 77 ")), Some("77".to_string()));
        assert_eq!(id_text(&serde_json::json!(null)), None);
    }

    #[test]
    fn quote_entry_reads_nested_or_inline() {
        let nested: SchwabQuoteEntry =
            serde_json::from_value(serde_json::json!({"quote": {"bidPrice": 1.1, "askPrice": 1.3}}))
                .unwrap();
        assert_eq!(nested.to_quote(), Some(Quote::new(dec!(1.1), dec!(1.3))));
        let inline: SchwabQuoteEntry =
            serde_json::from_value(serde_json::json!({"bid": 0.5, "ask": 0.6})).unwrap();
        assert_eq!(inline.to_quote(), Some(Quote::new(dec!(0.5), dec!(0.6))));
        let empty: SchwabQuoteEntry = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(empty.to_quote(), None);
    }

    #[test]
    fn unknown_order_status_is_tolerated() {
        let order: SchwabOrder = serde_json::from_value(serde_json::json!({
            "orderId": 9, "status": "NEW_STATUS", "orderLegCollection": []
        }))
        .unwrap();
        assert_eq!(order.status, OrderStatus::Unknown);
        assert!(order.status.is_working());
    }
}
