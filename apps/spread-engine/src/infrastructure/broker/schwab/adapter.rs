//! Schwab broker adapter implementing BrokerPort.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::SecondsFormat;
use rust_decimal::Decimal;
use tokio::sync::OnceCell;

use crate::application::ports::{
    BrokerError, BrokerOrder, BrokerPort, BrokerPosition, OrderWindow, SpreadOrderRequest,
};
use crate::domain::execution::Quote;
use crate::domain::option_position::{CanonicalLegKey, OptionSymbol};
use crate::domain::shared::BrokerId;

use super::api_types::{
    SchwabAccountNumber, SchwabAccountResponse, SchwabOrder, SchwabOrderRequest, SchwabQuoteEntry,
};
use super::config::SchwabConfig;
use super::error::SchwabError;
use super::http_client::SchwabHttpClient;

const TRADER: &str = "/trader/v1";
const MARKET_DATA: &str = "/marketdata/v1";

/// Schwab broker adapter.
#[derive(Debug)]
pub struct SchwabBrokerAdapter {
    client: SchwabHttpClient,
    account_number: Option<String>,
    account_hash: OnceCell<String>,
    max_orders: u32,
}

impl SchwabBrokerAdapter {
    /// Create a new Schwab broker adapter.
    pub fn new(config: SchwabConfig) -> Result<Self, SchwabError> {
        let client = SchwabHttpClient::new(&config)?;
        Ok(Self {
            client,
            account_number: config.account_number,
            account_hash: OnceCell::new_with(config.account_hash),
            max_orders: config.max_orders,
        })
    }

    async fn account_hash(&self) -> Result<&str, SchwabError> {
        let hash = self
            .account_hash
            .get_or_try_init(|| async {
                let accounts: Vec<SchwabAccountNumber> = self
                    .client
                    .get(&format!("{TRADER}/accounts/accountNumbers"), &[])
                    .await?;
                let chosen = match &self.account_number {
                    Some(number) => accounts.into_iter().find(|a| &a.account_number == number),
                    None => accounts.into_iter().next(),
                };
                let hash = chosen
                    .map(|a| a.hash_value)
                    .ok_or_else(|| {
                        SchwabError::AccountNotFound(
                            self.account_number.clone().unwrap_or_else(|| "any".to_string()),
                        )
                    })?;
                tracing::info!("Resolved Schwab account hash");
                Ok::<_, SchwabError>(hash)
            })
            .await?;
        Ok(hash.as_str())
    }

    async fn account(&self, with_positions: bool) -> Result<SchwabAccountResponse, SchwabError> {
        let hash = self.account_hash().await?;
        let query = if with_positions {
            vec![("fields", "positions".to_string())]
        } else {
            Vec::new()
        };
        self.client
            .get(&format!("{TRADER}/accounts/{hash}"), &query)
            .await
    }

    async fn orders_path(&self) -> Result<String, SchwabError> {
        Ok(format!("{TRADER}/accounts/{}/orders", self.account_hash().await?))
    }
}

#[async_trait]
impl BrokerPort for SchwabBrokerAdapter {
    async fn get_positions(&self) -> Result<Vec<BrokerPosition>, BrokerError> {
        let account = self.account(true).await?;
        let positions: Vec<BrokerPosition> = account
            .securities_account
            .positions
            .into_iter()
            .map(BrokerPosition::from)
            .collect();
        tracing::debug!(count = positions.len(), "Fetched positions");
        Ok(positions)
    }

    async fn list_orders(&self, window: OrderWindow) -> Result<Vec<BrokerOrder>, BrokerError> {
        let path = self.orders_path().await?;
        let query = [
            (
                "fromEnteredTime",
                window.from.to_rfc3339_opts(SecondsFormat::Millis, true),
            ),
            (
                "toEnteredTime",
                window.to.to_rfc3339_opts(SecondsFormat::Millis, true),
            ),
            ("maxResults", self.max_orders.to_string()),
        ];
        let orders: Vec<SchwabOrder> = self.client.get(&path, &query).await?;
        let total = orders.len();
        let orders: Vec<BrokerOrder> = orders
            .into_iter()
            .filter_map(SchwabOrder::into_broker_order)
            .collect();
        if orders.len() < total {
            tracing::warn!(dropped = total - orders.len(), "Orders without usable ids ignored");
        }
        Ok(orders)
    }

    async fn get_quote(&self, symbol: &OptionSymbol) -> Result<Quote, BrokerError> {
        let quotes = self.get_quotes(std::slice::from_ref(symbol)).await?;
        quotes
            .get(symbol.key())
            .copied()
            .ok_or_else(|| BrokerError::InvalidResponse {
                message: format!("no quote returned for {symbol}"),
            })
    }

    async fn get_quotes(
        &self,
        symbols: &[OptionSymbol],
    ) -> Result<HashMap<CanonicalLegKey, Quote>, BrokerError> {
        if symbols.is_empty() {
            return Ok(HashMap::new());
        }
        let joined = symbols
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let entries: HashMap<String, serde_json::Value> = self
            .client
            .get(&format!("{MARKET_DATA}/quotes"), &[("symbols", joined)])
            .await?;

        let mut quotes = HashMap::with_capacity(symbols.len());
        for (raw, value) in entries {
            let Ok(symbol) = OptionSymbol::parse(&raw) else {
                continue;
            };
            let quote = serde_json::from_value::<SchwabQuoteEntry>(value)
                .ok()
                .and_then(|entry| entry.to_quote());
            if let Some(quote) = quote {
                quotes.insert(*symbol.key(), quote);
            }
        }
        Ok(quotes)
    }

    async fn place_order(&self, order: &SpreadOrderRequest) -> Result<BrokerId, BrokerError> {
        let body = SchwabOrderRequest::from(order);
        tracing::info!(
            order_type = body.order_type,
            strategy = body.complex_order_strategy_type,
            price = %body.price,
            quantity = order.quantity(),
            "Submitting order to Schwab"
        );
        let created = self.client.post(&self.orders_path().await?, &body).await?;
        let id = created.order_id().ok_or(SchwabError::MissingOrderId)?;
        Ok(BrokerId::new(id))
    }

    async fn replace_order(
        &self,
        order_id: &BrokerId,
        order: &SpreadOrderRequest,
    ) -> Result<BrokerId, BrokerError> {
        let body = SchwabOrderRequest::from(order);
        let path = format!("{}/{}", self.orders_path().await?, order_id.as_str());
        tracing::info!(
            order_id = %order_id,
            price = %body.price,
            quantity = order.quantity(),
            "Replacing order at Schwab"
        );
        let created = self.client.put(&path, &body).await?;
        match created.order_id() {
            Some(id) => Ok(BrokerId::new(id)),
            None => {
                tracing::warn!(order_id = %order_id, "Replace response carried no new id");
                Ok(order_id.clone())
            }
        }
    }

    async fn cancel_order(&self, order_id: &BrokerId) -> Result<(), BrokerError> {
        let path = format!("{}/{}", self.orders_path().await?, order_id.as_str());
        self.client.delete(&path).await?;
        Ok(())
    }

    async fn get_account_cash(&self) -> Result<Decimal, BrokerError> {
        let account = self.account(false).await?;
        account
            .securities_account
            .opening_cash()
            .ok_or_else(|| BrokerError::InvalidResponse {
                message: "account has no cash balance fields".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::domain::option_position::{
        OptionRight, SpreadSide, Strike, VerticalSpec, build_vertical,
    };
    use crate::domain::reconciliation::OrderStatus;
    use crate::infrastructure::broker::retry::RetryPolicy;

    fn adapter(server: &MockServer) -> SchwabBrokerAdapter {
        let retry = RetryPolicy::default()
            .with_max_attempts(3)
            .with_backoff(Duration::from_millis(1), Duration::from_millis(5));
        SchwabBrokerAdapter::new(
            SchwabConfig::new("tok")
                .with_base_url(server.uri())
                .with_account_hash("HASH")
                .with_retry(retry),
        )
        .unwrap()
    }

    fn request() -> SpreadOrderRequest {
        let structure = build_vertical(&VerticalSpec {
            root: "SPXW".to_string(),
            expiration: NaiveDate::from_ymd_opt(2025, 12, 19).unwrap(),
            right: OptionRight::Call,
            inner: Strike::from_points(5900),
            width: Strike::from_points(5),
            side: SpreadSide::Credit,
            quantity: 1,
        })
        .unwrap();
        SpreadOrderRequest::net(&structure, 2, dec!(1.25))
    }

    #[tokio::test]
    async fn place_order_reads_location_header() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/trader/v1/accounts/HASH/orders"))
            .and(header("Authorization", "Bearer tok"))
            .and(body_partial_json(json!({"orderType": "NET_CREDIT", "price": "1.25"})))
            .respond_with(ResponseTemplate::new(201).insert_header(
                "Location",
                "https://api.schwabapi.com/trader/v1/accounts/HASH/orders/4242",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let id = adapter(&server).place_order(&request()).await.unwrap();
        assert_eq!(id.as_str(), "4242");
    }

    #[tokio::test]
    async fn server_errors_are_retried() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/trader/v1/accounts/HASH/orders/7"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/trader/v1/accounts/HASH/orders/7"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        adapter(&server)
            .cancel_order(&BrokerId::new("7"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn rate_limit_exhaustion_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/trader/v1/accounts/HASH"))
            .respond_with(ResponseTemplate::new(429))
            .expect(3)
            .mount(&server)
            .await;

        let err = adapter(&server).get_positions().await.unwrap_err();
        assert!(matches!(err, BrokerError::RateLimited { .. }));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn auth_failure_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/trader/v1/accounts/HASH"))
            .respond_with(ResponseTemplate::new(401).set_body_string("expired"))
            .expect(1)
            .mount(&server)
            .await;

        let err = adapter(&server).get_account_cash().await.unwrap_err();
        assert!(matches!(err, BrokerError::AuthenticationFailed { .. }));
    }

    #[tokio::test]
    async fn positions_and_orders_are_mapped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/trader/v1/accounts/HASH"))
            .and(query_param("fields", "positions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "securitiesAccount": {
                    "positions": [{
                        "longQuantity": 0, "shortQuantity": 2,
                        "instrument": {"symbol": "SPXW  251219C05900000", "assetType": "OPTION", "putCall": "CALL"}
                    }]
                }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/trader/v1/accounts/HASH/orders"))
            .and(query_param("maxResults", "200"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"orderId": 11, "status": "WORKING", "price": 1.3,
                 "orderLegCollection": [{"instrument": {"symbol": "SPXW  251219C05900000"}}]},
                {"status": "FILLED"}
            ])))
            .mount(&server)
            .await;

        let adapter = adapter(&server);
        let positions = adapter.get_positions().await.unwrap();
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].net_quantity(), dec!(-2));

        let orders = adapter
            .list_orders(OrderWindow::lookback(Duration::from_secs(3600)))
            .await
            .unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].id.as_str(), "11");
        assert_eq!(orders[0].status, OrderStatus::Working);
    }

    #[tokio::test]
    async fn quotes_are_keyed_by_contract() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/marketdata/v1/quotes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "SPXW  251219C05900000": {"quote": {"bidPrice": 2.1, "askPrice": 2.3}},
                "SPXW  251219C05905000": {"quote": {"bidPrice": 1.0}}
            })))
            .mount(&server)
            .await;

        let req = request();
        let symbols: Vec<OptionSymbol> = req.structure.legs().iter().map(|l| l.symbol.clone()).collect();
        let quotes = adapter(&server).get_quotes(&symbols).await.unwrap();

        assert_eq!(quotes.len(), 1);
        let inner = symbols.iter().find(|s| s.strike() == Strike::from_points(5900)).unwrap();
        assert_eq!(quotes[inner.key()], Quote::new(dec!(2.1), dec!(2.3)));
    }

    #[tokio::test]
    async fn account_hash_is_resolved_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/trader/v1/accounts/accountNumbers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"accountNumber": "111", "hashValue": "H1"},
                {"accountNumber": "222", "hashValue": "H2"}
            ])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/trader/v1/accounts/H2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "securitiesAccount": {"currentBalances": {"cashAvailableForTrading": 8000}}
            })))
            .expect(2)
            .mount(&server)
            .await;

        let adapter = SchwabBrokerAdapter::new(
            SchwabConfig::new("tok")
                .with_base_url(server.uri())
                .with_account_number("222"),
        )
        .unwrap();
        assert_eq!(adapter.get_account_cash().await.unwrap(), dec!(8000));
        assert_eq!(adapter.get_account_cash().await.unwrap(), dec!(8000));
    }
}
