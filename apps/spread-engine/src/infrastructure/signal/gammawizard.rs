//! GammaWizard signal client.
//!
//! Fetches the LeoCross payload and pulls out the latest trade record. The
//! payload shape varies between endpoint versions, so the trade is located
//! by search rather than by a fixed path:
//!
//! 1. An object with a `Trade` key yields that value (the last element when
//!    it is a list).
//! 2. An object carrying any trade field (`Date`, `TDate`, `Limit`, ...) is
//!    itself the trade.
//! 3. Otherwise nested objects are searched in order and lists from the end.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::application::ports::{SignalError, SignalPort};
use crate::domain::option_position::Strike;
use crate::domain::signal::TradeSignal;
use crate::infrastructure::broker::retry::{RetryPolicy, StatusClass, classify_status, retry_after};

const TRADE_FIELDS: [&str; 8] = ["Date", "TDate", "Limit", "CLimit", "Cat1", "Cat2", "Put", "Call"];

/// GammaWizard client configuration.
#[derive(Debug, Clone)]
pub struct GammaWizardConfig {
    /// API host.
    pub base_url: String,
    /// Signal endpoint path.
    pub endpoint: String,
    /// Bearer token; a leading `Bearer ` and surrounding quotes are ignored.
    pub token: String,
    /// Request timeout.
    pub timeout: Duration,
    /// Retry policy for 429/5xx.
    pub retry: RetryPolicy,
}

impl GammaWizardConfig {
    /// Configuration for the public host.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            base_url: "https://gandalf.gammawizard.com".to_string(),
            endpoint: "/rapi/GetLeoCross".to_string(),
            token: token.into(),
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default().with_max_attempts(3),
        }
    }

    /// Point at another host.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.endpoint.trim_start_matches('/')
        )
    }
}

fn sanitize_token(raw: &str) -> String {
    let t = raw.trim().trim_matches('"').trim_matches('\'').trim();
    match t.get(..7) {
        Some(prefix) if prefix.eq_ignore_ascii_case("bearer ") => t[7..].trim().to_string(),
        _ => t.to_string(),
    }
}

/// HTTP signal source.
#[derive(Debug, Clone)]
pub struct GammaWizardSignal {
    client: Client,
    url: String,
    token: String,
    retry: RetryPolicy,
}

impl GammaWizardSignal {
    /// Build the client.
    pub fn new(config: &GammaWizardConfig) -> Result<Self, SignalError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SignalError::Unavailable {
                message: e.to_string(),
            })?;
        Ok(Self {
            client,
            url: config.url(),
            token: sanitize_token(&config.token),
            retry: config.retry.clone(),
        })
    }

    async fn fetch(&self) -> Result<Value, SignalError> {
        let mut backoff = self.retry.backoff();
        loop {
            let sent = self
                .client
                .get(&self.url)
                .bearer_auth(&self.token)
                .header("Accept", "application/json")
                .send()
                .await;
            let response = match sent {
                Ok(response) => response,
                Err(e) => {
                    if let Some(delay) = backoff.next_backoff() {
                        tracing::warn!(error = %e, delay_ms = delay.as_millis(), "Signal fetch failed, retrying");
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(SignalError::Unavailable {
                        message: e.to_string(),
                    });
                }
            };

            let status = response.status();
            if status.is_success() {
                return response.json().await.map_err(|e| SignalError::Malformed {
                    message: e.to_string(),
                });
            }
            if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
                return Err(SignalError::Unauthorized);
            }

            let delay = match classify_status(status) {
                StatusClass::RateLimited => backoff.next_after(retry_after(response.headers())),
                StatusClass::Retryable => backoff.next_backoff(),
                StatusClass::Permanent => None,
            };
            match delay {
                Some(delay) => {
                    tracing::warn!(status = status.as_u16(), delay_ms = delay.as_millis(), "Signal provider error, retrying");
                    tokio::time::sleep(delay).await;
                }
                None => {
                    return Err(SignalError::Unavailable {
                        message: format!("HTTP {}", status.as_u16()),
                    });
                }
            }
        }
    }
}

#[async_trait]
impl SignalPort for GammaWizardSignal {
    async fn latest_signal(&self) -> Result<TradeSignal, SignalError> {
        let payload = self.fetch().await?;
        let trade = extract_trade(&payload).ok_or(SignalError::NoTradePayload)?;
        let signal = parse_trade(trade)?;
        tracing::info!(
            signal_date = ?signal.signal_date,
            expiration = %signal.expiration,
            "Fetched LeoCross signal"
        );
        Ok(signal)
    }
}

/// Locate the latest trade record in a payload.
#[must_use]
pub fn extract_trade(payload: &Value) -> Option<&Map<String, Value>> {
    match payload {
        Value::Object(map) => {
            if let Some(trade) = map.get("Trade") {
                return match trade {
                    Value::Array(items) => items.last().and_then(Value::as_object),
                    Value::Object(obj) => Some(obj),
                    _ => None,
                }
                .filter(|obj| !obj.is_empty());
            }
            if TRADE_FIELDS.iter().any(|k| map.contains_key(*k)) {
                return Some(map);
            }
            map.values()
                .filter(|v| v.is_object() || v.is_array())
                .find_map(extract_trade)
        }
        Value::Array(items) => items.iter().rev().find_map(extract_trade),
        _ => None,
    }
}

/// Convert a trade record into a [`TradeSignal`].
pub fn parse_trade(trade: &Map<String, Value>) -> Result<TradeSignal, SignalError> {
    let expiration = field_date(trade, "TDate")?.ok_or_else(|| malformed("TDate missing"))?;
    let inner_put = field_strike(trade, "Limit")?;
    let inner_call = field_strike(trade, "CLimit")?;
    Ok(TradeSignal {
        signal_date: field_date(trade, "Date").ok().flatten(),
        expiration,
        inner_put,
        inner_call,
        cat1: field_decimal(trade, "Cat1"),
        cat2: field_decimal(trade, "Cat2"),
    })
}

fn malformed(message: impl Into<String>) -> SignalError {
    SignalError::Malformed {
        message: message.into(),
    }
}

fn field_decimal(trade: &Map<String, Value>, key: &str) -> Option<Decimal> {
    match trade.get(key)? {
        Value::Number(n) => n.to_string().parse().ok(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn field_strike(trade: &Map<String, Value>, key: &str) -> Result<Strike, SignalError> {
    field_decimal(trade, key)
        .and_then(Strike::from_decimal)
        .filter(|s| s.is_positive())
        .ok_or_else(|| malformed(format!("{key} is not a strike")))
}

fn field_date(trade: &Map<String, Value>, key: &str) -> Result<Option<NaiveDate>, SignalError> {
    let Some(raw) = trade.get(key).and_then(Value::as_str) else {
        return Ok(None);
    };
    let head = raw.trim().get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(head, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| malformed(format!("{key} is not a date: {raw}")))
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn trade() -> Value {
        json!({"Date": "2025-12-18", "TDate": "2025-12-19T00:00:00", "Limit": 5800, "CLimit": "5900", "Cat1": 0.41, "Cat2": 0.58})
    }

    #[test]
    fn trade_key_takes_last_list_element() {
        let payload = json!({"Trade": [{"Limit": 1}, {"Limit": 2}]});
        assert_eq!(extract_trade(&payload).unwrap()["Limit"], 2);
    }

    #[test]
    fn bare_trade_object_is_found() {
        let payload = trade();
        assert!(extract_trade(&payload).is_some());
    }

    #[test]
    fn nested_lists_search_from_the_end() {
        let payload = json!({"data": [{"Date": "old", "Limit": 1}, {"meta": 1}, {"Date": "new", "Limit": 2}]});
        assert_eq!(extract_trade(&payload).unwrap()["Date"], "new");
    }

    #[test]
    fn no_trade_anywhere() {
        assert!(extract_trade(&json!({"status": "ok", "items": []})).is_none());
        assert!(extract_trade(&json!({"Trade": []})).is_none());
    }

    #[test]
    fn parses_trade_fields() {
        let payload = trade();
        let signal = parse_trade(extract_trade(&payload).unwrap()).unwrap();
        assert_eq!(signal.expiration, NaiveDate::from_ymd_opt(2025, 12, 19).unwrap());
        assert_eq!(signal.signal_date, NaiveDate::from_ymd_opt(2025, 12, 18));
        assert_eq!(signal.inner_put, Strike::from_points(5800));
        assert_eq!(signal.inner_call, Strike::from_points(5900));
        assert_eq!(signal.cat1, Some(dec!(0.41)));
    }

    #[test]
    fn missing_strike_is_malformed() {
        let payload = json!({"TDate": "2025-12-19", "Limit": 5800});
        let err = parse_trade(extract_trade(&payload).unwrap()).unwrap_err();
        assert!(matches!(err, SignalError::Malformed { .. }));
    }

    #[test]
    fn token_is_sanitized() {
        assert_eq!(sanitize_token(" \"Bearer abc\" "), "abc");
        assert_eq!(sanitize_token("abc"), "abc");
    }

    #[tokio::test]
    async fn fetches_with_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rapi/GetLeoCross"))
            .and(header("Authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Trade": [trade()]})))
            .mount(&server)
            .await;

        let client = GammaWizardSignal::new(&GammaWizardConfig::new("Bearer tok").with_base_url(server.uri())).unwrap();
        let signal = client.latest_signal().await.unwrap();
        assert_eq!(signal.inner_call, Strike::from_points(5900));
    }

    #[tokio::test]
    async fn unauthorized_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let client = GammaWizardSignal::new(&GammaWizardConfig::new("tok").with_base_url(server.uri())).unwrap();
        assert_eq!(client.latest_signal().await.unwrap_err(), SignalError::Unauthorized);
    }

    #[tokio::test]
    async fn empty_payload_is_no_trade() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"Trade": []})))
            .mount(&server)
            .await;

        let client = GammaWizardSignal::new(&GammaWizardConfig::new("tok").with_base_url(server.uri())).unwrap();
        assert_eq!(client.latest_signal().await.unwrap_err(), SignalError::NoTradePayload);
    }
}
