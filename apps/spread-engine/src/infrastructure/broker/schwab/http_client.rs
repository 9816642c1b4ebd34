//! HTTP client wrapper with retry logic.

use reqwest::header::{HeaderMap, LOCATION};
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::api_types::id_text;
use super::config::SchwabConfig;
use super::error::SchwabError;
use crate::infrastructure::broker::retry::{RetryPolicy, StatusClass, classify_status, retry_after};

/// Response to a create/replace call: Schwab answers 201 with the new
/// order's URL in `Location`, sometimes with a JSON body as well.
#[derive(Debug, Clone)]
pub struct Created {
    location: Option<String>,
    body: String,
}

impl Created {
    /// Order id from the body's `orderId`, else the last `Location` segment.
    pub fn order_id(&self) -> Option<String> {
        serde_json::from_str::<serde_json::Value>(&self.body)
            .ok()
            .and_then(|json| json.get("orderId").and_then(id_text))
            .or_else(|| {
                self.location
                    .as_deref()
                    .map(|loc| loc.trim_end_matches('/'))
                    .and_then(|loc| loc.rsplit('/').next())
                    .filter(|id| !id.is_empty())
                    .map(str::to_string)
            })
    }
}

/// HTTP client for the Schwab APIs.
#[derive(Debug, Clone)]
pub struct SchwabHttpClient {
    client: Client,
    base_url: String,
    access_token: String,
    retry: RetryPolicy,
}

impl SchwabHttpClient {
    /// Create a new HTTP client from config.
    pub fn new(config: &SchwabConfig) -> Result<Self, SchwabError> {
        if config.access_token.trim().is_empty() {
            return Err(SchwabError::AuthenticationFailed(
                "no access token configured".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SchwabError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            access_token: config.access_token.trim().to_string(),
            retry: config.retry.clone(),
        })
    }

    /// GET and decode JSON.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, SchwabError> {
        let (_, body) = self
            .request(Method::GET, path, query, None::<&()>)
            .await?;
        serde_json::from_str(&body).map_err(|e| SchwabError::JsonParse(e.to_string()))
    }

    /// POST a JSON body.
    pub async fn post<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<Created, SchwabError> {
        let (headers, body) = self.request(Method::POST, path, &[], Some(body)).await?;
        Ok(created(&headers, body))
    }

    /// PUT a JSON body.
    pub async fn put<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<Created, SchwabError> {
        let (headers, body) = self.request(Method::PUT, path, &[], Some(body)).await?;
        Ok(created(&headers, body))
    }

    /// DELETE.
    pub async fn delete(&self, path: &str) -> Result<(), SchwabError> {
        self.request(Method::DELETE, path, &[], None::<&()>).await?;
        Ok(())
    }

    /// Send with retries; returns headers and body text of a 2xx response.
    async fn request<B: Serialize + Sync>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<(HeaderMap, String), SchwabError> {
        let url = format!("{}{path}", self.base_url);
        let mut backoff = self.retry.backoff();

        loop {
            let mut request = self
                .client
                .request(method.clone(), &url)
                .bearer_auth(&self.access_token)
                .header("Accept", "application/json");
            if !query.is_empty() {
                request = request.query(query);
            }
            if let Some(b) = body {
                request = request.json(b);
            }

            let response = match request.send().await {
                Ok(resp) => resp,
                Err(e) => {
                    if let Some(delay) = backoff.next_backoff() {
                        tracing::warn!(
                            error = %e,
                            method = %method,
                            path,
                            delay_ms = delay.as_millis(),
                            attempt = backoff.attempt(),
                            "Network error, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(SchwabError::Network(e.to_string()));
                }
            };

            let status = response.status();
            let headers = response.headers().clone();
            let text = response
                .text()
                .await
                .map_err(|e| SchwabError::Network(e.to_string()))?;

            if status.is_success() {
                return Ok((headers, text));
            }

            let server_delay = retry_after(&headers);
            match classify_status(status) {
                StatusClass::RateLimited => {
                    if let Some(delay) = backoff.next_after(server_delay) {
                        tracing::warn!(
                            path,
                            delay_ms = delay.as_millis(),
                            attempt = backoff.attempt(),
                            "Rate limited, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(SchwabError::RateLimited {
                        retry_after_secs: server_delay.map(|d| d.as_secs()),
                    });
                }
                StatusClass::Retryable => {
                    if let Some(delay) = backoff.next_backoff() {
                        tracing::warn!(
                            status = status.as_u16(),
                            path,
                            delay_ms = delay.as_millis(),
                            attempt = backoff.attempt(),
                            "Retryable error, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(SchwabError::Server {
                        status: status.as_u16(),
                        message: text,
                    });
                }
                StatusClass::Permanent => {
                    return Err(match status {
                        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                            SchwabError::AuthenticationFailed(text)
                        }
                        StatusCode::NOT_FOUND => SchwabError::NotFound {
                            path: path.to_string(),
                        },
                        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                            SchwabError::OrderRejected(text)
                        }
                        _ => SchwabError::Api {
                            status: status.as_u16(),
                            message: text,
                        },
                    });
                }
            }
        }
    }
}

fn created(headers: &HeaderMap, body: String) -> Created {
    Created {
        location: headers
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn created_with(location: Option<&str>, body: &str) -> Created {
        Created {
            location: location.map(str::to_string),
            body: body.to_string(),
        }
    }

    #[test]
    fn order_id_prefers_body() {
        let c = created_with(Some("/orders/2"), r#"{"orderId": 1}"#);
        assert_eq!(c.order_id().as_deref(), Some("1"));
    }

    #[test]
    fn order_id_falls_back_to_location() {
        let c = created_with(
            Some("https://api.schwabapi.com/trader/v1/accounts/H/orders/1005/"),
            "",
        );
        assert_eq!(c.order_id().as_deref(), Some("1005"));
    }

    #[test]
    fn order_id_missing() {
        assert_eq!(created_with(None, "").order_id(), None);
    }

    #[test]
    fn empty_token_is_rejected() {
        let err = SchwabHttpClient::new(&SchwabConfig::new("  ")).unwrap_err();
        assert!(matches!(err, SchwabError::AuthenticationFailed(_)));
    }
}
