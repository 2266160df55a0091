use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::config::ClientConfig;
use crate::models::{LocationQuery, WeatherRequest};
use crate::weather::AggregatedWeather;
use crate::{Result, TintwaveError};

/// Fallback when a non-success reply carries no usable `error` field
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error";

/// Anything that answers a lookup with the aggregated payloads
#[async_trait]
pub trait WeatherEndpoint: Send + Sync {
    async fn lookup(&self, query: &LocationQuery) -> Result<AggregatedWeather>;
}

/// Calls a running aggregation endpoint over HTTP
pub struct HttpWeatherEndpoint {
    client: Client,
    url: String,
}

impl HttpWeatherEndpoint {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| TintwaveError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: format!("{}/api/weather", config.endpoint.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl WeatherEndpoint for HttpWeatherEndpoint {
    async fn lookup(&self, query: &LocationQuery) -> Result<AggregatedWeather> {
        debug!("POST {} for {query}", self.url);
        let response = self
            .client
            .post(&self.url)
            .json(&WeatherRequest::from(query))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TintwaveError::timeout("endpoint")
                } else {
                    TintwaveError::upstream("endpoint", e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body: Option<Value> = response.json().await.ok();
            let message = body
                .as_ref()
                .and_then(|b| b.get("error"))
                .and_then(Value::as_str)
                .filter(|m| !m.is_empty())
                .unwrap_or(UNKNOWN_ERROR_MESSAGE);
            return Err(TintwaveError::endpoint(status.as_u16(), message));
        }

        response
            .json()
            .await
            .map_err(|e| TintwaveError::unexpected_payload(format!("endpoint reply: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn endpoint_for(server: &MockServer) -> HttpWeatherEndpoint {
        HttpWeatherEndpoint::new(&ClientConfig {
            endpoint: server.uri(),
            timeout_seconds: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_lookup_posts_city_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/weather"))
            .and(body_json(json!({"city": "Paris"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"weather": {"cod": 200}, "forecast": {"cod": "200"}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let reply = endpoint_for(&server)
            .lookup(&LocationQuery::city("Paris"))
            .await
            .unwrap();
        assert_eq!(reply.weather, json!({"cod": 200}));
    }

    #[tokio::test]
    async fn test_error_field_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(500).set_body_json(json!({"error": "Server error"})),
            )
            .mount(&server)
            .await;

        let err = endpoint_for(&server)
            .lookup(&LocationQuery::coordinates(1.0, 2.0))
            .await
            .unwrap_err();
        assert!(matches!(err, TintwaveError::Endpoint { status: 500, .. }));
        assert_eq!(err.user_message(), "Server error");
    }

    #[tokio::test]
    async fn test_missing_error_field_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&server)
            .await;

        let err = endpoint_for(&server)
            .lookup(&LocationQuery::city("Paris"))
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Unknown error");
    }
}
