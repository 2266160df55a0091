//! OpenWeatherMap client and response structures
//!
//! The client issues the raw GETs for the aggregation endpoint and memoizes
//! successful payloads for a short freshness window. The response structures
//! turn those payloads into [`CurrentConditions`] and [`ForecastSeries`] for
//! the lookup client.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryError, RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::{UpstreamResource, WeatherSource, build_upstream_url};
use crate::cache::ResponseCache;
use crate::config::TintwaveConfig;
use crate::models::{
    ConditionDescriptor, CurrentConditions, ForecastEntry, ForecastSeries, LocationQuery,
};
use crate::{Result, TintwaveError};

const USER_AGENT: &str = concat!("TintWave/", env!("CARGO_PKG_VERSION"));

/// HTTP client for the OpenWeatherMap 2.5 API
pub struct OpenWeatherMapClient {
    client: ClientWithMiddleware,
    base_url: String,
    api_key: String,
    cache: ResponseCache<Value>,
    cache_ttl: Duration,
}

impl OpenWeatherMapClient {
    /// Create a new client. Fails when no API key is configured.
    pub fn new(config: &TintwaveConfig) -> anyhow::Result<Self> {
        let api_key = config.validate_api_keys()?.to_string();

        let client = Client::builder()
            .timeout(config.weather.timeout())
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TintwaveError::config(format!("Failed to create HTTP client: {e}")))?;

        let retry_policy =
            ExponentialBackoff::builder().build_with_max_retries(config.weather.max_retries);
        let client = ClientBuilder::new(client)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            base_url: config.weather.base_url.clone(),
            api_key,
            cache: ResponseCache::new(config.cache.max_entries as usize),
            cache_ttl: config.cache.ttl(),
        })
    }

    fn url_for(&self, resource: UpstreamResource, query: &LocationQuery) -> String {
        build_upstream_url(&self.base_url, resource, query, &self.api_key)
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherMapClient {
    #[instrument(skip(self, resource, query), fields(resource = %resource, query = %query))]
    async fn fetch(&self, resource: UpstreamResource, query: &LocationQuery) -> Result<Value> {
        let key = query.cache_key(resource.path());
        if let Some(cached) = self.cache.get(&key).await {
            debug!("Serving {resource} from cache");
            return Ok(cached);
        }

        let start_time = Instant::now();
        let response = self
            .client
            .get(self.url_for(resource, query))
            .send()
            .await
            .map_err(|e| request_error(resource, e))?;

        let status = response.status();
        let payload: Value = response.json().await.map_err(|e| {
            if e.is_timeout() {
                TintwaveError::timeout(resource.path())
            } else {
                TintwaveError::upstream(resource.path(), format!("Invalid JSON body: {e}"))
            }
        })?;

        let elapsed = start_time.elapsed();
        info!(
            "Fetched {resource} with status {status} in {:.3}s",
            elapsed.as_secs_f64()
        );

        if status.is_success() {
            self.cache.put(&key, payload.clone(), self.cache_ttl).await;
        } else {
            warn!("Provider answered {status} for {resource}; forwarding body unchanged");
        }

        Ok(payload)
    }
}

fn request_error(resource: UpstreamResource, error: reqwest_middleware::Error) -> TintwaveError {
    if is_timeout(&error) {
        TintwaveError::timeout(resource.path())
    } else {
        TintwaveError::upstream(resource.path(), error.to_string())
    }
}

/// The retry middleware wraps every send error, even without retries, and its
/// transparent `source()` skips the `reqwest::Error` itself.
fn is_timeout(error: &reqwest_middleware::Error) -> bool {
    match error {
        reqwest_middleware::Error::Reqwest(e) => e.is_timeout(),
        reqwest_middleware::Error::Middleware(e) => match e.downcast_ref::<RetryError>() {
            Some(RetryError::Error(inner) | RetryError::WithRetries { err: inner, .. }) => {
                is_timeout(inner)
            }
            None => e
                .chain()
                .filter_map(|cause| cause.downcast_ref::<reqwest::Error>())
                .any(reqwest::Error::is_timeout),
        },
    }
}

/// Current weather response from OpenWeatherMap
#[derive(Debug, Deserialize)]
pub struct CurrentResponse {
    pub name: Option<String>,
    pub main: MainBlock,
    #[serde(default)]
    pub weather: Vec<ConditionBlock>,
}

/// 5-day / 3-hour forecast response from OpenWeatherMap
#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    #[serde(default)]
    pub list: Vec<ForecastItem>,
    pub city: Option<CityBlock>,
}

#[derive(Debug, Deserialize)]
pub struct ForecastItem {
    pub dt: i64,
    pub main: MainBlock,
    #[serde(default)]
    pub weather: Vec<ConditionBlock>,
}

#[derive(Debug, Deserialize)]
pub struct MainBlock {
    pub temp: f64,
}

#[derive(Debug, Deserialize)]
pub struct ConditionBlock {
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Deserialize)]
pub struct CityBlock {
    pub name: Option<String>,
    /// Shift in seconds from UTC
    pub timezone: Option<i32>,
}

impl From<ConditionBlock> for ConditionDescriptor {
    fn from(block: ConditionBlock) -> Self {
        Self {
            description: block.description,
            icon: block.icon,
        }
    }
}

fn conditions(blocks: Vec<ConditionBlock>, what: &str) -> Result<Vec<ConditionDescriptor>> {
    if blocks.is_empty() {
        return Err(TintwaveError::unexpected_payload(format!(
            "{what} has no condition descriptors"
        )));
    }
    Ok(blocks.into_iter().map(ConditionDescriptor::from).collect())
}

impl TryFrom<CurrentResponse> for CurrentConditions {
    type Error = TintwaveError;

    fn try_from(response: CurrentResponse) -> Result<Self> {
        Ok(Self {
            location_name: response.name.filter(|name| !name.is_empty()),
            temperature: response.main.temp,
            conditions: conditions(response.weather, "current conditions")?,
        })
    }
}

impl TryFrom<ForecastResponse> for ForecastSeries {
    type Error = TintwaveError;

    fn try_from(response: ForecastResponse) -> Result<Self> {
        let entries = response
            .list
            .into_iter()
            .map(|item| {
                Ok(ForecastEntry {
                    timestamp: item.dt,
                    temperature: item.main.temp,
                    conditions: conditions(item.weather, "forecast entry")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            entries,
            utc_offset_seconds: response.city.and_then(|city| city.timezone),
        })
    }
}

/// Detect an error the provider embedded in a payload, e.g.
/// `{"cod": "404", "message": "city not found"}`. `cod` arrives as a number
/// on success for current weather and as a string elsewhere.
#[must_use]
pub fn provider_error(payload: &Value) -> Option<TintwaveError> {
    let code = match payload.get("cod")? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }?;
    if code == 200 {
        return None;
    }

    let message = payload
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .unwrap_or("weather service error");
    Some(TintwaveError::provider(
        u16::try_from(code).unwrap_or(u16::MAX),
        message,
    ))
}

/// Parse a raw current-weather payload
pub fn parse_current(payload: &Value) -> Result<CurrentConditions> {
    if let Some(err) = provider_error(payload) {
        return Err(err);
    }
    let response = CurrentResponse::deserialize(payload)
        .map_err(|e| TintwaveError::unexpected_payload(format!("current conditions: {e}")))?;
    CurrentConditions::try_from(response)
}

/// Parse a raw forecast payload
pub fn parse_forecast(payload: &Value) -> Result<ForecastSeries> {
    if let Some(err) = provider_error(payload) {
        return Err(err);
    }
    let response = ForecastResponse::deserialize(payload)
        .map_err(|e| TintwaveError::unexpected_payload(format!("forecast: {e}")))?;
    ForecastSeries::try_from(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> TintwaveConfig {
        let mut config = TintwaveConfig::default();
        config.weather.api_key = Some("test_key".to_string());
        config.weather.base_url = server.uri();
        config
    }

    fn current_body() -> Value {
        json!({
            "cod": 200,
            "name": "Paris",
            "main": {"temp": 18.6},
            "weather": [{"description": "clear sky", "icon": "01d"}]
        })
    }

    #[test]
    fn test_new_requires_api_key() {
        let config = TintwaveConfig::default();
        assert!(OpenWeatherMapClient::new(&config).is_err());
    }

    #[tokio::test]
    async fn test_fetch_sends_key_units_and_city() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("appid", "test_key"))
            .and(query_param("units", "metric"))
            .and(query_param("q", "Paris"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenWeatherMapClient::new(&config_for(&server)).unwrap();
        let payload = client
            .fetch(UpstreamResource::Current, &LocationQuery::city("Paris"))
            .await
            .unwrap();
        assert_eq!(payload, current_body());
    }

    #[tokio::test]
    async fn test_successful_payload_is_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/forecast"))
            .and(query_param("lat", "48.85"))
            .and(query_param("lon", "2.35"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"cod": "200", "list": []})))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenWeatherMapClient::new(&config_for(&server)).unwrap();
        let query = LocationQuery::coordinates(48.85, 2.35);
        let first = client.fetch(UpstreamResource::Forecast, &query).await.unwrap();
        let second = client.fetch(UpstreamResource::Forecast, &query).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_provider_error_body_is_forwarded_and_not_cached() {
        let server = MockServer::start().await;
        let body = json!({"cod": "404", "message": "city not found"});
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(404).set_body_json(body.clone()))
            .expect(2)
            .mount(&server)
            .await;

        let client = OpenWeatherMapClient::new(&config_for(&server)).unwrap();
        let query = LocationQuery::city("Atlantis");
        for _ in 0..2 {
            let payload = client.fetch(UpstreamResource::Current, &query).await.unwrap();
            assert_eq!(payload, body);
        }
    }

    #[tokio::test]
    async fn test_non_json_body_is_an_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>bad gateway</html>"))
            .mount(&server)
            .await;

        let client = OpenWeatherMapClient::new(&config_for(&server)).unwrap();
        let err = client
            .fetch(UpstreamResource::Current, &LocationQuery::city("Paris"))
            .await
            .unwrap_err();
        assert!(matches!(err, TintwaveError::Upstream { .. }));
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(current_body())
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let mut config = config_for(&server);
        config.weather.timeout_seconds = 1;
        let client = OpenWeatherMapClient::new(&config).unwrap();
        let err = client
            .fetch(UpstreamResource::Current, &LocationQuery::city("Paris"))
            .await
            .unwrap_err();
        assert!(matches!(err, TintwaveError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_slow_provider_times_out_after_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(current_body())
                    .set_delay(Duration::from_secs(3)),
            )
            .expect(2)
            .mount(&server)
            .await;

        let mut config = config_for(&server);
        config.weather.timeout_seconds = 1;
        config.weather.max_retries = 1;
        let client = OpenWeatherMapClient::new(&config).unwrap();
        let err = client
            .fetch(UpstreamResource::Forecast, &LocationQuery::city("Paris"))
            .await
            .unwrap_err();
        assert!(matches!(err, TintwaveError::Timeout { ref resource } if resource == "forecast"));
    }

    #[tokio::test]
    async fn test_refused_connection_is_an_upstream_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let uri = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let mut config = TintwaveConfig::default();
        config.weather.api_key = Some("test_key".to_string());
        config.weather.base_url = uri;
        let client = OpenWeatherMapClient::new(&config).unwrap();
        let err = client
            .fetch(UpstreamResource::Current, &LocationQuery::city("Paris"))
            .await
            .unwrap_err();
        assert!(matches!(err, TintwaveError::Upstream { .. }));
    }

    #[rstest]
    #[case(json!({"cod": "404", "message": "city not found"}), Some(404))]
    #[case(json!({"cod": 401, "message": "Invalid API key"}), Some(401))]
    #[case(json!({"cod": 200, "main": {"temp": 1.0}}), None)]
    #[case(json!({"cod": "200", "list": []}), None)]
    #[case(json!({"main": {"temp": 1.0}}), None)]
    fn test_provider_error_detection(#[case] payload: Value, #[case] expected: Option<u16>) {
        let code = provider_error(&payload).map(|e| match e {
            TintwaveError::Provider { code, .. } => code,
            _ => 0,
        });
        assert_eq!(code, expected);
    }

    #[test]
    fn test_parse_current() {
        let current = parse_current(&current_body()).unwrap();
        assert_eq!(current.location_name.as_deref(), Some("Paris"));
        assert_eq!(current.rounded_temperature(), 19);
        assert_eq!(current.conditions[0].icon, "01d");
    }

    #[test]
    fn test_parse_current_rejects_empty_conditions() {
        let payload = json!({"name": "Paris", "main": {"temp": 1.0}, "weather": []});
        assert!(matches!(
            parse_current(&payload),
            Err(TintwaveError::UnexpectedPayload { .. })
        ));
    }

    #[test]
    fn test_parse_forecast_reads_timezone() {
        let payload = json!({
            "cod": "200",
            "list": [
                {"dt": 1_709_294_400, "main": {"temp": 10.2},
                 "weather": [{"description": "light rain", "icon": "10d"}]}
            ],
            "city": {"name": "Tokyo", "timezone": 32400}
        });
        let series = parse_forecast(&payload).unwrap();
        assert_eq!(series.entries.len(), 1);
        assert_eq!(series.utc_offset_seconds, Some(32400));
    }

    #[test]
    fn test_parse_forecast_surfaces_provider_error() {
        let payload = json!({"cod": "404", "message": "city not found"});
        let err = parse_forecast(&payload).unwrap_err();
        assert_eq!(err.user_message(), "City not found");
    }
}
