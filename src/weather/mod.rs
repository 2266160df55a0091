//! Upstream weather provider access and the two-resource aggregation

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::Result;
use crate::models::LocationQuery;

pub mod openweathermap;

pub use openweathermap::OpenWeatherMapClient;

/// Unit system requested from the provider. Temperatures are rendered as °C.
pub const UNITS: &str = "metric";

/// The two provider resources fetched for every lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpstreamResource {
    /// Current conditions
    Current,
    /// 5-day forecast at 3-hour resolution
    Forecast,
}

impl UpstreamResource {
    /// Path segment below the provider base URL
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            UpstreamResource::Current => "weather",
            UpstreamResource::Forecast => "forecast",
        }
    }
}

impl fmt::Display for UpstreamResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Build the provider URL for one resource. Both resources go through here
/// so the query forms cannot drift apart.
#[must_use]
pub fn build_upstream_url(
    base_url: &str,
    resource: UpstreamResource,
    query: &LocationQuery,
    api_key: &str,
) -> String {
    format!(
        "{}/{}?appid={}&units={}&{}",
        base_url.trim_end_matches('/'),
        resource.path(),
        urlencoding::encode(api_key),
        UNITS,
        query.query_string()
    )
}

/// Source of raw provider payloads
#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Fetch one resource for the query. The payload is returned as the
    /// provider sent it, including provider-side error bodies.
    async fn fetch(&self, resource: UpstreamResource, query: &LocationQuery) -> Result<Value>;
}

/// Combined reply of the aggregation endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedWeather {
    pub weather: Value,
    pub forecast: Value,
}

/// Fans a lookup out to both provider resources concurrently
#[derive(Clone)]
pub struct WeatherAggregator {
    source: Arc<dyn WeatherSource>,
}

impl WeatherAggregator {
    pub fn new(source: Arc<dyn WeatherSource>) -> Self {
        Self { source }
    }

    /// Both fetches must succeed; the first failure fails the lookup.
    #[instrument(skip(self, query), fields(query = %query))]
    pub async fn aggregate(&self, query: &LocationQuery) -> Result<AggregatedWeather> {
        let started = Instant::now();

        let joined = futures::try_join!(
            self.source.fetch(UpstreamResource::Current, query),
            self.source.fetch(UpstreamResource::Forecast, query),
        );

        let (weather, forecast) = joined.inspect_err(|e| warn!("Aggregation failed: {e}"))?;

        debug!(
            "Aggregated current conditions and forecast in {:.3}s",
            started.elapsed().as_secs_f64()
        );

        Ok(AggregatedWeather { weather, forecast })
    }
}
