//! Lookup client: the view state and the request orchestration around it
//!
//! [`WeatherController`] owns the query text and a single [`ViewState`]. It
//! talks to the aggregation endpoint through [`WeatherEndpoint`] and obtains
//! the device position through [`Geolocator`], so both can be swapped in tests.

pub mod endpoint;
pub mod geolocation;
pub mod render;

use tracing::{debug, info, warn};

use crate::models::{CurrentConditions, ForecastEntry, ForecastSeries, LocationQuery};
use crate::weather::AggregatedWeather;
use crate::weather::openweathermap::{parse_current, parse_forecast};
use crate::Result;

pub use endpoint::{HttpWeatherEndpoint, WeatherEndpoint};
pub use geolocation::{FixedPosition, Geolocator};

pub const MANUAL_ENTRY_PROMPT: &str = "Please enter a city manually.";
pub const EMPTY_CITY_MESSAGE: &str = "Please enter a city name";

/// Typed result of one successful lookup
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub current: CurrentConditions,
    pub forecast: ForecastSeries,
}

impl WeatherReport {
    /// Interpret the endpoint envelope. Provider errors hidden inside the
    /// payloads surface here as [`crate::TintwaveError::Provider`].
    pub fn from_aggregate(aggregated: &AggregatedWeather) -> Result<Self> {
        Ok(Self {
            current: parse_current(&aggregated.weather)?,
            forecast: parse_forecast(&aggregated.forecast)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ViewState {
    #[default]
    Idle,
    Loading,
    Ready(WeatherReport),
    Failed(String),
}

pub struct WeatherController<E> {
    endpoint: E,
    city: String,
    state: ViewState,
}

impl<E: WeatherEndpoint> WeatherController<E> {
    pub fn new(endpoint: E) -> Self {
        Self {
            endpoint,
            city: String::new(),
            state: ViewState::Idle,
        }
    }

    #[must_use]
    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn set_city<S: Into<String>>(&mut self, city: S) {
        self.city = city.into();
    }

    #[must_use]
    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Advisory in-flight flag
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self.state, ViewState::Loading)
    }

    #[must_use]
    pub fn report(&self) -> Option<&WeatherReport> {
        match &self.state {
            ViewState::Ready(report) => Some(report),
            _ => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match &self.state {
            ViewState::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// Derived from the stored forecast on every call
    #[must_use]
    pub fn daily_digest(&self) -> Vec<&ForecastEntry> {
        self.report()
            .map(|report| report.forecast.daily_digest())
            .unwrap_or_default()
    }

    /// Try the device position once; fall back to asking for a city.
    pub async fn mount<G: Geolocator + ?Sized>(&mut self, geolocator: &G) {
        match geolocator.current_position().await {
            Ok(position) => {
                info!("Got location: {}", position.format_coordinates());
                self.fetch(LocationQuery::Coordinates(position)).await;
            }
            Err(e) => {
                debug!("Geolocation unavailable: {e}");
                self.state = ViewState::Failed(MANUAL_ENTRY_PROMPT.to_string());
            }
        }
    }

    /// Form submission: look up the typed city
    pub async fn submit(&mut self) {
        let city = self.city.trim();
        if city.is_empty() {
            self.state = ViewState::Failed(EMPTY_CITY_MESSAGE.to_string());
            return;
        }
        let query = LocationQuery::city(city);
        self.fetch(query).await;
    }

    /// Shared by both triggers. Every path leaves `Loading`.
    pub async fn fetch(&mut self, query: LocationQuery) {
        self.state = ViewState::Loading;

        let outcome = match self.endpoint.lookup(&query).await {
            Ok(aggregated) => WeatherReport::from_aggregate(&aggregated),
            Err(e) => Err(e),
        };

        self.state = match outcome {
            Ok(report) => {
                if query.is_coordinates() {
                    if let Some(name) = &report.current.location_name {
                        self.city = name.clone();
                    }
                }
                ViewState::Ready(report)
            }
            Err(e) => {
                warn!("Weather lookup for {query} failed: {e}");
                ViewState::Failed(e.user_message())
            }
        };
    }
}
