//! `TintWave` - current conditions and a 5-day forecast for a city or position
//!
//! This library provides the aggregation endpoint that fans out to
//! OpenWeatherMap, and the lookup client that turns its replies into view state.

pub mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use api::AppState;
pub use cache::ResponseCache;
pub use client::{ViewState, WeatherController, WeatherReport};
pub use config::TintwaveConfig;
pub use error::TintwaveError;
pub use models::{
    ConditionDescriptor, Coordinates, CurrentConditions, ForecastEntry, ForecastSeries,
    LocationQuery, WeatherRequest,
};
pub use weather::{AggregatedWeather, OpenWeatherMapClient, WeatherAggregator, WeatherSource};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, TintwaveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
