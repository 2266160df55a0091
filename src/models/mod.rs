//! Data models for the TintWave application
//!
//! This module contains the core domain models organized by concern:
//! - Location: what the user asked for, and the inbound request body
//! - Weather: current conditions and condition descriptors
//! - Forecast: forecast series and the per-day digest

pub mod forecast;
pub mod location;
pub mod weather;

// Re-export all public types for convenient access
pub use forecast::{DIGEST_DAYS, ForecastEntry, ForecastSeries};
pub use location::{Coordinates, LocationQuery, WeatherRequest};
pub use weather::{ConditionDescriptor, CurrentConditions};
