//! Location query model and inbound request shape

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TintwaveError;

/// Geographic position in decimal degrees
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// What the user asked the weather for: a free-text city or a position
#[derive(Debug, Clone, PartialEq)]
pub enum LocationQuery {
    City(String),
    Coordinates(Coordinates),
}

impl LocationQuery {
    pub fn city<S: Into<String>>(name: S) -> Self {
        Self::City(name.into())
    }

    #[must_use]
    pub fn coordinates(latitude: f64, longitude: f64) -> Self {
        Self::Coordinates(Coordinates::new(latitude, longitude))
    }

    #[must_use]
    pub fn is_coordinates(&self) -> bool {
        matches!(self, Self::Coordinates(_))
    }

    /// Provider query parameters for this location, already URL-encoded
    #[must_use]
    pub fn query_string(&self) -> String {
        match self {
            Self::City(name) => format!("q={}", urlencoding::encode(name)),
            Self::Coordinates(c) => format!("lat={}&lon={}", c.latitude, c.longitude),
        }
    }

    /// Generate cache key for this location
    #[must_use]
    pub fn cache_key(&self, resource: &str) -> String {
        format!("{resource}:{}", self.query_string())
    }
}

impl fmt::Display for LocationQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::City(name) => write!(f, "{name}"),
            Self::Coordinates(c) => write!(f, "{}", c.format_coordinates()),
        }
    }
}

/// JSON body accepted by `POST /api/weather`
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
}

impl TryFrom<WeatherRequest> for LocationQuery {
    type Error = TintwaveError;

    /// A non-empty city wins; otherwise both coordinates must be present.
    fn try_from(request: WeatherRequest) -> Result<Self, Self::Error> {
        match request {
            WeatherRequest {
                city: Some(city), ..
            } if !city.is_empty() => Ok(Self::City(city)),
            WeatherRequest {
                lat: Some(lat),
                lon: Some(lon),
                ..
            } => Ok(Self::coordinates(lat, lon)),
            _ => Err(TintwaveError::MissingLocation),
        }
    }
}

impl From<&LocationQuery> for WeatherRequest {
    fn from(query: &LocationQuery) -> Self {
        match query {
            LocationQuery::City(name) => Self {
                city: Some(name.clone()),
                ..Self::default()
            },
            LocationQuery::Coordinates(c) => Self {
                city: None,
                lat: Some(c.latitude),
                lon: Some(c.longitude),
            },
        }
    }
}
