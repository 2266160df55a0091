//! Current conditions model and display methods

use serde::{Deserialize, Serialize};

const ICON_BASE_URL: &str = "https://openweathermap.org/img/wn";

/// Short condition summary as reported by the provider
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ConditionDescriptor {
    /// Human-readable description, e.g. "light rain"
    pub description: String,
    /// Provider icon identifier, e.g. "10d"
    pub icon: String,
}

impl ConditionDescriptor {
    #[must_use]
    pub fn icon_url(&self) -> String {
        format!("{ICON_BASE_URL}/{}@2x.png", self.icon)
    }
}

/// Conditions at the queried location right now
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CurrentConditions {
    /// Location name resolved by the provider
    pub location_name: Option<String>,
    /// Temperature in Celsius
    pub temperature: f64,
    /// Never empty; the first entry is the primary condition
    pub conditions: Vec<ConditionDescriptor>,
}

impl CurrentConditions {
    #[must_use]
    pub fn primary_condition(&self) -> Option<&ConditionDescriptor> {
        self.conditions.first()
    }

    #[must_use]
    pub fn rounded_temperature(&self) -> i64 {
        round_temperature(self.temperature)
    }

    /// Format temperature with unit
    #[must_use]
    pub fn format_temperature(&self) -> String {
        format!("{}°C", self.rounded_temperature())
    }
}

/// Round to the nearest whole degree; halves round up.
#[must_use]
pub fn round_temperature(celsius: f64) -> i64 {
    (celsius + 0.5).floor() as i64
}
