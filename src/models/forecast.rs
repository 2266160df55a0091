//! Forecast series model and the per-day digest derived from it

use std::collections::HashSet;

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use serde::{Deserialize, Serialize};

use super::weather::{ConditionDescriptor, round_temperature};

/// Maximum number of days in a [`ForecastSeries::daily_digest`]
pub const DIGEST_DAYS: usize = 5;

/// One forecast step, typically 3 hours apart from its neighbours
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ForecastEntry {
    /// Seconds since the Unix epoch
    pub timestamp: i64,
    /// Temperature in Celsius
    pub temperature: f64,
    pub conditions: Vec<ConditionDescriptor>,
}

impl ForecastEntry {
    #[must_use]
    pub fn primary_condition(&self) -> Option<&ConditionDescriptor> {
        self.conditions.first()
    }

    #[must_use]
    pub fn rounded_temperature(&self) -> i64 {
        round_temperature(self.temperature)
    }

    /// Calendar date of this entry at the given offset
    #[must_use]
    pub fn local_date(&self, offset: FixedOffset) -> Option<NaiveDate> {
        DateTime::<Utc>::from_timestamp(self.timestamp, 0)
            .map(|dt| dt.with_timezone(&offset).date_naive())
    }

    /// Short day label such as "Mon, Jan 6"
    #[must_use]
    pub fn day_label(&self, offset: FixedOffset) -> String {
        DateTime::<Utc>::from_timestamp(self.timestamp, 0)
            .map(|dt| dt.with_timezone(&offset).format("%a, %b %-d").to_string())
            .unwrap_or_default()
    }
}

/// Ordered forecast entries as returned by the provider
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct ForecastSeries {
    pub entries: Vec<ForecastEntry>,
    /// Shift from UTC of the forecast location, in seconds
    pub utc_offset_seconds: Option<i32>,
}

impl ForecastSeries {
    #[must_use]
    pub fn new(entries: Vec<ForecastEntry>) -> Self {
        Self {
            entries,
            utc_offset_seconds: None,
        }
    }

    #[must_use]
    pub fn with_utc_offset(mut self, seconds: i32) -> Self {
        self.utc_offset_seconds = Some(seconds);
        self
    }

    /// Offset used to decide which calendar day an entry belongs to.
    /// Falls back to UTC when the provider reported none or an invalid one.
    #[must_use]
    pub fn offset(&self) -> FixedOffset {
        self.utc_offset_seconds
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix())
    }

    /// First entry of each distinct calendar date, in series order, capped
    /// at [`DIGEST_DAYS`].
    #[must_use]
    pub fn daily_digest(&self) -> Vec<&ForecastEntry> {
        let offset = self.offset();
        let mut seen = HashSet::new();
        let mut digest = Vec::with_capacity(DIGEST_DAYS);

        for entry in &self.entries {
            if digest.len() == DIGEST_DAYS {
                break;
            }
            let Some(date) = entry.local_date(offset) else {
                continue;
            };
            if seen.insert(date) {
                digest.push(entry);
            }
        }

        digest
    }
}
