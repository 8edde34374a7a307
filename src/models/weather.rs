//! Weather snapshot model used to fill response templates

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Rain volume reported by the provider, in mm
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Precipitation {
    /// Rain over the last hour
    pub last_hour: Option<f64>,
    /// Rain over the last three-hour period
    pub last_three_hours: Option<f64>,
}

impl Precipitation {
    /// Amount to report, preferring the hourly reading
    #[must_use]
    pub fn amount(&self) -> Option<f64> {
        self.last_hour.or(self.last_three_hours)
    }
}

/// Point-in-time weather for one city, fetched fresh for every answer
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherSnapshot {
    /// City the snapshot was fetched for
    pub city: String,
    /// Detailed condition text, e.g. "light rain"
    pub status: String,
    /// Current temperature in Celsius
    pub temperature: f64,
    /// Minimum temperature in Celsius
    pub temp_min: f64,
    /// Maximum temperature in Celsius
    pub temp_max: f64,
    /// Relative humidity in percent
    pub humidity: u8,
    /// Rain volumes, empty when no rain is reported
    pub precipitation: Precipitation,
    /// Sunrise time
    pub sunrise: DateTime<Utc>,
    /// Sunset time
    pub sunset: DateTime<Utc>,
    /// Condition text of the last entry in the provider's forecast
    pub forecast_status: String,
}

/// Render a reading the way the provider's JSON float prints: integral values
/// keep one decimal (`22.0`), others use the shortest exact form (`22.53`)
#[must_use]
pub fn format_reading(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}
