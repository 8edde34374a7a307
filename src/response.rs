//! Response templating
//!
//! Maps a matched [`Intent`] and a [`WeatherSnapshot`] to one English sentence.

use chrono::{DateTime, FixedOffset, Utc};

use crate::intent::Intent;
use crate::models::{WeatherSnapshot, format_reading};
use crate::{Result, WeatherBotError};

/// Answer given when no intent matched the query
pub const NO_MATCH_RESPONSE: &str = "I am sorry, I don't understand your question.";

/// Renders templated answers, showing times at a fixed UTC offset
#[derive(Debug, Clone)]
pub struct ResponseGenerator {
    offset: FixedOffset,
}

impl ResponseGenerator {
    /// Create a generator rendering times at `utc_offset_seconds` east of UTC
    pub fn new(utc_offset_seconds: i32) -> Result<Self> {
        let offset = FixedOffset::east_opt(utc_offset_seconds).ok_or_else(|| {
            WeatherBotError::config(format!(
                "UTC offset of {utc_offset_seconds} seconds is out of range"
            ))
        })?;
        Ok(Self { offset })
    }

    /// Answer for a match result; `None` yields the fallback sentence
    #[must_use]
    pub fn generate(&self, matched: Option<Intent>, snapshot: &WeatherSnapshot) -> String {
        match matched {
            Some(intent) => self.respond(intent, snapshot),
            None => NO_MATCH_RESPONSE.to_string(),
        }
    }

    /// Answer for a matched intent
    #[must_use]
    pub fn respond(&self, intent: Intent, snapshot: &WeatherSnapshot) -> String {
        match intent {
            Intent::CurrentWeather => format!(
                "{} today. Current temperature is {} degrees celsius (Maximum: {}°C, Minimum: {}°C). Humidity today is {}%.",
                capitalize(&snapshot.status),
                format_reading(snapshot.temperature),
                format_reading(snapshot.temp_max),
                format_reading(snapshot.temp_min),
                snapshot.humidity
            ),
            Intent::CurrentTemperature => format!(
                "The current temperature is {} degrees celsius.",
                format_reading(snapshot.temperature)
            ),
            Intent::MaxTemperature => format!(
                "The maximum temperature today is {} degrees celsius.",
                format_reading(snapshot.temp_max)
            ),
            Intent::MinTemperature => format!(
                "The minimum temperature today is {} degrees celsius.",
                format_reading(snapshot.temp_min)
            ),
            Intent::RainToday => match snapshot.precipitation.amount() {
                Some(amount) => format!("Rain today is {}.", format_reading(amount)),
                None => "There is no chance of rain today.".to_string(),
            },
            // The provider's current reading stands in for tomorrow's rain.
            Intent::RainTomorrow => match snapshot.precipitation.amount() {
                Some(amount) => format!("Rain tomorrow will be {}.", format_reading(amount)),
                None => "There is no chance of rain tomorrow.".to_string(),
            },
            Intent::ForecastToday => {
                format!("{} forecasted today.", capitalize(&snapshot.forecast_status))
            }
            Intent::ForecastTomorrow => {
                format!("{} forecasted tomorrow.", capitalize(&snapshot.forecast_status))
            }
            Intent::SunsetTime => format!(
                "Time of sunset today is {}.",
                self.local_time(snapshot.sunset)
            ),
            Intent::SunriseTime => format!(
                "Time of sunrise tomorrow will be {}.",
                self.local_time(snapshot.sunrise)
            ),
        }
    }

    /// Format a timestamp as `HH:MM:SS` at the configured offset
    #[must_use]
    pub fn local_time(&self, time: DateTime<Utc>) -> String {
        time.with_timezone(&self.offset).format("%H:%M:%S").to_string()
    }
}

/// Uppercase the first character and lowercase the rest
fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
