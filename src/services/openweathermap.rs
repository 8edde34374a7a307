//! Weather API client for OpenWeatherMap
//!
//! Fetches current conditions (`/weather`) and the 5-day / 3-hour forecast
//! (`/forecast`) for a city in metric units and folds both into a
//! [`WeatherSnapshot`].

use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, instrument, warn};

use super::{WeatherGateway, build_http_client, send_error, status_error};
use crate::config::WeatherConfig;
use crate::error::Service;
use crate::models::{Precipitation, WeatherSnapshot};
use crate::{Result, WeatherBotError};

/// Weather API client for OpenWeatherMap
pub struct OpenWeatherMapClient {
    /// HTTP client
    client: ClientWithMiddleware,
    /// API base URL without trailing slash
    base_url: String,
    /// API key
    api_key: String,
}

impl OpenWeatherMapClient {
    /// Create a new weather API client
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            WeatherBotError::config(
                "weather.api_key is required (set WEATHERBOT_WEATHER__API_KEY)",
            )
        })?;

        Ok(Self {
            client: build_http_client(config.timeout(), config.max_retries)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Request URL for an endpoint and city
    fn endpoint_url(&self, endpoint: &str, city: &str) -> String {
        format!(
            "{}/{}?q={}&units=metric&appid={}",
            self.base_url,
            endpoint,
            urlencoding::encode(city),
            urlencoding::encode(&self.api_key)
        )
    }

    /// Fetch and parse one endpoint
    #[instrument(skip(self))]
    async fn fetch<T: DeserializeOwned>(&self, endpoint: &str, city: &str) -> Result<T> {
        let start_time = Instant::now();
        debug!("OpenWeatherMap request: /{} for '{}'", endpoint, city);

        let response = self
            .client
            .get(self.endpoint_url(endpoint, city))
            .send()
            .await
            .map_err(|e| send_error(Service::Weather, e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            warn!("OpenWeatherMap has no data for '{}'", city);
            return Err(WeatherBotError::gateway(format!("city not found: {city}")));
        }
        if !status.is_success() {
            return Err(status_error(Service::Weather, status));
        }

        let parsed = response.json::<T>().await.map_err(|e| {
            error!("Failed to parse /{} response: {}", endpoint, e);
            WeatherBotError::gateway(format!(
                "Invalid /{endpoint} data received from OpenWeatherMap"
            ))
        })?;

        let total_duration = start_time.elapsed();
        if total_duration.as_secs() > 5 {
            warn!(
                "Slow OpenWeatherMap response detected: {:.3}s",
                total_duration.as_secs_f64()
            );
        }

        Ok(parsed)
    }
}

#[async_trait]
impl WeatherGateway for OpenWeatherMapClient {
    #[instrument(skip(self))]
    async fn current_and_forecast(&self, city: &str) -> Result<WeatherSnapshot> {
        info!("Getting weather for city: '{}'", city);
        let start_time = Instant::now();

        let (current, forecast) = tokio::try_join!(
            self.fetch::<CurrentWeatherResponse>("weather", city),
            self.fetch::<ForecastResponse>("forecast", city),
        )?;

        let snapshot = into_snapshot(city, current, forecast)?;

        info!(
            "Successfully retrieved weather for '{}' in {:.3}s",
            city,
            start_time.elapsed().as_secs_f64()
        );

        Ok(snapshot)
    }
}

/// Current weather response from `/weather`
#[derive(Debug, Deserialize)]
struct CurrentWeatherResponse {
    weather: Vec<Condition>,
    main: MainReadings,
    #[serde(default)]
    rain: Option<RainVolume>,
    sys: SunTimes,
}

#[derive(Debug, Deserialize)]
struct Condition {
    description: String,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: f64,
    temp_min: f64,
    temp_max: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct RainVolume {
    #[serde(rename = "1h")]
    one_hour: Option<f64>,
    #[serde(rename = "3h")]
    three_hours: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct SunTimes {
    sunrise: i64,
    sunset: i64,
}

/// Forecast response from `/forecast`
#[derive(Debug, Deserialize)]
struct ForecastResponse {
    list: Vec<ForecastEntry>,
}

#[derive(Debug, Deserialize)]
struct ForecastEntry {
    weather: Vec<Condition>,
}

fn timestamp(seconds: i64, field: &str) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(seconds, 0)
        .ok_or_else(|| WeatherBotError::gateway(format!("Invalid {field} timestamp: {seconds}")))
}

fn into_snapshot(
    city: &str,
    current: CurrentWeatherResponse,
    forecast: ForecastResponse,
) -> Result<WeatherSnapshot> {
    let status = current
        .weather
        .into_iter()
        .next()
        .map(|condition| condition.description)
        .ok_or_else(|| WeatherBotError::gateway("No current conditions in weather response"))?;

    let forecast_status = forecast
        .list
        .into_iter()
        .last()
        .and_then(|entry| entry.weather.into_iter().next())
        .map(|condition| condition.description)
        .ok_or_else(|| WeatherBotError::gateway("No entries in forecast response"))?;

    let precipitation = current
        .rain
        .map(|rain| Precipitation {
            last_hour: rain.one_hour,
            last_three_hours: rain.three_hours,
        })
        .unwrap_or_default();

    Ok(WeatherSnapshot {
        city: city.to_string(),
        status,
        temperature: current.main.temp,
        temp_min: current.main.temp_min,
        temp_max: current.main.temp_max,
        humidity: current.main.humidity,
        precipitation,
        sunrise: timestamp(current.sys.sunrise, "sunrise")?,
        sunset: timestamp(current.sys.sunset, "sunset")?,
        forecast_status,
    })
}
