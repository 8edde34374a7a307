//! External collaborators
//!
//! The assistant core only talks to these traits, so real HTTP clients and
//! in-memory fakes are interchangeable:
//! - [`WeatherGateway`]: current conditions plus forecast for a city
//! - [`LocationResolver`]: caller origin to city name
//! - [`Translator`]: text translation between the user's language and English

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use tracing::warn;

use crate::error::Service;
use crate::models::{RequestOrigin, WeatherSnapshot};
use crate::{Result, WeatherBotError};

pub mod ipdata;
pub mod openweathermap;
pub mod translate;

pub use ipdata::IpDataResolver;
pub use openweathermap::OpenWeatherMapClient;
pub use translate::{GoogleTranslator, PassthroughTranslator, translator_from_config};

/// Source of weather data
#[async_trait]
pub trait WeatherGateway: Send + Sync {
    /// Current conditions and forecast for a named city
    async fn current_and_forecast(&self, city: &str) -> Result<WeatherSnapshot>;
}

/// Maps a caller's network origin to a city
#[async_trait]
pub trait LocationResolver: Send + Sync {
    async fn resolve_city(&self, origin: &RequestOrigin) -> Result<String>;
}

/// Text translation service
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `text` into `target_lang` (ISO-639-1)
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String>;
}

/// Shortest wait before retrying a transient failure
pub const RETRY_BACKOFF_MIN: Duration = Duration::from_millis(500);
/// Longest wait before retrying a transient failure
pub const RETRY_BACKOFF_MAX: Duration = Duration::from_secs(5);

/// Upper bound on one call through [`build_http_client`]: every attempt plus
/// the backoff before each retry
#[must_use]
pub fn retry_budget(per_attempt: Duration, max_retries: u32) -> Duration {
    per_attempt * (max_retries + 1) + RETRY_BACKOFF_MAX * max_retries
}

/// Build an HTTP client with a per-attempt timeout and bounded retries for
/// transient failures
pub fn build_http_client(timeout: Duration, max_retries: u32) -> Result<ClientWithMiddleware> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("WeatherBot/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| WeatherBotError::config(format!("Failed to create HTTP client: {e}")))?;

    let retry_policy = ExponentialBackoff::builder()
        .retry_bounds(RETRY_BACKOFF_MIN, RETRY_BACKOFF_MAX)
        .build_with_max_retries(max_retries);

    Ok(ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build())
}

/// Map a failed send to the collaborator's error kind, keeping timeouts distinct
pub(crate) fn send_error(service: Service, error: reqwest_middleware::Error) -> WeatherBotError {
    match &error {
        reqwest_middleware::Error::Reqwest(e) if e.is_timeout() => {
            warn!("Request to the {} timed out", service);
            WeatherBotError::timeout(service)
        }
        _ => {
            warn!("Network error talking to the {}: {}", service, error);
            WeatherBotError::unavailable(service, format!("network error: {error}"))
        }
    }
}

/// Map a non-success HTTP status to the collaborator's error kind
pub(crate) fn status_error(service: Service, status: StatusCode) -> WeatherBotError {
    let message = match status.as_u16() {
        401 | 403 => "invalid API key".to_string(),
        404 => "requested resource not found".to_string(),
        429 => "rate limit exceeded".to_string(),
        _ => format!(
            "request failed with status: {} - {}",
            status,
            status.canonical_reason().unwrap_or("Unknown error")
        ),
    };
    warn!("{} responded with {}: {}", service, status, message);
    WeatherBotError::unavailable(service, message)
}
