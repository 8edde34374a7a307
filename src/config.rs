//! Configuration management for the `WeatherBot` assistant
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::WeatherBotError;
use crate::assistant::CallTimeouts;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure for the `WeatherBot` application
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeatherBotConfig {
    /// Weather provider configuration
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Caller location lookup configuration
    #[serde(default)]
    pub location: LocationConfig,
    /// Translation configuration
    #[serde(default)]
    pub translation: TranslationConfig,
    /// Time display settings
    #[serde(default)]
    pub locale: LocaleConfig,
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// OpenWeatherMap configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// OpenWeatherMap API key
    pub api_key: Option<String>,
    /// Base URL for the weather API
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    /// Retries for transient failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// ipdata.co configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    /// ipdata API key
    pub api_key: Option<String>,
    /// Base URL for the lookup API
    #[serde(default = "default_location_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    /// City used when no lookup key is configured
    pub fallback_city: Option<String>,
}

/// Translation provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationConfig {
    /// Provider name (none or google)
    #[serde(default = "default_translation_provider")]
    pub provider: String,
    /// Google Cloud Translation API key
    pub api_key: Option<String>,
    /// Base URL for the translation API
    #[serde(default = "default_translation_base_url")]
    pub base_url: String,
    /// Language answers are translated into (ISO-639-1)
    #[serde(default = "default_target_language")]
    pub target_language: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
}

/// Time display settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocaleConfig {
    /// Offset east of UTC used to show sunrise and sunset times
    #[serde(default = "default_utc_offset")]
    pub utc_offset_seconds: i32,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound for one request, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u32,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
    /// OTLP/HTTP endpoint for span export
    pub otlp_endpoint: Option<String>,
}

// Default value functions
fn default_weather_base_url() -> String {
    "https://api.openweathermap.org/data/2.5".to_string()
}

fn default_location_base_url() -> String {
    "https://api.ipdata.co".to_string()
}

fn default_translation_base_url() -> String {
    "https://translation.googleapis.com/language/translate/v2".to_string()
}

fn default_translation_provider() -> String {
    "none".to_string()
}

fn default_target_language() -> String {
    "en".to_string()
}

fn default_timeout() -> u32 {
    10
}

fn default_max_retries() -> u32 {
    1
}

fn default_utc_offset() -> i32 {
    19_800
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_request_timeout() -> u32 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_weather_base_url(),
            timeout_seconds: default_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_location_base_url(),
            timeout_seconds: default_timeout(),
            fallback_city: None,
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            provider: default_translation_provider(),
            api_key: None,
            base_url: default_translation_base_url(),
            target_language: default_target_language(),
            timeout_seconds: default_timeout(),
        }
    }
}

impl Default for LocaleConfig {
    fn default() -> Self {
        Self {
            utc_offset_seconds: default_utc_offset(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            otlp_endpoint: None,
        }
    }
}

impl WeatherConfig {
    /// Per-attempt request timeout
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.into())
    }
}

impl LocationConfig {
    /// Per-attempt request timeout
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.into())
    }
}

impl TranslationConfig {
    /// Per-attempt request timeout
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.into())
    }

    /// Whether a real translation provider is configured
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.provider != "none"
    }
}

impl ServerConfig {
    /// Whole-request timeout
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds.into())
    }
}

impl WeatherBotConfig {
    /// Load configuration from the given file, the default location or
    /// `./config.toml`, then environment variables
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path()
                .filter(|path| path.exists())
                .unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // Environment overrides such as WEATHERBOT_WEATHER__API_KEY
        builder = builder.add_source(
            Environment::with_prefix("WEATHERBOT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: WeatherBotConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        // Apply defaults for missing values
        config.apply_defaults();

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("weatherbot").join("config.toml"))
    }

    /// Apply default values to empty configuration fields
    pub fn apply_defaults(&mut self) {
        if self.weather.base_url.is_empty() {
            self.weather.base_url = default_weather_base_url();
        }
        if self.weather.timeout_seconds == 0 {
            self.weather.timeout_seconds = default_timeout();
        }
        if self.location.base_url.is_empty() {
            self.location.base_url = default_location_base_url();
        }
        if self.location.timeout_seconds == 0 {
            self.location.timeout_seconds = default_timeout();
        }
        if self.translation.provider.is_empty() {
            self.translation.provider = default_translation_provider();
        }
        if self.translation.base_url.is_empty() {
            self.translation.base_url = default_translation_base_url();
        }
        if self.translation.target_language.is_empty() {
            self.translation.target_language = default_target_language();
        }
        if self.translation.timeout_seconds == 0 {
            self.translation.timeout_seconds = default_timeout();
        }
        if self.server.request_timeout_seconds == 0 {
            self.server.request_timeout_seconds = default_request_timeout();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate API keys and credentials
    pub fn validate_api_keys(&self) -> Result<()> {
        let keys = [
            ("Weather", &self.weather.api_key),
            ("Location", &self.location.api_key),
            ("Translation", &self.translation.api_key),
        ];

        for (name, key) in keys {
            if let Some(api_key) = key {
                if api_key.is_empty() {
                    return Err(WeatherBotError::config(format!(
                        "{name} API key cannot be empty if provided. Either remove it or provide a valid key."
                    ))
                    .into());
                }

                if api_key.len() > 200 {
                    return Err(WeatherBotError::config(format!(
                        "{name} API key appears to be invalid (too long). Please check your API key."
                    ))
                    .into());
                }
            }
        }

        if self.translation.provider == "google" && self.translation.api_key.is_none() {
            return Err(WeatherBotError::config(
                "Translation provider 'google' requires translation.api_key",
            )
            .into());
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        let timeouts = [
            ("Weather", self.weather.timeout_seconds),
            ("Location", self.location.timeout_seconds),
            ("Translation", self.translation.timeout_seconds),
        ];
        for (name, timeout) in timeouts {
            if timeout > 300 {
                return Err(WeatherBotError::config(format!(
                    "{name} API timeout cannot exceed 300 seconds"
                ))
                .into());
            }
        }

        if self.weather.max_retries > 10 {
            return Err(WeatherBotError::config("Weather API max retries cannot exceed 10").into());
        }

        if self.locale.utc_offset_seconds.abs() > 50_400 {
            return Err(WeatherBotError::config(
                "UTC offset must be within 14 hours (50400 seconds) of UTC",
            )
            .into());
        }

        if self.server.request_timeout_seconds > 600 {
            return Err(
                WeatherBotError::config("Server request timeout cannot exceed 600 seconds").into(),
            );
        }

        let pipeline = CallTimeouts::from_config(self).pipeline();
        if self.server.request_timeout() <= pipeline {
            return Err(WeatherBotError::config(format!(
                "Server request timeout ({}s) must exceed the longest answer time of {}s \
                 (two translations, location lookup and every weather attempt)",
                self.server.request_timeout_seconds,
                pipeline.as_secs()
            ))
            .into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(WeatherBotError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(WeatherBotError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        let valid_providers = ["none", "google"];
        if !valid_providers.contains(&self.translation.provider.as_str()) {
            return Err(WeatherBotError::config(format!(
                "Invalid translation provider '{}'. Must be one of: {}",
                self.translation.provider,
                valid_providers.join(", ")
            ))
            .into());
        }

        let language = &self.translation.target_language;
        if !(2..=8).contains(&language.len())
            || !language.chars().all(|c| c.is_ascii_alphabetic() || c == '-')
        {
            return Err(WeatherBotError::config(format!(
                "Invalid target language '{language}'. Use an ISO-639-1 code such as 'gu' or 'en'"
            ))
            .into());
        }

        let urls = [
            ("Weather", &self.weather.base_url),
            ("Location", &self.location.base_url),
            ("Translation", &self.translation.base_url),
        ];
        for (name, url) in urls {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(WeatherBotError::config(format!(
                    "{name} API base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }
}
