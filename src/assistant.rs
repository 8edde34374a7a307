//! Query answering pipeline
//!
//! translate to English -> normalize -> match intent -> resolve city ->
//! fetch weather -> fill template -> translate to the target language.
//!
//! [`WeatherAssistant`] holds no per-request state; one instance is shared by
//! every transport and every concurrent request.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument};

use crate::config::WeatherBotConfig;
use crate::error::Service;
use crate::intent::{Intent, IntentCatalog};
use crate::models::RequestOrigin;
use crate::response::{NO_MATCH_RESPONSE, ResponseGenerator};
use crate::services::{
    IpDataResolver, LocationResolver, OpenWeatherMapClient, Translator, WeatherGateway,
    retry_budget, translator_from_config,
};
use crate::{Result, WeatherBotError};

/// Language the catalog and templates are written in
pub const ENGLISH: &str = "en";

const FAREWELLS: [&str; 2] = ["goodbye", "see you soon"];

/// Upper bounds for each collaborator call
#[derive(Debug, Clone, Copy)]
pub struct CallTimeouts {
    pub weather: Duration,
    pub location: Duration,
    pub translation: Duration,
}

impl Default for CallTimeouts {
    fn default() -> Self {
        Self::from_config(&WeatherBotConfig::default())
    }
}

impl CallTimeouts {
    /// Bounds covering every configured attempt of each collaborator
    #[must_use]
    pub fn from_config(config: &WeatherBotConfig) -> Self {
        Self {
            weather: retry_budget(config.weather.timeout(), config.weather.max_retries),
            location: config.location.timeout(),
            translation: config.translation.timeout(),
        }
    }

    /// Longest a single answer can take: translation in, location, weather,
    /// translation out
    #[must_use]
    pub fn pipeline(&self) -> Duration {
        self.translation * 2 + self.location + self.weather
    }
}

/// The collaborators the assistant depends on
#[derive(Clone)]
pub struct Collaborators {
    pub weather: Arc<dyn WeatherGateway>,
    pub location: Arc<dyn LocationResolver>,
    pub translator: Arc<dyn Translator>,
}

/// Answers free-text weather questions
pub struct WeatherAssistant {
    catalog: IntentCatalog,
    responder: ResponseGenerator,
    collaborators: Collaborators,
    target_language: String,
    timeouts: CallTimeouts,
}

impl WeatherAssistant {
    pub fn new(
        collaborators: Collaborators,
        responder: ResponseGenerator,
        target_language: impl Into<String>,
        timeouts: CallTimeouts,
    ) -> Self {
        Self {
            catalog: IntentCatalog::default(),
            responder,
            collaborators,
            target_language: target_language.into(),
            timeouts,
        }
    }

    /// Build an assistant backed by the configured HTTP collaborators
    pub fn from_config(config: &WeatherBotConfig) -> Result<Self> {
        let collaborators = Collaborators {
            weather: Arc::new(OpenWeatherMapClient::new(&config.weather)?),
            location: Arc::new(IpDataResolver::new(&config.location)?),
            translator: translator_from_config(&config.translation)?,
        };

        // Without a translation provider every answer stays in English
        let target_language = if config.translation.is_enabled() {
            config.translation.target_language.clone()
        } else {
            ENGLISH.to_string()
        };

        Ok(Self::new(
            collaborators,
            ResponseGenerator::new(config.locale.utc_offset_seconds)?,
            target_language,
            CallTimeouts::from_config(config),
        ))
    }

    /// Language answers are delivered in
    #[must_use]
    pub fn target_language(&self) -> &str {
        &self.target_language
    }

    /// Answer a query in the user's language
    #[instrument(skip(self, text))]
    pub async fn answer(&self, text: &str, origin: &RequestOrigin) -> Result<String> {
        let english = self.to_english(text).await?;
        let answer = self.answer_english(&english, origin).await?;
        self.localize(&answer).await
    }

    /// Answer an English query in English
    pub async fn answer_english(&self, english: &str, origin: &RequestOrigin) -> Result<String> {
        let Some(intent) = self.classify(english) else {
            info!("No intent matched query");
            return Ok(NO_MATCH_RESPONSE.to_string());
        };
        info!(?intent, "Matched intent");

        let city = within(
            Service::Location,
            self.timeouts.location,
            self.collaborators.location.resolve_city(origin),
        )
        .await?;

        let snapshot = within(
            Service::Weather,
            self.timeouts.weather,
            self.collaborators.weather.current_and_forecast(&city),
        )
        .await?;

        Ok(self.responder.respond(intent, &snapshot))
    }

    /// Match an English query against the intent catalog
    #[must_use]
    pub fn classify(&self, english: &str) -> Option<Intent> {
        self.catalog.classify(english)
    }

    /// Translate user text to lowercased English
    pub async fn to_english(&self, text: &str) -> Result<String> {
        let english = within(
            Service::Translation,
            self.timeouts.translation,
            self.collaborators.translator.translate(text, ENGLISH),
        )
        .await?;
        debug!("Query in English: {}", english);
        Ok(english.to_lowercase())
    }

    /// Translate an English answer to the target language
    pub async fn localize(&self, english: &str) -> Result<String> {
        if self.target_language == ENGLISH {
            return Ok(english.to_string());
        }

        within(
            Service::Translation,
            self.timeouts.translation,
            self.collaborators
                .translator
                .translate(english, &self.target_language),
        )
        .await
    }

    /// Whether an English query ends the conversation
    #[must_use]
    pub fn is_farewell(english: &str) -> bool {
        let trimmed = english
            .trim()
            .trim_end_matches(|c: char| c.is_ascii_punctuation())
            .to_lowercase();
        FAREWELLS.contains(&trimmed.as_str())
    }
}

/// Await a collaborator call, failing with a timeout error after `limit`
async fn within<T>(
    service: Service,
    limit: Duration,
    call: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| WeatherBotError::timeout(service))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Precipitation, WeatherSnapshot};
    use async_trait::async_trait;
    use chrono::DateTime;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedWeather {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl WeatherGateway for FixedWeather {
        async fn current_and_forecast(&self, city: &str) -> Result<WeatherSnapshot> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(WeatherSnapshot {
                city: city.to_string(),
                status: "clear sky".to_string(),
                temperature: 22.5,
                temp_min: 19.0,
                temp_max: 26.0,
                humidity: 40,
                precipitation: Precipitation::default(),
                sunrise: DateTime::from_timestamp(1_617_065_520, 0).unwrap(),
                sunset: DateTime::from_timestamp(1_617_110_460, 0).unwrap(),
                forecast_status: "few clouds".to_string(),
            })
        }
    }

    struct FixedCity;

    #[async_trait]
    impl LocationResolver for FixedCity {
        async fn resolve_city(&self, _origin: &RequestOrigin) -> Result<String> {
            Ok("Ahmedabad".to_string())
        }
    }

    struct SlowCity;

    #[async_trait]
    impl LocationResolver for SlowCity {
        async fn resolve_city(&self, _origin: &RequestOrigin) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok("Nowhere".to_string())
        }
    }

    struct Shouting;

    #[async_trait]
    impl Translator for Shouting {
        async fn translate(&self, text: &str, target_lang: &str) -> Result<String> {
            if target_lang == ENGLISH {
                Ok(text.to_uppercase())
            } else {
                Ok(format!("[{target_lang}] {text}"))
            }
        }
    }

    fn assistant(
        location: Arc<dyn LocationResolver>,
        translator: Arc<dyn Translator>,
        target_language: &str,
    ) -> (WeatherAssistant, Arc<FixedWeather>) {
        let weather = Arc::new(FixedWeather {
            calls: AtomicUsize::new(0),
        });
        let collaborators = Collaborators {
            weather: weather.clone(),
            location,
            translator,
        };
        let timeouts = CallTimeouts {
            location: Duration::from_millis(50),
            ..CallTimeouts::default()
        };
        let assistant = WeatherAssistant::new(
            collaborators,
            ResponseGenerator::new(19_800).unwrap(),
            target_language,
            timeouts,
        );
        (assistant, weather)
    }

    #[tokio::test]
    async fn test_answer_current_temperature() {
        let (assistant, _) = assistant(Arc::new(FixedCity), Arc::new(Shouting), ENGLISH);
        let answer = assistant
            .answer("What is the temperature today", &RequestOrigin::local())
            .await
            .unwrap();
        assert_eq!(answer, "The current temperature is 22.5 degrees celsius.");
    }

    #[tokio::test]
    async fn test_answer_is_localized() {
        let (assistant, _) = assistant(Arc::new(FixedCity), Arc::new(Shouting), "gu");
        let answer = assistant
            .answer("when is sunset", &RequestOrigin::local())
            .await
            .unwrap();
        assert_eq!(answer, "[gu] Time of sunset today is 18:51:00.");
    }

    #[tokio::test]
    async fn test_no_match_skips_weather_lookup() {
        let (assistant, weather) = assistant(Arc::new(SlowCity), Arc::new(Shouting), ENGLISH);
        let answer = assistant
            .answer("asdkjasd nonsense query", &RequestOrigin::local())
            .await
            .unwrap();
        assert_eq!(answer, "I am sorry, I don't understand your question.");
        assert_eq!(weather.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_slow_location_times_out() {
        let (assistant, weather) = assistant(Arc::new(SlowCity), Arc::new(Shouting), ENGLISH);
        let result = assistant
            .answer("will it rain today", &RequestOrigin::local())
            .await;
        assert!(matches!(
            result,
            Err(WeatherBotError::Timeout {
                service: Service::Location
            })
        ));
        assert_eq!(weather.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_to_english_lowercases() {
        let (assistant, _) = assistant(Arc::new(FixedCity), Arc::new(Shouting), ENGLISH);
        assert_eq!(assistant.to_english("Goodbye").await.unwrap(), "goodbye");
    }

    #[test]
    fn test_is_farewell() {
        assert!(WeatherAssistant::is_farewell("goodbye"));
        assert!(WeatherAssistant::is_farewell("  Goodbye! "));
        assert!(WeatherAssistant::is_farewell("see you soon."));
        assert!(!WeatherAssistant::is_farewell("goodbye rain"));
        assert!(!WeatherAssistant::is_farewell("what is the weather today"));
    }

    #[test]
    fn test_timeouts_cover_retries() {
        let mut config = WeatherBotConfig::default();
        config.weather.timeout_seconds = 5;
        config.weather.max_retries = 2;
        let timeouts = CallTimeouts::from_config(&config);
        // three 5 s attempts plus two backoffs of at most 5 s
        assert_eq!(timeouts.weather, Duration::from_secs(25));
        assert_eq!(timeouts.location, Duration::from_secs(10));
        assert_eq!(timeouts.pipeline(), Duration::from_secs(55));
    }

    /// Takes as long as a timed-out first attempt, the longest backoff and a
    /// slow second attempt
    struct RetriedWeather {
        inner: FixedWeather,
        per_attempt: Duration,
    }

    #[async_trait]
    impl WeatherGateway for RetriedWeather {
        async fn current_and_forecast(&self, city: &str) -> Result<WeatherSnapshot> {
            let elapsed = self.per_attempt * 2 + crate::services::RETRY_BACKOFF_MAX
                - Duration::from_millis(1);
            tokio::time::sleep(elapsed).await;
            self.inner.current_and_forecast(city).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_weather_limit_leaves_room_for_retry() {
        let config = WeatherBotConfig::default();
        let weather = RetriedWeather {
            inner: FixedWeather {
                calls: AtomicUsize::new(0),
            },
            per_attempt: config.weather.timeout(),
        };
        let assistant = WeatherAssistant::new(
            Collaborators {
                weather: Arc::new(weather),
                location: Arc::new(FixedCity),
                translator: Arc::new(Shouting),
            },
            ResponseGenerator::new(0).unwrap(),
            ENGLISH,
            CallTimeouts::from_config(&config),
        );

        let answer = assistant
            .answer("what is the temperature today", &RequestOrigin::local())
            .await
            .unwrap();
        assert_eq!(answer, "The current temperature is 22.5 degrees celsius.");
    }

    #[test]
    fn test_disabled_translation_answers_in_english() {
        let mut config = WeatherBotConfig::default();
        config.weather.api_key = Some("owm_key".to_string());
        config.translation.target_language = "gu".to_string();
        let assistant = WeatherAssistant::from_config(&config).unwrap();
        assert_eq!(assistant.target_language(), ENGLISH);

        config.translation.provider = "google".to_string();
        config.translation.api_key = Some("translate_key".to_string());
        let assistant = WeatherAssistant::from_config(&config).unwrap();
        assert_eq!(assistant.target_language(), "gu");
    }
}
