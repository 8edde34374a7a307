//! Translation clients
//!
//! [`GoogleTranslator`] calls the Google Cloud Translation v2 REST API.
//! [`PassthroughTranslator`] returns text unchanged and is used when
//! translation is disabled.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{Translator, build_http_client, send_error, status_error};
use crate::config::TranslationConfig;
use crate::error::Service;
use crate::{Result, WeatherBotError};

/// Identity translator
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughTranslator;

#[async_trait]
impl Translator for PassthroughTranslator {
    async fn translate(&self, text: &str, _target_lang: &str) -> Result<String> {
        Ok(text.to_string())
    }
}

/// Google Cloud Translation v2 client
pub struct GoogleTranslator {
    client: ClientWithMiddleware,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    target: &'a str,
    format: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    data: TranslateData,
}

#[derive(Debug, Deserialize)]
struct TranslateData {
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Translation {
    translated_text: String,
    detected_source_language: Option<String>,
}

impl GoogleTranslator {
    pub fn new(config: &TranslationConfig) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            WeatherBotError::config("translation.api_key is required for the google provider")
        })?;

        Ok(Self {
            client: build_http_client(config.timeout(), 0)?,
            base_url: config.base_url.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    #[instrument(skip(self, text), fields(chars = text.chars().count()))]
    async fn translate(&self, text: &str, target_lang: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        let body = serde_json::to_vec(&TranslateRequest {
            q: text,
            target: target_lang,
            format: "text",
        })
        .map_err(|e| WeatherBotError::translation(format!("Failed to encode request: {e}")))?;

        let url = format!("{}?key={}", self.base_url, urlencoding::encode(&self.api_key));
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| send_error(Service::Translation, e))?;

        let status = response.status();
        if status.as_u16() == 400 {
            return Err(WeatherBotError::translation(format!(
                "Translation rejected; '{target_lang}' may be an unsupported language"
            )));
        }
        if !status.is_success() {
            return Err(status_error(Service::Translation, status));
        }

        let parsed: TranslateResponse = response.json().await.map_err(|e| {
            WeatherBotError::translation(format!("Invalid translation response: {e}"))
        })?;

        first_translation(parsed)
    }
}

fn first_translation(response: TranslateResponse) -> Result<String> {
    let translation = response
        .data
        .translations
        .into_iter()
        .next()
        .ok_or_else(|| WeatherBotError::translation("Translation response was empty"))?;

    if let Some(source) = &translation.detected_source_language {
        debug!("Detected source language: {}", source);
    }

    Ok(translation.translated_text)
}

/// Build the translator selected by the configuration
pub fn translator_from_config(config: &TranslationConfig) -> Result<Arc<dyn Translator>> {
    match config.provider.as_str() {
        "none" => Ok(Arc::new(PassthroughTranslator)),
        "google" => Ok(Arc::new(GoogleTranslator::new(config)?)),
        other => Err(WeatherBotError::config(format!(
            "Unknown translation provider '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_passthrough_returns_input() {
        let translated = PassthroughTranslator
            .translate("Rain today is 0.25.", "gu")
            .await
            .unwrap();
        assert_eq!(translated, "Rain today is 0.25.");
    }

    #[test]
    fn test_first_translation() {
        let response: TranslateResponse = serde_json::from_str(
            r#"{"data": {"translations": [{"translatedText": "what is the weather today", "detectedSourceLanguage": "gu"}]}}"#,
        )
        .unwrap();
        assert_eq!(first_translation(response).unwrap(), "what is the weather today");

        let empty: TranslateResponse =
            serde_json::from_str(r#"{"data": {"translations": []}}"#).unwrap();
        assert!(matches!(
            first_translation(empty),
            Err(WeatherBotError::TranslationUnavailable { .. })
        ));
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(TranslateRequest {
            q: "hello",
            target: "gu",
            format: "text",
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"q": "hello", "target": "gu", "format": "text"}));
    }

    #[test]
    fn test_translator_from_config() {
        let config = TranslationConfig::default();
        assert!(translator_from_config(&config).is_ok());

        let google = TranslationConfig {
            provider: "google".to_string(),
            ..TranslationConfig::default()
        };
        assert!(matches!(
            translator_from_config(&google),
            Err(WeatherBotError::Config { .. })
        ));

        let unknown = TranslationConfig {
            provider: "babelfish".to_string(),
            ..TranslationConfig::default()
        };
        assert!(translator_from_config(&unknown).is_err());
    }
}
