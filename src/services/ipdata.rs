//! Caller location lookup via ipdata.co

use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use super::{LocationResolver, build_http_client, send_error, status_error};
use crate::config::LocationConfig;
use crate::error::Service;
use crate::models::RequestOrigin;
use crate::{Result, WeatherBotError};

/// Resolves a caller's city from their IP address
pub struct IpDataResolver {
    client: ClientWithMiddleware,
    base_url: String,
    api_key: Option<String>,
    fallback_city: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IpDataResponse {
    city: Option<String>,
}

impl IpDataResolver {
    pub fn new(config: &LocationConfig) -> Result<Self> {
        Ok(Self {
            client: build_http_client(config.timeout(), 0)?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            fallback_city: config.fallback_city.clone(),
        })
    }

    /// Lookup URL; without a public address the service locates the caller itself
    fn lookup_url(&self, api_key: &str, origin: &RequestOrigin) -> String {
        match origin.public_ip() {
            Some(ip) => format!(
                "{}/{}?api-key={}",
                self.base_url,
                ip,
                urlencoding::encode(api_key)
            ),
            None => format!("{}?api-key={}", self.base_url, urlencoding::encode(api_key)),
        }
    }
}

#[async_trait]
impl LocationResolver for IpDataResolver {
    #[instrument(skip(self))]
    async fn resolve_city(&self, origin: &RequestOrigin) -> Result<String> {
        let Some(api_key) = &self.api_key else {
            return self.fallback_city.clone().ok_or_else(|| {
                WeatherBotError::location("No ipdata API key or fallback city configured")
            });
        };

        debug!("Resolving city for origin {:?}", origin.ip);

        let response = self
            .client
            .get(self.lookup_url(api_key, origin))
            .send()
            .await
            .map_err(|e| send_error(Service::Location, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(status_error(Service::Location, status));
        }

        let lookup: IpDataResponse = response
            .json()
            .await
            .map_err(|e| WeatherBotError::location(format!("Invalid ipdata response: {e}")))?;

        let city = parse_city(lookup)?;
        info!("Resolved caller city: {}", city);
        Ok(city)
    }
}

fn parse_city(lookup: IpDataResponse) -> Result<String> {
    lookup
        .city
        .map(|city| city.trim().to_string())
        .filter(|city| !city.is_empty())
        .ok_or_else(|| WeatherBotError::location("ipdata did not return a city for this address"))
}
