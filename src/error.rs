//! Error types and handling for the `WeatherBot` assistant

use std::fmt;

use thiserror::Error;

/// External collaborator a request depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Weather,
    Location,
    Translation,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Service::Weather => "weather service",
            Service::Location => "location service",
            Service::Translation => "translation service",
        };
        f.write_str(name)
    }
}

/// Main error type for the `WeatherBot` application
#[derive(Error, Debug)]
pub enum WeatherBotError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Weather provider unreachable or returned malformed data
    #[error("Weather gateway unavailable: {message}")]
    GatewayUnavailable { message: String },

    /// City lookup for the caller failed
    #[error("Location unresolved: {message}")]
    LocationUnresolved { message: String },

    /// Translation service failed or the language is unsupported
    #[error("Translation unavailable: {message}")]
    TranslationUnavailable { message: String },

    /// A collaborator call exceeded its time limit
    #[error("Timed out waiting for the {service}")]
    Timeout { service: Service },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl WeatherBotError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new weather gateway error
    pub fn gateway<S: Into<String>>(message: S) -> Self {
        Self::GatewayUnavailable {
            message: message.into(),
        }
    }

    /// Create a new location resolution error
    pub fn location<S: Into<String>>(message: S) -> Self {
        Self::LocationUnresolved {
            message: message.into(),
        }
    }

    /// Create a new translation error
    pub fn translation<S: Into<String>>(message: S) -> Self {
        Self::TranslationUnavailable {
            message: message.into(),
        }
    }

    /// Create a new timeout error for the given collaborator
    #[must_use]
    pub fn timeout(service: Service) -> Self {
        Self::Timeout { service }
    }

    /// Create the "unavailable" error matching a collaborator
    pub fn unavailable<S: Into<String>>(service: Service, message: S) -> Self {
        match service {
            Service::Weather => Self::gateway(message),
            Service::Location => Self::location(message),
            Service::Translation => Self::translation(message),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            WeatherBotError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            WeatherBotError::GatewayUnavailable { .. } => {
                "Sorry, I couldn't reach the weather service right now.".to_string()
            }
            WeatherBotError::LocationUnresolved { .. } => {
                "Sorry, I couldn't work out where you are right now.".to_string()
            }
            WeatherBotError::TranslationUnavailable { .. } => {
                "Sorry, the translation service is unavailable right now.".to_string()
            }
            WeatherBotError::Timeout { service } => {
                format!("Sorry, the {service} took too long to respond.")
            }
            WeatherBotError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = WeatherBotError::config("missing API key");
        assert!(matches!(config_err, WeatherBotError::Config { .. }));

        let gateway_err = WeatherBotError::gateway("connection failed");
        assert!(matches!(gateway_err, WeatherBotError::GatewayUnavailable { .. }));

        let location_err = WeatherBotError::location("no city");
        assert!(matches!(location_err, WeatherBotError::LocationUnresolved { .. }));
    }

    #[test]
    fn test_unavailable_follows_service() {
        assert!(matches!(
            WeatherBotError::unavailable(Service::Weather, "x"),
            WeatherBotError::GatewayUnavailable { .. }
        ));
        assert!(matches!(
            WeatherBotError::unavailable(Service::Location, "x"),
            WeatherBotError::LocationUnresolved { .. }
        ));
        assert!(matches!(
            WeatherBotError::unavailable(Service::Translation, "x"),
            WeatherBotError::TranslationUnavailable { .. }
        ));
    }

    #[test]
    fn test_user_messages() {
        let gateway_err = WeatherBotError::gateway("test");
        assert_eq!(
            gateway_err.user_message(),
            "Sorry, I couldn't reach the weather service right now."
        );

        let timeout_err = WeatherBotError::timeout(Service::Translation);
        assert_eq!(
            timeout_err.user_message(),
            "Sorry, the translation service took too long to respond."
        );

        let config_err = WeatherBotError::config("test");
        assert!(config_err.user_message().contains("Configuration error"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let bot_err: WeatherBotError = io_err.into();
        assert!(matches!(bot_err, WeatherBotError::Io { .. }));
    }
}
