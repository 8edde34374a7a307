//! `WeatherBot` - conversational weather assistant
//!
//! Matches free-text weather questions to a fixed catalog of intents by
//! token-set overlap, fetches weather for the caller's city and answers with a
//! templated sentence, optionally translated to the user's language.

pub mod api;
pub mod assistant;
pub mod chat;
pub mod config;
pub mod error;
pub mod intent;
pub mod models;
pub mod nlp;
pub mod response;
pub mod services;
pub mod telemetry;
pub mod web;

// Re-export core types for public API
pub use assistant::{CallTimeouts, Collaborators, WeatherAssistant};
pub use config::WeatherBotConfig;
pub use error::{Service, WeatherBotError};
pub use intent::{Intent, IntentCatalog};
pub use models::{Precipitation, RequestOrigin, WeatherSnapshot};
pub use nlp::{TokenSet, best_match, jaccard_similarity, normalize};
pub use response::{NO_MATCH_RESPONSE, ResponseGenerator};
pub use services::{LocationResolver, Translator, WeatherGateway};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, WeatherBotError>;
