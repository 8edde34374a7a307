//! Data models for the `WeatherBot` assistant
//!
//! - Weather: the per-request weather snapshot used by response templates
//! - Origin: the network origin used to infer the caller's city

pub mod origin;
pub mod weather;

pub use origin::RequestOrigin;
pub use weather::{Precipitation, WeatherSnapshot, format_reading};
