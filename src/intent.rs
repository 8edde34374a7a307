//! Intent catalog
//!
//! Each recognised question is an [`Intent`] with one canonical phrasing. The
//! catalog normalizes the canonical phrasings once at construction and matches
//! incoming queries against them in declaration order.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::nlp::{TokenSet, best_match, normalize};

/// Weather question the assistant knows how to answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    CurrentWeather,
    CurrentTemperature,
    MaxTemperature,
    MinTemperature,
    RainToday,
    RainTomorrow,
    ForecastToday,
    ForecastTomorrow,
    SunsetTime,
    SunriseTime,
}

impl Intent {
    /// All intents in catalog order; earlier entries win similarity ties
    pub const ALL: [Intent; 10] = [
        Intent::CurrentWeather,
        Intent::CurrentTemperature,
        Intent::MaxTemperature,
        Intent::MinTemperature,
        Intent::RainToday,
        Intent::RainTomorrow,
        Intent::ForecastToday,
        Intent::ForecastTomorrow,
        Intent::SunsetTime,
        Intent::SunriseTime,
    ];

    /// Canonical question this intent is matched against
    #[must_use]
    pub fn canonical_query(self) -> &'static str {
        match self {
            Intent::CurrentWeather => "what is the weather today",
            Intent::CurrentTemperature => "what is the temperature today",
            Intent::MaxTemperature => "what is the maximum / highest temperature today",
            Intent::MinTemperature => "what is the minimum / lowest temperature today",
            Intent::RainToday => "what is the chance of rain today",
            Intent::RainTomorrow => "what is the chance of rain tomorrow",
            Intent::ForecastToday => "what is the weather forecast for today",
            Intent::ForecastTomorrow => "what is the weather forecast for tomorrow",
            Intent::SunsetTime => "what time is the sunset today",
            Intent::SunriseTime => "what time is the sunrise tomorrow",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_query())
    }
}

#[derive(Debug, Clone)]
struct CatalogEntry {
    intent: Intent,
    tokens: TokenSet,
}

/// Immutable, ordered set of intents with their precomputed token sets
#[derive(Debug, Clone)]
pub struct IntentCatalog {
    entries: Vec<CatalogEntry>,
}

impl IntentCatalog {
    /// Build the catalog from the given intents, keeping their order
    #[must_use]
    pub fn new(intents: &[Intent]) -> Self {
        let entries = intents
            .iter()
            .map(|&intent| CatalogEntry {
                intent,
                tokens: normalize(intent.canonical_query()),
            })
            .collect();
        Self { entries }
    }

    /// Match already-normalized query tokens against the catalog
    #[must_use]
    pub fn best_match(&self, query: &TokenSet) -> Option<Intent> {
        best_match(
            query,
            self.entries
                .iter()
                .map(|entry| (entry.intent, &entry.tokens)),
        )
    }

    /// Normalize an English query and match it against the catalog
    #[must_use]
    pub fn classify(&self, english_query: &str) -> Option<Intent> {
        let tokens = normalize(english_query);
        let matched = self.best_match(&tokens);
        debug!(?tokens, ?matched, "Classified query");
        matched
    }
}

impl Default for IntentCatalog {
    fn default() -> Self {
        Self::new(&Intent::ALL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("What is the temperature today", Intent::CurrentTemperature)]
    #[case("What's the weather like today?", Intent::CurrentWeather)]
    #[case("highest temperature today", Intent::MaxTemperature)]
    #[case("lowest temperature", Intent::MinTemperature)]
    #[case("will it rain today?", Intent::RainToday)]
    #[case("will it rain tomorrow", Intent::RainTomorrow)]
    #[case("forecast today", Intent::ForecastToday)]
    #[case("weather forecast for tomorrow", Intent::ForecastTomorrow)]
    #[case("when is sunset", Intent::SunsetTime)]
    #[case("What time is the sunrise tomorrow?", Intent::SunriseTime)]
    fn test_classify(#[case] query: &str, #[case] expected: Intent) {
        let catalog = IntentCatalog::default();
        assert_eq!(catalog.classify(query), Some(expected));
    }

    #[rstest]
    #[case("asdkjasd nonsense query")]
    #[case("what is the")]
    #[case("")]
    #[case("?!")]
    fn test_classify_without_overlap(#[case] query: &str) {
        let catalog = IntentCatalog::default();
        assert_eq!(catalog.classify(query), None);
    }

    #[test]
    fn test_canonical_queries_match_themselves() {
        let catalog = IntentCatalog::default();
        for intent in Intent::ALL {
            assert_eq!(catalog.classify(intent.canonical_query()), Some(intent));
        }
    }

    #[test]
    fn test_ties_follow_catalog_order() {
        // "today" overlaps CurrentWeather and CurrentTemperature equally
        let query = normalize("today");
        let forward = IntentCatalog::new(&[Intent::CurrentWeather, Intent::CurrentTemperature]);
        let reversed = IntentCatalog::new(&[Intent::CurrentTemperature, Intent::CurrentWeather]);

        assert_eq!(forward.best_match(&query), Some(Intent::CurrentWeather));
        assert_eq!(reversed.best_match(&query), Some(Intent::CurrentTemperature));
    }
}
