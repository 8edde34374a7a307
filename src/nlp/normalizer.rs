//! Text normalization for intent matching
//!
//! Turns free text into a [`TokenSet`]:
//! 1. Strip punctuation (Unicode `P*` categories plus ASCII punctuation)
//! 2. Split on whitespace
//! 3. Lowercase and stem each token to a fixed point (English Snowball stemmer)
//! 4. Drop stopwords
//!
//! Stopwords are removed after stemming, so a stem that no longer matches the
//! stopword list (for example `does` -> `doe`) is kept.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};

use super::stopwords::is_stopword;

/// Set of stemmed, lowercased, stopword-free tokens
pub type TokenSet = BTreeSet<String>;

static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{P}[:punct:]]").expect("Invalid punctuation regex"));

static STEMMER: LazyLock<Stemmer> = LazyLock::new(|| Stemmer::create(Algorithm::English));

const MAX_STEM_PASSES: usize = 8;

/// Normalize free text into its token set
#[must_use]
pub fn normalize(text: &str) -> TokenSet {
    let stripped = PUNCTUATION.replace_all(text, "");

    stripped
        .split_whitespace()
        .map(|token| stem(&token.to_lowercase()))
        .filter(|token| !is_stopword(token))
        .collect()
}

/// Stem until the token stops changing; a single Snowball pass can leave a
/// stem that stems further (`sunrises` -> `sunris` -> `sunri`)
fn stem(token: &str) -> String {
    let mut current = token.to_string();
    for _ in 0..MAX_STEM_PASSES {
        let next = STEMMER.stem(&current);
        if next == current {
            break;
        }
        current = next.into_owned();
    }
    current
}
