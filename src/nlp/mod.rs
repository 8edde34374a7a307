//! Lexical query processing
//!
//! - Normalizer: punctuation stripping, stemming and stopword removal
//! - Similarity: Jaccard scoring and first-wins best-match selection

pub mod normalizer;
pub mod similarity;
pub mod stopwords;

pub use normalizer::{TokenSet, normalize};
pub use similarity::{best_match, jaccard_similarity};
