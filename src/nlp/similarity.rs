//! Token-set similarity and best-match selection

use super::TokenSet;

/// Jaccard index `|A ∩ B| / |A ∪ B|`; two empty sets score 0
#[must_use]
pub fn jaccard_similarity(a: &TokenSet, b: &TokenSet) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    intersection as f64 / union as f64
}

/// Pick the candidate whose token set is most similar to `query`.
///
/// Candidates are scanned in order and only a strictly higher score replaces
/// the current best, so ties go to the earliest candidate. A candidate must
/// score above zero to be selected at all.
pub fn best_match<'a, K, I>(query: &TokenSet, candidates: I) -> Option<K>
where
    I: IntoIterator<Item = (K, &'a TokenSet)>,
{
    let mut highest = 0.0;
    let mut best = None;

    for (key, tokens) in candidates {
        let score = jaccard_similarity(query, tokens);
        if score > highest {
            highest = score;
            best = Some(key);
        }
    }

    best
}
