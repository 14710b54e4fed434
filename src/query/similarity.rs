//! Query similarity matching

use std::collections::HashSet;

/// Filler words ignored when comparing queries
pub const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "is", "are", "was", "were", "in", "on", "at", "to",
    "for", "with", "by", "about", "like", "through", "over", "before", "between", "after",
    "since", "without", "under", "within", "along", "following", "across", "behind", "beyond",
    "plus", "except", "up", "down", "off", "me", "you",
];

/// Reduce a query to its set of significant terms.
///
/// Lowercases, strips everything that is neither alphanumeric nor
/// whitespace, then drops single-character tokens and stop words.
pub fn normalize_terms(query: &str) -> HashSet<String> {
    let cleaned: String = query
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();

    cleaned
        .split_whitespace()
        .filter(|token| token.chars().count() > 1)
        .filter(|token| !STOP_WORDS.contains(token))
        .map(str::to_string)
        .collect()
}

/// Jaccard index of two term sets (0.0 when both are empty)
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Whether two queries should be treated as the same logical query.
///
/// Short queries need a near-exact match; long queries may also match on
/// the absolute number of shared terms.
pub fn similar(a: &str, b: &str) -> bool {
    if a.trim().is_empty() || b.trim().is_empty() {
        return false;
    }

    let terms_a = normalize_terms(a);
    let terms_b = normalize_terms(b);

    // Trivial queries never match, to avoid false cache hits
    if terms_a.is_empty() || terms_b.is_empty() {
        return false;
    }

    if terms_a == terms_b {
        return true;
    }

    let intersection = terms_a.intersection(&terms_b).count();
    let score = jaccard(&terms_a, &terms_b);
    let min_terms = terms_a.len().min(terms_b.len());

    match min_terms {
        0..=3 => score > 0.8,
        4..=6 => score > 0.7,
        _ => score > 0.6 || intersection >= 5usize.min(min_terms / 2),
    }
}
