//! Query validation

use once_cell::sync::Lazy;
use regex::Regex;

static EMOJI_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        "[",
        r"\x{1F600}-\x{1F64F}", // emoticons
        r"\x{1F300}-\x{1F5FF}", // symbols & pictographs
        r"\x{1F680}-\x{1F6FF}", // transport & map symbols
        r"\x{1F700}-\x{1F77F}", // alchemical symbols
        r"\x{1F780}-\x{1F7FF}", // geometric shapes extended
        r"\x{1F800}-\x{1F8FF}", // supplemental arrows-C
        r"\x{1F900}-\x{1F9FF}", // supplemental symbols and pictographs
        r"\x{1FA00}-\x{1FA6F}", // chess symbols
        r"\x{1FA70}-\x{1FAFF}", // symbols and pictographs extended-A
        r"\x{2702}-\x{27B0}",   // dingbats
        r"\x{24C2}-\x{1F251}",
        "]+"
    ))
    .expect("emoji pattern is valid")
});

static DIGITS_ONLY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{5,}$").expect("digit pattern is valid"));

/// Whether a query is worth sending to a search provider.
///
/// Rejects empty input, a lone emoji (or very short emoji-only input),
/// bare numbers of five or more digits, and long strings without a single
/// vowel.
pub fn is_valid_query(query: &str) -> bool {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return false;
    }

    let without_emoji = EMOJI_RE.replace_all(query, "");
    if without_emoji.trim().is_empty() && query.chars().count() <= 5 {
        return false;
    }

    if DIGITS_ONLY_RE.is_match(trimmed) {
        return false;
    }

    if query.chars().count() > 10 && !query.chars().any(|c| "aeiouAEIOU".contains(c)) {
        return false;
    }

    true
}
