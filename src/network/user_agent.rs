//! User agent generation and accept headers

use rand::seq::SliceRandom;
use rand::Rng;

const CHROME_VERSIONS: &[&str] = &["124.0.0.0", "125.0.0.0", "126.0.0.0", "127.0.0.0"];
const FIREFOX_VERSIONS: &[&str] = &["125.0", "126.0", "127.0", "128.0"];
const SAFARI_VERSIONS: &[&str] = &["17.4", "17.5", "17.6"];

const DESKTOP_PLATFORMS: &[&str] = &[
    "Windows NT 10.0; Win64; x64",
    "Macintosh; Intel Mac OS X 10_15_7",
    "X11; Linux x86_64",
    "X11; Ubuntu; Linux x86_64",
];

/// Generate a random desktop browser user agent.
///
/// Roughly 60% Chrome, 30% Firefox, 10% Safari.
pub fn generate_user_agent() -> String {
    let mut rng = rand::thread_rng();
    let platform = DESKTOP_PLATFORMS.choose(&mut rng).copied().unwrap_or("X11; Linux x86_64");

    match rng.gen_range(0..10u8) {
        0..=5 => {
            let version = CHROME_VERSIONS.choose(&mut rng).copied().unwrap_or("126.0.0.0");
            format!(
                "Mozilla/5.0 ({platform}) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{version} Safari/537.36"
            )
        }
        6..=8 => {
            let version = FIREFOX_VERSIONS.choose(&mut rng).copied().unwrap_or("127.0");
            format!("Mozilla/5.0 ({platform}; rv:{version}) Gecko/20100101 Firefox/{version}")
        }
        _ => {
            let version = SAFARI_VERSIONS.choose(&mut rng).copied().unwrap_or("17.5");
            format!(
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/{version} Safari/605.1.15"
            )
        }
    }
}

/// Accept header for HTML pages
pub fn accept_html() -> &'static str {
    "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"
}

/// Accept header for JSON APIs
pub fn accept_json() -> &'static str {
    "application/json"
}

/// Accept-Language header value
pub fn accept_language(lang: &str) -> String {
    if lang == "all" || lang.is_empty() {
        "en-US,en;q=0.9".to_string()
    } else {
        format!("{},en-US;q=0.9,en;q=0.8", lang)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_user_agent() {
        for _ in 0..20 {
            let ua = generate_user_agent();
            assert!(ua.starts_with("Mozilla/5.0"));
            assert!(ua.len() > 50);
        }
    }

    #[test]
    fn test_accept_language() {
        assert_eq!(accept_language("all"), "en-US,en;q=0.9");
        assert_eq!(accept_language("de"), "de,en-US;q=0.9,en;q=0.8");
    }
}
