//! Provider traits and types

use crate::error::ProviderError;
use async_trait::async_trait;
use serde::Serialize;

/// What a provider can do beyond a plain search
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProviderCapabilities {
    /// Whether `search_fallback` is a real second call path
    pub has_fallback: bool,
    /// Whether an API key is required for the primary path
    pub requires_api_key: bool,
    /// Whether the primary path uses the provider's official API
    pub official_api: bool,
    /// Website URL
    pub website: Option<String>,
}

impl ProviderCapabilities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fallback(mut self, has_fallback: bool) -> Self {
        self.has_fallback = has_fallback;
        self
    }

    pub fn api_key_required(mut self, required: bool) -> Self {
        self.requires_api_key = required;
        self
    }

    pub fn official_api(mut self, uses: bool) -> Self {
        self.official_api = uses;
        self
    }

    pub fn website(mut self, url: impl Into<String>) -> Self {
        self.website = Some(url.into());
        self
    }
}

/// A named, fallible text-in/text-out search backend.
///
/// Implementations must be shareable across concurrent dispatches.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Provider name, unique within a registry
    fn name(&self) -> &str;

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities::default()
    }

    /// Run a search through the primary call path
    async fn search(&self, query: &str) -> Result<String, ProviderError>;

    /// Run a search through the secondary call path, if there is one
    async fn search_fallback(&self, _query: &str) -> Result<String, ProviderError> {
        Err(ProviderError::NoFallback(self.name().to_string()))
    }
}

/// One web result, as rendered into provider text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    pub content: String,
}

impl SearchHit {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            content: content.into(),
        }
    }
}

/// Render hits as the numbered plain-text block every provider returns.
///
/// An empty hit list renders as an empty string so the dispatcher treats
/// it as an invalid result.
pub fn format_hits(answer: Option<&str>, hits: &[SearchHit]) -> String {
    if hits.is_empty() && answer.map_or(true, |a| a.trim().is_empty()) {
        return String::new();
    }

    let mut output = Vec::new();
    if let Some(answer) = answer.filter(|a| !a.trim().is_empty()) {
        output.push(format!("Answer: {}\n", answer.trim()));
    }

    output.push("Search Results:".to_string());
    for (i, hit) in hits.iter().enumerate() {
        let title = if hit.title.trim().is_empty() { "No Title" } else { hit.title.trim() };
        let url = if hit.url.trim().is_empty() { "No URL" } else { hit.url.trim() };
        let content = if hit.content.trim().is_empty() {
            "No Content"
        } else {
            hit.content.trim()
        };
        output.push(format!(
            "\n{}. {}\n   URL: {}\n   Content: {}\n",
            i + 1,
            title,
            url,
            content
        ));
    }

    output.join("\n")
}
