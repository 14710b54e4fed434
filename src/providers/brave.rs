//! Brave search provider
//!
//! The primary path is the Brave Search API, which needs a subscription
//! token. Without one, or when the API fails, the public result page is
//! scraped instead.

use super::traits::*;
use crate::error::ProviderError;
use crate::network::{accept_json, HttpClient, HttpRequest};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use serde::Deserialize;
use tracing::debug;

const API_URL: &str = "https://api.search.brave.com/res/v1/web/search";
const HTML_URL: &str = "https://search.brave.com/search";

static RESULT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.snippet").expect("result selector is valid"));
static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a.result-header").expect("title selector is valid"));
static SNIPPET_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p.snippet-description").expect("snippet selector is valid"));

/// The API highlights matches with inline tags
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").expect("tag pattern is valid"));

#[derive(Debug, Deserialize)]
struct BraveResponse {
    web: Option<BraveWeb>,
}

#[derive(Debug, Deserialize)]
struct BraveWeb {
    #[serde(default)]
    results: Vec<BraveResult>,
}

#[derive(Debug, Deserialize)]
struct BraveResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    description: String,
}

/// Brave web search
pub struct Brave {
    name: String,
    client: HttpClient,
    api_key: Option<String>,
    max_results: usize,
    api_url: String,
    html_url: String,
}

impl Brave {
    pub fn new(client: HttpClient, api_key: Option<String>) -> Self {
        Self {
            name: "brave".to_string(),
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            max_results: 5,
            api_url: API_URL.to_string(),
            html_url: HTML_URL.to_string(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Point both call paths at another host, keeping their paths
    pub fn with_base_url(mut self, base: &str) -> Self {
        let base = base.trim_end_matches('/');
        self.api_url = format!("{base}/res/v1/web/search");
        self.html_url = format!("{base}/search");
        self
    }

    fn parse_api(&self, body: BraveResponse) -> Result<String, ProviderError> {
        let web = body
            .web
            .ok_or_else(|| ProviderError::UnexpectedShape("response has no web section".into()))?;

        let hits: Vec<SearchHit> = web
            .results
            .into_iter()
            .take(self.max_results)
            .map(|r| SearchHit::new(r.title, r.url, TAG_RE.replace_all(&r.description, "")))
            .collect();

        Ok(format_hits(None, &hits))
    }

    fn parse_html(&self, html: &str) -> Vec<SearchHit> {
        let document = Html::parse_document(html);
        let mut hits = Vec::new();

        for element in document.select(&RESULT_SELECTOR) {
            let Some(title_elem) = element.select(&TITLE_SELECTOR).next() else {
                continue;
            };

            let title = title_elem.text().collect::<String>().trim().to_string();
            let url = title_elem.value().attr("href").unwrap_or_default();
            // Relative links point back into Brave
            if title.is_empty() || url.is_empty() || url.starts_with('/') {
                continue;
            }

            let snippet = element
                .select(&SNIPPET_SELECTOR)
                .next()
                .map(|s| s.text().collect::<String>())
                .unwrap_or_default();

            hits.push(SearchHit::new(title, url, snippet.trim()));
            if hits.len() >= self.max_results {
                break;
            }
        }

        hits
    }
}

#[async_trait]
impl SearchProvider for Brave {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities::new()
            .fallback(true)
            .api_key_required(true)
            .official_api(true)
            .website("https://search.brave.com")
    }

    async fn search(&self, query: &str) -> Result<String, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::MissingApiKey(self.name.clone()))?;

        let request = HttpRequest::get(&self.api_url)
            .header("Accept", accept_json())
            .header("X-Subscription-Token", api_key)
            .param("q", query)
            .param("count", self.max_results.to_string());

        let response = self.client.execute(request).await?.error_for_status()?;
        self.parse_api(response.json()?)
    }

    async fn search_fallback(&self, query: &str) -> Result<String, ProviderError> {
        debug!("Scraping Brave result page for: {}", query);
        let request = HttpRequest::get(&self.html_url)
            .param("q", query)
            .param("source", "web");

        let response = self.client.execute(request).await?.error_for_status()?;
        if response.is_captcha() {
            return Err(ProviderError::Captcha);
        }

        Ok(format_hits(None, &self.parse_html(&response.text)))
    }
}
