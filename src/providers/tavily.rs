//! Tavily search API provider

use super::traits::*;
use crate::error::ProviderError;
use crate::network::{accept_json, HttpClient, HttpRequest};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

const TAVILY_URL: &str = "https://api.tavily.com/search";

/// The API rejects larger result counts
const MAX_RESULTS_LIMIT: usize = 10;

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    answer: Option<String>,
    results: Option<Vec<TavilyResult>>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

/// Tavily web search over its JSON API
pub struct Tavily {
    name: String,
    client: HttpClient,
    api_key: Option<String>,
    search_depth: String,
    max_results: usize,
    include_answer: bool,
    base_url: String,
}

impl Tavily {
    pub fn new(client: HttpClient, api_key: Option<String>) -> Self {
        Self {
            name: "tavily".to_string(),
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            search_depth: "basic".to_string(),
            max_results: 5,
            include_answer: false,
            base_url: TAVILY_URL.to_string(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_search_depth(mut self, depth: impl Into<String>) -> Self {
        self.search_depth = depth.into();
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_answer(mut self, include_answer: bool) -> Self {
        self.include_answer = include_answer;
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn payload(&self, api_key: &str, query: &str) -> serde_json::Value {
        serde_json::json!({
            "api_key": api_key,
            "query": query,
            "search_depth": self.search_depth,
            "max_results": self.max_results.min(MAX_RESULTS_LIMIT),
            "include_answer": self.include_answer,
        })
    }

    fn format_response(body: TavilyResponse) -> Result<String, ProviderError> {
        let Some(results) = body.results else {
            return Err(ProviderError::UnexpectedShape(
                body.error.unwrap_or_else(|| "response has no results".to_string()),
            ));
        };

        let hits: Vec<SearchHit> = results
            .into_iter()
            .map(|r| SearchHit::new(r.title, r.url, r.content))
            .collect();

        Ok(format_hits(body.answer.as_deref(), &hits))
    }
}

#[async_trait]
impl SearchProvider for Tavily {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities::new()
            .api_key_required(true)
            .official_api(true)
            .website("https://tavily.com")
    }

    async fn search(&self, query: &str) -> Result<String, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::MissingApiKey(self.name.clone()))?;

        debug!("Tavily search ({} depth): {}", self.search_depth, query);
        let request = HttpRequest::post(&self.base_url)
            .header("Accept", accept_json())
            .json(self.payload(api_key, query));

        let response = self.client.execute(request).await?.error_for_status()?;
        Self::format_response(response.json()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn tavily(server: &MockServer, key: Option<&str>) -> Tavily {
        Tavily::new(HttpClient::new().unwrap(), key.map(str::to_string))
            .with_base_url(format!("{}/search", server.uri()))
    }

    #[tokio::test]
    async fn test_search_formats_results() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/search"))
            .and(body_partial_json(serde_json::json!({
                "api_key": "tvly-key",
                "query": "rust ownership",
                "max_results": 10,
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "answer": "Ownership is Rust's memory model.",
                "results": [
                    {"title": "The Book", "url": "https://doc.rust-lang.org/book", "content": " Ownership rules "}
                ]
            })))
            .mount(&server)
            .await;

        let text = tavily(&server, Some("tvly-key"))
            .with_max_results(25)
            .with_answer(true)
            .search("rust ownership")
            .await
            .unwrap();

        assert!(text.starts_with("Answer: Ownership is Rust's memory model.\n"));
        assert!(text.contains("1. The Book\n   URL: https://doc.rust-lang.org/book\n   Content: Ownership rules"));
    }

    #[tokio::test]
    async fn test_missing_key_is_fault() {
        let server = MockServer::start().await;
        let err = tavily(&server, Some("  ")).search("rust").await.unwrap_err();
        assert_eq!(err, ProviderError::MissingApiKey("tavily".to_string()));
    }

    #[tokio::test]
    async fn test_body_without_results() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"error": "Invalid API key"})),
            )
            .mount(&server)
            .await;

        let err = tavily(&server, Some("bad")).search("rust").await.unwrap_err();
        assert_eq!(err, ProviderError::UnexpectedShape("Invalid API key".to_string()));
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let err = tavily(&server, Some("k")).search("rust").await.unwrap_err();
        assert_eq!(err, ProviderError::RateLimited);
    }
}
