//! DuckDuckGo search provider

use super::traits::*;
use crate::error::ProviderError;
use crate::network::{accept_json, HttpClient, HttpRequest};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde::Deserialize;
use std::collections::HashMap;

const HTML_URL: &str = "https://html.duckduckgo.com/html/";
const API_URL: &str = "https://api.duckduckgo.com/";

static RESULT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.result").expect("result selector is valid"));
static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a.result__a").expect("title selector is valid"));
static SNIPPET_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a.result__snippet").expect("snippet selector is valid"));

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct InstantAnswer {
    abstract_text: String,
    #[serde(rename = "AbstractURL")]
    abstract_url: String,
    heading: String,
    results: Vec<Topic>,
    related_topics: Vec<Topic>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct Topic {
    text: String,
    #[serde(rename = "FirstURL")]
    first_url: String,
}

/// DuckDuckGo web search: HTML results first, Instant Answer API second
pub struct DuckDuckGo {
    name: String,
    client: HttpClient,
    max_results: usize,
    html_url: String,
    api_url: String,
}

impl DuckDuckGo {
    pub fn new(client: HttpClient) -> Self {
        Self {
            name: "duckduckgo".to_string(),
            client,
            max_results: 5,
            html_url: HTML_URL.to_string(),
            api_url: API_URL.to_string(),
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

    /// Point both call paths at another host
    pub fn with_base_url(mut self, base: &str) -> Self {
        let base = base.trim_end_matches('/');
        self.html_url = format!("{base}/html/");
        self.api_url = format!("{base}/");
        self
    }

    fn parse_html(&self, html: &str) -> Vec<SearchHit> {
        let document = Html::parse_document(html);
        let mut hits = Vec::new();

        for element in document.select(&RESULT_SELECTOR) {
            let Some(title_elem) = element.select(&TITLE_SELECTOR).next() else {
                continue;
            };

            let title = title_elem.text().collect::<String>();
            let url = title_elem.value().attr("href").unwrap_or_default();
            // Ads and internal links
            if title.trim().is_empty() || url.is_empty() || url.contains("duckduckgo.com") {
                continue;
            }

            let snippet = element
                .select(&SNIPPET_SELECTOR)
                .next()
                .map(|s| s.text().collect::<String>())
                .unwrap_or_default();

            hits.push(SearchHit::new(title, url, snippet));
            if hits.len() >= self.max_results {
                break;
            }
        }

        hits
    }

    fn format_instant(&self, answer: InstantAnswer) -> String {
        let abstract_answer = if answer.abstract_url.is_empty() {
            answer.abstract_text.clone()
        } else {
            format!("{} ({})", answer.abstract_text, answer.abstract_url)
        };

        let hits: Vec<SearchHit> = answer
            .results
            .into_iter()
            .chain(answer.related_topics)
            .filter(|t| !t.first_url.is_empty())
            .take(self.max_results)
            .map(|t| {
                let title = t.text.split(" - ").next().unwrap_or_default().to_string();
                let title = if title.is_empty() { answer.heading.clone() } else { title };
                SearchHit::new(title, t.first_url, t.text)
            })
            .collect();

        let answer_text = (!answer.abstract_text.trim().is_empty()).then_some(abstract_answer);
        format_hits(answer_text.as_deref(), &hits)
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGo {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities::new()
            .fallback(true)
            .website("https://duckduckgo.com")
    }

    async fn search(&self, query: &str) -> Result<String, ProviderError> {
        let mut form = HashMap::new();
        form.insert("q".to_string(), query.to_string());
        form.insert("b".to_string(), String::new());

        let request = HttpRequest::post(&self.html_url).form(form);
        let response = self.client.execute(request).await?.error_for_status()?;
        if response.is_captcha() {
            return Err(ProviderError::Captcha);
        }

        Ok(format_hits(None, &self.parse_html(&response.text)))
    }

    async fn search_fallback(&self, query: &str) -> Result<String, ProviderError> {
        let request = HttpRequest::get(&self.api_url)
            .header("Accept", accept_json())
            .param("q", query)
            .param("format", "json")
            .param("no_redirect", "1")
            .param("no_html", "1");

        let response = self.client.execute(request).await?.error_for_status()?;
        Ok(self.format_instant(response.json()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const RESULT_PAGE: &str = r#"
        <html><body>
          <div class="result">
            <a class="result__a" href="https://duckduckgo.com/y.js?ad=1">Sponsored</a>
          </div>
          <div class="result">
            <a class="result__a" href="https://tokio.rs/">Tokio</a>
            <a class="result__snippet">An asynchronous Rust runtime</a>
          </div>
        </body></html>
    "#;

    fn ddg(server: &MockServer) -> DuckDuckGo {
        DuckDuckGo::new(HttpClient::new().unwrap()).with_base_url(&server.uri())
    }

    #[tokio::test]
    async fn test_html_search() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/html/"))
            .and(body_string_contains("q=tokio"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RESULT_PAGE))
            .mount(&server)
            .await;

        let text = ddg(&server).search("tokio").await.unwrap();
        assert!(text.contains("1. Tokio\n   URL: https://tokio.rs/\n   Content: An asynchronous Rust runtime"));
        assert!(!text.contains("Sponsored"));
    }

    #[tokio::test]
    async fn test_empty_page_gives_empty_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        assert_eq!(ddg(&server).search("tokio").await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_instant_answer_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .and(query_param("format", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "Heading": "Tokio",
                "AbstractText": "Tokio is an asynchronous runtime for Rust.",
                "AbstractURL": "https://en.wikipedia.org/wiki/Tokio",
                "Results": [],
                "RelatedTopics": [
                    {"Text": "Mio - Metal I/O library", "FirstURL": "https://duckduckgo.com/Mio"},
                    {"Name": "Group", "Topics": []}
                ]
            })))
            .mount(&server)
            .await;

        let text = ddg(&server).search_fallback("tokio").await.unwrap();
        assert!(text.starts_with(
            "Answer: Tokio is an asynchronous runtime for Rust. (https://en.wikipedia.org/wiki/Tokio)\n"
        ));
        assert!(text.contains("1. Mio\n   URL: https://duckduckgo.com/Mio"));
    }

    #[test]
    fn test_instant_answer_field_names() {
        let answer: InstantAnswer = serde_json::from_value(serde_json::json!({
            "AbstractText": "Rust is a systems language.",
            "AbstractURL": "https://en.wikipedia.org/wiki/Rust",
            "Heading": "Rust"
        }))
        .unwrap();
        assert_eq!(answer.abstract_url, "https://en.wikipedia.org/wiki/Rust");
        assert_eq!(answer.heading, "Rust");
    }

    #[tokio::test]
    async fn test_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = ddg(&server).search("tokio").await.unwrap_err();
        assert_eq!(err, ProviderError::Status(503));
    }
}
