//! HTTP client for making requests to search providers

use super::request::{HttpMethod, HttpRequest, HttpResponse, RequestBody};
use super::user_agent::{accept_html, accept_language, generate_user_agent};
use crate::config::OutgoingSettings;
use crate::error::{ConfigError, ProviderError};
use reqwest::{Client, Response};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// HTTP client wrapper configured from the `outgoing` settings
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    default_timeout: Duration,
    user_agent: String,
    extra_headers: HashMap<String, String>,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self, ConfigError> {
        Self::with_settings(&OutgoingSettings::default())
    }

    /// Create a new HTTP client with custom settings
    pub fn with_settings(settings: &OutgoingSettings) -> Result<Self, ConfigError> {
        let timeout = Duration::from_secs_f64(settings.request_timeout.max(0.1));
        let mut builder = Client::builder()
            .timeout(timeout)
            .pool_max_idle_per_host(settings.pool_maxsize)
            .gzip(true)
            .brotli(true);

        if !settings.verify_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let proxy = |result: reqwest::Result<reqwest::Proxy>| {
            result.map_err(|e| ConfigError::HttpClient(e.to_string()))
        };
        if let Some(ref proxy_url) = settings.proxies.all {
            builder = builder.proxy(proxy(reqwest::Proxy::all(proxy_url))?);
        } else {
            if let Some(ref http) = settings.proxies.http {
                builder = builder.proxy(proxy(reqwest::Proxy::http(http))?);
            }
            if let Some(ref https) = settings.proxies.https {
                builder = builder.proxy(proxy(reqwest::Proxy::https(https))?);
            }
        }

        let client = builder
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            default_timeout: timeout,
            user_agent: generate_user_agent(),
            extra_headers: settings.extra_headers.clone(),
        })
    }

    /// Execute a provider request
    pub async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ProviderError> {
        self.execute_with_timeout(request, self.default_timeout)
            .await
    }

    /// Execute a provider request with custom timeout
    pub async fn execute_with_timeout(
        &self,
        request: HttpRequest,
        timeout: Duration,
    ) -> Result<HttpResponse, ProviderError> {
        debug!("{:?} {}", request.method, request.url);

        let mut req_builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };

        req_builder = req_builder
            .timeout(timeout)
            .header("User-Agent", &self.user_agent)
            .header("Accept-Language", accept_language("en"))
            .header("DNT", "1");

        if !request.headers.contains_key("Accept") {
            req_builder = req_builder.header("Accept", accept_html());
        }

        for (key, value) in self.extra_headers.iter().chain(request.headers.iter()) {
            req_builder = req_builder.header(key, value);
        }

        if !request.params.is_empty() {
            req_builder = req_builder.query(&request.params);
        }

        if let Some(body) = request.data {
            req_builder = match body {
                RequestBody::Form(data) => req_builder.form(&data),
                RequestBody::Json(json) => req_builder.json(&json),
            };
        }

        let response = req_builder.send().await?;

        Self::parse_response(response).await
    }

    /// Simple GET request
    pub async fn get(&self, url: &str) -> Result<HttpResponse, ProviderError> {
        self.execute(HttpRequest::get(url)).await
    }

    /// POST with JSON body
    pub async fn post_json(
        &self,
        url: &str,
        json: serde_json::Value,
    ) -> Result<HttpResponse, ProviderError> {
        self.execute(HttpRequest::post(url).json(json)).await
    }

    async fn parse_response(response: Response) -> Result<HttpResponse, ProviderError> {
        let status = response.status().as_u16();
        let url = response.url().to_string();

        let mut headers = HashMap::new();
        for (key, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                headers.insert(key.to_string(), v.to_string());
            }
        }

        let text = response.text().await?;

        Ok(HttpResponse {
            status,
            headers,
            text,
            url,
        })
    }

    /// Pick a new random user agent
    pub fn rotate_user_agent(&mut self) {
        self.user_agent = generate_user_agent();
    }

    /// Get current user agent
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_client_creation() {
        let client = HttpClient::new();
        assert!(client.is_ok());
        assert!(client.unwrap().user_agent().starts_with("Mozilla/5.0"));
    }

    #[tokio::test]
    async fn test_get_with_params_and_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "rust"))
            .and(header("X-Test", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let request = HttpRequest::get(format!("{}/search", server.uri()))
            .param("q", "rust")
            .header("X-Test", "1");
        let response = client.execute(request).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.text, "hello");
    }

    #[tokio::test]
    async fn test_post_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api"))
            .and(body_json(serde_json::json!({"query": "rust"})))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;

        let client = HttpClient::new().unwrap();
        let response = client
            .post_json(
                &format!("{}/api", server.uri()),
                serde_json::json!({"query": "rust"}),
            )
            .await
            .unwrap();
        assert_eq!(response.status, 201);
    }

    #[tokio::test]
    async fn test_connection_failure_is_transport_fault() {
        let client = HttpClient::new().unwrap();
        let err = client.get("http://127.0.0.1:9/unreachable").await.unwrap_err();
        assert!(matches!(
            err,
            ProviderError::Transport(_) | ProviderError::Timeout(_)
        ));
    }
}
