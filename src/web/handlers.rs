//! HTTP request handlers

use super::state::AppState;
use crate::dispatch::{SearchOutcome, SessionSnapshot};
use crate::metrics::MetricsSnapshot;
use crate::providers::ProviderCapabilities;
use crate::query::is_valid_query;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Query parameters for search
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// Search query
    pub q: Option<String>,
}

/// Search response: the outcome plus its agent-facing text
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    #[serde(flatten)]
    pub outcome: SearchOutcome,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub metrics: MetricsSnapshot,
    pub session: SessionSnapshot,
    pub cache_entries: usize,
}

#[derive(Debug, Serialize)]
pub struct ProviderInfo {
    pub name: String,
    pub delay_secs: f64,
    pub capabilities: ProviderCapabilities,
    pub last_used_ms_ago: Option<u64>,
}

fn bad_request(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

/// Search handler
pub async fn search(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Response {
    let Some(query) = params.q.map(|q| q.trim().to_string()) else {
        return bad_request("missing query parameter 'q'");
    };
    if !is_valid_query(&query) {
        return bad_request(format!("not a searchable query: '{}'", query));
    }

    let outcome = state.dispatcher.run(&query).await;
    Json(SearchResponse {
        message: outcome.to_string(),
        query,
        outcome,
    })
    .into_response()
}

/// Metrics, current session and cache size
pub async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    let dispatcher = &state.dispatcher;
    Json(StatsResponse {
        metrics: dispatcher.metrics().snapshot(),
        session: dispatcher.session(),
        cache_entries: dispatcher.cache_len(),
    })
}

/// Registered providers in registration order
pub async fn providers(State(state): State<AppState>) -> impl IntoResponse {
    let dispatcher = &state.dispatcher;
    let usage = dispatcher.usage();

    let providers: Vec<ProviderInfo> = dispatcher
        .providers()
        .iter()
        .zip(usage)
        .map(|(provider, usage)| ProviderInfo {
            name: provider.name().to_string(),
            delay_secs: provider.limiter().delay().as_secs_f64(),
            capabilities: provider.provider().capabilities(),
            last_used_ms_ago: usage.last_used_ms_ago,
        })
        .collect();

    Json(providers)
}

/// Health check handler
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "instance_name": state.instance_name(),
        "version": crate::VERSION,
        "providers": state.dispatcher.provider_names().len(),
    }))
}

#[cfg(test)]
mod tests {
    use crate::config::Settings;
    use crate::dispatch::{DispatchOptions, SearchDispatcher};
    use crate::error::ProviderError;
    use crate::providers::{ProviderRegistry, SearchProvider};
    use crate::web::{create_router, AppState};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    struct Canned;

    #[async_trait]
    impl SearchProvider for Canned {
        fn name(&self) -> &str {
            "canned"
        }

        async fn search(&self, query: &str) -> Result<String, ProviderError> {
            Ok(format!("Search Results:\n1. About {query}\n   URL: https://example.com"))
        }
    }

    fn app() -> axum::Router {
        let registry = ProviderRegistry::new()
            .with(Arc::new(Canned), Duration::ZERO)
            .unwrap();
        let dispatcher = SearchDispatcher::new(registry, DispatchOptions::default()).unwrap();
        create_router(AppState::new(Settings::default(), dispatcher))
    }

    async fn get(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_search_endpoint() {
        let (status, json) = get(app(), "/search?q=rust%20ownership").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["outcome"], "success");
        assert_eq!(json["provider_name"], "canned");
        assert_eq!(json["query"], "rust ownership");
        assert!(json["message"]
            .as_str()
            .unwrap()
            .contains("Search performed using canned"));
    }

    #[tokio::test]
    async fn test_invalid_query_rejected() {
        let (status, json) = get(app(), "/search?q=123456").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("123456"));

        let (status, _) = get(app(), "/search").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health_and_providers() {
        let (status, json) = get(app(), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["providers"], 1);

        let (_, json) = get(app(), "/providers").await;
        assert_eq!(json[0]["name"], "canned");
        assert_eq!(json[0]["delay_secs"], 0.0);
        assert!(json[0]["last_used_ms_ago"].is_null());
    }

    #[tokio::test]
    async fn test_stats_after_search() {
        let app = app();
        get(app.clone(), "/search?q=rust%20ownership").await;
        get(app.clone(), "/search?q=Rust%20ownership%3F").await;

        let (_, json) = get(app, "/stats").await;
        assert_eq!(json["metrics"]["runs"], 2);
        assert_eq!(json["metrics"]["cache_hits"], 1);
        assert_eq!(json["session"]["calls_made"], 1);
        assert_eq!(json["cache_entries"], 1);
    }
}
