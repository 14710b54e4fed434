//! HTTP networking module
//!
//! Provides the HTTP client the reference providers use to reach their APIs.

mod client;
mod request;
mod user_agent;

pub use client::HttpClient;
pub use request::{HttpMethod, HttpRequest, HttpResponse, RequestBody};
pub use user_agent::{accept_json, generate_user_agent};
