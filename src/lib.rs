//! search-relay: budgeted, cached, failover search dispatch
//!
//! A [`SearchDispatcher`] sits between a caller (typically an automated
//! research agent) and a set of rate-limited web search providers. It
//! rotates providers, enforces per-provider spacing, reuses results for
//! similar queries and caps how many provider calls one logical query may
//! consume.

pub mod cache;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod metrics;
pub mod network;
pub mod providers;
pub mod query;
pub mod research;
pub mod web;

pub use config::Settings;
pub use dispatch::{DispatchOptions, SearchDispatcher, SearchOutcome};
pub use error::{AttemptError, ConfigError, ProviderError};
pub use providers::{ProviderRegistry, SearchProvider};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
