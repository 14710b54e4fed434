//! Search providers
//!
//! Defines the [`SearchProvider`] trait, the per-provider rate limiter and
//! the registry a dispatcher draws from, plus reference providers for
//! Tavily, Brave and DuckDuckGo.

mod loader;
mod rate_limiter;
mod registry;
mod traits;

pub mod brave;
pub mod duckduckgo;
pub mod tavily;

pub use brave::Brave;
pub use duckduckgo::DuckDuckGo;
pub use loader::{ProviderLoader, AVAILABLE_ENGINES};
pub use rate_limiter::RateLimiter;
pub use registry::{ProviderRegistry, RegisteredProvider};
pub use tavily::Tavily;
pub use traits::*;
