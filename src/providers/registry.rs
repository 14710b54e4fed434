//! Provider registry: the fixed, ordered set of providers a dispatcher uses

use super::rate_limiter::RateLimiter;
use super::traits::SearchProvider;
use crate::error::ConfigError;
use std::sync::Arc;
use std::time::Duration;

/// A provider together with its rate limiter
#[derive(Clone)]
pub struct RegisteredProvider {
    provider: Arc<dyn SearchProvider>,
    limiter: RateLimiter,
}

impl RegisteredProvider {
    pub fn name(&self) -> &str {
        self.provider.name()
    }

    pub fn provider(&self) -> &Arc<dyn SearchProvider> {
        &self.provider
    }

    pub fn limiter(&self) -> RateLimiter {
        self.limiter
    }

    /// Run a rate-limited search against this provider
    pub async fn invoke(&self, query: &str) -> Result<String, crate::error::ProviderError> {
        self.limiter.invoke(self.provider.as_ref(), query).await
    }
}

impl std::fmt::Debug for RegisteredProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredProvider")
            .field("name", &self.name())
            .field("delay", &self.limiter.delay())
            .finish()
    }
}

/// Providers in registration order. Names are unique.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<RegisteredProvider>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider with the delay enforced after each of its calls
    pub fn register(
        &mut self,
        provider: Arc<dyn SearchProvider>,
        delay: Duration,
    ) -> Result<(), ConfigError> {
        let name = provider.name().to_string();
        if self.contains(&name) {
            return Err(ConfigError::DuplicateProvider(name));
        }

        self.providers.push(RegisteredProvider {
            provider,
            limiter: RateLimiter::new(delay),
        });
        Ok(())
    }

    /// Builder-style registration
    pub fn with(
        mut self,
        provider: Arc<dyn SearchProvider>,
        delay: Duration,
    ) -> Result<Self, ConfigError> {
        self.register(provider, delay)?;
        Ok(self)
    }

    /// Get a provider by registration index
    pub fn get(&self, index: usize) -> Option<&RegisteredProvider> {
        self.providers.get(index)
    }

    /// Get a provider by name
    pub fn by_name(&self, name: &str) -> Option<&RegisteredProvider> {
        self.providers.iter().find(|p| p.name() == name)
    }

    /// Registration index of a provider
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.providers.iter().position(|p| p.name() == name)
    }

    /// Check if a provider exists
    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    /// All provider names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RegisteredProvider> {
        self.providers.iter()
    }

    /// Get number of registered providers
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
