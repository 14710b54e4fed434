//! Provider loader for building a registry from configuration

use super::registry::ProviderRegistry;
use super::traits::SearchProvider;
use super::{brave::Brave, duckduckgo::DuckDuckGo, tavily::Tavily};
use crate::config::{ProviderConfig, Settings};
use crate::error::ConfigError;
use crate::network::HttpClient;
use std::sync::Arc;
use tracing::{info, warn};

/// Provider implementations selectable through `engine`
pub const AVAILABLE_ENGINES: &[&str] = &["brave", "duckduckgo", "tavily"];

/// Builds a [`ProviderRegistry`] from settings
pub struct ProviderLoader;

impl ProviderLoader {
    /// Load every enabled provider, in configuration order.
    ///
    /// Unknown engines, invalid delays and duplicate names are errors. A
    /// keyless provider that needs a key is loaded with a warning, unless
    /// no enabled provider could ever answer.
    pub fn load(settings: &Settings, client: HttpClient) -> Result<ProviderRegistry, ConfigError> {
        let mut registry = ProviderRegistry::new();
        let mut unusable = Vec::new();

        for config in &settings.providers {
            if config.disabled {
                info!("Skipping disabled provider: {}", config.name);
                continue;
            }

            let delay = config.delay()?;
            let provider = Self::create_provider(config, client.clone())?;
            let capabilities = provider.capabilities();
            let has_key = config.api_key.as_deref().is_some_and(|k| !k.trim().is_empty());
            if capabilities.requires_api_key && !has_key {
                if capabilities.has_fallback {
                    warn!("Provider {} has no API key, only its fallback path will work", config.name);
                } else {
                    warn!("Provider {} has no API key, every call will fail", config.name);
                    unusable.push(config.name.clone());
                }
            }
            registry.register(provider, delay)?;
            info!(
                "Loaded provider: {} ({}, {:.1}s delay)",
                config.name,
                config.engine,
                delay.as_secs_f64()
            );
        }

        if !registry.is_empty() && unusable.len() == registry.len() {
            return Err(ConfigError::MissingApiKeys(unusable));
        }

        info!("Loaded {} providers", registry.len());
        Ok(registry)
    }

    fn create_provider(
        config: &ProviderConfig,
        client: HttpClient,
    ) -> Result<Arc<dyn SearchProvider>, ConfigError> {
        let api_key = config.api_key.clone();

        let provider: Arc<dyn SearchProvider> = match config.engine.as_str() {
            "tavily" => {
                let mut tavily = Tavily::new(client, api_key)
                    .with_name(&config.name)
                    .with_search_depth(&config.search_depth)
                    .with_max_results(config.max_results)
                    .with_answer(config.include_answer);
                if let Some(ref url) = config.base_url {
                    tavily = tavily.with_base_url(url);
                }
                Arc::new(tavily)
            }
            "brave" => {
                let mut brave = Brave::new(client, api_key)
                    .with_name(&config.name)
                    .with_max_results(config.max_results);
                if let Some(ref url) = config.base_url {
                    brave = brave.with_base_url(url);
                }
                Arc::new(brave)
            }
            "duckduckgo" => {
                let mut ddg = DuckDuckGo::new(client)
                    .with_name(&config.name)
                    .with_max_results(config.max_results);
                if let Some(ref url) = config.base_url {
                    ddg = ddg.with_base_url(url);
                }
                Arc::new(ddg)
            }
            other => return Err(ConfigError::UnknownEngine(other.to_string())),
        };

        Ok(provider)
    }
}
