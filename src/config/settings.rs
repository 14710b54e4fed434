//! Settings structures for search-relay configuration

use crate::dispatch::DispatchOptions;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// Main settings structure, loaded from `settings.yml`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub dispatch: DispatchSettings,
    pub server: ServerSettings,
    pub outgoing: OutgoingSettings,
    pub providers: Vec<ProviderConfig>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            general: GeneralSettings::default(),
            dispatch: DispatchSettings::default(),
            server: ServerSettings::default(),
            outgoing: OutgoingSettings::default(),
            providers: default_providers(),
        }
    }
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Parse settings from YAML text
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Merge with environment variables
    pub fn merge_env(&mut self) {
        self.merge_from(|key| std::env::var(key).ok());
    }

    /// Merge overrides from any key lookup; `merge_env` uses the process
    /// environment
    pub fn merge_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("SEARCH_RELAY_DEBUG") {
            self.general.debug = val.parse().unwrap_or(false);
        }
        if let Some(val) = lookup("SEARCH_RELAY_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = lookup("SEARCH_RELAY_BIND_ADDRESS") {
            self.server.bind_address = val;
        }

        for (engine, var) in [("brave", "BRAVE_API_KEY"), ("tavily", "TAVILY_API_KEY")] {
            let Some(key) = lookup(var).filter(|k| !k.trim().is_empty()) else {
                continue;
            };
            for provider in self.providers.iter_mut().filter(|p| p.engine == engine) {
                if provider.api_key.is_none() {
                    provider.api_key = Some(key.clone());
                }
            }
        }
    }

    /// Get provider config by name
    pub fn get_provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.iter().find(|p| p.name == name)
    }

    /// Get all enabled providers
    pub fn enabled_providers(&self) -> Vec<&ProviderConfig> {
        self.providers.iter().filter(|p| !p.disabled).collect()
    }

    /// Options for building a dispatcher
    pub fn dispatch_options(&self) -> DispatchOptions {
        DispatchOptions::default()
            .with_max_calls_per_query(self.dispatch.max_calls_per_query)
            .with_cache_ttl(Duration::from_secs(self.dispatch.cache_ttl))
            .with_max_provider_attempts(self.dispatch.max_provider_attempts)
    }
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Enable debug logging
    pub debug: bool,
    /// Instance name reported by `/health`
    pub instance_name: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            debug: false,
            instance_name: "search-relay".to_string(),
        }
    }
}

/// Budget, cache and failover settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchSettings {
    /// Provider calls allowed per logical query
    pub max_calls_per_query: u32,
    /// Cache lifetime (seconds)
    pub cache_ttl: u64,
    /// Distinct providers tried per search
    pub max_provider_attempts: usize,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        let options = DispatchOptions::default();
        Self {
            max_calls_per_query: options.max_calls_per_query,
            cache_ttl: options.cache_ttl.as_secs(),
            max_provider_attempts: options.max_provider_attempts,
        }
    }
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Server port
    pub port: u16,
    /// Bind address
    pub bind_address: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 8888,
            bind_address: "127.0.0.1".to_string(),
        }
    }
}

/// Outgoing request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutgoingSettings {
    /// Default request timeout in seconds
    pub request_timeout: f64,
    /// Pool max size
    pub pool_maxsize: usize,
    /// Verify SSL certificates
    pub verify_ssl: bool,
    /// Proxy settings
    pub proxies: ProxySettings,
    /// Extra headers to send
    pub extra_headers: HashMap<String, String>,
}

impl Default for OutgoingSettings {
    fn default() -> Self {
        Self {
            request_timeout: 10.0,
            pool_maxsize: 20,
            verify_ssl: true,
            proxies: ProxySettings::default(),
            extra_headers: HashMap::new(),
        }
    }
}

/// Proxy settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub http: Option<String>,
    pub https: Option<String>,
    pub all: Option<String>,
}

/// Individual provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Provider name (unique identifier)
    pub name: String,
    /// Provider implementation to use
    pub engine: String,
    /// Whether the provider is disabled
    pub disabled: bool,
    /// Delay enforced after each successful call (seconds)
    pub delay: f64,
    /// API key if required
    pub api_key: Option<String>,
    /// Results requested per call
    pub max_results: usize,
    /// Tavily search depth, `basic` or `advanced`
    pub search_depth: String,
    /// Include a synthesized answer when the provider offers one
    pub include_answer: bool,
    /// Endpoint override, mostly for testing
    pub base_url: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            engine: String::new(),
            disabled: false,
            delay: 0.0,
            api_key: None,
            max_results: 5,
            search_depth: "basic".to_string(),
            include_answer: false,
            base_url: None,
        }
    }
}

impl ProviderConfig {
    fn new(name: &str, delay: f64) -> Self {
        Self {
            name: name.to_string(),
            engine: name.to_string(),
            delay,
            ..Default::default()
        }
    }

    /// The configured delay, rejecting negative or non-finite values
    pub fn delay(&self) -> Result<Duration, ConfigError> {
        Duration::try_from_secs_f64(self.delay).map_err(|_| ConfigError::InvalidDelay {
            name: self.name.clone(),
            delay: self.delay,
        })
    }
}

/// Get default provider configurations
fn default_providers() -> Vec<ProviderConfig> {
    vec![
        ProviderConfig::new("brave", 10.0),
        ProviderConfig::new("tavily", 10.0),
        ProviderConfig::new("duckduckgo", 2.0),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8888);
        assert_eq!(settings.dispatch.max_calls_per_query, 5);
        assert_eq!(settings.dispatch.cache_ttl, 300);
        assert_eq!(
            settings
                .providers
                .iter()
                .map(|p| p.name.as_str())
                .collect::<Vec<_>>(),
            vec!["brave", "tavily", "duckduckgo"]
        );
        assert_eq!(
            settings.get_provider("duckduckgo").unwrap().delay().unwrap(),
            Duration::from_secs(2)
        );
    }

    #[test]
    fn test_from_yaml() {
        let settings = Settings::from_yaml(
            r#"
dispatch:
  max_calls_per_query: 3
  cache_ttl: 60
server:
  port: 9000
providers:
  - name: tavily
    engine: tavily
    delay: 1.5
    search_depth: advanced
  - name: ddg
    engine: duckduckgo
    disabled: true
"#,
        )
        .unwrap();

        let options = settings.dispatch_options();
        assert_eq!(options.max_calls_per_query, 3);
        assert_eq!(options.cache_ttl, Duration::from_secs(60));
        assert_eq!(options.max_provider_attempts, 3);
        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.providers.len(), 2);
        assert_eq!(settings.enabled_providers().len(), 1);
        assert_eq!(
            settings.get_provider("tavily").unwrap().delay().unwrap(),
            Duration::from_millis(1500)
        );
        assert_eq!(settings.get_provider("ddg").unwrap().max_results, 5);
    }

    #[test]
    fn test_invalid_delay() {
        let mut config = ProviderConfig::new("brave", -1.0);
        assert!(matches!(
            config.delay(),
            Err(ConfigError::InvalidDelay { ref name, .. }) if name == "brave"
        ));
        config.delay = f64::NAN;
        assert!(config.delay().is_err());
    }

    #[test]
    fn test_merge_overrides() {
        let mut settings = Settings::default();
        settings.merge_from(|key| match key {
            "SEARCH_RELAY_PORT" => Some("7000".to_string()),
            "SEARCH_RELAY_DEBUG" => Some("true".to_string()),
            "TAVILY_API_KEY" => Some("tvly-test".to_string()),
            _ => None,
        });

        assert_eq!(settings.server.port, 7000);
        assert!(settings.general.debug);
        assert_eq!(
            settings.get_provider("tavily").unwrap().api_key.as_deref(),
            Some("tvly-test")
        );
        assert_eq!(settings.get_provider("brave").unwrap().api_key, None);
    }

    #[test]
    fn test_bad_yaml() {
        assert!(matches!(
            Settings::from_yaml("server: [1, 2"),
            Err(ConfigError::Yaml(_))
        ));
    }
}
