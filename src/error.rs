//! Error types for search-relay
//!
//! Provider faults are ordinary values handled by the dispatcher's failover
//! loop. Configuration errors are raised eagerly when a dispatcher or
//! registry is built, never at query time.

use std::path::PathBuf;

/// A fault raised by a single search provider call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// Connection, DNS or body read failure
    #[error("transport error: {0}")]
    Transport(String),

    /// The request did not complete in time
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Non-success HTTP status
    #[error("HTTP status {0}")]
    Status(u16),

    /// The provider answered 429
    #[error("rate limited by provider")]
    RateLimited,

    /// The provider served a CAPTCHA page instead of results
    #[error("CAPTCHA challenge served")]
    Captcha,

    /// The body could not be understood
    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),

    /// The provider needs an API key that was not configured
    #[error("missing API key for {0}")]
    MissingApiKey(String),

    /// The provider has no secondary call path
    #[error("no fallback call path for {0}")]
    NoFallback(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout(err.to_string())
        } else if let Some(status) = err.status() {
            ProviderError::Status(status.as_u16())
        } else if err.is_decode() {
            ProviderError::UnexpectedShape(err.to_string())
        } else {
            ProviderError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::UnexpectedShape(err.to_string())
    }
}

/// Why a single dispatch attempt against one provider did not count.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AttemptError {
    #[error("{provider}: {source}")]
    ProviderFault {
        provider: String,
        #[source]
        source: ProviderError,
    },

    #[error("{provider}: invalid result ({reason})")]
    InvalidResult { provider: String, reason: String },
}

impl AttemptError {
    /// Name of the provider the attempt was made against
    pub fn provider(&self) -> &str {
        match self {
            AttemptError::ProviderFault { provider, .. } => provider,
            AttemptError::InvalidResult { provider, .. } => provider,
        }
    }
}

/// Misconfiguration detected while loading settings or building a dispatcher.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("at least one search provider must be registered")]
    NoProviders,

    #[error("duplicate provider name: {0}")]
    DuplicateProvider(String),

    #[error("unknown provider engine: {0}")]
    UnknownEngine(String),

    #[error("no usable providers: missing API keys for {}", .0.join(", "))]
    MissingApiKeys(Vec<String>),

    #[error("invalid delay for provider {name}: {delay}")]
    InvalidDelay { name: String, delay: f64 },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_provider_fault() {
        let err = AttemptError::ProviderFault {
            provider: "brave".to_string(),
            source: ProviderError::Status(503),
        };
        assert_eq!(err.to_string(), "brave: HTTP status 503");
        assert_eq!(err.provider(), "brave");
    }

    #[test]
    fn test_display_invalid_result() {
        let err = AttemptError::InvalidResult {
            provider: "tavily".to_string(),
            reason: "too short".to_string(),
        };
        assert_eq!(err.to_string(), "tavily: invalid result (too short)");
    }

    #[test]
    fn test_display_config_errors() {
        assert_eq!(
            ConfigError::NoProviders.to_string(),
            "at least one search provider must be registered"
        );
        assert_eq!(
            ConfigError::DuplicateProvider("brave".into()).to_string(),
            "duplicate provider name: brave"
        );
        assert_eq!(
            ConfigError::MissingApiKeys(vec!["tavily".into(), "exa".into()]).to_string(),
            "no usable providers: missing API keys for tavily, exa"
        );
    }

    #[test]
    fn test_errors_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ProviderError>();
        assert_send_sync::<AttemptError>();
        assert_send_sync::<ConfigError>();
    }
}
