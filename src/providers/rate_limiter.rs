//! Post-call delay wrapper for a single provider

use super::traits::SearchProvider;
use crate::error::ProviderError;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Enforces a minimum spacing after each successful call to one provider.
///
/// The delay suspends only the task that made the call; it never holds
/// dispatcher state while waiting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateLimiter {
    delay: Duration,
}

impl RateLimiter {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// A limiter that never waits
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Call the provider and return its raw text.
    ///
    /// A failing primary call is retried once through the provider's
    /// fallback path when it advertises one; if that fails too, the
    /// fallback's fault is returned. Faults are returned without waiting.
    pub async fn invoke(
        &self,
        provider: &dyn SearchProvider,
        query: &str,
    ) -> Result<String, ProviderError> {
        let name = provider.name();
        debug!("Running provider '{}' with query: {}", name, query);

        let text = match provider.search(query).await {
            Ok(text) => text,
            Err(err) if provider.capabilities().has_fallback => {
                warn!(
                    "Primary call failed for provider '{}' ({}), trying fallback path",
                    name, err
                );
                provider.search_fallback(query).await.map_err(|fallback_err| {
                    error!("Fallback also failed for provider '{}': {}", name, fallback_err);
                    fallback_err
                })?
            }
            Err(err) => {
                error!("Provider '{}' failed: {}", name, err);
                return Err(err);
            }
        };

        if !self.delay.is_zero() {
            info!(
                "Rate limit enforced: waiting {:.2}s after running {}",
                self.delay.as_secs_f64(),
                name
            );
            tokio::time::sleep(self.delay).await;
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderCapabilities;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    struct TwoPath {
        primary: Result<String, ProviderError>,
        fallback: Option<Result<String, ProviderError>>,
        primary_calls: AtomicUsize,
        fallback_calls: AtomicUsize,
    }

    impl TwoPath {
        fn new(
            primary: Result<String, ProviderError>,
            fallback: Option<Result<String, ProviderError>>,
        ) -> Self {
            Self {
                primary,
                fallback,
                primary_calls: AtomicUsize::new(0),
                fallback_calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SearchProvider for TwoPath {
        fn name(&self) -> &str {
            "two_path"
        }

        fn capabilities(&self) -> ProviderCapabilities {
            ProviderCapabilities::new().fallback(self.fallback.is_some())
        }

        async fn search(&self, _query: &str) -> Result<String, ProviderError> {
            self.primary_calls.fetch_add(1, Ordering::SeqCst);
            self.primary.clone()
        }

        async fn search_fallback(&self, _query: &str) -> Result<String, ProviderError> {
            self.fallback_calls.fetch_add(1, Ordering::SeqCst);
            self.fallback
                .clone()
                .unwrap_or_else(|| Err(ProviderError::NoFallback("two_path".into())))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_applied_after_success() {
        let provider = TwoPath::new(Ok("result text".into()), None);
        let limiter = RateLimiter::new(Duration::from_secs(10));

        let start = Instant::now();
        let text = limiter.invoke(&provider, "rust").await.unwrap();

        assert_eq!(text, "result text");
        assert!(start.elapsed() >= Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_delay_never_sleeps() {
        let provider = TwoPath::new(Ok("result text".into()), None);
        let limiter = RateLimiter::unlimited();

        let start = Instant::now();
        limiter.invoke(&provider, "rust").await.unwrap();
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fault_propagates_without_delay() {
        let provider = TwoPath::new(Err(ProviderError::Status(500)), None);
        let limiter = RateLimiter::new(Duration::from_secs(10));

        let start = Instant::now();
        let err = limiter.invoke(&provider, "rust").await.unwrap_err();

        assert_eq!(err, ProviderError::Status(500));
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(provider.fallback_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fallback_used_once_when_primary_fails() {
        let provider = TwoPath::new(
            Err(ProviderError::MissingApiKey("two_path".into())),
            Some(Ok("fallback text".into())),
        );
        let text = RateLimiter::unlimited().invoke(&provider, "rust").await.unwrap();

        assert_eq!(text, "fallback text");
        assert_eq!(provider.primary_calls.load(Ordering::SeqCst), 1);
        assert_eq!(provider.fallback_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fallback_fault_surfaces() {
        let provider = TwoPath::new(
            Err(ProviderError::Status(503)),
            Some(Err(ProviderError::Captcha)),
        );
        let err = RateLimiter::unlimited()
            .invoke(&provider, "rust")
            .await
            .unwrap_err();

        assert_eq!(err, ProviderError::Captcha);
        assert_eq!(provider.primary_calls.load(Ordering::SeqCst), 1);
        assert_eq!(provider.fallback_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_primary_success_skips_fallback() {
        let provider = TwoPath::new(Ok("primary".into()), Some(Ok("fallback".into())));
        let text = RateLimiter::unlimited().invoke(&provider, "rust").await.unwrap();

        assert_eq!(text, "primary");
        assert_eq!(provider.fallback_calls.load(Ordering::SeqCst), 0);
    }
}
