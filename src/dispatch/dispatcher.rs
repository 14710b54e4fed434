//! Search dispatch: cache, budget, provider rotation and failover

use super::models::{DispatchOptions, QuerySession, SearchOutcome, SessionSnapshot, MIN_RESULT_LENGTH};
use super::selector::{ProviderSelector, ProviderUsage};
use crate::cache::ResultCache;
use crate::error::{AttemptError, ConfigError, ProviderError};
use crate::metrics::Metrics;
use crate::providers::ProviderRegistry;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// State owned by one dispatcher, guarded by a single lock.
///
/// The lock is only taken for bookkeeping and is never held across a
/// provider call or a rate-limit delay.
#[derive(Debug)]
struct DispatchState {
    session: QuerySession,
    selector: ProviderSelector,
    cache: ResultCache,
}

/// Turns one logical search request into budgeted, cached, failover-aware
/// provider calls.
pub struct SearchDispatcher {
    providers: ProviderRegistry,
    options: DispatchOptions,
    state: Mutex<DispatchState>,
    metrics: Arc<Metrics>,
}

/// How a query left the admission step
enum Admission<'a> {
    Resolved(SearchOutcome),
    Reserved(Reservation<'a>, usize),
}

/// A budget slot held while providers are being tried.
///
/// Dropping an unsettled reservation gives the slot back, so a caller
/// timing out mid-call does not leak budget.
struct Reservation<'a> {
    state: &'a Mutex<DispatchState>,
    epoch: u64,
    calls_before: u32,
    settled: bool,
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if !self.settled {
            lock(self.state).session.release(self.epoch);
        }
    }
}

fn lock(state: &Mutex<DispatchState>) -> MutexGuard<'_, DispatchState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SearchDispatcher {
    /// Create a dispatcher over a fixed set of providers.
    ///
    /// Fails when no provider is registered.
    pub fn new(providers: ProviderRegistry, options: DispatchOptions) -> Result<Self, ConfigError> {
        if providers.is_empty() {
            return Err(ConfigError::NoProviders);
        }

        let names = providers.names().into_iter().map(str::to_string).collect();
        info!(
            "Search dispatcher initialized with providers: {}",
            providers.names().join(", ")
        );

        Ok(Self {
            state: Mutex::new(DispatchState {
                session: QuerySession::default(),
                selector: ProviderSelector::new(names),
                cache: ResultCache::new(options.cache_ttl),
            }),
            providers,
            options,
            metrics: Arc::new(Metrics::new()),
        })
    }

    pub fn options(&self) -> &DispatchOptions {
        &self.options
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Registered provider names in registration order
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.names()
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    /// Search for `query`, returning exactly one outcome.
    ///
    /// Budget exhaustion and total provider failure are outcomes, not errors.
    pub async fn run(&self, query: &str) -> SearchOutcome {
        info!("Dispatching search for: '{}'", query);
        self.metrics.inc_run();

        let (reservation, first) = match self.admit(query) {
            Admission::Resolved(outcome) => {
                self.metrics.record_outcome(&outcome);
                return outcome;
            }
            Admission::Reserved(reservation, first) => (reservation, first),
        };

        let outcome = self.try_providers(query, reservation, first).await;
        self.metrics.record_outcome(&outcome);
        outcome
    }

    /// Session reset, cache lookup, budget check and first provider pick,
    /// all in one critical section.
    fn admit(&self, query: &str) -> Admission<'_> {
        let mut state = lock(&self.state);
        let now = Instant::now();

        if !state.session.matches(query) {
            info!("New search query detected, resetting search count");
            state.session.reset(query);
        }

        if let Some(hit) = state.cache.lookup(query, now) {
            info!("Using cached result for similar query: '{}'", hit.matched_key);
            return Admission::Resolved(SearchOutcome::CacheHit {
                text: hit.text,
                matched_query: hit.matched_key,
            });
        }

        let max_calls = self.options.max_calls_per_query;
        let used = state.session.budget_used();
        if used >= max_calls {
            info!("Search limit reached ({}/{})", used, max_calls);
            return Admission::Resolved(SearchOutcome::BudgetExhausted {
                calls_used: used,
                max_calls,
            });
        }

        let last_used = state.session.last_provider_used();
        let Some(first) = state.selector.select(&HashSet::new(), last_used) else {
            return Admission::Resolved(SearchOutcome::AllProvidersFailed {
                last_error: "no provider available".to_string(),
            });
        };

        let (epoch, calls_before) = state.session.reserve();
        Admission::Reserved(
            Reservation {
                state: &self.state,
                epoch,
                calls_before,
                settled: false,
            },
            first,
        )
    }

    async fn try_providers(
        &self,
        query: &str,
        mut reservation: Reservation<'_>,
        first: usize,
    ) -> SearchOutcome {
        let max_attempts = self
            .options
            .max_provider_attempts
            .min(self.providers.len())
            .max(1);

        let mut tried = HashSet::new();
        let mut next = Some(first);
        let mut last_error: Option<AttemptError> = None;

        while let Some(index) = next {
            if tried.len() >= max_attempts {
                break;
            }
            let Some(provider) = self.providers.get(index) else {
                break;
            };
            tried.insert(index);

            let name = provider.name();
            info!("Selected search provider: {}", name);
            self.metrics.record_attempt(name);

            let start = Instant::now();
            let attempt = provider.invoke(query).await;
            let elapsed = start.elapsed();

            match check_result(name, attempt) {
                Ok(text) => {
                    info!(
                        "Valid result obtained from {} in {:.2}s",
                        name,
                        elapsed.as_secs_f64()
                    );
                    self.metrics.record_success(name, elapsed);
                    return self.settle_success(query, &mut reservation, index, text, elapsed);
                }
                Err(err) => {
                    warn!("Attempt failed ({}), trying another provider", err);
                    match err {
                        AttemptError::ProviderFault { .. } => self.metrics.record_fault(name),
                        AttemptError::InvalidResult { .. } => self.metrics.record_invalid(name),
                    }
                    last_error = Some(err);
                }
            }

            next = lock(&self.state).selector.select_next(&tried);
        }

        warn!(
            "All search providers failed after {} attempt(s)",
            tried.len()
        );
        // Dropping the reservation returns the unused budget slot
        drop(reservation);

        SearchOutcome::AllProvidersFailed {
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no provider could be tried".to_string()),
        }
    }

    fn settle_success(
        &self,
        query: &str,
        reservation: &mut Reservation<'_>,
        index: usize,
        text: String,
        elapsed: Duration,
    ) -> SearchOutcome {
        let mut state = lock(&self.state);
        let now = Instant::now();

        state.cache.store(query, text.clone(), now);
        state.selector.record_use(index, now);

        let calls_used = match state.session.commit(reservation.epoch, index) {
            Some(calls) => calls,
            None => {
                debug!("Session changed while '{}' was in flight", query);
                reservation.calls_before + 1
            }
        };
        reservation.settled = true;

        let max_calls = self.options.max_calls_per_query;
        info!("Search count incremented to {}/{}", calls_used, max_calls);

        SearchOutcome::Success {
            text,
            provider_name: self
                .providers
                .get(index)
                .map(|p| p.name().to_string())
                .unwrap_or_default(),
            elapsed,
            calls_used,
            calls_remaining: max_calls.saturating_sub(calls_used),
        }
    }

    /// Snapshot of the current query session
    pub fn session(&self) -> SessionSnapshot {
        let state = lock(&self.state);
        state
            .session
            .snapshot(|index| self.providers.get(index).map(|p| p.name().to_string()))
    }

    /// Last successful use of each provider
    pub fn usage(&self) -> Vec<ProviderUsage> {
        lock(&self.state).selector.usage(Instant::now())
    }

    /// Number of cached results, including expired ones not yet swept
    pub fn cache_len(&self) -> usize {
        lock(&self.state).cache.len()
    }

    /// Sweep expired cache entries
    pub fn evict_expired(&self) -> usize {
        lock(&self.state).cache.evict_expired(Instant::now())
    }
}

/// Accept a provider's text only if it looks like real results
fn check_result(provider: &str, attempt: Result<String, ProviderError>) -> Result<String, AttemptError> {
    let text = attempt.map_err(|source| AttemptError::ProviderFault {
        provider: provider.to_string(),
        source,
    })?;

    let invalid = |reason: &str| AttemptError::InvalidResult {
        provider: provider.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(invalid("empty result"));
    }
    if trimmed.to_lowercase().contains("error") {
        return Err(invalid("result contains an error marker"));
    }
    if trimmed.chars().count() < MIN_RESULT_LENGTH {
        return Err(invalid("result too short"));
    }

    Ok(text)
}
