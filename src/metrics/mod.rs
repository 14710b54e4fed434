//! Metrics collection module
//!
//! Tracks dispatch outcomes, provider performance and error rates.

use crate::dispatch::SearchOutcome;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

/// Response times kept per provider
const RESPONSE_WINDOW: usize = 100;

#[derive(Debug, Default)]
struct ProviderCounters {
    attempts: u64,
    successes: u64,
    faults: u64,
    invalid: u64,
    /// Most recent response times in ms
    response_times: VecDeque<u64>,
}

/// Dispatcher metrics collector
#[derive(Debug, Default)]
pub struct Metrics {
    runs: AtomicU64,
    successes: AtomicU64,
    cache_hits: AtomicU64,
    budget_exhausted: AtomicU64,
    all_failed: AtomicU64,
    providers: RwLock<HashMap<String, ProviderCounters>>,
}

impl Metrics {
    /// Create a new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one call to `run`
    pub fn inc_run(&self) {
        self.runs.fetch_add(1, Ordering::Relaxed);
    }

    /// Count the outcome of a finished run
    pub fn record_outcome(&self, outcome: &SearchOutcome) {
        let counter = match outcome {
            SearchOutcome::Success { .. } => &self.successes,
            SearchOutcome::CacheHit { .. } => &self.cache_hits,
            SearchOutcome::BudgetExhausted { .. } => &self.budget_exhausted,
            SearchOutcome::AllProvidersFailed { .. } => &self.all_failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn with_provider(&self, provider: &str, update: impl FnOnce(&mut ProviderCounters)) {
        let mut providers = self
            .providers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        update(providers.entry(provider.to_string()).or_default());
    }

    /// Record a provider being tried
    pub fn record_attempt(&self, provider: &str) {
        self.with_provider(provider, |c| c.attempts += 1);
    }

    /// Record a valid result and its response time
    pub fn record_success(&self, provider: &str, elapsed: Duration) {
        self.with_provider(provider, |c| {
            c.successes += 1;
            if c.response_times.len() >= RESPONSE_WINDOW {
                c.response_times.pop_front();
            }
            c.response_times.push_back(elapsed.as_millis() as u64);
        });
    }

    /// Record a provider fault
    pub fn record_fault(&self, provider: &str) {
        self.with_provider(provider, |c| c.faults += 1);
    }

    /// Record text rejected as an invalid result
    pub fn record_invalid(&self, provider: &str) {
        self.with_provider(provider, |c| c.invalid += 1);
    }

    pub fn total_runs(&self) -> u64 {
        self.runs.load(Ordering::Relaxed)
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    /// Get statistics for every provider that has been tried
    pub fn provider_stats(&self) -> BTreeMap<String, ProviderStats> {
        let providers = self
            .providers
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        providers
            .iter()
            .map(|(name, c)| {
                let avg_response_ms = if c.response_times.is_empty() {
                    None
                } else {
                    Some(c.response_times.iter().sum::<u64>() / c.response_times.len() as u64)
                };
                let reliability = if c.attempts == 0 {
                    100.0
                } else {
                    (c.successes as f64 / c.attempts as f64) * 100.0
                };
                (
                    name.clone(),
                    ProviderStats {
                        attempts: c.attempts,
                        successes: c.successes,
                        faults: c.faults,
                        invalid_results: c.invalid,
                        avg_response_ms,
                        reliability,
                    },
                )
            })
            .collect()
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            runs: self.total_runs(),
            successes: self.successes.load(Ordering::Relaxed),
            cache_hits: self.cache_hits(),
            budget_exhausted: self.budget_exhausted.load(Ordering::Relaxed),
            all_providers_failed: self.all_failed.load(Ordering::Relaxed),
            providers: self.provider_stats(),
        }
    }
}

/// Statistics for a single provider
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderStats {
    pub attempts: u64,
    pub successes: u64,
    pub faults: u64,
    pub invalid_results: u64,
    pub avg_response_ms: Option<u64>,
    /// Share of attempts that produced a valid result, in percent
    pub reliability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub runs: u64,
    pub successes: u64,
    pub cache_hits: u64,
    pub budget_exhausted: u64,
    pub all_providers_failed: u64,
    pub providers: BTreeMap<String, ProviderStats>,
}
