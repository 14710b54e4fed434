//! Dispatch options, outcomes and per-query session state

use crate::cache::DEFAULT_CACHE_TTL;
use crate::query::similar;
use serde::{Serialize, Serializer};
use std::fmt;
use std::time::Duration;

/// Default number of provider calls allowed per logical query
pub const DEFAULT_MAX_CALLS_PER_QUERY: u32 = 5;

/// Default cap on distinct providers tried within one `run`
pub const DEFAULT_MAX_PROVIDER_ATTEMPTS: usize = 3;

/// Provider text shorter than this (after trimming) is not a usable result
pub const MIN_RESULT_LENGTH: usize = 20;

/// Construction-time dispatcher settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchOptions {
    /// Provider calls allowed per logical query
    pub max_calls_per_query: u32,
    /// Lifetime of cached results; zero disables reuse
    pub cache_ttl: Duration,
    /// Distinct providers tried per `run`, further capped by the provider count
    pub max_provider_attempts: usize,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            max_calls_per_query: DEFAULT_MAX_CALLS_PER_QUERY,
            cache_ttl: DEFAULT_CACHE_TTL,
            max_provider_attempts: DEFAULT_MAX_PROVIDER_ATTEMPTS,
        }
    }
}

impl DispatchOptions {
    pub fn with_max_calls_per_query(mut self, max: u32) -> Self {
        self.max_calls_per_query = max;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_max_provider_attempts(mut self, attempts: usize) -> Self {
        self.max_provider_attempts = attempts;
        self
    }
}

/// The single result of `SearchDispatcher::run`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SearchOutcome {
    /// A provider returned a valid result
    Success {
        text: String,
        provider_name: String,
        #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
        elapsed: Duration,
        calls_used: u32,
        calls_remaining: u32,
    },
    /// A stored result for a similar query was reused
    CacheHit { text: String, matched_query: String },
    /// The logical query has used its whole budget.
    ///
    /// `calls_used` counts completed calls plus calls still in flight for
    /// the same query, so it can exceed the session's `calls_made`.
    BudgetExhausted { calls_used: u32, max_calls: u32 },
    /// Every provider tried failed or returned unusable text
    AllProvidersFailed { last_error: String },
}

fn serialize_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

impl SearchOutcome {
    /// Result text, for outcomes that carry one
    pub fn text(&self) -> Option<&str> {
        match self {
            SearchOutcome::Success { text, .. } | SearchOutcome::CacheHit { text, .. } => {
                Some(text.as_str())
            }
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, SearchOutcome::Success { .. })
    }

    pub fn is_cache_hit(&self) -> bool {
        matches!(self, SearchOutcome::CacheHit { .. })
    }

    /// Stable short label, used in logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            SearchOutcome::Success { .. } => "success",
            SearchOutcome::CacheHit { .. } => "cache_hit",
            SearchOutcome::BudgetExhausted { .. } => "budget_exhausted",
            SearchOutcome::AllProvidersFailed { .. } => "all_providers_failed",
        }
    }
}

impl fmt::Display for SearchOutcome {
    /// Text handed back to an agent: the result plus a usage footer
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchOutcome::Success {
                text,
                provider_name,
                elapsed,
                calls_used,
                calls_remaining,
            } => write!(
                f,
                "{}\n\nSearch performed using {} in {:.2}s. Searches used: {}/{}. Searches remaining: {}.",
                text,
                provider_name,
                elapsed.as_secs_f64(),
                calls_used,
                calls_used + calls_remaining,
                calls_remaining
            ),
            SearchOutcome::CacheHit {
                text,
                matched_query,
            } => write!(
                f,
                "{}\n\n[Cached result from similar query: '{}']",
                text, matched_query
            ),
            SearchOutcome::BudgetExhausted {
                calls_used,
                max_calls,
            } => write!(
                f,
                "Search limit reached. You've performed {} searches for this query. Maximum allowed is {}.",
                calls_used, max_calls
            ),
            SearchOutcome::AllProvidersFailed { last_error } => write!(
                f,
                "All search providers failed to provide meaningful results for this query. Last error: {}",
                last_error
            ),
        }
    }
}

/// Read-only view of the dispatcher's query session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub current_query: Option<String>,
    pub calls_made: u32,
    pub in_flight: u32,
    pub last_provider_used: Option<String>,
}

/// Budget bookkeeping for the current logical query.
///
/// `calls_made + in_flight` never exceeds the budget: a slot is reserved
/// before any provider is contacted. Each reset starts a new epoch, and
/// completions from an older epoch leave the current counters alone.
#[derive(Debug, Default)]
pub(crate) struct QuerySession {
    current_query: Option<String>,
    calls_made: u32,
    in_flight: u32,
    last_provider_used: Option<usize>,
    epoch: u64,
}

impl QuerySession {
    /// Whether `query` belongs to the current logical query
    pub(crate) fn matches(&self, query: &str) -> bool {
        self.current_query
            .as_deref()
            .map_or(false, |current| similar(current, query))
    }

    pub(crate) fn reset(&mut self, query: &str) {
        self.current_query = Some(query.to_string());
        self.calls_made = 0;
        self.in_flight = 0;
        self.last_provider_used = None;
        self.epoch += 1;
    }

    /// Calls made plus calls currently reserved
    pub(crate) fn budget_used(&self) -> u32 {
        self.calls_made + self.in_flight
    }

    pub(crate) fn last_provider_used(&self) -> Option<usize> {
        self.last_provider_used
    }

    /// Reserve one call; returns the epoch and the calls made so far
    pub(crate) fn reserve(&mut self) -> (u64, u32) {
        self.in_flight += 1;
        (self.epoch, self.calls_made)
    }

    /// Give back a reservation that produced no result
    pub(crate) fn release(&mut self, epoch: u64) {
        if epoch == self.epoch {
            self.in_flight = self.in_flight.saturating_sub(1);
        }
    }

    /// Turn a reservation into a counted call.
    ///
    /// Returns the new call count, or `None` if the session was reset
    /// while the call was running.
    pub(crate) fn commit(&mut self, epoch: u64, provider: usize) -> Option<u32> {
        if epoch != self.epoch {
            return None;
        }
        self.in_flight = self.in_flight.saturating_sub(1);
        self.calls_made += 1;
        self.last_provider_used = Some(provider);
        Some(self.calls_made)
    }

    pub(crate) fn snapshot(&self, provider_name: impl Fn(usize) -> Option<String>) -> SessionSnapshot {
        SessionSnapshot {
            current_query: self.current_query.clone(),
            calls_made: self.calls_made,
            in_flight: self.in_flight,
            last_provider_used: self.last_provider_used.and_then(provider_name),
        }
    }
}
