//! Provider selection: rotate away from the last provider, prefer the
//! least recently used one

use rand::seq::SliceRandom;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tokio::time::Instant;

/// When a provider was last used successfully
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LastUse {
    pub at: Instant,
    /// Monotonic use counter; orders uses that share a clock reading
    pub sequence: u64,
}

/// Provider name → last successful use
#[derive(Debug, Default)]
pub struct UsageLedger {
    entries: HashMap<String, LastUse>,
    next_sequence: u64,
}

impl UsageLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, provider: &str, now: Instant) {
        self.next_sequence += 1;
        self.entries.insert(
            provider.to_string(),
            LastUse {
                at: now,
                sequence: self.next_sequence,
            },
        );
    }

    pub fn last_use(&self, provider: &str) -> Option<LastUse> {
        self.entries.get(provider).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Usage of one provider as reported to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderUsage {
    pub name: String,
    /// Milliseconds since the last successful use, if any
    pub last_used_ms_ago: Option<u64>,
}

/// Chooses which registered provider to try next.
///
/// Providers are identified by registration index. Never-used providers
/// rank as least recently used; ties go to the earlier registration.
#[derive(Debug)]
pub struct ProviderSelector {
    names: Vec<String>,
    ledger: UsageLedger,
}

impl ProviderSelector {
    pub fn new(names: Vec<String>) -> Self {
        Self {
            names,
            ledger: UsageLedger::new(),
        }
    }

    pub fn ledger(&self) -> &UsageLedger {
        &self.ledger
    }

    fn recency(&self, index: usize) -> (Option<u64>, usize) {
        let sequence = self
            .names
            .get(index)
            .and_then(|name| self.ledger.last_use(name))
            .map(|last| last.sequence);
        (sequence, index)
    }

    fn least_recently_used(&self, candidates: &[usize]) -> Option<usize> {
        candidates.iter().copied().min_by_key(|&i| self.recency(i))
    }

    /// Pick the provider for a fresh attempt.
    ///
    /// With no usage history the pick is uniformly random. Otherwise the
    /// least recently used provider other than `last_used` is chosen, and
    /// `last_used` itself only when nothing else is left.
    pub fn select(&self, excluding: &HashSet<usize>, last_used: Option<usize>) -> Option<usize> {
        let candidates: Vec<usize> = (0..self.names.len())
            .filter(|i| !excluding.contains(i))
            .collect();

        if candidates.is_empty() {
            return None;
        }

        if self.ledger.is_empty() {
            return candidates.choose(&mut rand::thread_rng()).copied();
        }

        let preferred: Vec<usize> = candidates
            .iter()
            .copied()
            .filter(|&i| Some(i) != last_used)
            .collect();

        if preferred.is_empty() {
            self.least_recently_used(&candidates)
        } else {
            self.least_recently_used(&preferred)
        }
    }

    /// Least recently used provider not yet tried, if any
    pub fn select_next(&self, tried: &HashSet<usize>) -> Option<usize> {
        let untried: Vec<usize> = (0..self.names.len())
            .filter(|i| !tried.contains(i))
            .collect();
        self.least_recently_used(&untried)
    }

    /// Note a successful use of a provider
    pub fn record_use(&mut self, index: usize, now: Instant) {
        if let Some(name) = self.names.get(index) {
            self.ledger.record(name, now);
        }
    }

    /// Usage for every provider in registration order
    pub fn usage(&self, now: Instant) -> Vec<ProviderUsage> {
        self.names
            .iter()
            .map(|name| ProviderUsage {
                name: name.clone(),
                last_used_ms_ago: self
                    .ledger
                    .last_use(name)
                    .map(|last| now.saturating_duration_since(last.at).as_millis() as u64),
            })
            .collect()
    }
}
