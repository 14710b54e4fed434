//! Caching module for search-relay
//!
//! Holds the most recent successful provider result per query and serves it
//! back for any later query judged similar, until the entry's TTL runs out.

use crate::query::similar;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Default lifetime of a cached result (5 minutes)
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// A stored provider result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Literal query text the result was fetched for
    pub key: String,
    /// When the result was stored
    pub timestamp: Instant,
    /// Raw provider text
    pub result: String,
}

/// A cache hit: the stored text and the query it was stored under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResult {
    pub matched_key: String,
    pub text: String,
}

/// Time-bounded result store with similarity lookup.
///
/// Entries are scanned in insertion order. When several stored queries are
/// similar to an incoming one, the first live entry wins, not the newest.
#[derive(Debug)]
pub struct ResultCache {
    entries: Vec<CacheEntry>,
    ttl: Duration,
}

impl ResultCache {
    /// Create a new result cache with the given TTL
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Vec::new(),
            ttl,
        }
    }

    /// Configured entry lifetime
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_live(&self, entry: &CacheEntry, now: Instant) -> bool {
        now.saturating_duration_since(entry.timestamp) < self.ttl
    }

    /// Find a live entry similar to `query`.
    ///
    /// Expired entries met before the match are evicted.
    pub fn lookup(&mut self, query: &str, now: Instant) -> Option<CachedResult> {
        let mut index = 0;
        while index < self.entries.len() {
            let entry = &self.entries[index];
            if !self.is_live(entry, now) {
                debug!("Cache expired for query: '{}'", entry.key);
                self.entries.remove(index);
                continue;
            }

            if similar(query, &entry.key) {
                return Some(CachedResult {
                    matched_key: entry.key.clone(),
                    text: entry.result.clone(),
                });
            }
            index += 1;
        }

        None
    }

    /// Store a result under the literal query text, replacing any previous
    /// result for exactly that text.
    pub fn store(&mut self, query: &str, result: impl Into<String>, now: Instant) {
        let result = result.into();
        match self.entries.iter_mut().find(|e| e.key == query) {
            Some(entry) => {
                entry.timestamp = now;
                entry.result = result;
            }
            None => self.entries.push(CacheEntry {
                key: query.to_string(),
                timestamp: now,
                result,
            }),
        }
    }

    /// Drop every expired entry, returning how many were removed
    pub fn evict_expired(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        self.entries
            .retain(|e| now.saturating_duration_since(e.timestamp) < ttl);
        before - self.entries.len()
    }

    /// Remove a cached result by its literal key
    pub fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let index = self.entries.iter().position(|e| e.key == key)?;
        Some(self.entries.remove(index))
    }

    /// Clear the entire cache
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of stored entries, live or not yet swept
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stored keys in scan order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(300);

    #[test]
    fn test_lookup_by_similar_query() {
        let mut cache = ResultCache::new(TTL);
        let t0 = Instant::now();
        cache.store("AI ethics", "Search Results: ethics of AI systems", t0);

        let hit = cache.lookup("ai ethics!!", t0).unwrap();
        assert_eq!(hit.matched_key, "AI ethics");
        assert_eq!(hit.text, "Search Results: ethics of AI systems");
        assert!(cache.lookup("cat food", t0).is_none());
    }

    #[test]
    fn test_ttl_boundaries() {
        let mut cache = ResultCache::new(TTL);
        let t0 = Instant::now();
        cache.store("rust ownership", "borrow checker explained at length", t0);

        assert!(cache
            .lookup("rust ownership", t0 + TTL - Duration::from_secs(1))
            .is_some());
        assert!(cache
            .lookup("rust ownership", t0 + TTL + Duration::from_secs(1))
            .is_none());
        // The expired entry was evicted by the scan
        assert!(cache.is_empty());
    }

    #[test]
    fn test_entry_expires_exactly_at_ttl() {
        let mut cache = ResultCache::new(TTL);
        let t0 = Instant::now();
        cache.store("rust ownership", "borrow checker", t0);
        assert!(cache.lookup("rust ownership", t0 + TTL).is_none());
    }

    #[test]
    fn test_store_overwrites_same_key() {
        let mut cache = ResultCache::new(TTL);
        let t0 = Instant::now();
        cache.store("rust ownership", "first", t0);
        let t1 = t0 + Duration::from_secs(200);
        cache.store("rust ownership", "second", t1);

        assert_eq!(cache.len(), 1);
        // Refreshed timestamp keeps it alive past the original expiry
        let hit = cache
            .lookup("rust ownership", t0 + TTL + Duration::from_secs(10))
            .unwrap();
        assert_eq!(hit.text, "second");
    }

    #[test]
    fn test_similar_queries_keep_separate_entries() {
        let mut cache = ResultCache::new(TTL);
        let t0 = Instant::now();
        cache.store("AI ethics", "first result", t0);
        cache.store("ai ethics?", "second result", t0 + Duration::from_secs(1));

        assert_eq!(cache.len(), 2);
        // Scan order, not recency, decides the match
        let hit = cache.lookup("ethics AI", t0 + Duration::from_secs(2)).unwrap();
        assert_eq!(hit.matched_key, "AI ethics");
    }

    #[test]
    fn test_lookup_skips_expired_match_for_live_one() {
        let mut cache = ResultCache::new(TTL);
        let t0 = Instant::now();
        cache.store("AI ethics", "old", t0);
        cache.store("ai ethics?", "fresh", t0 + Duration::from_secs(200));

        let hit = cache
            .lookup("ethics AI", t0 + Duration::from_secs(350))
            .unwrap();
        assert_eq!(hit.text, "fresh");
        assert_eq!(cache.keys().collect::<Vec<_>>(), vec!["ai ethics?"]);
    }

    #[test]
    fn test_evict_expired() {
        let mut cache = ResultCache::new(TTL);
        let t0 = Instant::now();
        cache.store("one query", "a", t0);
        cache.store("two query", "b", t0 + Duration::from_secs(100));

        let removed = cache.evict_expired(t0 + Duration::from_secs(350));
        assert_eq!(removed, 1);
        assert_eq!(cache.keys().collect::<Vec<_>>(), vec!["two query"]);
    }

    #[test]
    fn test_zero_ttl_never_hits() {
        let mut cache = ResultCache::new(Duration::ZERO);
        let t0 = Instant::now();
        cache.store("rust ownership", "borrow checker", t0);
        assert!(cache.lookup("rust ownership", t0).is_none());
    }

    #[test]
    fn test_remove_and_clear() {
        let mut cache = ResultCache::default();
        let t0 = Instant::now();
        cache.store("one query", "a", t0);
        cache.store("two query", "b", t0);

        assert_eq!(cache.remove("one query").map(|e| e.result), Some("a".to_string()));
        assert!(cache.remove("one query").is_none());
        cache.clear();
        assert!(cache.is_empty());
    }
}
