//! Response Cache Module
//!
//! TTL cache of backend GET payloads with lazy expiry and per-target invalidation.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::cache::{CacheEntry, CacheKey, CacheStats};

// == Response Cache ==
/// In-memory store of successful GET payloads.
///
/// Expired entries are only removed when they are looked up; there is no sweeper.
#[derive(Debug)]
pub struct ResponseCache {
    entries: HashMap<CacheKey, CacheEntry>,
    stats: CacheStats,
    ttl: Duration,
}

impl ResponseCache {
    // == Constructor ==
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::new(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    // == Lookup ==
    /// Returns the cached payload if present and younger than the TTL.
    ///
    /// A stale entry is evicted and reported as a miss. A fresh entry is
    /// returned untouched; its `stored_at` is never refreshed by reads.
    pub fn lookup(&mut self, key: &CacheKey) -> Option<Value> {
        match self.entries.get(key) {
            Some(entry) if !entry.is_expired(self.ttl) => {
                debug!(key = %key, age_ms = entry.age().as_millis() as u64, "cache hit");
                let payload = entry.payload.clone();
                self.stats.record_hit();
                Some(payload)
            }
            Some(_) => {
                debug!(key = %key, "cache entry expired");
                self.entries.remove(key);
                self.stats.record_expired();
                self.stats.record_miss();
                self.stats.set_total_entries(self.entries.len());
                None
            }
            None => {
                debug!(key = %key, "cache miss");
                self.stats.record_miss();
                None
            }
        }
    }

    /// Counts a read that was skipped on purpose as a miss.
    pub fn record_bypass(&mut self) {
        debug!("cache read bypassed");
        self.stats.record_miss();
    }

    // == Store ==
    /// Writes a payload, replacing any existing entry and resetting its age.
    pub fn store(&mut self, key: CacheKey, payload: Value) {
        debug!(key = %key, "cache store");
        self.entries.insert(key, CacheEntry::new(payload));
        self.stats.set_total_entries(self.entries.len());
    }

    // == Invalidate Target ==
    /// Removes every entry cached for `target`, whatever its action.
    ///
    /// Matching is exact on the target URL, so a URL that merely starts
    /// with `target` is left alone. Returns the number of entries removed.
    pub fn invalidate_target(&mut self, target: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| key.target != target);
        let removed = before - self.entries.len();

        self.stats.record_invalidated(removed);
        self.stats.set_total_entries(self.entries.len());
        removed
    }

    // == Peek ==
    /// Returns the raw entry without expiry checks or stats accounting.
    pub fn peek(&self, key: &CacheKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
