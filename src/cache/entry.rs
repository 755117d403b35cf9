//! Cache Entry Module
//!
//! Defines cache keys and the entries stored under them.

use std::fmt;
use std::time::Duration;

use serde_json::Value;
use tokio::time::Instant;

// == Cache Key ==
/// Identifies a cached GET response: the backend URL plus the action.
///
/// Kept as a tuple rather than a joined string so invalidation can match
/// on the target exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub target: String,
    pub action: String,
}

impl CacheKey {
    pub fn new(target: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            action: action.into(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.target, self.action)
    }
}

// == Cache Entry ==
/// A backend payload along with the moment it was stored.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The decoded JSON body returned by the backend
    pub payload: Value,
    /// When the entry was written
    pub stored_at: Instant,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry stamped with the current time.
    pub fn new(payload: Value) -> Self {
        Self {
            payload,
            stored_at: Instant::now(),
        }
    }

    // == Age ==
    pub fn age(&self) -> Duration {
        self.stored_at.elapsed()
    }

    // == Is Expired ==
    /// Checks whether the entry is past its TTL.
    ///
    /// An entry is servable only while `age < ttl`; at exactly `ttl` it is expired.
    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.age() >= ttl
    }

    // == Time To Live ==
    /// Returns remaining lifetime, saturating at zero.
    pub fn ttl_remaining(&self, ttl: Duration) -> Duration {
        ttl.saturating_sub(self.age())
    }
}
