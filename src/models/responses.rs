//! Response DTOs for the proxy API
//!
//! Defines the structure of outgoing HTTP response bodies other than
//! forwarded backend payloads, which are passed through untouched.

use serde::Serialize;

use crate::cache::CacheStats;

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// GET lookups served from cache
    pub hits: u64,
    /// GET lookups that went on to dispatch or join
    pub misses: u64,
    /// Entries evicted because they were read after their TTL
    pub expired: u64,
    /// Entries removed by successful POSTs
    pub invalidated: u64,
    /// Callers that shared another caller's dispatch
    pub deduplicated: u64,
    /// Entries currently cached
    pub cached_entries: usize,
    /// Keys currently pending or inside the grace window
    pub in_flight: usize,
    /// hits / (hits + misses)
    pub hit_rate: f64,
}

impl StatsResponse {
    pub fn new(cache: &CacheStats, deduplicated: u64, in_flight: usize) -> Self {
        Self {
            hits: cache.hits,
            misses: cache.misses,
            expired: cache.expired,
            invalidated: cache.invalidated,
            deduplicated,
            cached_entries: cache.total_entries,
            in_flight,
            hit_rate: cache.hit_rate(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error envelope for every failed proxy call
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_response_from_cache_stats() {
        let mut cache = CacheStats::new();
        cache.record_hit();
        cache.record_hit();
        cache.record_hit();
        cache.record_miss();
        cache.record_invalidated(2);
        cache.set_total_entries(4);

        let resp = StatsResponse::new(&cache, 7, 1);

        assert_eq!(resp.hits, 3);
        assert_eq!(resp.misses, 1);
        assert_eq!(resp.invalidated, 2);
        assert_eq!(resp.deduplicated, 7);
        assert_eq!(resp.cached_entries, 4);
        assert_eq!(resp.in_flight, 1);
        assert!((resp.hit_rate - 0.75).abs() < 0.001);
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }

    #[test]
    fn test_error_response_serialize() {
        let resp = ErrorResponse::new("Missing target URL");
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(json, r#"{"error":"Missing target URL"}"#);
    }
}
