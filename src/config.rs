//! Configuration Module
//!
//! Handles loading and managing proxy configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::proxy::PostKeyPolicy;

/// Proxy configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Response cache TTL in seconds
    pub cache_ttl_secs: u64,
    /// Delay in milliseconds before a settled in-flight entry is dropped
    pub inflight_grace_ms: u64,
    /// Outbound request timeout in seconds
    pub backend_timeout_secs: u64,
    /// How POST requests are keyed for deduplication
    pub post_key_policy: PostKeyPolicy,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CACHE_TTL_SECS` - Response cache TTL (default: 900)
    /// - `INFLIGHT_GRACE_MS` - In-flight removal delay (default: 100)
    /// - `BACKEND_TIMEOUT_SECS` - Outbound timeout (default: 30)
    /// - `POST_DEDUP_KEY` - `action` or `body-hash` (default: action)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            cache_ttl_secs: parse_var("CACHE_TTL_SECS").unwrap_or(defaults.cache_ttl_secs),
            inflight_grace_ms: parse_var("INFLIGHT_GRACE_MS")
                .unwrap_or(defaults.inflight_grace_ms),
            backend_timeout_secs: parse_var("BACKEND_TIMEOUT_SECS")
                .unwrap_or(defaults.backend_timeout_secs),
            post_key_policy: parse_var("POST_DEDUP_KEY").unwrap_or(defaults.post_key_policy),
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn inflight_grace(&self) -> Duration {
        Duration::from_millis(self.inflight_grace_ms)
    }

    pub fn backend_timeout(&self) -> Duration {
        Duration::from_secs(self.backend_timeout_secs)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            cache_ttl_secs: 15 * 60,
            inflight_grace_ms: 100,
            backend_timeout_secs: 30,
            post_key_policy: PostKeyPolicy::Action,
        }
    }
}
