//! Cache Module
//!
//! Provides the in-memory TTL response cache used by the forwarding proxy.

mod entry;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::{CacheEntry, CacheKey};
pub use stats::CacheStats;
pub use store::ResponseCache;

// == Public Constants ==
/// Action used when a request does not name one
pub const DEFAULT_ACTION: &str = "default";
