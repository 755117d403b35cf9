//! Forward Cache - A deduplicating, caching forwarding proxy
//!
//! Forwards JSON reads and writes to a remote backend, coalescing concurrent
//! identical requests and caching successful reads for a fixed TTL.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod inflight;
pub mod models;
pub mod proxy;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use proxy::ForwardingService;
