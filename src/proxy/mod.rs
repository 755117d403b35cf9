//! Proxy Module
//!
//! Validation, key derivation and backend dispatch, composed into the
//! [`ForwardingService`].

pub mod backend;
pub mod keys;
mod service;
mod validate;

pub use backend::{Backend, HttpBackend};
pub use keys::PostKeyPolicy;
pub use service::{CacheStatus, Forwarded, ForwardingService};
pub use validate::validate_target;
