//! Request and Response models for the proxy API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! parsing inbound calls and serializing service responses.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{GetForward, PostForward};
pub use responses::{ErrorResponse, HealthResponse, StatsResponse};
