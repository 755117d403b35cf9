//! API Module
//!
//! HTTP handlers and routing for the forwarding proxy.
//!
//! # Endpoints
//! - `GET /api/proxy` - Forward a read to the backend
//! - `POST /api/proxy` - Forward a write to the backend
//! - `GET /stats` - Cache and deduplication counters
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
