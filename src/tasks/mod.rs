//! Background Tasks Module
//!
//! Contains tasks spawned alongside request handling.
//!
//! # Tasks
//! - In-flight release: drops a settled dispatch from the in-flight map after the grace window

mod release;

pub use release::spawn_release;
