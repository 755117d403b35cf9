//! In-Flight Module
//!
//! Request coalescing: one outbound dispatch per key, shared by every concurrent caller.

mod coordinator;

pub use coordinator::{
    DispatchFuture, InFlightCoordinator, InFlightEntry, InFlightMap, JoinOptions, Role,
};
