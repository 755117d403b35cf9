//! In-Flight Release Task
//!
//! Deferred removal of a settled dispatch from the in-flight map.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::inflight::{InFlightEntry, InFlightMap};

/// Spawns a task that removes `key` from `entries` once `grace` has elapsed.
///
/// The entry is removed only if it still belongs to `generation`; a newer
/// dispatch registered under the same key in the meantime is left alone.
///
/// Callers arriving during the grace window join the settled outcome
/// instead of dispatching again.
///
/// # Returns
/// A JoinHandle for the spawned task. Dropping it does not cancel the release.
pub fn spawn_release(
    entries: InFlightMap,
    key: String,
    generation: u64,
    grace: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(grace).await;

        let mut guard = entries.lock().await;
        match guard.get(&key).map(InFlightEntry::generation) {
            Some(current) if current == generation => {
                guard.remove(&key);
                debug!(key, generation, "released in-flight entry");
            }
            Some(current) => {
                debug!(key, generation, current, "in-flight entry superseded, leaving it");
            }
            None => {}
        }
    })
}
