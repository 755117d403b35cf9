//! Deduplication Coordinator
//!
//! Guarantees at most one outbound dispatch per in-flight key. Callers that
//! arrive while a dispatch is pending (or inside the grace window after it
//! settles) share its outcome instead of issuing their own.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{ProxyError, Result};
use crate::tasks::spawn_release;

/// A boxed backend dispatch, ready to be shared between waiters.
pub type DispatchFuture = BoxFuture<'static, Result<Value>>;

type SharedDispatch = Shared<DispatchFuture>;

/// Shared handle on the in-flight map, also held by release tasks.
pub type InFlightMap = Arc<Mutex<HashMap<String, InFlightEntry>>>;

/// One pending (or recently settled) dispatch.
#[derive(Clone)]
pub struct InFlightEntry {
    generation: u64,
    scope: Option<String>,
    settled: Arc<AtomicBool>,
    outcome: SharedDispatch,
}

impl InFlightEntry {
    /// Distinguishes this dispatch from later ones under the same key.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True once the backend call has produced its result.
    pub fn is_settled(&self) -> bool {
        self.settled.load(Ordering::Acquire)
    }

    #[cfg(test)]
    pub(crate) fn settled(generation: u64, result: Result<Value>) -> Self {
        Self {
            generation,
            scope: None,
            settled: Arc::new(AtomicBool::new(true)),
            outcome: futures::future::ready(result).boxed().shared(),
        }
    }
}

/// Restrictions on which registered dispatch a caller may share.
#[derive(Debug, Clone, Copy, Default)]
pub struct JoinOptions<'a> {
    /// Backend target the dispatch reads from; [`InFlightCoordinator::forget_scope`]
    /// drops every entry tagged with it.
    pub scope: Option<&'a str>,
    /// Join only a dispatch that is still running, never a settled one.
    pub pending_only: bool,
}

/// How a caller obtained its outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// This caller started the dispatch.
    Leader,
    /// This caller attached to another caller's dispatch.
    Joined,
}

// == In-Flight Coordinator ==
pub struct InFlightCoordinator {
    entries: InFlightMap,
    next_generation: AtomicU64,
    grace: Duration,
    joined: AtomicU64,
    retried: AtomicU64,
}

impl InFlightCoordinator {
    /// Creates a coordinator whose settled entries linger for `grace`.
    pub fn new(grace: Duration) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(0),
            grace,
            joined: AtomicU64::new(0),
            retried: AtomicU64::new(0),
        }
    }

    // == Acquire Or Join ==
    /// Runs `work` for `key` unless a dispatch for `key` is already registered,
    /// in which case its outcome is shared.
    ///
    /// A caller that joined a dispatch which then failed gets one fresh
    /// attempt: it joins a newer dispatch if one has appeared, otherwise it
    /// starts its own. `work` may therefore be called more than once.
    ///
    /// The dispatch runs on its own task, so dropping every waiter does not
    /// cancel it.
    pub async fn acquire_or_join<F>(&self, key: &str, work: F) -> (Result<Value>, Role)
    where
        F: Fn() -> DispatchFuture,
    {
        self.acquire_or_join_with(key, JoinOptions::default(), work)
            .await
    }

    /// [`acquire_or_join`](Self::acquire_or_join) with restrictions on what may be joined.
    pub async fn acquire_or_join_with<F>(
        &self,
        key: &str,
        options: JoinOptions<'_>,
        work: F,
    ) -> (Result<Value>, Role)
    where
        F: Fn() -> DispatchFuture,
    {
        let mut failed_generation = None;

        loop {
            let (outcome, role, generation) =
                self.claim(key, options, failed_generation, &work).await;
            let result = outcome.await;

            match (&result, role, failed_generation) {
                (Err(err), Role::Joined, None) => {
                    warn!(key, error = %err, "joined dispatch failed, retrying independently");
                    self.retried.fetch_add(1, Ordering::Relaxed);
                    failed_generation = Some(generation);
                }
                _ => return (result, role),
            }
        }
    }

    /// Joins the registered dispatch for `key`, or registers a new one.
    ///
    /// `skip` names a generation the caller already saw fail; it is never joined again.
    async fn claim<F>(
        &self,
        key: &str,
        options: JoinOptions<'_>,
        skip: Option<u64>,
        work: &F,
    ) -> (SharedDispatch, Role, u64)
    where
        F: Fn() -> DispatchFuture,
    {
        let mut entries = self.entries.lock().await;

        if let Some(entry) = entries.get(key) {
            let joinable = !(options.pending_only && entry.is_settled());
            if joinable && Some(entry.generation) != skip {
                debug!(key, generation = entry.generation, "joining in-flight dispatch");
                self.joined.fetch_add(1, Ordering::Relaxed);
                return (entry.outcome.clone(), Role::Joined, entry.generation);
            }
        }

        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        debug!(key, generation, "starting dispatch");

        let dispatch = work();
        let map = self.entries.clone();
        let owned_key = key.to_string();
        let grace = self.grace;
        let settled = Arc::new(AtomicBool::new(false));
        let settled_flag = settled.clone();

        // Release is scheduled from the task itself so it happens even if
        // nobody is left polling. The lock held here keeps the release from
        // running before the entry is inserted below.
        let handle = tokio::spawn(async move {
            let result = AssertUnwindSafe(dispatch)
                .catch_unwind()
                .await
                .unwrap_or_else(|_| Err(ProxyError::Internal("backend dispatch panicked".into())));
            settled_flag.store(true, Ordering::Release);
            spawn_release(map, owned_key, generation, grace);
            result
        });

        let outcome: SharedDispatch = async move {
            handle
                .await
                .unwrap_or_else(|e| Err(ProxyError::Internal(format!("dispatch task failed: {e}"))))
        }
        .boxed()
        .shared();

        entries.insert(
            key.to_string(),
            InFlightEntry {
                generation,
                scope: options.scope.map(str::to_string),
                settled,
                outcome: outcome.clone(),
            },
        );

        (outcome, Role::Leader, generation)
    }

    // == Forget Scope ==
    /// Unregisters every dispatch tagged with `scope`, pending or settled.
    ///
    /// Later callers start a fresh dispatch instead of sharing one that began
    /// before the backend state changed. Forgotten dispatches still run to
    /// completion for the callers already waiting on them. Returns the number
    /// of entries removed.
    pub async fn forget_scope(&self, scope: &str) -> usize {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.scope.as_deref() != Some(scope));
        let removed = before - entries.len();
        if removed > 0 {
            debug!(scope, removed, "forgot in-flight dispatches");
        }
        removed
    }

    /// Number of keys currently registered (pending or within the grace window).
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.entries.lock().await.contains_key(key)
    }

    /// Total callers that attached to another caller's dispatch.
    pub fn joined_count(&self) -> u64 {
        self.joined.load(Ordering::Relaxed)
    }

    /// Total joiners that retried after their joined dispatch failed.
    pub fn retried_count(&self) -> u64 {
        self.retried.load(Ordering::Relaxed)
    }
}
