//! Forwarding Service
//!
//! Composes the response cache, the in-flight coordinator and the backend
//! into the two proxy operations. One instance is built at startup and
//! shared by every handler.

use std::sync::Arc;

use futures::FutureExt;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};
use url::Url;

use crate::cache::{CacheKey, ResponseCache};
use crate::config::Config;
use crate::error::Result;
use crate::inflight::{InFlightCoordinator, JoinOptions, Role};
use crate::models::{GetForward, PostForward, StatsResponse};
use crate::proxy::backend::{Backend, HttpBackend};
use crate::proxy::keys::{self, PostKeyPolicy};

/// Value of the `X-Cache` diagnostic header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
    Deduplicated,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
            CacheStatus::Deduplicated => "DEDUPLICATED",
        }
    }
}

impl From<Role> for CacheStatus {
    fn from(role: Role) -> Self {
        match role {
            Role::Leader => CacheStatus::Miss,
            Role::Joined => CacheStatus::Deduplicated,
        }
    }
}

/// A backend payload and how it was obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct Forwarded {
    pub payload: Value,
    pub cache_status: CacheStatus,
}

// == Forwarding Service ==
pub struct ForwardingService {
    cache: Arc<RwLock<ResponseCache>>,
    inflight: Arc<InFlightCoordinator>,
    backend: Arc<dyn Backend>,
    post_key_policy: PostKeyPolicy,
}

impl ForwardingService {
    pub fn new(backend: Arc<dyn Backend>, config: &Config) -> Self {
        Self {
            cache: Arc::new(RwLock::new(ResponseCache::new(config.cache_ttl()))),
            inflight: Arc::new(InFlightCoordinator::new(config.inflight_grace())),
            backend,
            post_key_policy: config.post_key_policy,
        }
    }

    /// Builds a service talking HTTP to the real backend.
    pub fn from_config(config: &Config) -> reqwest::Result<Self> {
        let backend = HttpBackend::new(config.backend_timeout())?;
        Ok(Self::new(Arc::new(backend), config))
    }

    // == Forward GET ==
    /// Serves a GET from cache, or from the single in-flight dispatch for its key.
    ///
    /// `force_refresh` skips the cache read and refuses to share an already
    /// settled dispatch; a successful dispatch is cached either way.
    pub async fn forward_get(&self, req: GetForward) -> Result<Forwarded> {
        let cache_key = keys::cache_key(&req.target, &req.action);

        if req.force_refresh {
            debug!(key = %cache_key, "force refresh, skipping cache read");
            self.cache.write().await.record_bypass();
        } else if let Some(payload) = self.cache.write().await.lookup(&cache_key) {
            return Ok(Forwarded {
                payload,
                cache_status: CacheStatus::Hit,
            });
        }

        let inflight_key = keys::get_inflight_key(&req.target, &req.action);
        let target = Arc::new(req.target);
        let params = Arc::new(req.params);
        let options = JoinOptions {
            scope: Some(target.as_str()),
            pending_only: req.force_refresh,
        };

        let work = || {
            fetch_and_store(
                self.backend.clone(),
                self.cache.clone(),
                target.clone(),
                params.clone(),
                cache_key.clone(),
            )
            .boxed()
        };

        let (result, role) = self
            .inflight
            .acquire_or_join_with(&inflight_key, options, work)
            .await;
        Ok(Forwarded {
            payload: result?,
            cache_status: role.into(),
        })
    }

    // == Forward POST ==
    /// Dispatches a POST (deduplicated per the configured key policy) and,
    /// on success, drops every cached response for the same backend URL
    /// along with any GET dispatch for it that could still be joined.
    pub async fn forward_post(&self, req: PostForward) -> Result<Forwarded> {
        let inflight_key = keys::post_inflight_key(&req.target, &req.body, self.post_key_policy);
        let target = Arc::new(req.target);
        let body = Arc::new(req.body);

        let work = || {
            post_and_invalidate(
                self.backend.clone(),
                self.cache.clone(),
                self.inflight.clone(),
                target.clone(),
                body.clone(),
            )
            .boxed()
        };

        let (result, role) = self.inflight.acquire_or_join(&inflight_key, work).await;
        Ok(Forwarded {
            payload: result?,
            cache_status: role.into(),
        })
    }

    // == Stats ==
    pub async fn stats(&self) -> StatsResponse {
        let cache = self.cache.read().await.stats();
        StatsResponse::new(
            &cache,
            self.inflight.joined_count(),
            self.inflight.len().await,
        )
    }

    pub fn cache(&self) -> &Arc<RwLock<ResponseCache>> {
        &self.cache
    }
}

/// The shared body of a GET dispatch: fetch, then cache on success.
async fn fetch_and_store(
    backend: Arc<dyn Backend>,
    cache: Arc<RwLock<ResponseCache>>,
    target: Arc<Url>,
    params: Arc<Vec<(String, String)>>,
    cache_key: CacheKey,
) -> Result<Value> {
    let payload = backend.get(&target, &params).await?;
    cache.write().await.store(cache_key, payload.clone());
    Ok(payload)
}

/// The shared body of a POST dispatch: forward, then invalidate on success.
///
/// The cache lock is held until the in-flight reads are forgotten too, so a
/// GET that misses the cache cannot join a read started before the write.
async fn post_and_invalidate(
    backend: Arc<dyn Backend>,
    cache: Arc<RwLock<ResponseCache>>,
    inflight: Arc<InFlightCoordinator>,
    target: Arc<Url>,
    body: Arc<Value>,
) -> Result<Value> {
    let payload = backend.post(&target, &body).await?;

    let mut cache = cache.write().await;
    let removed = cache.invalidate_target(target.as_str());
    let forgotten = inflight.forget_scope(target.as_str()).await;
    drop(cache);

    info!(target_url = %target, removed, forgotten, "invalidated cached responses after write");
    Ok(payload)
}
