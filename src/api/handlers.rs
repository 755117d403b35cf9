//! API Handlers
//!
//! HTTP request handlers for each proxy endpoint.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};

use crate::config::Config;
use crate::error::Result;
use crate::models::{GetForward, HealthResponse, PostForward, StatsResponse};
use crate::proxy::{Backend, Forwarded, ForwardingService};

/// Diagnostic header reporting how a payload was obtained
pub const X_CACHE: HeaderName = HeaderName::from_static("x-cache");

/// Application state shared across all handlers.
///
/// Holds the single forwarding service; its cache and in-flight map live
/// as long as the process.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ForwardingService>,
}

impl AppState {
    /// Creates a new AppState around an existing service.
    pub fn new(service: ForwardingService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    /// Creates a new AppState talking HTTP to the backend.
    pub fn from_config(config: &Config) -> reqwest::Result<Self> {
        Ok(Self::new(ForwardingService::from_config(config)?))
    }

    /// Creates a new AppState over an injected backend.
    pub fn with_backend(backend: Arc<dyn Backend>, config: &Config) -> Self {
        Self::new(ForwardingService::new(backend, config))
    }
}

fn forwarded_response(forwarded: Forwarded) -> Response {
    let status = HeaderValue::from_static(forwarded.cache_status.as_str());
    ([(X_CACHE, status)], Json(forwarded.payload)).into_response()
}

/// Handler for GET /api/proxy
///
/// Forwards `url` (plus every parameter but `url` and `forceRefresh`) to the
/// backend, serving from cache where possible.
pub async fn proxy_get_handler(
    State(state): State<AppState>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Response> {
    let req = GetForward::from_query_pairs(pairs)?;
    let forwarded = state.service.forward_get(req).await?;
    Ok(forwarded_response(forwarded))
}

/// Handler for POST /api/proxy
///
/// The body is parsed here rather than by the `Json` extractor so malformed
/// bodies get the same error envelope as every other failure.
pub async fn proxy_post_handler(State(state): State<AppState>, body: Bytes) -> Result<Response> {
    let req = PostForward::from_body(&body)?;
    let forwarded = state.service.forward_post(req).await?;
    Ok(forwarded_response(forwarded))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.service.stats().await)
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProxyError;
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use serde_json::{json, Value};
    use url::Url;

    /// Backend that must never be reached.
    struct Unreachable;

    #[async_trait]
    impl Backend for Unreachable {
        async fn get(&self, target: &Url, _params: &[(String, String)]) -> Result<Value> {
            panic!("unexpected GET to {target}")
        }

        async fn post(&self, target: &Url, _body: &Value) -> Result<Value> {
            panic!("unexpected POST to {target}")
        }
    }

    /// Backend echoing what it was sent.
    struct Echo;

    #[async_trait]
    impl Backend for Echo {
        async fn get(&self, target: &Url, params: &[(String, String)]) -> Result<Value> {
            Ok(json!({ "url": target.as_str(), "params": params.len() }))
        }

        async fn post(&self, _target: &Url, body: &Value) -> Result<Value> {
            Ok(body.clone())
        }
    }

    fn state(backend: impl Backend + 'static) -> AppState {
        AppState::with_backend(Arc::new(backend), &Config::default())
    }

    fn query(raw: &[(&str, &str)]) -> Query<Vec<(String, String)>> {
        Query(
            raw.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_get_handler_missing_url() {
        let result = proxy_get_handler(State(state(Unreachable)), query(&[])).await;
        assert!(matches!(result, Err(ProxyError::MissingTarget)));
    }

    #[tokio::test]
    async fn test_get_handler_invalid_url() {
        let result =
            proxy_get_handler(State(state(Unreachable)), query(&[("url", "not a url")])).await;
        assert!(matches!(result, Err(ProxyError::InvalidTarget(_))));
    }

    #[tokio::test]
    async fn test_get_handler_sets_x_cache() {
        let state = state(Echo);
        let q = &[("url", "https://script.example/exec"), ("action", "getProblems")];

        let first = proxy_get_handler(State(state.clone()), query(q)).await.unwrap();
        let second = proxy_get_handler(State(state), query(q)).await.unwrap();

        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(first.headers()[&X_CACHE], "MISS");
        assert_eq!(second.headers()[&X_CACHE], "HIT");
    }

    #[tokio::test]
    async fn test_post_handler_rejects_missing_script_url() {
        let result = proxy_post_handler(
            State(state(Unreachable)),
            Bytes::from_static(br#"{"action":"completeReview"}"#),
        )
        .await;
        assert!(matches!(result, Err(ProxyError::MissingTarget)));
    }

    #[tokio::test]
    async fn test_post_handler_forwards() {
        let response = proxy_post_handler(
            State(state(Echo)),
            Bytes::from_static(
                br#"{"scriptUrl":"https://script.example/exec","action":"addToReview"}"#,
            ),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[&X_CACHE], "MISS");
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let response = stats_handler(State(state(Unreachable))).await;
        assert_eq!(response.hits, 0);
        assert_eq!(response.misses, 0);
        assert_eq!(response.in_flight, 0);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
