//! Backend dispatch
//!
//! Performs the real outbound call to the proxied JSON endpoint and maps
//! every failure onto [`ProxyError`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Response};
use serde_json::Value;
use tracing::{info, warn};
use url::Url;

use crate::error::{ProxyError, Result};

/// The remote JSON service being proxied.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Issues a GET to `target` with `params` appended to its query string.
    async fn get(&self, target: &Url, params: &[(String, String)]) -> Result<Value>;

    /// Issues a POST to `target` with `body` serialized as JSON.
    async fn post(&self, target: &Url, body: &Value) -> Result<Value>;
}

/// [`Backend`] over a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
}

impl HttpBackend {
    pub fn new(timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn get(&self, target: &Url, params: &[(String, String)]) -> Result<Value> {
        let mut url = target.clone();
        if !params.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }

        info!(url = %url, "dispatching GET to backend");
        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json")
            .header(header::CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(transport_error)?;

        decode(response).await
    }

    async fn post(&self, target: &Url, body: &Value) -> Result<Value> {
        info!(url = %target, "dispatching POST to backend");
        let response = self
            .client
            .post(target.clone())
            .header(header::ACCEPT, "application/json")
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;

        decode(response).await
    }
}

fn transport_error(err: reqwest::Error) -> ProxyError {
    if err.is_timeout() {
        ProxyError::Transport(format!("timed out: {err}"))
    } else {
        ProxyError::Transport(err.to_string())
    }
}

/// Turns a backend response into a JSON value or an error.
async fn decode(response: Response) -> Result<Value> {
    let status = response.status();
    if !status.is_success() {
        // Body text is diagnostic only; failing to read it is not fatal
        let body = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), body = %body, "backend returned error status");
        return Err(ProxyError::Upstream {
            status: status.as_u16(),
            body,
        });
    }

    let text = response.text().await.map_err(transport_error)?;
    serde_json::from_str(&text).map_err(|e| {
        warn!(error = %e, "backend body is not JSON");
        ProxyError::Parse(e.to_string())
    })
}
