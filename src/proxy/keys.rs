//! Key derivation for the response cache and the in-flight map.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use sha3::{Digest, Sha3_256};
use url::Url;

use crate::cache::{CacheKey, DEFAULT_ACTION};

/// How POST requests are told apart for deduplication.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PostKeyPolicy {
    /// Key on the body's `action` field only. Two POSTs naming the same
    /// action share one dispatch even when their payloads differ.
    #[default]
    Action,
    /// Key on a SHA3-256 digest of the whole body.
    BodyHash,
}

impl FromStr for PostKeyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "action" => Ok(PostKeyPolicy::Action),
            "body-hash" | "body_hash" | "bodyhash" => Ok(PostKeyPolicy::BodyHash),
            other => Err(format!("unknown POST dedup policy '{other}'")),
        }
    }
}

impl fmt::Display for PostKeyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostKeyPolicy::Action => f.write_str("action"),
            PostKeyPolicy::BodyHash => f.write_str("body-hash"),
        }
    }
}

/// Falls back to `"default"` for absent or empty actions.
pub fn action_or_default(action: Option<&str>) -> &str {
    match action {
        Some(a) if !a.is_empty() => a,
        _ => DEFAULT_ACTION,
    }
}

/// Reads the `action` field of a POST body.
///
/// Non-string actions are keyed on their JSON text rather than falling back
/// to the default action.
pub fn body_action(body: &Value) -> Cow<'_, str> {
    match body.get("action") {
        None | Some(Value::Null) => Cow::Borrowed(DEFAULT_ACTION),
        Some(Value::String(action)) => Cow::Borrowed(action_or_default(Some(action.as_str()))),
        Some(other) => Cow::Owned(other.to_string()),
    }
}

pub fn cache_key(target: &Url, action: &str) -> CacheKey {
    CacheKey::new(target.as_str(), action)
}

pub fn get_inflight_key(target: &Url, action: &str) -> String {
    format!("GET:{}:{}", target, action)
}

pub fn post_inflight_key(target: &Url, body: &Value, policy: PostKeyPolicy) -> String {
    match policy {
        PostKeyPolicy::Action => format!("POST:{}:{}", target, body_action(body)),
        PostKeyPolicy::BodyHash => format!("POST:{}:{}", target, body_digest(body)),
    }
}

// serde_json orders object keys, so equal bodies serialize identically
fn body_digest(body: &Value) -> String {
    let mut hasher = Sha3_256::new();
    hasher.update(body.to_string().as_bytes());
    hex::encode(hasher.finalize())
}
