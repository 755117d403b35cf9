//! Request models for the proxy API
//!
//! Turns raw inbound query strings and bodies into validated forward requests.

use std::borrow::Cow;

use serde_json::{Map, Value};
use url::Url;

use crate::error::{ProxyError, Result};
use crate::proxy::keys::action_or_default;
use crate::proxy::validate_target;

/// Query parameter naming the backend on GET
pub const URL_PARAM: &str = "url";
/// Query parameter that bypasses the cache read on GET
pub const FORCE_REFRESH_PARAM: &str = "forceRefresh";
/// Body field naming the backend on POST
pub const SCRIPT_URL_FIELD: &str = "scriptUrl";
/// Older body field name some clients still send alongside `scriptUrl`
pub const TARGET_URL_FIELD: &str = "targetUrl";

/// A validated GET forward (GET /api/proxy).
#[derive(Debug, Clone, PartialEq)]
pub struct GetForward {
    pub target: Url,
    pub action: String,
    pub force_refresh: bool,
    /// Every inbound parameter except `url` and `forceRefresh`, in order
    pub params: Vec<(String, String)>,
}

impl GetForward {
    /// Builds a forward from the inbound query pairs.
    ///
    /// `action` is kept in `params` so the backend receives it too.
    pub fn from_query_pairs(pairs: Vec<(String, String)>) -> Result<Self> {
        let mut target = None;
        let mut force_refresh = false;
        let mut action = None;
        let mut params = Vec::with_capacity(pairs.len());

        for (name, value) in pairs {
            match name.as_str() {
                URL_PARAM => target = Some(value),
                FORCE_REFRESH_PARAM => force_refresh = value == "true",
                _ => {
                    if name == "action" && action.is_none() {
                        action = Some(value.clone());
                    }
                    params.push((name, value));
                }
            }
        }

        let target = validate_target(target.as_deref())?;
        let action = action_or_default(action.as_deref()).to_string();

        Ok(Self {
            target,
            action,
            force_refresh,
            params,
        })
    }
}

/// A validated POST forward (POST /api/proxy).
#[derive(Debug, Clone, PartialEq)]
pub struct PostForward {
    pub target: Url,
    /// The inbound object minus the target URL fields
    pub body: Value,
}

impl PostForward {
    /// Parses the raw request body.
    pub fn from_body(raw: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(raw)
            .map_err(|e| ProxyError::InvalidRequest(format!("body is not valid JSON: {e}")))?;

        let mut object: Map<String, Value> = match value {
            Value::Object(object) => object,
            _ => {
                return Err(ProxyError::InvalidRequest(
                    "body must be a JSON object".to_string(),
                ))
            }
        };

        let script_url = object.remove(SCRIPT_URL_FIELD);
        let legacy_url = object.remove(TARGET_URL_FIELD);
        let raw_target = script_url.or(legacy_url);

        let target = validate_target(raw_target.as_ref().and_then(Value::as_str))?;

        Ok(Self {
            target,
            body: Value::Object(object),
        })
    }

    pub fn action(&self) -> Cow<'_, str> {
        crate::proxy::keys::body_action(&self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_get_forward_strips_control_params() {
        let req = GetForward::from_query_pairs(pairs(&[
            ("url", "https://script.example/exec"),
            ("action", "getProblems"),
            ("forceRefresh", "true"),
            ("difficulty", "Hard"),
        ]))
        .unwrap();

        assert_eq!(req.target.as_str(), "https://script.example/exec");
        assert_eq!(req.action, "getProblems");
        assert!(req.force_refresh);
        assert_eq!(
            req.params,
            pairs(&[("action", "getProblems"), ("difficulty", "Hard")])
        );
    }

    #[test]
    fn test_get_forward_defaults() {
        let req =
            GetForward::from_query_pairs(pairs(&[("url", "https://script.example/exec")]))
                .unwrap();

        assert_eq!(req.action, "default");
        assert!(!req.force_refresh);
        assert!(req.params.is_empty());
    }

    #[test]
    fn test_get_forward_force_refresh_only_when_true() {
        let req = GetForward::from_query_pairs(pairs(&[
            ("url", "https://script.example/exec"),
            ("forceRefresh", "1"),
        ]))
        .unwrap();
        assert!(!req.force_refresh);
    }

    #[test]
    fn test_get_forward_missing_url() {
        let err = GetForward::from_query_pairs(pairs(&[("action", "getProblems")])).unwrap_err();
        assert_eq!(err, ProxyError::MissingTarget);
    }

    #[test]
    fn test_get_forward_invalid_url() {
        let err = GetForward::from_query_pairs(pairs(&[("url", "not a url")])).unwrap_err();
        assert!(matches!(err, ProxyError::InvalidTarget(_)));
    }

    #[test]
    fn test_post_forward_strips_script_url() {
        let raw = json!({
            "scriptUrl": "https://script.example/exec",
            "action": "completeReview",
            "problemId": 42
        });
        let req = PostForward::from_body(raw.to_string().as_bytes()).unwrap();

        assert_eq!(req.target.as_str(), "https://script.example/exec");
        assert_eq!(req.body, json!({"action": "completeReview", "problemId": 42}));
        assert_eq!(req.action(), "completeReview");
    }

    #[test]
    fn test_post_forward_accepts_target_url_field() {
        let raw = json!({"targetUrl": "https://script.example/exec", "action": "addToReview"});
        let req = PostForward::from_body(raw.to_string().as_bytes()).unwrap();

        assert_eq!(req.target.as_str(), "https://script.example/exec");
        assert_eq!(req.body, json!({"action": "addToReview"}));
    }

    #[test]
    fn test_post_forward_rejects_bad_bodies() {
        assert!(matches!(
            PostForward::from_body(b"{not json"),
            Err(ProxyError::InvalidRequest(_))
        ));
        assert!(matches!(
            PostForward::from_body(b"[1, 2, 3]"),
            Err(ProxyError::InvalidRequest(_))
        ));
        assert_eq!(
            PostForward::from_body(br#"{"action": "completeReview"}"#),
            Err(ProxyError::MissingTarget)
        );
    }
}
