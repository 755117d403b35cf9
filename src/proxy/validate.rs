//! Target URL validation.

use tracing::debug;
use url::Url;

use crate::error::{ProxyError, Result};

/// Parses the caller-supplied backend URL.
///
/// Missing/empty and unparsable URLs are reported as distinct errors; both
/// become a 400 before any cache or in-flight state is touched.
pub fn validate_target(raw: Option<&str>) -> Result<Url> {
    let raw = match raw.map(str::trim) {
        Some(s) if !s.is_empty() => s,
        _ => {
            debug!("rejecting request without target URL");
            return Err(ProxyError::MissingTarget);
        }
    };

    debug!(target_url = raw, "parsing target URL");
    let url = Url::parse(raw).map_err(|e| {
        debug!(target_url = raw, error = %e, "target URL failed to parse");
        ProxyError::InvalidTarget(format!("{raw}: {e}"))
    })?;

    match url.scheme() {
        "http" | "https" => {
            debug!(target_url = %url, "target URL accepted");
            Ok(url)
        }
        scheme => Err(ProxyError::InvalidTarget(format!(
            "{raw}: unsupported scheme '{scheme}'"
        ))),
    }
}
