//! Fetch the raw row collection from the spreadsheet's web-app endpoint.
//!
//! One GET per call, no retry and no timeout beyond the HTTP client's
//! defaults. The caller decides whether to try again.

use chrono::Utc;
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use serde_json::Value;
use std::fmt;
use tracing::{info, warn};

use crate::error::{FetchError, Result};

/// Query parameter carrying the cache-busting stamp
pub const CACHE_BUST_PARAM: &str = "t";

/// Parseable body that is not a row array.
///
/// Indistinguishable from "the sheet has no rows", so it yields an empty
/// collection; callers should still show it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatWarning {
    /// Body carried an explicit `error` field
    Upstream(String),
    /// Body was JSON of another kind (object, string, ...)
    NotAnArray(&'static str),
}

impl fmt::Display for FormatWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatWarning::Upstream(msg) => write!(f, "sheet reported an error: {msg}"),
            FormatWarning::NotAnArray(kind) => write!(f, "expected a JSON array of rows, got {kind}"),
        }
    }
}

/// Rows as delivered (not yet normalized) plus any shape warning
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SheetPayload {
    pub rows: Vec<Value>,
    pub warning: Option<FormatWarning>,
}

impl SheetPayload {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// HTTP client for the sheet endpoint
#[derive(Debug, Clone, Default)]
pub struct SheetClient {
    http: reqwest::Client,
}

impl SheetClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// GET `url` (with a fresh cache-busting stamp) and return its rows.
    ///
    /// An HTML content type is checked first: the sign-in redirect page can
    /// come back with a 200.
    pub async fn fetch_rows(&self, url: &str) -> Result<SheetPayload> {
        let target = cache_busted_url(url, Utc::now().timestamp_millis())?;
        info!(endpoint = %redact(&target), "fetching sheet rows");

        let resp = self.http.get(target).send().await?;

        let is_html = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("text/html"));
        if is_html {
            warn!("sheet endpoint answered with HTML; access is not public");
            return Err(FetchError::PermissionDenied);
        }

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Transport { status });
        }

        let bytes = resp.bytes().await?;
        let body: Value = serde_json::from_slice(&bytes)?;
        let payload = interpret_body(body);

        match &payload.warning {
            Some(w) => warn!(warning = %w, "sheet body is not a row array; treating as empty"),
            None => info!(rows = payload.rows.len(), "sheet rows fetched"),
        }
        Ok(payload)
    }
}

/// `url` with `t=<stamp>` appended, so every call reaches the origin.
pub fn cache_busted_url(url: &str, stamp_ms: i64) -> Result<Url> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(FetchError::InvalidUrl {
            url: url.to_string(),
            reason: "empty".to_string(),
        });
    }

    let mut parsed = Url::parse(trimmed).map_err(|e| FetchError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(FetchError::InvalidUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }

    parsed
        .query_pairs_mut()
        .append_pair(CACHE_BUST_PARAM, &stamp_ms.to_string());
    Ok(parsed)
}

/// Classify a decoded JSON body.
pub fn interpret_body(body: Value) -> SheetPayload {
    match body {
        Value::Array(rows) => SheetPayload {
            rows,
            warning: None,
        },
        Value::Object(ref map) if map.get("error").is_some_and(|e| !e.is_null()) => {
            let msg = match &map["error"] {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            SheetPayload {
                rows: Vec::new(),
                warning: Some(FormatWarning::Upstream(msg)),
            }
        }
        other => SheetPayload {
            rows: Vec::new(),
            warning: Some(FormatWarning::NotAnArray(json_kind(&other))),
        },
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Endpoint without its query string, for logs
fn redact(url: &Url) -> String {
    let mut u = url.clone();
    u.set_query(None);
    u.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cache_bust_appends_param() {
        let u = cache_busted_url("https://script.google.com/macros/s/abc/exec", 1700).unwrap();
        assert_eq!(u.as_str(), "https://script.google.com/macros/s/abc/exec?t=1700");

        let u = cache_busted_url("https://example.com/exec?sheet=AR", 5).unwrap();
        assert_eq!(u.as_str(), "https://example.com/exec?sheet=AR&t=5");
    }

    #[test]
    fn test_invalid_urls() {
        assert!(matches!(cache_busted_url("", 1), Err(FetchError::InvalidUrl { .. })));
        assert!(matches!(cache_busted_url("not a url", 1), Err(FetchError::InvalidUrl { .. })));
        assert!(matches!(cache_busted_url("ftp://example.com/x", 1), Err(FetchError::InvalidUrl { .. })));
    }

    #[test]
    fn test_array_body_returned_as_is() {
        let p = interpret_body(json!([{ "id": 1 }, "odd", 3]));
        assert_eq!(p.rows.len(), 3);
        assert_eq!(p.warning, None);
    }

    #[test]
    fn test_error_field_is_empty_with_warning() {
        let p = interpret_body(json!({ "error": "Sheet not found" }));
        assert!(p.is_empty());
        assert_eq!(p.warning, Some(FormatWarning::Upstream("Sheet not found".into())));
    }

    #[test]
    fn test_non_array_is_empty_with_warning() {
        let p = interpret_body(json!({ "rows": [] }));
        assert!(p.is_empty());
        assert_eq!(p.warning, Some(FormatWarning::NotAnArray("an object")));

        let p = interpret_body(json!("hello"));
        assert_eq!(p.warning, Some(FormatWarning::NotAnArray("a string")));
    }
}
