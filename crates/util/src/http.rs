//! # HTTP Utilities
//!
//! Helpers for turning transport-level response data into the shapes the HTTP
//! step reports, plus a log-friendly preview of response bodies.

use indexmap::IndexMap;
use reqwest::header::HeaderMap;

/// Collect response headers into a name → ordered values mapping.
///
/// Names keep the order in which they first appear; repeated headers keep
/// every value in arrival order. Values that are not valid visible ASCII are
/// decoded lossily instead of being dropped.
///
/// # Example
/// ```rust
/// use reqwest::header::{HeaderMap, HeaderValue, SET_COOKIE};
/// use stepcall_util::header_multimap;
///
/// let mut headers = HeaderMap::new();
/// headers.append(SET_COOKIE, HeaderValue::from_static("a=1"));
/// headers.append(SET_COOKIE, HeaderValue::from_static("b=2"));
///
/// let collected = header_multimap(&headers);
/// assert_eq!(collected["set-cookie"], vec!["a=1", "b=2"]);
/// ```
pub fn header_multimap(headers: &HeaderMap) -> IndexMap<String, Vec<String>> {
    let mut collected: IndexMap<String, Vec<String>> = IndexMap::new();
    for name in headers.keys() {
        let values = headers
            .get_all(name)
            .iter()
            .map(|value| match value.to_str() {
                Ok(text) => text.to_string(),
                Err(_) => String::from_utf8_lossy(value.as_bytes()).into_owned(),
            })
            .collect();
        collected.insert(name.as_str().to_string(), values);
    }
    collected
}

/// Shorten a response body for log output.
///
/// Whitespace runs made of newlines and tabs collapse to a single space and
/// the preview is cut at `limit` characters with a trailing `...`. Empty or
/// blank bodies render as `<empty>`.
pub fn truncate_response_preview(text: &str, limit: usize) -> String {
    if text.trim().is_empty() {
        return "<empty>".to_string();
    }

    let mut preview = String::new();
    for (count, ch) in text.chars().enumerate() {
        if count >= limit {
            preview.push_str("...");
            break;
        }
        match ch {
            '\n' | '\r' | '\t' => {
                if !preview.ends_with(' ') {
                    preview.push(' ');
                }
            }
            _ => preview.push(ch),
        }
    }

    preview.trim().to_string()
}
