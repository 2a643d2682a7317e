//! Helpers shared by the Stepcall crates: the async-to-blocking bridge, HTTP
//! header/preview utilities, and secret redaction for log output.

pub mod async_runtime;
pub mod http;

pub use async_runtime::block_on;
pub use http::{header_multimap, truncate_response_preview};

use once_cell::sync::Lazy;
use regex::Regex;

static SENSITIVE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(?P<prefix>authorization: )[\w\-\.=:/+ ]+",
        r"(?i)(?P<prefix>[A-Z0-9_\-]*?(KEY|TOKEN|SECRET|PASSWORD)[=:] ?)[^\s&]+",
        r"(?i)(?P<prefix>://[^:/@\s]+:)[^@\s/]+(?P<suffix>@)",
    ]
    .iter()
    .filter_map(|pattern| Regex::new(pattern).ok())
    .collect()
});

/// Redacts values that look like secrets in a string.
///
/// Covers `Authorization:` header lines, `*KEY`/`*TOKEN`/`*SECRET`/`*PASSWORD`
/// assignments (including query-string pairs such as `api_key=...`) and
/// passwords embedded in URL userinfo.
///
/// ```rust
/// use stepcall_util::redact_sensitive;
///
/// assert_eq!(redact_sensitive("https://h/x?api_key=abc&q=1"), "https://h/x?api_key=<redacted>&q=1");
/// assert_eq!(redact_sensitive("authorization: Bearer abc"), "authorization: <redacted>");
/// ```
pub fn redact_sensitive(input: &str) -> String {
    let mut redacted = input.to_string();
    for pattern in SENSITIVE_PATTERNS.iter() {
        redacted = pattern
            .replace_all(&redacted, |caps: &regex::Captures| {
                let prefix = caps.name("prefix").map(|m| m.as_str()).unwrap_or("");
                let suffix = caps.name("suffix").map(|m| m.as_str()).unwrap_or("");
                format!("{prefix}<redacted>{suffix}")
            })
            .to_string();
    }
    redacted
}
