//! Step request descriptors.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Method used when a step definition omits `method`.
pub const DEFAULT_METHOD: &str = "GET";

/// Content type used to tag the request body when a step definition omits `accept`.
pub const DEFAULT_ACCEPT: &str = "application/json";

/// Request descriptor for one HTTP step invocation.
///
/// Built by the workflow engine from step configuration. Any string inside
/// `url`, `headers`, `param` or `body` may carry `${{ ... }}` placeholders that
/// are substituted during input resolution.
///
/// ```rust
/// use stepcall_types::StepInput;
///
/// let input: StepInput = serde_json::from_str(r#"{ "url": "https://example.com/items" }"#).unwrap();
/// assert_eq!(input.method, "GET");
/// assert_eq!(input.accept, "application/json");
/// assert!(input.body.is_null());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepInput {
    /// Target URL, possibly templated. The query string is appended during resolution.
    pub url: String,
    /// HTTP verb. Compared case-insensitively.
    #[serde(default = "default_method")]
    pub method: String,
    /// Outgoing request headers. One value per name.
    #[serde(default)]
    pub headers: IndexMap<String, String>,
    /// Query parameters in declaration order.
    #[serde(default)]
    pub param: IndexMap<String, Value>,
    /// Request body; serialized as JSON for every method except `GET`.
    #[serde(default)]
    pub body: Value,
    /// Content type attached to the serialized body.
    #[serde(default = "default_accept")]
    pub accept: String,
}

impl Default for StepInput {
    fn default() -> Self {
        Self {
            url: String::new(),
            method: default_method(),
            headers: IndexMap::new(),
            param: IndexMap::new(),
            body: Value::Null,
            accept: default_accept(),
        }
    }
}

impl StepInput {
    /// Convenience constructor for a `GET` against `url` with no parameters.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }
}

/// Fully resolved request ready to be sent.
///
/// Produced by input resolution. The URL already carries the query string and
/// no resolvable placeholders remain in any field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedStepInput {
    /// Literal URL including the query string.
    pub url: String,
    /// Upper-cased HTTP verb.
    pub method: String,
    /// Literal request headers.
    pub headers: IndexMap<String, String>,
    /// Literal request body.
    pub body: Value,
    /// Content type attached to the serialized body.
    pub accept: String,
}

impl ResolvedStepInput {
    /// Returns true when the request is a `GET` and therefore carries no payload.
    pub fn is_get(&self) -> bool {
        self.method.eq_ignore_ascii_case(DEFAULT_METHOD)
    }
}

fn default_method() -> String {
    DEFAULT_METHOD.to_string()
}

fn default_accept() -> String {
    DEFAULT_ACCEPT.to_string()
}
