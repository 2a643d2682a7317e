//! Normalized HTTP step results.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Canonical shape of a response payload.
///
/// Every HTTP response body is reduced to one of these five shapes before it
/// is handed back to the workflow. The enum serializes untagged, so a
/// `ResponseBody` reads as the plain JSON value it represents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseBody {
    /// No payload.
    Null,
    /// Numeric root, always widened to double precision.
    Number(f64),
    /// Raw text, a string root, or the textual form of a boolean/null root.
    Text(String),
    /// Array root.
    List(Vec<Value>),
    /// Object root. Key order is not guaranteed.
    Map(Map<String, Value>),
}

impl ResponseBody {
    /// Returns true for [`ResponseBody::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, ResponseBody::Null)
    }

    /// Convert into a generic JSON value.
    ///
    /// A non-finite number cannot be represented in JSON and becomes `null`.
    pub fn into_value(self) -> Value {
        match self {
            ResponseBody::Null => Value::Null,
            ResponseBody::Number(number) => Number::from_f64(number).map(Value::Number).unwrap_or(Value::Null),
            ResponseBody::Text(text) => Value::String(text),
            ResponseBody::List(items) => Value::Array(items),
            ResponseBody::Map(map) => Value::Object(map),
        }
    }
}

/// Result of one HTTP step call.
///
/// Any status code, including 4xx and 5xx, is reported here; only transport
/// failures are errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResponse {
    /// HTTP status code.
    pub status: u16,
    /// Normalized payload.
    pub body: ResponseBody,
    /// Response headers; a name may repeat, values keep arrival order.
    pub headers: IndexMap<String, Vec<String>>,
}

impl StepResponse {
    /// Convert into the JSON value stored in the runtime parameter mapping.
    ///
    /// ```rust
    /// use indexmap::IndexMap;
    /// use stepcall_types::{ResponseBody, StepResponse};
    ///
    /// let response = StepResponse { status: 200, body: ResponseBody::Number(42.0), headers: IndexMap::new() };
    /// let value = response.into_value();
    /// assert_eq!(value["status"], 200);
    /// assert_eq!(value["body"], 42.0);
    /// ```
    pub fn into_value(self) -> Value {
        let headers = self
            .headers
            .into_iter()
            .map(|(name, values)| (name, Value::Array(values.into_iter().map(Value::String).collect())))
            .collect::<Map<String, Value>>();

        let mut object = Map::new();
        object.insert("status".into(), Value::from(self.status));
        object.insert("headers".into(), Value::Object(headers));
        object.insert("body".into(), self.body.into_value());
        Value::Object(object)
    }

    /// First value received for `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .and_then(|(_, values)| values.first())
            .map(String::as_str)
    }
}
