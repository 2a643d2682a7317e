//! Response body normalization.
//!
//! Every payload is reduced to one of the [`ResponseBody`] shapes:
//!
//! | payload                     | result                       |
//! |-----------------------------|------------------------------|
//! | absent, empty or blank      | `Null`                       |
//! | not JSON                    | `Text` (raw, unchanged)      |
//! | JSON array                  | `List`                       |
//! | JSON object                 | `Map`                        |
//! | JSON number                 | `Number` (as `f64`)          |
//! | JSON string, bool or `null` | `Text` of the value's text   |
//!
//! Numbers nested inside lists and maps are widened to `f64` as well.

use serde_json::{Map, Number, Value};
use stepcall_types::ResponseBody;
use stepcall_util::{redact_sensitive, truncate_response_preview};
use tracing::warn;

const PREVIEW_LIMIT: usize = 200;

/// Normalize a raw response payload.
///
/// ```rust
/// use stepcall_engine::executor::normalize::normalize_body;
/// use stepcall_types::ResponseBody;
///
/// assert_eq!(normalize_body(Some("42")), ResponseBody::Number(42.0));
/// assert_eq!(normalize_body(Some("hello world")), ResponseBody::Text("hello world".into()));
/// assert_eq!(normalize_body(Some("")), ResponseBody::Null);
/// ```
pub fn normalize_body(raw: Option<&str>) -> ResponseBody {
    let Some(text) = raw else {
        return ResponseBody::Null;
    };
    if text.trim().is_empty() {
        return ResponseBody::Null;
    }

    match serde_json::from_str::<Value>(text) {
        Ok(root) => classify_root(root),
        Err(error) => {
            warn!(
                error = %error,
                preview = %redact_sensitive(&truncate_response_preview(text, PREVIEW_LIMIT)),
                "response body is not JSON; returning it as text"
            );
            ResponseBody::Text(text.to_string())
        }
    }
}

fn classify_root(root: Value) -> ResponseBody {
    match root {
        Value::Array(items) => ResponseBody::List(items.into_iter().map(widen_numbers).collect()),
        Value::Object(map) => ResponseBody::Map(widen_map(map)),
        Value::Number(number) => match number.as_f64() {
            Some(value) => ResponseBody::Number(value),
            None => ResponseBody::Text(number.to_string()),
        },
        Value::String(text) => ResponseBody::Text(text),
        Value::Bool(flag) => ResponseBody::Text(flag.to_string()),
        Value::Null => ResponseBody::Text("null".to_string()),
    }
}

fn widen_map(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter().map(|(key, value)| (key, widen_numbers(value))).collect()
}

fn widen_numbers(value: Value) -> Value {
    match value {
        Value::Number(number) => match number.as_f64().and_then(Number::from_f64) {
            Some(widened) => Value::Number(widened),
            None => Value::Number(number),
        },
        Value::Array(items) => Value::Array(items.into_iter().map(widen_numbers).collect()),
        Value::Object(map) => Value::Object(widen_map(map)),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_or_blank_payload_is_null() {
        assert_eq!(normalize_body(None), ResponseBody::Null);
        assert_eq!(normalize_body(Some("")), ResponseBody::Null);
        assert_eq!(normalize_body(Some(" \r\n\t")), ResponseBody::Null);
    }

    #[test]
    fn numeric_root_becomes_double() {
        assert_eq!(normalize_body(Some("42")), ResponseBody::Number(42.0));
        assert_eq!(normalize_body(Some("-0.5")), ResponseBody::Number(-0.5));
        assert_eq!(normalize_body(Some(" 1e3 ")), ResponseBody::Number(1000.0));
    }

    #[test]
    fn object_root_becomes_map_with_widened_numbers() {
        let body = normalize_body(Some(r#"{"a": 1, "b": {"c": [2, "x"]}, "d": true}"#));
        let ResponseBody::Map(map) = body else {
            panic!("expected a map, got {body:?}");
        };
        assert_eq!(map["a"], json!(1.0));
        assert_eq!(map["b"], json!({"c": [2.0, "x"]}));
        assert_eq!(map["d"], json!(true));
    }

    #[test]
    fn array_root_becomes_list() {
        assert_eq!(
            normalize_body(Some(r#"[1, "two", null]"#)),
            ResponseBody::List(vec![json!(1.0), json!("two"), Value::Null])
        );
        assert_eq!(normalize_body(Some("[]")), ResponseBody::List(Vec::new()));
    }

    #[test]
    fn scalar_roots_use_their_text() {
        assert_eq!(normalize_body(Some(r#""hi""#)), ResponseBody::Text("hi".into()));
        assert_eq!(normalize_body(Some("true")), ResponseBody::Text("true".into()));
        assert_eq!(normalize_body(Some("null")), ResponseBody::Text("null".into()));
    }

    #[test]
    fn non_json_payload_is_returned_verbatim() {
        assert_eq!(normalize_body(Some("hello world")), ResponseBody::Text("hello world".into()));
        assert_eq!(normalize_body(Some("{broken")), ResponseBody::Text("{broken".into()));
        assert_eq!(
            normalize_body(Some("<html><body>oops</body></html>\n")),
            ResponseBody::Text("<html><body>oops</body></html>\n".into())
        );
    }
}
