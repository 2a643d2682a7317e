//! # Template Resolution
//!
//! This module provides the default templating collaborator used by the HTTP
//! step. It replaces `${{ ... }}` placeholders inside arbitrary JSON values
//! with data drawn from the workflow's runtime parameter mapping.
//!
//! ## Template Syntax
//!
//! - `${{ name }}` - top-level runtime parameter
//! - `${{ user.profile.email }}` - nested object field
//! - `${{ items[0].id }}` or `${{ items.0.id }}` - array element
//! - `${{ $.user.id }}` - the same paths with a JSONPath-style root prefix
//!
//! A string that consists of a single placeholder resolves to the referenced
//! value with its JSON type intact (a missing reference becomes `null`).
//! Placeholders embedded in longer strings are rendered as text.
//!
//! ## Usage
//!
//! ```rust
//! use stepcall_engine::resolve::interpolate_value;
//! use serde_json::json;
//!
//! let mut params = serde_json::Map::new();
//! params.insert("app".into(), json!({"name": "myapp", "replicas": 3}));
//!
//! let value = json!({
//!     "name": "${{ app.name }}",
//!     "replicas": "${{ app.replicas }}",
//!     "label": "deploy ${{ app.name }} x${{ app.replicas }}"
//! });
//!
//! let interpolated = interpolate_value(&value, &params);
//! assert_eq!(interpolated["name"], "myapp");
//! assert_eq!(interpolated["replicas"], 3);
//! assert_eq!(interpolated["label"], "deploy myapp x3");
//! ```

use serde_json::Value;
use stepcall_types::RuntimeParams;

use crate::error::TemplateError;

/// Opening placeholder delimiter.
pub const TEMPLATE_START: &str = "${{";
/// Closing placeholder delimiter.
pub const TEMPLATE_END: &str = "}}";

/// Substitutes runtime values into a template-bearing JSON value.
///
/// Implementations must tolerate a `null` template (returning `null`) and must
/// leave a value without placeholders unchanged.
pub trait TemplateResolver: Send + Sync {
    /// Return a copy of `template` with every placeholder replaced using `source`.
    fn resolve(&self, source: &RuntimeParams, template: &Value) -> Result<Value, TemplateError>;
}

/// Default [`TemplateResolver`] implementing the `${{ ... }}` syntax.
#[derive(Debug, Default, Clone, Copy)]
pub struct InterpolatingResolver;

impl TemplateResolver for InterpolatingResolver {
    fn resolve(&self, source: &RuntimeParams, template: &Value) -> Result<Value, TemplateError> {
        Ok(interpolate_value(template, source))
    }
}

/// Recursively interpolates all template expressions in a JSON value.
///
/// Strings are resolved, arrays and objects are walked recursively (object keys
/// are left as-is), and every other value is returned unchanged.
pub fn interpolate_value(value: &Value, params: &RuntimeParams) -> Value {
    match value {
        Value::String(string_value) => interpolate_string_value(string_value, params),
        Value::Array(array_values) => Value::Array(
            array_values
                .iter()
                .map(|array_value| interpolate_value(array_value, params))
                .collect(),
        ),
        Value::Object(object_map) => {
            let mut interpolated_map = serde_json::Map::new();
            for (key, value) in object_map.iter() {
                interpolated_map.insert(key.clone(), interpolate_value(value, params));
            }
            Value::Object(interpolated_map)
        }
        _ => value.clone(),
    }
}

/// Interpolates template expressions in a string, always producing text.
///
/// Missing references render as an empty string. A malformed template (an
/// opening `${{` without a closing `}}`) is preserved verbatim together with
/// the rest of the input.
pub fn interpolate_string(input_string: &str, params: &RuntimeParams) -> String {
    let mut output_string = String::with_capacity(input_string.len());
    let mut remaining_string = input_string;

    while let Some(template_start) = remaining_string.find(TEMPLATE_START) {
        let (string_before_template, string_after_template) = remaining_string.split_at(template_start);
        output_string.push_str(string_before_template);

        let Some(template_end_index) = string_after_template.find(TEMPLATE_END) else {
            output_string.push_str(string_after_template);
            return output_string;
        };

        let template_expression = &string_after_template[TEMPLATE_START.len()..template_end_index];
        if let Some(resolved_value) = resolve_value(template_expression, params) {
            output_string.push_str(&format_json_value(&resolved_value));
        }
        remaining_string = &string_after_template[template_end_index + TEMPLATE_END.len()..];
    }

    output_string.push_str(remaining_string);
    output_string
}

/// Resolves a template expression to the JSON value it references.
///
/// Returns `None` when the expression is empty, malformed, or points at
/// something absent from `params`. An explicit `null` in `params` resolves to
/// `Some(Value::Null)`.
pub fn resolve_value(expression: &str, params: &RuntimeParams) -> Option<Value> {
    let trimmed = expression.trim();
    let path = trimmed.strip_prefix("$.").unwrap_or(trimmed);
    let segments = parse_path(path)?;
    let (first, rest) = segments.split_first()?;

    let PathSegment::Key(root_key) = first else {
        return None;
    };
    let mut current = params.get(root_key.as_str())?;
    for segment in rest {
        current = step_into(current, segment)?;
    }
    Some(current.clone())
}

/// Formats a JSON value as text for string interpolation and query strings.
///
/// - **Strings**: returned as-is
/// - **Numbers** and **booleans**: their JSON literal
/// - **Null**: empty string
/// - **Objects/Arrays**: compact JSON
pub fn format_json_value(value: &Value) -> String {
    match value {
        Value::String(string_value) => string_value.clone(),
        Value::Number(number_value) => number_value.to_string(),
        Value::Bool(boolean_value) => boolean_value.to_string(),
        Value::Null => String::new(),
        other_value => other_value.to_string(),
    }
}

fn interpolate_string_value(input_string: &str, params: &RuntimeParams) -> Value {
    if let Some(expression) = sole_expression(input_string) {
        return resolve_value(expression, params).unwrap_or(Value::Null);
    }
    Value::String(interpolate_string(input_string, params))
}

/// Returns the inner expression when `input` is exactly one placeholder.
fn sole_expression(input: &str) -> Option<&str> {
    let inner = input.trim().strip_prefix(TEMPLATE_START)?.strip_suffix(TEMPLATE_END)?;
    if inner.contains(TEMPLATE_START) || inner.contains(TEMPLATE_END) {
        return None;
    }
    Some(inner)
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PathSegment {
    Key(String),
    Index(usize),
}

/// Splits `a.b[0].c` into key and index segments.
fn parse_path(path: &str) -> Option<Vec<PathSegment>> {
    if path.is_empty() {
        return None;
    }

    let mut segments = Vec::new();
    for dotted in path.split('.') {
        if dotted.is_empty() {
            return None;
        }
        let key_end = dotted.find('[').unwrap_or(dotted.len());
        let key = dotted[..key_end].trim();
        if !key.is_empty() {
            segments.push(PathSegment::Key(key.to_string()));
        }

        let mut brackets = &dotted[key_end..];
        while !brackets.is_empty() {
            let inner_end = brackets.find(']')?;
            let index = brackets.get(1..inner_end)?.trim().parse::<usize>().ok()?;
            segments.push(PathSegment::Index(index));
            brackets = &brackets[inner_end + 1..];
            if !brackets.is_empty() && !brackets.starts_with('[') {
                return None;
            }
        }
    }
    Some(segments)
}

fn step_into<'a>(current: &'a Value, segment: &PathSegment) -> Option<&'a Value> {
    match (current, segment) {
        (Value::Object(map), PathSegment::Key(key)) => map.get(key.as_str()),
        (Value::Array(items), PathSegment::Key(key)) => key.parse::<usize>().ok().and_then(|index| items.get(index)),
        (Value::Array(items), PathSegment::Index(index)) => items.get(*index),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> RuntimeParams {
        value.as_object().cloned().expect("object params")
    }

    #[test]
    fn test_interpolate_nested_values() {
        let context = params(json!({
            "app": "myapp",
            "create": {"id": "app-123", "tags": ["a", "b"]}
        }));

        let value = json!({
            "name": "${{ app }}",
            "ref": "${{ create.id }}",
            "nested": {"tag": "${{ create.tags[1] }}"},
            "list": ["${{ create.tags.0 }}", 7, null]
        });

        let result = interpolate_value(&value, &context);

        assert_eq!(result["name"], "myapp");
        assert_eq!(result["ref"], "app-123");
        assert_eq!(result["nested"]["tag"], "b");
        assert_eq!(result["list"], json!(["a", 7, null]));
    }

    #[test]
    fn test_sole_placeholder_keeps_json_type() {
        let context = params(json!({"count": 3, "flags": {"on": true}, "items": [1, 2]}));

        assert_eq!(interpolate_value(&json!("${{ count }}"), &context), json!(3));
        assert_eq!(interpolate_value(&json!("${{flags.on}}"), &context), json!(true));
        assert_eq!(interpolate_value(&json!("${{ items }}"), &context), json!([1, 2]));
        assert_eq!(interpolate_value(&json!("${{ $.count }}"), &context), json!(3));
    }

    #[test]
    fn test_missing_sole_placeholder_becomes_null() {
        let context = RuntimeParams::new();
        assert_eq!(interpolate_value(&json!("${{ absent }}"), &context), Value::Null);
        assert_eq!(interpolate_value(&json!("${{ }}"), &context), Value::Null);
    }

    #[test]
    fn test_interpolate_string_complex() {
        let context = params(json!({"env": "prod", "app": "myapp", "port": 8080}));

        let input = "Deploy ${{ app }} to ${{ env }} on :${{ port }}";
        assert_eq!(interpolate_string(input, &context), "Deploy myapp to prod on :8080");
    }

    #[test]
    fn test_interpolate_string_missing_reference_renders_empty() {
        let context = RuntimeParams::new();
        assert_eq!(interpolate_string("${{ missing }}/items", &context), "/items");
    }

    #[test]
    fn test_interpolate_string_malformed() {
        let context = params(json!({"name": "x"}));

        let input = "Value: ${{ name";
        assert_eq!(interpolate_string(input, &context), "Value: ${{ name");
    }

    #[test]
    fn test_resolution_is_a_fixed_point_without_placeholders() {
        let context = params(json!({"id": 5}));
        let template = json!({"url": "https://x/${{ id }}", "n": "${{ id }}", "keep": [true, 1.5, "plain"]});

        let once = interpolate_value(&template, &context);
        let twice = interpolate_value(&once, &context);
        assert_eq!(once, twice);
        assert_eq!(once, json!({"url": "https://x/5", "n": 5, "keep": [true, 1.5, "plain"]}));
    }

    #[test]
    fn test_null_template_resolves_to_null() {
        let resolved = InterpolatingResolver.resolve(&RuntimeParams::new(), &Value::Null).expect("resolve");
        assert_eq!(resolved, Value::Null);
    }

    #[test]
    fn test_resolve_value_distinguishes_null_from_missing() {
        let context = params(json!({"present": null, "list": [{"id": 1}]}));
        assert_eq!(resolve_value("present", &context), Some(Value::Null));
        assert_eq!(resolve_value("absent", &context), None);
        assert_eq!(resolve_value("list[0].id", &context), Some(json!(1)));
        assert_eq!(resolve_value("list[3].id", &context), None);
        assert_eq!(resolve_value("list[x]", &context), None);
        assert_eq!(resolve_value("list..id", &context), None);
    }

    #[test]
    fn test_format_json_value_types() {
        assert_eq!(format_json_value(&json!("hello")), "hello");
        assert_eq!(format_json_value(&json!(42)), "42");
        assert_eq!(format_json_value(&json!(true)), "true");
        assert_eq!(format_json_value(&json!(null)), "");
        assert_eq!(format_json_value(&json!({"key": "value"})), r#"{"key":"value"}"#);
    }
}
