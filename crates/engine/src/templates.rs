//! Placeholder extraction and unresolved-reference diagnostics.

use serde_json::Value;
use stepcall_types::RuntimeParams;

use crate::resolve::{TEMPLATE_END, TEMPLATE_START, resolve_value};

/// Structured unresolved template reference diagnostic.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct UnresolvedTemplateRef {
    /// Location of the template inside the step input, e.g. `body.user[0].name`.
    pub source_path: String,
    /// Raw template expression without delimiters.
    pub expression: String,
}

/// Extracts template expressions from a string value.
///
/// Returned expressions do not include `${{` or `}}` delimiters.
pub fn extract_template_expressions(value: &str) -> Vec<String> {
    let mut expressions = Vec::new();
    let mut remainder = value;

    while let Some(start) = remainder.find(TEMPLATE_START) {
        let after_start = &remainder[start + TEMPLATE_START.len()..];
        let Some(end) = after_start.find(TEMPLATE_END) else {
            break;
        };
        let expression = after_start[..end].trim();
        if !expression.is_empty() {
            expressions.push(expression.to_string());
        }
        remainder = &after_start[end + TEMPLATE_END.len()..];
    }

    expressions
}

/// Collect template references in `value` that `params` cannot satisfy.
pub fn collect_unresolved_templates_from_value(
    value: &Value,
    source_path: &str,
    params: &RuntimeParams,
    unresolved: &mut Vec<UnresolvedTemplateRef>,
) {
    match value {
        Value::String(raw_text) => {
            for expression in extract_template_expressions(raw_text) {
                if resolve_value(expression.as_str(), params).is_none() {
                    unresolved.push(UnresolvedTemplateRef {
                        source_path: source_path.to_string(),
                        expression,
                    });
                }
            }
        }
        Value::Array(values) => {
            for (index, nested_value) in values.iter().enumerate() {
                collect_unresolved_templates_from_value(nested_value, format!("{source_path}[{index}]").as_str(), params, unresolved);
            }
        }
        Value::Object(map) => {
            for (key, nested_value) in map {
                collect_unresolved_templates_from_value(nested_value, format!("{source_path}.{key}").as_str(), params, unresolved);
            }
        }
        _ => {}
    }
}
