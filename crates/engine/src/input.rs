//! Input resolution for the HTTP step.
//!
//! [`InputResolver`] turns the declarative, template-bearing [`StepInput`] into
//! a literal [`ResolvedStepInput`]:
//!
//! - the URL is resolved and the resolved query parameters are appended
//! - header values are resolved
//! - the body is resolved with its structure preserved
//!
//! Resolution is pure: no I/O happens here and the input is never mutated.

use std::sync::Arc;

use indexmap::IndexMap;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde_json::Value;
use stepcall_types::{ResolvedStepInput, RuntimeParams, StepInput};
use stepcall_util::redact_sensitive;
use tracing::{debug, warn};

use crate::{
    error::StepError,
    resolve::{InterpolatingResolver, TemplateResolver, format_json_value},
    templates::{UnresolvedTemplateRef, collect_unresolved_templates_from_value},
};

/// Characters escaped inside a query-string key or value.
const QUERY_COMPONENT_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'<')
    .add(b'=')
    .add(b'>');

/// Resolves step inputs against the workflow's runtime parameters.
#[derive(Clone)]
pub struct InputResolver {
    templates: Arc<dyn TemplateResolver>,
}

impl Default for InputResolver {
    fn default() -> Self {
        Self::new(Arc::new(InterpolatingResolver))
    }
}

impl InputResolver {
    /// Create a resolver backed by the given templating collaborator.
    pub fn new(templates: Arc<dyn TemplateResolver>) -> Self {
        Self { templates }
    }

    /// Resolve `input` against `params`.
    ///
    /// Query parameters whose resolved value is `null` are omitted. When no
    /// parameter survives, the URL is left untouched. Templating failures are
    /// returned as [`StepError::Template`] without modification.
    ///
    /// ```rust
    /// use serde_json::json;
    /// use stepcall_engine::InputResolver;
    /// use stepcall_types::StepInput;
    ///
    /// let mut input = StepInput::get("https://api.example.com/users/${{ user }}");
    /// input.param.insert("expand".into(), json!("${{ expand }}"));
    /// input.param.insert("page".into(), json!(2));
    ///
    /// let params = json!({"user": "u-1", "expand": null}).as_object().cloned().unwrap();
    /// let resolved = InputResolver::default().resolve(&input, &params).unwrap();
    /// assert_eq!(resolved.url, "https://api.example.com/users/u-1?page=2");
    /// ```
    pub fn resolve(&self, input: &StepInput, params: &RuntimeParams) -> Result<ResolvedStepInput, StepError> {
        report_unresolved_templates(input, params);

        let base_url = self.resolve_text(&input.url, params)?;

        let mut query = IndexMap::with_capacity(input.param.len());
        for (name, template) in &input.param {
            query.insert(name.clone(), self.templates.resolve(params, template)?);
        }
        let query_string = build_query_string(&query);
        let url = append_query_string(&base_url, query_string.as_deref());

        let mut headers = IndexMap::with_capacity(input.headers.len());
        for (name, template) in &input.headers {
            headers.insert(name.clone(), self.resolve_text(template, params)?);
        }

        let body = self.templates.resolve(params, &input.body)?;

        debug!(
            url = %redact_sensitive(&url),
            query_params = query.len(),
            header_count = headers.len(),
            has_body = !body.is_null(),
            "resolved step input"
        );

        Ok(ResolvedStepInput {
            url,
            method: input.method.trim().to_ascii_uppercase(),
            headers,
            body,
            accept: input.accept.clone(),
        })
    }

    fn resolve_text(&self, template: &str, params: &RuntimeParams) -> Result<String, StepError> {
        let resolved = self.templates.resolve(params, &Value::String(template.to_string()))?;
        Ok(format_json_value(&resolved))
    }
}

/// Build `key=value` pairs joined by `&`, skipping `null` values.
///
/// Returns `None` when no pair remains. Keys and values are percent-encoded.
///
/// ```rust
/// use indexmap::IndexMap;
/// use serde_json::json;
/// use stepcall_engine::input::build_query_string;
///
/// let mut query = IndexMap::new();
/// query.insert("a".to_string(), json!(1));
/// query.insert("b".to_string(), json!(null));
/// query.insert("c".to_string(), json!("x"));
/// assert_eq!(build_query_string(&query).as_deref(), Some("a=1&c=x"));
/// ```
pub fn build_query_string(query: &IndexMap<String, Value>) -> Option<String> {
    let pairs: Vec<String> = query
        .iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(name, value)| format!("{}={}", encode_query_component(name), encode_query_component(&format_json_value(value))))
        .collect();

    if pairs.is_empty() { None } else { Some(pairs.join("&")) }
}

/// Append `query` to `url`, respecting an existing query string and fragment.
pub fn append_query_string(url: &str, query: Option<&str>) -> String {
    let Some(query) = query else {
        return url.to_string();
    };

    let (base, fragment) = match url.find('#') {
        Some(index) => url.split_at(index),
        None => (url, ""),
    };
    let separator = if !base.contains('?') {
        "?"
    } else if base.ends_with('?') || base.ends_with('&') {
        ""
    } else {
        "&"
    };

    format!("{base}{separator}{query}{fragment}")
}

fn encode_query_component(raw: &str) -> String {
    utf8_percent_encode(raw, QUERY_COMPONENT_ENCODE_SET).to_string()
}

fn report_unresolved_templates(input: &StepInput, params: &RuntimeParams) {
    let mut unresolved: Vec<UnresolvedTemplateRef> = Vec::new();
    collect_unresolved_templates_from_value(&Value::String(input.url.clone()), "url", params, &mut unresolved);
    for (name, template) in &input.param {
        collect_unresolved_templates_from_value(template, &format!("param.{name}"), params, &mut unresolved);
    }
    for (name, template) in &input.headers {
        collect_unresolved_templates_from_value(&Value::String(template.clone()), &format!("headers.{name}"), params, &mut unresolved);
    }
    collect_unresolved_templates_from_value(&input.body, "body", params, &mut unresolved);

    for reference in unresolved {
        warn!(
            source = %reference.source_path,
            expression = %reference.expression,
            "template references a value missing from the runtime parameters"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TemplateError;
    use serde_json::json;

    fn params(value: Value) -> RuntimeParams {
        value.as_object().cloned().expect("object params")
    }

    fn input_with_params(url: &str, query: Value) -> StepInput {
        let mut input = StepInput::get(url);
        for (name, value) in query.as_object().cloned().unwrap_or_default() {
            input.param.insert(name, value);
        }
        input
    }

    #[test]
    fn query_string_skips_null_entries_without_trailing_separator() {
        let mut input = StepInput::get("http://localhost/search");
        input.param.insert("a".into(), json!(1));
        input.param.insert("b".into(), Value::Null);
        input.param.insert("c".into(), json!("x"));

        let resolved = InputResolver::default().resolve(&input, &RuntimeParams::new()).expect("resolve");
        assert_eq!(resolved.url, "http://localhost/search?a=1&c=x");
    }

    #[test]
    fn query_string_keeps_declaration_order() {
        let mut input = StepInput::get("http://localhost/");
        input.param.insert("zeta".into(), json!("z"));
        input.param.insert("alpha".into(), json!("a"));

        let resolved = InputResolver::default().resolve(&input, &RuntimeParams::new()).expect("resolve");
        assert_eq!(resolved.url, "http://localhost/?zeta=z&alpha=a");
    }

    #[test]
    fn resolves_url_params_headers_and_body() {
        let mut input = input_with_params(
            "https://api.example.com/items/${{ item.id }}",
            json!({"q": "${{ query }}", "missing": "${{ nope }}"}),
        );
        input.method = "post".into();
        input.headers.insert("Authorization".into(), "Bearer ${{ token }}".into());
        input.body = json!({"id": "${{ item.id }}", "tags": ["${{ item.tag }}", "static"]});

        let context = params(json!({
            "item": {"id": 42, "tag": "blue"},
            "query": "rust lang",
            "token": "t0k"
        }));
        let resolved = InputResolver::default().resolve(&input, &context).expect("resolve");

        assert_eq!(resolved.url, "https://api.example.com/items/42?q=rust%20lang");
        assert_eq!(resolved.method, "POST");
        assert_eq!(resolved.headers["Authorization"], "Bearer t0k");
        assert_eq!(resolved.body, json!({"id": 42, "tags": ["blue", "static"]}));
        assert_eq!(resolved.accept, "application/json");
    }

    #[test]
    fn url_is_untouched_without_surviving_params() {
        let empty = StepInput::get("http://localhost/a");
        let all_null = input_with_params("http://localhost/a", json!({"x": null, "y": "${{ absent }}"}));

        let resolver = InputResolver::default();
        assert_eq!(resolver.resolve(&empty, &RuntimeParams::new()).unwrap().url, "http://localhost/a");
        assert_eq!(resolver.resolve(&all_null, &RuntimeParams::new()).unwrap().url, "http://localhost/a");
    }

    #[test]
    fn query_values_are_percent_encoded() {
        let input = input_with_params("http://localhost/", json!({"filter": "a&b=c", "list": [1, 2], "on": true}));

        let resolved = InputResolver::default().resolve(&input, &RuntimeParams::new()).expect("resolve");
        assert_eq!(resolved.url, "http://localhost/?filter=a%26b%3Dc&list=[1,2]&on=true");
    }

    #[test]
    fn append_query_string_respects_existing_query_and_fragment() {
        assert_eq!(append_query_string("http://h/p?x=1", Some("a=1")), "http://h/p?x=1&a=1");
        assert_eq!(append_query_string("http://h/p?", Some("a=1")), "http://h/p?a=1");
        assert_eq!(append_query_string("http://h/p#top", Some("a=1")), "http://h/p?a=1#top");
        assert_eq!(append_query_string("http://h/p", None), "http://h/p");
    }

    #[test]
    fn resolving_a_resolved_input_is_a_no_op() {
        let mut input = input_with_params("http://localhost/users/${{ id }}", json!({"page": "${{ page }}"}));
        input.body = json!({"id": "${{ id }}"});
        let context = params(json!({"id": 7, "page": 3}));

        let resolver = InputResolver::default();
        let first = resolver.resolve(&input, &context).expect("first");

        let again = StepInput {
            url: first.url.clone(),
            method: first.method.clone(),
            headers: first.headers.clone(),
            param: IndexMap::new(),
            body: first.body.clone(),
            accept: first.accept.clone(),
        };
        let second = resolver.resolve(&again, &context).expect("second");
        assert_eq!(first, second);
    }

    #[test]
    fn resolve_leaves_the_input_untouched() {
        let input = input_with_params("http://localhost/${{ id }}", json!({"a": "${{ id }}"}));
        let snapshot = input.clone();

        InputResolver::default().resolve(&input, &params(json!({"id": 1}))).expect("resolve");
        assert_eq!(input, snapshot);
    }

    struct FailingResolver;

    impl TemplateResolver for FailingResolver {
        fn resolve(&self, _source: &RuntimeParams, template: &Value) -> Result<Value, TemplateError> {
            if template.is_object() {
                return Err(TemplateError::new("cannot resolve objects"));
            }
            Ok(template.clone())
        }
    }

    #[test]
    fn template_failures_propagate_unchanged() {
        let mut input = StepInput::get("http://localhost/");
        input.body = json!({"a": 1});

        let resolver = InputResolver::new(Arc::new(FailingResolver));
        let error = resolver.resolve(&input, &RuntimeParams::new()).expect_err("should fail");
        assert!(matches!(error, StepError::Template(_)));
        assert_eq!(error.to_string(), "template resolution failed: cannot resolve objects");
    }
}
