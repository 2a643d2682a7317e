//! # Stepcall Engine
//!
//! The HTTP step of a workflow engine. A step is described declaratively by a
//! [`StepInput`]; at run time its `${{ ... }}` placeholders are resolved against
//! the workflow's runtime parameters, exactly one HTTP request is sent, and the
//! response is normalized into a [`StepResponse`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use stepcall_engine::{HttpStep, parse_step_file};
//!
//! let step_file = parse_step_file("steps/get-user.yaml")?;
//! let step = HttpStep::from_env()?;
//! let response = step.run(&step_file.step, &step_file.params)?;
//! println!("{} {:?}", response.status, response.body);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - **`input`**: turns a templated step input into a literal request description
//! - **`resolve`**: the default `${{ ... }}` templating collaborator
//! - **`templates`**: placeholder extraction and unresolved-reference diagnostics
//! - **`executor`**: request construction, transport, and response normalization
//! - **`step`**: resolution and execution composed into one operation

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;

pub mod error;
pub mod executor;
pub mod input;
pub mod resolve;
pub mod step;
pub mod templates;

pub use error::{StepError, TemplateError, TransportError};
pub use executor::{HttpRequest, HttpTransport, RawResponse, ReqwestTransport, RequestExecutor, normalize_body};
pub use input::InputResolver;
pub use resolve::{InterpolatingResolver, TemplateResolver};
pub use step::HttpStep;
pub use stepcall_types::{ResolvedStepInput, ResponseBody, RuntimeParams, StepInput, StepResponse};

/// A step definition loaded from disk together with its default parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct StepFile {
    pub step: StepInput,
    /// Parameter defaults shipped with the step; empty for a bare definition.
    pub params: RuntimeParams,
}

/// Loads a step definition file (YAML or JSON).
///
/// Two layouts are accepted:
/// - a bare step input (`url`, `method`, `headers`, `param`, `body`, `accept`)
/// - a document with the step under `step` and parameter defaults under `params`
///
/// # Examples
///
/// ```rust
/// use stepcall_engine::parse_step_file;
///
/// let temp_dir = tempfile::tempdir()?;
/// let step_path = temp_dir.path().join("user.yaml");
/// std::fs::write(&step_path, r#"
/// step:
///   url: "https://api.example.com/users/${{ user_id }}"
/// params:
///   user_id: 42
/// "#)?;
///
/// let step_file = parse_step_file(&step_path)?;
/// assert_eq!(step_file.step.method, "GET");
/// assert_eq!(step_file.params["user_id"], 42);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn parse_step_file(file_path: impl AsRef<Path>) -> Result<StepFile> {
    let file_path = file_path.as_ref();
    let file_content = fs::read(file_path).with_context(|| format!("Failed to read step file: {}", file_path.display()))?;
    let content_string = String::from_utf8_lossy(&file_content);

    // A bare step never carries a `step` key, so the wrapped layout is tried first.
    #[derive(Deserialize)]
    struct WrappedStepDocument {
        step: StepInput,
        #[serde(default)]
        params: RuntimeParams,
    }

    if let Ok(document) = serde_yaml::from_str::<WrappedStepDocument>(&content_string) {
        return Ok(StepFile {
            step: document.step,
            params: document.params,
        });
    }

    let step = serde_yaml::from_str::<StepInput>(&content_string).with_context(|| {
        format!(
            "Unsupported step document format in {}. Expected a step with a 'url' field, or 'step' and 'params' keys",
            file_path.display()
        )
    })?;
    Ok(StepFile {
        step,
        params: RuntimeParams::new(),
    })
}

/// Loads a runtime parameter mapping (YAML or JSON object). An empty file is an empty mapping.
pub fn parse_runtime_params_file(file_path: impl AsRef<Path>) -> Result<RuntimeParams> {
    let file_path = file_path.as_ref();
    let content_string =
        fs::read_to_string(file_path).with_context(|| format!("Failed to read parameter file: {}", file_path.display()))?;
    if content_string.trim().is_empty() {
        return Ok(RuntimeParams::new());
    }

    serde_yaml::from_str::<RuntimeParams>(&content_string)
        .with_context(|| format!("Parameter file {} must contain a mapping", file_path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(contents: &str, suffix: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write temp file");
        file
    }

    #[test]
    fn parses_bare_yaml_step() {
        let file = write_temp(
            r#"
url: "https://api.example.com/items"
method: post
headers:
  Authorization: "Bearer ${{ token }}"
param:
  page: 2
  filter: "${{ filter }}"
body:
  name: widget
"#,
            ".yaml",
        );

        let step_file = parse_step_file(file.path()).expect("parse step");
        assert_eq!(step_file.step.method, "post");
        assert_eq!(step_file.step.headers["Authorization"], "Bearer ${{ token }}");
        let param_names: Vec<&str> = step_file.step.param.keys().map(String::as_str).collect();
        assert_eq!(param_names, vec!["page", "filter"]);
        assert_eq!(step_file.step.body, json!({"name": "widget"}));
        assert!(step_file.params.is_empty());
    }

    #[test]
    fn parses_wrapped_json_step_with_params() {
        let file = write_temp(
            r#"{"step": {"url": "http://localhost/${{ id }}", "accept": "text/plain"}, "params": {"id": 7, "tags": ["a"]}}"#,
            ".json",
        );

        let step_file = parse_step_file(file.path()).expect("parse step");
        assert_eq!(step_file.step.url, "http://localhost/${{ id }}");
        assert_eq!(step_file.step.accept, "text/plain");
        assert_eq!(step_file.params["id"], json!(7));
        assert_eq!(step_file.params["tags"], json!(["a"]));
    }

    #[test]
    fn rejects_documents_without_a_url() {
        let file = write_temp("method: GET\n", ".yaml");
        let error = parse_step_file(file.path()).expect_err("missing url");
        assert!(error.to_string().contains("Unsupported step document format"), "unexpected error: {error}");
    }

    #[test]
    fn missing_step_file_reports_path() {
        let error = parse_step_file("/definitely/not/here.yaml").expect_err("missing file");
        assert!(error.to_string().contains("/definitely/not/here.yaml"));
    }

    #[test]
    fn parses_params_file() {
        let file = write_temp("user:\n  id: 5\nverbose: true\n", ".yaml");
        let params = parse_runtime_params_file(file.path()).expect("parse params");
        assert_eq!(params["user"], json!({"id": 5}));
        assert_eq!(params["verbose"], json!(true));

        let empty = write_temp("  \n", ".yaml");
        assert!(parse_runtime_params_file(empty.path()).expect("empty params").is_empty());

        let list = write_temp("- 1\n- 2\n", ".yaml");
        assert!(parse_runtime_params_file(list.path()).is_err());
    }
}
