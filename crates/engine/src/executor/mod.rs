//! Request execution: turns a [`ResolvedStepInput`] into exactly one HTTP call
//! and the call's response into a [`StepResponse`].
//!
//! - [`build_request`] validates the resolved input and prepares headers and payload
//! - [`transport::HttpTransport`] abstracts how the request reaches the network
//! - [`normalize::normalize_body`] reduces the payload to a [`ResponseBody`](stepcall_types::ResponseBody)
//!
//! Any status code is a successful execution; only transport failures and
//! unsendable inputs are errors.

pub mod normalize;
pub mod transport;

use std::sync::Arc;

use reqwest::{
    Method,
    header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue},
};
use stepcall_api::{ClientConfigError, StepClient, validate_url};
use stepcall_types::{ResolvedStepInput, StepResponse};
use stepcall_util::redact_sensitive;
use tracing::debug;

use crate::error::StepError;
pub use normalize::normalize_body;
pub use transport::{HttpRequest, HttpTransport, RawResponse, ReqwestTransport};

/// Performs one HTTP call per [`execute`](RequestExecutor::execute).
///
/// Holds no per-call state, so a single executor may be shared between
/// concurrent steps.
#[derive(Clone)]
pub struct RequestExecutor {
    transport: Arc<dyn HttpTransport>,
}

impl RequestExecutor {
    /// Executor over a `reqwest` client configured from the environment.
    pub fn from_env() -> Result<Self, ClientConfigError> {
        Ok(Self::new(StepClient::new_from_env()?))
    }

    /// Executor over an explicit client.
    pub fn new(client: StepClient) -> Self {
        Self::with_transport(Arc::new(ReqwestTransport::new(client)))
    }

    /// Executor over a custom transport.
    pub fn with_transport(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// Send the request described by `input` and normalize the response.
    pub fn execute(&self, input: &ResolvedStepInput) -> Result<StepResponse, StepError> {
        let request = build_request(input)?;
        let redacted_url = redact_sensitive(request.url.as_str());
        debug!(
            method = %request.method,
            url = %redacted_url,
            header_count = request.headers.len(),
            has_body = request.body.is_some(),
            "sending http step request"
        );

        let raw = self.transport.send(request).map_err(|source| StepError::Transport {
            url: redacted_url.clone(),
            source,
        })?;

        let body = normalize_body(raw.body.as_deref());
        debug!(
            url = %redacted_url,
            status = raw.status,
            header_count = raw.headers.len(),
            "received http step response"
        );
        Ok(StepResponse {
            status: raw.status,
            body,
            headers: raw.headers,
        })
    }
}

/// Validate `input` and build the request the transport will send.
///
/// Headers are applied in declaration order with later names replacing earlier
/// ones (names compare case-insensitively). Every method except `GET` carries
/// the body serialized as JSON and tagged with `accept` as its `Content-Type`.
pub fn build_request(input: &ResolvedStepInput) -> Result<HttpRequest, StepError> {
    let url = validate_url(input.url.trim()).map_err(|error| StepError::InvalidRequest(redact_sensitive(&error.to_string())))?;

    let method_token = input.method.trim().to_ascii_uppercase();
    if method_token.is_empty() {
        return Err(StepError::InvalidRequest("missing HTTP method".to_string()));
    }
    let method = Method::from_bytes(method_token.as_bytes())
        .map_err(|_| StepError::InvalidRequest(format!("invalid HTTP method '{}'", input.method)))?;

    let mut headers = HeaderMap::with_capacity(input.headers.len() + 1);
    for (name, value) in &input.headers {
        let header_name = HeaderName::from_bytes(name.trim().as_bytes())
            .map_err(|_| StepError::InvalidRequest(format!("invalid header name '{name}'")))?;
        let header_value =
            HeaderValue::from_str(value).map_err(|_| StepError::InvalidRequest(format!("invalid value for header '{name}'")))?;
        headers.insert(header_name, header_value);
    }

    if method == Method::GET {
        return Ok(HttpRequest {
            method,
            url,
            headers,
            body: None,
        });
    }

    let content_type = input.accept.trim();
    if !content_type.is_empty() {
        let value = HeaderValue::from_str(content_type)
            .map_err(|_| StepError::InvalidRequest(format!("invalid content type '{content_type}'")))?;
        headers.insert(CONTENT_TYPE, value);
    }
    let payload = serde_json::to_string(&input.body)
        .map_err(|error| StepError::InvalidRequest(format!("could not serialize request body: {error}")))?;

    Ok(HttpRequest {
        method,
        url,
        headers,
        body: Some(payload),
    })
}
