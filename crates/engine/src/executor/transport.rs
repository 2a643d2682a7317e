//! The seam between the executor and the network.

use indexmap::IndexMap;
use reqwest::{Method, header::HeaderMap};
use stepcall_api::StepClient;
use stepcall_util::{block_on, header_multimap};
use tracing::warn;
use url::Url;

use crate::error::TransportError;

/// Sends one fully built request and buffers the complete response.
///
/// Implementations must not retry and must not interpret the status code.
pub trait HttpTransport: Send + Sync {
    /// Deliver `request` and wait for status, headers and body.
    fn send(&self, request: HttpRequest) -> Result<RawResponse, TransportError>;
}

/// A validated request ready for dispatch.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    /// Outgoing headers, `Content-Type` included when a body is attached.
    pub headers: HeaderMap,
    /// Serialized JSON payload. `None` for `GET`.
    pub body: Option<String>,
}

/// Response as received, before body normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub headers: IndexMap<String, Vec<String>>,
    /// Body text, or `None` when no text could be obtained.
    pub body: Option<String>,
}

/// [`HttpTransport`] backed by a pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: StepClient,
}

impl ReqwestTransport {
    pub fn new(client: StepClient) -> Self {
        Self { client }
    }
}

impl HttpTransport for ReqwestTransport {
    fn send(&self, request: HttpRequest) -> Result<RawResponse, TransportError> {
        let HttpRequest { method, url, headers, body } = request;

        let mut builder = self.client.request(method, url).headers(headers);
        if let Some(payload) = body {
            builder = builder.body(payload);
        }

        block_on(async move {
            let response = builder.send().await?;
            let status = response.status().as_u16();
            let headers = header_multimap(response.headers());
            let body = match response.text().await {
                Ok(text) => Some(text),
                Err(error) => {
                    warn!(status, error = %error, "could not read response body; treating it as empty");
                    None
                }
            };
            Ok::<RawResponse, TransportError>(RawResponse { status, headers, body })
        })
    }
}
