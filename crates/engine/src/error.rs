//! Error types surfaced by the HTTP step.

use std::error::Error as StdError;
use std::io;

use thiserror::Error;

/// Failure of one HTTP step invocation.
#[derive(Debug, Error)]
pub enum StepError {
    /// The request could not be delivered or its response could not be received.
    #[error("http call to {url} failed: {source}")]
    Transport {
        /// Redacted target URL.
        url: String,
        #[source]
        source: TransportError,
    },
    /// The resolved input does not describe a sendable request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// The templating collaborator failed; its error is passed through untouched.
    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// Low-level transport failure (connection refused, timeout, I/O error).
///
/// The original cause is kept as the error source.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl TransportError {
    /// Create a transport error wrapping `source`.
    pub fn with_source<E>(message: impl Into<String>, source: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync + 'static>>,
    {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Human readable summary without the source chain.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<io::Error> for TransportError {
    fn from(error: io::Error) -> Self {
        Self::with_source("I/O error", error)
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        let message = if error.is_timeout() {
            "request timed out"
        } else if error.is_connect() {
            "connection failed"
        } else if error.is_body() || error.is_decode() {
            "failed to read response"
        } else {
            "request failed"
        };
        Self::with_source(message, error)
    }
}

/// Failure raised by a templating collaborator.
#[derive(Debug, Error)]
#[error("template resolution failed: {message}")]
pub struct TemplateError {
    message: String,
}

impl TemplateError {
    /// Create a template error with a descriptive message.
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}
