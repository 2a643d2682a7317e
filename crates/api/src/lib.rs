//! Stepcall HTTP client utilities.
//!
//! This module provides the configured HTTP client used by the HTTP step.
//! It focuses on:
//!
//! - Reading transport settings (timeouts, User-Agent) from the environment
//! - Constructing a `reqwest::Client` from those settings
//! - Validating request URLs before anything is sent
//!
//! The primary entry point is [`StepClient`]. Create an instance via
//! [`StepClient::new_from_env`] or [`StepClient::new`], and then build
//! requests with [`StepClient::request`].
//!
//! # Example
//!
//! ```ignore
//! use stepcall_api::{StepClient, validate_url};
//!
//! let client = StepClient::new_from_env()?;
//! let url = validate_url("https://example.com/health")?;
//! let response = client.request(reqwest::Method::GET, url).send().await?;
//! ```

use std::env;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, header};
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Overall request timeout in whole seconds. Unset means no timeout.
pub const HTTP_TIMEOUT_ENV: &str = "STEPCALL_HTTP_TIMEOUT_SECS";
/// Connect timeout in whole seconds. Unset means no timeout.
pub const CONNECT_TIMEOUT_ENV: &str = "STEPCALL_CONNECT_TIMEOUT_SECS";
/// Overrides the User-Agent sent with every request.
pub const USER_AGENT_ENV: &str = "STEPCALL_USER_AGENT";

/// Error surfaced while configuring the HTTP client or validating a URL.
#[derive(Debug, Error)]
pub enum ClientConfigError {
    /// A timeout variable did not hold a whole number of seconds.
    #[error("{variable} must be a whole number of seconds; got '{value}'")]
    InvalidTimeout { variable: &'static str, value: String },
    /// The configured User-Agent is not a valid header value.
    #[error("invalid User-Agent '{0}'")]
    InvalidUserAgent(String),
    /// The underlying `reqwest::Client` could not be built.
    #[error("could not build the HTTP client: {0}")]
    Build(#[from] reqwest::Error),
    /// A request URL failed validation.
    #[error("invalid request URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Transport settings for [`StepClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Total time allowed for one request, including reading the body.
    pub timeout: Option<Duration>,
    /// Time allowed to establish a connection.
    pub connect_timeout: Option<Duration>,
    /// User-Agent header value.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            connect_timeout: None,
            user_agent: default_user_agent(),
        }
    }
}

impl ClientConfig {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ClientConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read settings through an arbitrary variable lookup.
    ///
    /// Blank values are treated as unset.
    ///
    /// ```rust
    /// use std::time::Duration;
    /// use stepcall_api::ClientConfig;
    ///
    /// let config = ClientConfig::from_lookup(|name| match name {
    ///     "STEPCALL_HTTP_TIMEOUT_SECS" => Some("15".to_string()),
    ///     _ => None,
    /// })
    /// .unwrap();
    /// assert_eq!(config.timeout, Some(Duration::from_secs(15)));
    /// assert_eq!(config.connect_timeout, None);
    /// ```
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).map(|value| value.trim().to_string()).filter(|value| !value.is_empty());

        let timeout = parse_seconds(HTTP_TIMEOUT_ENV, read(HTTP_TIMEOUT_ENV))?;
        let connect_timeout = parse_seconds(CONNECT_TIMEOUT_ENV, read(CONNECT_TIMEOUT_ENV))?;
        let user_agent = read(USER_AGENT_ENV).unwrap_or_else(default_user_agent);

        Ok(Self {
            timeout,
            connect_timeout,
            user_agent,
        })
    }
}

#[derive(Debug, Clone)]
/// Thin wrapper around a configured `reqwest::Client`.
///
/// The wrapped client pools connections internally and is cheap to clone, so
/// one `StepClient` can serve every step invocation without sharing any
/// per-call state.
pub struct StepClient {
    pub http: Client,
    pub user_agent: String,
}

impl StepClient {
    /// Construct a [`StepClient`] from environment variables.
    pub fn new_from_env() -> Result<Self, ClientConfigError> {
        Self::new(&ClientConfig::from_env()?)
    }

    /// Construct a [`StepClient`] from explicit settings.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientConfigError> {
        header::HeaderValue::from_str(&config.user_agent)
            .map_err(|_| ClientConfigError::InvalidUserAgent(config.user_agent.clone()))?;

        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(connect_timeout) = config.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }
        let http = builder.build()?;

        debug!(
            timeout = ?config.timeout,
            connect_timeout = ?config.connect_timeout,
            user_agent = %config.user_agent,
            "built http client"
        );
        Ok(Self {
            http,
            user_agent: config.user_agent.clone(),
        })
    }

    /// Build a `reqwest::RequestBuilder` for a method and absolute URL.
    ///
    /// The resulting request carries the configured User-Agent.
    pub fn request(&self, method: reqwest::Method, url: Url) -> RequestBuilder {
        self.http.request(method, url).header(header::USER_AGENT, &self.user_agent)
    }
}

/// Validate that a request URL is acceptable for the HTTP step.
///
/// Rules:
/// - it must parse as an absolute URL
/// - the scheme must be `http` or `https`
/// - it must include a host
///
/// ```rust
/// use stepcall_api::validate_url;
///
/// assert!(validate_url("https://example.com/items?page=1").is_ok());
/// assert!(validate_url("ftp://example.com/file").is_err());
/// assert!(validate_url("/relative/path").is_err());
/// ```
pub fn validate_url(raw: &str) -> Result<Url, ClientConfigError> {
    let invalid = |reason: String| ClientConfigError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };

    let parsed = Url::parse(raw).map_err(|error| invalid(error.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", parsed.scheme())));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    Ok(parsed)
}

fn parse_seconds(variable: &'static str, value: Option<String>) -> Result<Option<Duration>, ClientConfigError> {
    value
        .map(|raw| {
            raw.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ClientConfigError::InvalidTimeout { variable, value: raw })
        })
        .transpose()
}

fn default_user_agent() -> String {
    format!("stepcall/{}; {}", env!("CARGO_PKG_VERSION"), env::consts::OS)
}
