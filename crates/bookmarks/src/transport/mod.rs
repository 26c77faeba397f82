//! Resilient HTTP transport
//!
//! This module provides:
//! - A minimal request/response model for JSON POST calls
//! - The [`HttpClient`] seam for the raw network call (ureq in production)
//! - [`ResilientTransport`], which wraps a client with timeout-bounded
//!   attempts, exponential backoff and 401 short-circuiting

mod client;
mod retry;

pub use client::UreqClient;
pub use retry::{BackoffConfig, ExponentialBackoff, Retryable, retry};

use std::sync::Arc;
use std::time::Duration;

/// Per-attempt timeout applied to every HTTP call
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A JSON POST request, reusable across attempts
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RequestSpec {
    pub fn post(url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Look up a header value (case-insensitive)
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Raw HTTP response
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
    /// Value of the `X-Error` header, if the server sent one
    pub error_header: Option<String>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            error_header: None,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport-level failures
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    /// HTTP 401. Retrying with the same credentials cannot succeed.
    #[error("unauthorized")]
    Unauthorized,

    /// Any other non-2xx status
    #[error("got response {status}; X-Error=[{}]", .detail.as_deref().unwrap_or(""))]
    Status { status: u16, detail: Option<String> },

    /// The attempt exceeded the per-request timeout
    #[error("request timed out")]
    Timeout,

    /// Connection, TLS or I/O failure
    #[error("failed to send request: {0}")]
    Network(String),
}

impl Retryable for TransportError {
    fn is_permanent(&self) -> bool {
        matches!(self, TransportError::Unauthorized)
    }
}

/// A single, unretried HTTP call
///
/// Implementations return non-2xx responses as values; classification
/// happens in [`ResilientTransport`].
pub trait HttpClient: Send + Sync {
    fn send(&self, request: &RequestSpec) -> Result<HttpResponse, TransportError>;
}

/// HTTP client with retry and permanent-failure classification
#[derive(Clone)]
pub struct ResilientTransport {
    client: Arc<dyn HttpClient>,
    backoff: BackoffConfig,
}

impl ResilientTransport {
    pub fn new(client: Arc<dyn HttpClient>, backoff: BackoffConfig) -> Self {
        Self { client, backoff }
    }

    /// Transport backed by ureq with the standard request timeout
    pub fn with_ureq(backoff: BackoffConfig) -> Self {
        Self::new(Arc::new(UreqClient::new(REQUEST_TIMEOUT)), backoff)
    }

    /// Send `request`, retrying transient failures.
    ///
    /// Returns the first 2xx response. A 401 stops immediately with
    /// [`TransportError::Unauthorized`]; anything else is retried until the
    /// backoff budget runs out, and the last error is returned.
    pub fn execute(&self, request: &RequestSpec) -> Result<HttpResponse, TransportError> {
        retry(&self.backoff, || {
            let response = self.client.send(request)?;
            classify(response)
        })
    }
}

fn classify(response: HttpResponse) -> Result<HttpResponse, TransportError> {
    match response.status {
        401 => Err(TransportError::Unauthorized),
        _ if response.is_success() => Ok(response),
        status => Err(TransportError::Status {
            status,
            detail: response.error_header,
        }),
    }
}
