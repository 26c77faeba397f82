//! Blocking HTTP client backed by ureq
//!
//! Uses synchronous HTTP (ureq) to be executor-agnostic. Status codes are
//! returned as values so the retry layer can classify them.

use std::time::Duration;

use super::{HttpClient, HttpResponse, RequestSpec, TransportError};

/// ureq agent with a fixed per-request timeout
pub struct UreqClient {
    agent: ureq::Agent,
}

impl UreqClient {
    pub fn new(timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();

        Self {
            agent: ureq::Agent::new_with_config(config),
        }
    }
}

impl HttpClient for UreqClient {
    fn send(&self, request: &RequestSpec) -> Result<HttpResponse, TransportError> {
        let mut builder = self.agent.post(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let mut response = builder
            .send(request.body.as_bytes())
            .map_err(map_ureq_error)?;

        let status = response.status().as_u16();
        let error_header = response
            .headers()
            .get("X-Error")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(map_ureq_error)?;

        Ok(HttpResponse {
            status,
            body,
            error_header,
        })
    }
}

fn map_ureq_error(err: ureq::Error) -> TransportError {
    match err {
        ureq::Error::Timeout(_) => TransportError::Timeout,
        e => TransportError::Network(e.to_string()),
    }
}
