//! Error types for the sync engine
//!
//! Source and sink errors keep authentication failures distinct from
//! everything else: those are the only failures that stop the run.

use thiserror::Error;

use crate::models::Item;
use crate::transport::TransportError;

/// Failures while reading from the source (Pocket)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SourceError {
    /// The source rejected our credentials
    #[error("source unauthorized")]
    Unauthorized,

    /// The source answered with an `error` field in the body
    #[error("source reported error: {0}")]
    Application(String),

    /// The response body could not be decoded
    #[error("failed to decode source response: {0}")]
    Decode(String),

    /// Retries exhausted at the transport layer
    #[error("failed to fetch source items: {0}")]
    Transport(TransportError),
}

impl From<TransportError> for SourceError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Unauthorized => SourceError::Unauthorized,
            other => SourceError::Transport(other),
        }
    }
}

/// Failures while writing one item to the sink (linkding)
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SinkError {
    /// The sink rejected our token
    #[error("sink unauthorized")]
    Unauthorized,

    /// The push for this item failed after retries
    #[error("failed to save bookmark {url}: {source}")]
    Failed { url: Item, source: TransportError },
}

impl SinkError {
    pub fn from_transport(url: &Item, err: TransportError) -> Self {
        match err {
            TransportError::Unauthorized => SinkError::Unauthorized,
            source => SinkError::Failed {
                url: url.clone(),
                source,
            },
        }
    }
}

/// Errors that end the whole sync run
///
/// Invalid credentials do not fix themselves, so continuing to schedule
/// ticks would only repeat the failure.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SyncError {
    #[error("source credentials rejected (401)")]
    SourceUnauthorized,

    #[error("sink credentials rejected (401) while pushing {url} ({pushed} of {seen} pushed)")]
    SinkUnauthorized { url: Item, seen: usize, pushed: usize },

    /// The blocking tick task panicked or was cancelled
    #[error("sync tick aborted: {0}")]
    TickAborted(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_error_from_transport() {
        assert_eq!(
            SourceError::from(TransportError::Unauthorized),
            SourceError::Unauthorized
        );
        assert_eq!(
            SourceError::from(TransportError::Timeout),
            SourceError::Transport(TransportError::Timeout)
        );
    }

    #[test]
    fn test_sink_error_from_transport() {
        let url = Item::new("https://example.com");
        assert_eq!(
            SinkError::from_transport(&url, TransportError::Unauthorized),
            SinkError::Unauthorized
        );

        let err = SinkError::from_transport(&url, TransportError::Network("reset".into()));
        assert_eq!(
            err.to_string(),
            "failed to save bookmark https://example.com: failed to send request: reset"
        );
    }
}
