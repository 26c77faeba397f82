//! linkding API client
//!
//! Creates one bookmark per pushed item.

use anyhow::{Context, Result};
use url::Url;

use super::api::CreateBookmark;
use crate::error::SinkError;
use crate::models::Item;
use crate::sync::ItemSink;
use crate::transport::{RequestSpec, ResilientTransport, TransportError};

/// linkding bookmark writer
pub struct LinkdingClient {
    transport: ResilientTransport,
    bookmarks_url: String,
    token: String,
}

impl LinkdingClient {
    /// Bookmark creation path, relative to the instance root
    const BOOKMARKS_PATH: &'static str = "/api/bookmarks/";

    /// Create a client for the linkding instance at `base_url`
    ///
    /// # Errors
    /// Returns an error if `base_url` is not an absolute URL.
    pub fn new(
        transport: ResilientTransport,
        base_url: &str,
        token: impl Into<String>,
    ) -> Result<Self> {
        let base = Url::parse(base_url)
            .with_context(|| format!("failed to parse linkding URL {base_url:?}"))?;
        let bookmarks_url = base
            .join(Self::BOOKMARKS_PATH)
            .context("failed to build linkding bookmarks URL")?;

        Ok(Self {
            transport,
            bookmarks_url: bookmarks_url.into(),
            token: token.into(),
        })
    }

    /// Full URL bookmarks are posted to
    pub fn bookmarks_url(&self) -> &str {
        &self.bookmarks_url
    }

    /// Save `item` as a bookmark.
    ///
    /// A 401 yields [`SinkError::Unauthorized`] without retrying. Other
    /// failures are retried and then reported as [`SinkError::Failed`].
    pub fn push(&self, item: &Item) -> Result<(), SinkError> {
        let body = serde_json::to_string(&CreateBookmark { url: item.url() }).map_err(|e| {
            SinkError::from_transport(item, TransportError::Network(e.to_string()))
        })?;

        let request = RequestSpec::post(&self.bookmarks_url, body)
            .header("Authorization", format!("Token {}", self.token))
            .header("Content-Type", "application/json");

        self.transport
            .execute(&request)
            .map(|_| ())
            .map_err(|e| SinkError::from_transport(item, e))
    }
}

impl ItemSink for LinkdingClient {
    fn push(&self, item: &Item) -> Result<(), SinkError> {
        LinkdingClient::push(self, item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::testing::{ScriptedClient, instant_backoff};
    use std::sync::Arc;

    fn client(scripted: &Arc<ScriptedClient>, base: &str) -> LinkdingClient {
        let transport = ResilientTransport::new(scripted.clone(), instant_backoff(2));
        LinkdingClient::new(transport, base, "secret").unwrap()
    }

    #[test]
    fn test_bookmarks_url_resolution() {
        let scripted = Arc::new(ScriptedClient::new());
        assert_eq!(
            client(&scripted, "https://links.example").bookmarks_url(),
            "https://links.example/api/bookmarks/"
        );
        assert_eq!(
            client(&scripted, "https://links.example/").bookmarks_url(),
            "https://links.example/api/bookmarks/"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let transport = ResilientTransport::new(Arc::new(ScriptedClient::new()), instant_backoff(0));
        assert!(LinkdingClient::new(transport, "not a url", "secret").is_err());
    }

    #[test]
    fn test_push_sends_url_and_token() {
        let scripted = Arc::new(ScriptedClient::new());
        scripted.push_status(201, r#"{"id": 1}"#);

        client(&scripted, "https://links.example")
            .push(&Item::new("https://article.example/post"))
            .unwrap();

        let requests = scripted.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "https://links.example/api/bookmarks/");
        assert_eq!(requests[0].header_value("Authorization"), Some("Token secret"));
        assert_eq!(requests[0].header_value("Content-Type"), Some("application/json"));
        let body: serde_json::Value = serde_json::from_str(&requests[0].body).unwrap();
        assert_eq!(body, serde_json::json!({ "url": "https://article.example/post" }));
    }

    #[test]
    fn test_unauthorized_is_permanent() {
        let scripted = Arc::new(ScriptedClient::new());
        scripted.push_status(401, "");

        let err = client(&scripted, "https://links.example")
            .push(&Item::new("https://a"))
            .unwrap_err();

        assert_eq!(err, SinkError::Unauthorized);
        assert_eq!(scripted.requests().len(), 1);
    }

    #[test]
    fn test_other_failures_are_per_item() {
        let scripted = Arc::new(ScriptedClient::new());
        scripted.push_status(500, "");
        scripted.push_status(500, "");
        scripted.push_status(400, "");

        let err = client(&scripted, "https://links.example")
            .push(&Item::new("https://a"))
            .unwrap_err();

        assert_eq!(
            err,
            SinkError::Failed {
                url: Item::new("https://a"),
                source: TransportError::Status {
                    status: 400,
                    detail: None
                },
            }
        );
        assert_eq!(scripted.requests().len(), 3);
    }
}
