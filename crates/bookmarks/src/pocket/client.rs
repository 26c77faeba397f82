//! Pocket API client
//!
//! Reads unread items saved since a checkpoint, one page at a time.

use log::{debug, info};

use super::api::{RetrieveRequest, RetrieveResponse, STATUS_NO_NEW_DATA};
use super::normalize::normalize_list;
use crate::error::SourceError;
use crate::models::{Checkpoint, Item};
use crate::sync::{FetchOutcome, ItemSource};
use crate::transport::{RequestSpec, ResilientTransport};

/// Maximum number of items requested per page
pub const PAGE_SIZE: usize = 30;

/// Pocket `/v3/get` reader
pub struct PocketClient {
    transport: ResilientTransport,
    endpoint: String,
    consumer_key: String,
    access_token: String,
    page_size: usize,
}

impl PocketClient {
    /// Pocket retrieve endpoint
    pub const ENDPOINT: &'static str = "https://getpocket.com/v3/get";

    const STATE: &'static str = "unread";
    const DETAIL_TYPE: &'static str = "simple";

    pub fn new(
        transport: ResilientTransport,
        consumer_key: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            endpoint: Self::ENDPOINT.to_string(),
            consumer_key: consumer_key.into(),
            access_token: access_token.into(),
            page_size: PAGE_SIZE,
        }
    }

    /// Point the client at a different endpoint (proxies, tests)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Override the page size (at least 1)
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Fetch every unread item saved since `since`.
    ///
    /// Requests successive pages until one comes back short. The returned
    /// cursor is the last `since` the server advertised, or the time this
    /// fetch started if it never sent one.
    pub fn fetch(&self, since: Checkpoint) -> Result<FetchOutcome, SourceError> {
        let started_at = Checkpoint::now();
        let mut cursor = None;
        let mut items: Vec<Item> = Vec::new();
        let mut offset = 0;

        loop {
            let page = self.fetch_page(since, offset)?;

            if let Some(server_since) = page.since.filter(|s| *s > 0) {
                cursor = Some(Checkpoint::from_secs(server_since));
            }

            if page.status == STATUS_NO_NEW_DATA {
                debug!("Pocket reports no new data at offset {}", offset);
                if offset == 0 {
                    return Ok(FetchOutcome::NoNewData {
                        cursor: cursor.unwrap_or(started_at),
                    });
                }
                break;
            }

            let page_items = page
                .list
                .as_ref()
                .map(normalize_list)
                .unwrap_or_default();
            let page_len = page.list.as_ref().map_or(0, |l| l.entries().count());
            debug!(
                "Pocket page at offset {}: {} entries, {} usable",
                offset,
                page_len,
                page_items.len()
            );
            items.extend(page_items);

            if page_len < self.page_size {
                break;
            }
            offset += self.page_size;
        }

        let cursor = cursor.unwrap_or(started_at);
        info!(
            "Fetched {} items from Pocket since {} (next cursor {})",
            items.len(),
            since,
            cursor
        );
        Ok(FetchOutcome::Items { items, cursor })
    }

    fn fetch_page(&self, since: Checkpoint, offset: usize) -> Result<RetrieveResponse, SourceError> {
        let body = serde_json::to_string(&RetrieveRequest {
            consumer_key: &self.consumer_key,
            access_token: &self.access_token,
            state: Self::STATE,
            detail_type: Self::DETAIL_TYPE,
            since: since.as_secs(),
            offset,
            count: self.page_size,
        })
        .map_err(|e| SourceError::Decode(e.to_string()))?;

        let request = RequestSpec::post(&self.endpoint, body)
            .header("Content-Type", "application/json")
            .header("X-Accept", "application/json");

        let response = self.transport.execute(&request)?;

        let page: RetrieveResponse = serde_json::from_str(&response.body)
            .map_err(|e| SourceError::Decode(e.to_string()))?;

        if let Some(message) = page.error.as_deref().filter(|m| !m.is_empty()) {
            return Err(SourceError::Application(message.to_string()));
        }

        Ok(page)
    }
}

impl ItemSource for PocketClient {
    fn fetch(&self, since: Checkpoint) -> Result<FetchOutcome, SourceError> {
        PocketClient::fetch(self, since)
    }
}
