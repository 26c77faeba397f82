//! Pocket integration (the sync source)
//!
//! This module provides:
//! - The paginated `/v3/get` reader
//! - Normalization of listing entries to [`Item`](crate::models::Item)s

mod client;
mod normalize;

pub use client::{PAGE_SIZE, PocketClient};
pub use normalize::normalize_item;

/// Pocket API wire types
pub mod api {
    use serde::{Deserialize, Serialize};
    use std::collections::HashMap;

    /// `status` value meaning nothing changed since the requested cursor
    pub const STATUS_NO_NEW_DATA: i64 = 2;

    /// Body of a `/v3/get` request
    #[derive(Debug, Serialize)]
    pub struct RetrieveRequest<'a> {
        pub consumer_key: &'a str,
        pub access_token: &'a str,
        pub state: &'a str,
        #[serde(rename = "detailType")]
        pub detail_type: &'a str,
        pub since: i64,
        pub offset: usize,
        pub count: usize,
    }

    /// Body of a `/v3/get` response
    #[derive(Debug, Deserialize)]
    pub struct RetrieveResponse {
        #[serde(default)]
        pub status: i64,
        #[serde(default)]
        pub error: Option<String>,
        /// New cursor to pass as `since` on the next run
        #[serde(default)]
        pub since: Option<i64>,
        #[serde(default)]
        pub list: Option<ItemList>,
    }

    /// The `list` field: an object keyed by item id, or an empty array
    /// when there is nothing to return
    #[derive(Debug, Deserialize)]
    #[serde(untagged)]
    pub enum ItemList {
        Map(HashMap<String, PocketItem>),
        Empty(Vec<serde_json::Value>),
    }

    impl ItemList {
        pub fn entries(&self) -> impl Iterator<Item = &PocketItem> {
            let map = match self {
                ItemList::Map(map) => Some(map),
                ItemList::Empty(_) => None,
            };
            map.into_iter().flat_map(|m| m.values())
        }
    }

    /// One saved item in a listing (only the fields we use)
    #[derive(Debug, Default, Deserialize)]
    pub struct PocketItem {
        #[serde(default)]
        pub item_id: Option<String>,
        #[serde(default)]
        pub resolved_url: Option<String>,
        #[serde(default)]
        pub given_url: Option<String>,
    }
}
