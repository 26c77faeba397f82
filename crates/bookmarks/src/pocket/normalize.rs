//! Pocket listing normalization
//!
//! Converts Pocket listing entries to [`Item`]s.

use super::api::{ItemList, PocketItem};
use crate::models::Item;

/// Pick the canonical URL for a listing entry.
///
/// The resolved URL wins; the URL the user originally saved is the fallback.
/// Entries with neither are skipped.
pub fn normalize_item(entry: &PocketItem) -> Option<Item> {
    non_empty(entry.resolved_url.as_deref())
        .or_else(|| non_empty(entry.given_url.as_deref()))
        .map(Item::new)
}

/// Normalize every entry of a page, skipping entries without a URL
pub(crate) fn normalize_list(list: &ItemList) -> Vec<Item> {
    list.entries()
        .filter_map(|entry| {
            let item = normalize_item(entry);
            if item.is_none() {
                log::debug!(
                    "Skipping Pocket item {} without a URL",
                    entry.item_id.as_deref().unwrap_or("<unknown>")
                );
            }
            item
        })
        .collect()
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}
