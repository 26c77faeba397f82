//! Item model: a saved article identified by its canonical URL

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single saved item, normalized to the URL it is bookmarked under.
///
/// Identity is plain string equality on the URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Item(pub String);

impl Item {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn url(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
