//! linkding integration (the sync sink)

mod client;

pub use client::LinkdingClient;

/// linkding API wire types
pub mod api {
    use serde::Serialize;

    /// Body of a bookmark creation request
    #[derive(Debug, Serialize)]
    pub struct CreateBookmark<'a> {
        pub url: &'a str,
    }
}
