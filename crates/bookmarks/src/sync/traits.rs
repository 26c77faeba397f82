//! Source and sink abstractions driven by the sync engine

use crate::error::{SinkError, SourceError};
use crate::models::{Checkpoint, Item};

/// Result of reading everything new since a checkpoint
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// The source reported nothing new; `cursor` is where to resume
    NoNewData { cursor: Checkpoint },
    /// Items gathered across all pages, in no particular order
    Items { items: Vec<Item>, cursor: Checkpoint },
}

impl FetchOutcome {
    /// Checkpoint to adopt if this tick completes cleanly
    pub fn cursor(&self) -> Checkpoint {
        match self {
            FetchOutcome::NoNewData { cursor } | FetchOutcome::Items { cursor, .. } => *cursor,
        }
    }
}

/// Where new items come from
///
/// Readers receive the checkpoint by value and never mutate it.
pub trait ItemSource: Send {
    fn fetch(&self, since: Checkpoint) -> Result<FetchOutcome, SourceError>;
}

/// Where items are mirrored to
pub trait ItemSink: Send {
    fn push(&self, item: &Item) -> Result<(), SinkError>;
}
