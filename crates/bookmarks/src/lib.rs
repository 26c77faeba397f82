//! Bookmarks crate - incremental Pocket to linkding synchronization
//!
//! This crate provides:
//! - A resilient HTTP transport (timeouts, exponential backoff, 401 short-circuit)
//! - The Pocket reader (paginated, cursor based)
//! - The linkding writer
//! - The checkpointed sync engine and its interval scheduler
//! - Settings loading for the daemon
//!
//! HTTP is synchronous (ureq); only the scheduler needs an async runtime.

pub mod error;
pub mod linkding;
pub mod models;
pub mod pocket;
pub mod settings;
pub mod sync;
pub mod transport;

pub use error::{SinkError, SourceError, SyncError};
pub use linkding::LinkdingClient;
pub use models::{Checkpoint, Item};
pub use pocket::{PAGE_SIZE, PocketClient};
pub use settings::Settings;
pub use sync::{
    FetchOutcome, ItemSink, ItemSource, Scheduler, SchedulerExit, SyncEngine, TickOutcome,
    TickReport,
};
pub use transport::{BackoffConfig, ResilientTransport, TransportError};
