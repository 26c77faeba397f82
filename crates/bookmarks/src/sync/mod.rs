//! Sync engine for mirroring source items into the sink
//!
//! Provides the checkpointed tick and the interval scheduler that drives it.

mod engine;
mod scheduler;
mod traits;

pub use engine::{SyncEngine, TickOutcome, TickReport};
pub use scheduler::{Scheduler, SchedulerExit};
pub use traits::{FetchOutcome, ItemSink, ItemSource};
