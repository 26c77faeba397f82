//! Domain models for synchronization

mod checkpoint;
mod item;

pub use checkpoint::Checkpoint;
pub use item::Item;
