//! Work queue shared by the runner and its workers.
//!
//! Items are ordered by numeric [`Priority`] (lowest first) and, within one
//! priority, by insertion order. The queue also owns the completion counter
//! that `JobRunner::join` waits on.

pub mod item;
pub mod priority;

pub use item::{Payload, Priority, QueueItem};
pub use priority::BoundedPriorityQueue;
