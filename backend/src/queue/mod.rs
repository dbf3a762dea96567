//! Progress queue
//!
//! Yields the open project with the least accumulated work, identifier
//! breaking ties.

pub mod heap;

pub use heap::{ProgressQueue, QueueError};
