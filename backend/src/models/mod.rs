//! Domain models for the project scheduler

pub mod event;
pub mod project;

// Re-exports
pub use event::{Event, EventLog};
pub use project::{ProjectError, ProjectHandle, ProjectId, ProjectRecord, ProjectSnapshot};
