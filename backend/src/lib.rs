//! Project Scheduler Core - Rust Engine
//!
//! Deterministic single-resource scheduler for concurrently open
//! construction projects. Work goes to the least-progressed project in fixed
//! quanta; open projects can be queried by identifier at any tick.
//!
//! # Architecture
//!
//! - **core**: Time management
//! - **models**: Domain types (ProjectRecord, ProjectHandle, Event)
//! - **queue**: Progress queue (bounded binary min-heap)
//! - **index**: Identifier index (arena-backed red-black tree)
//! - **events**: Commands, command sources, textual parser
//! - **output**: Result lines and sinks
//! - **orchestrator**: Main simulation loop
//!
//! # Critical Invariants
//!
//! 1. Every open project is in the index, and either queued or active;
//!    the queue and the index share its record until its first quantum
//!    boundary
//! 2. Every tick applies at most one unit of work
//! 3. Execution is fully deterministic (no clocks, no randomness)

// Module declarations
pub mod core;
pub mod events;
pub mod index;
pub mod models;
pub mod orchestrator;
pub mod output;
pub mod queue;

// Re-exports for convenience
pub use crate::core::time::TimeManager;
pub use events::{Command, CommandSchedule, CommandSource, ScheduledCommand};
pub use index::{IdentifierIndex, IndexError, InvariantViolation};
pub use models::{
    event::{Event, EventLog},
    project::{ProjectError, ProjectHandle, ProjectId, ProjectRecord, ProjectSnapshot},
};
pub use orchestrator::{
    EngineConfig, EngineState, RunSummary, SimulationEngine, SimulationError, TickResult,
};
pub use output::{OutputLine, ResultSink, WriterSink};
pub use queue::{ProgressQueue, QueueError};
