//! Orchestrator - main simulation loop
//!
//! Implements the tick loop that drives the progress queue and the
//! identifier index from a command source.
//!
//! See `engine.rs` for full implementation.

pub mod engine;

// Re-export main types for convenience
pub use engine::{
    EngineConfig, EngineState, RunSummary, SimulationEngine, SimulationError, TickResult,
    DEFAULT_MAX_OPEN_PROJECTS, DEFAULT_QUANTUM,
};
