//! Command types for driving a simulation
//!
//! Commands open projects or query the open set at a specific tick.
//!
//! # Design Principles
//!
//! 1. **Determinism**: every command carries the tick it is dispatched at
//! 2. **Self-contained**: commands hold all data needed for dispatch
//! 3. **Structured**: the engine never sees text; see `parser.rs`

use crate::models::project::ProjectId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An operation against the open project set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Open a new project with no work done
    Insert {
        project_id: ProjectId,
        total_work: u64,
    },

    /// Report one project, or the `(0,0,0)` placeholder
    Print { project_id: ProjectId },

    /// Report every open project with `low <= id <= high`
    PrintRange { low: ProjectId, high: ProjectId },
}

impl Command {
    pub fn is_query(&self) -> bool {
        !matches!(self, Command::Insert { .. })
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Insert {
                project_id,
                total_work,
            } => write!(f, "insert({},{})", project_id, total_work),
            Command::Print { project_id } => write!(f, "print({})", project_id),
            Command::PrintRange { low, high } => write!(f, "print({},{})", low, high),
        }
    }
}

/// A command paired with its dispatch tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledCommand {
    pub tick: usize,
    pub command: Command,
}

impl ScheduledCommand {
    pub fn new(tick: usize, command: Command) -> Self {
        Self { tick, command }
    }

    pub fn insert(tick: usize, project_id: ProjectId, total_work: u64) -> Self {
        Self::new(
            tick,
            Command::Insert {
                project_id,
                total_work,
            },
        )
    }

    pub fn print(tick: usize, project_id: ProjectId) -> Self {
        Self::new(tick, Command::Print { project_id })
    }

    pub fn print_range(tick: usize, low: ProjectId, high: ProjectId) -> Self {
        Self::new(tick, Command::PrintRange { low, high })
    }
}

impl fmt::Display for ScheduledCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.tick, self.command)
    }
}
