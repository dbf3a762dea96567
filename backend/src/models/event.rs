//! Event logging for simulation replay and auditing.
//!
//! This module defines the Event enum which captures every significant state
//! change during a run. Events enable:
//! - Debugging (understand which project held the resource and when)
//! - Auditing (verify quanta and completions)
//! - Export (the CLI writes them out as JSON lines)
//!
//! # Example
//!
//! ```rust
//! use project_scheduler_core_rs::models::{Event, EventLog};
//!
//! let mut log = EventLog::new();
//! log.log(Event::ProjectInserted {
//!     tick: 0,
//!     project_id: 12,
//!     total_work: 40,
//! });
//!
//! assert_eq!(log.events_for_project(12).len(), 1);
//! assert_eq!(log.events()[0].tick(), 0);
//! ```

use crate::models::project::ProjectId;
use serde::Serialize;

/// Simulation event capturing a state change.
///
/// All events include a tick number for temporal ordering.
/// Events are logged in the order they occur within a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event_type")]
pub enum Event {
    /// New project opened by an insert command
    ProjectInserted {
        tick: usize,
        project_id: ProjectId,
        total_work: u64,
    },

    /// Project took the resource for a new quantum
    QuantumStarted {
        tick: usize,
        project_id: ProjectId,
        accumulated_work: u64,
        quantum_end: u64,
    },

    /// Project yielded the resource without finishing
    QuantumEnded {
        tick: usize,
        project_id: ProjectId,
        accumulated_work: u64,
    },

    /// Project reached its total work and left the index
    ProjectCompleted {
        tick: usize,
        project_id: ProjectId,
        total_work: u64,
    },

    /// A print command was answered
    ///
    /// `low == high` for a point query.
    QueryAnswered {
        tick: usize,
        low: ProjectId,
        high: ProjectId,
        matches: usize,
    },
}

impl Event {
    pub fn tick(&self) -> usize {
        match self {
            Event::ProjectInserted { tick, .. } => *tick,
            Event::QuantumStarted { tick, .. } => *tick,
            Event::QuantumEnded { tick, .. } => *tick,
            Event::ProjectCompleted { tick, .. } => *tick,
            Event::QueryAnswered { tick, .. } => *tick,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            Event::ProjectInserted { .. } => "ProjectInserted",
            Event::QuantumStarted { .. } => "QuantumStarted",
            Event::QuantumEnded { .. } => "QuantumEnded",
            Event::ProjectCompleted { .. } => "ProjectCompleted",
            Event::QueryAnswered { .. } => "QueryAnswered",
        }
    }

    pub fn project_id(&self) -> Option<ProjectId> {
        match self {
            Event::ProjectInserted { project_id, .. } => Some(*project_id),
            Event::QuantumStarted { project_id, .. } => Some(*project_id),
            Event::QuantumEnded { project_id, .. } => Some(*project_id),
            Event::ProjectCompleted { project_id, .. } => Some(*project_id),
            Event::QueryAnswered { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn log(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn events_at_tick(&self, tick: usize) -> Vec<&Event> {
        self.events.iter().filter(|e| e.tick() == tick).collect()
    }

    pub fn events_of_type(&self, event_type: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    pub fn events_for_project(&self, project_id: ProjectId) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.project_id() == Some(project_id))
            .collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
