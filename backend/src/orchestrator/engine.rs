//! Simulation Engine
//!
//! Discrete-event driver integrating the progress queue, the identifier
//! index, and the command source.
//!
//! # Architecture
//!
//! ```text
//! For each tick t:
//! 1. Close the active quantum if it reached its end last tick
//!    (complete the project, or requeue a fresh record and publish progress)
//! 2. If idle, take the least-progressed project from the queue
//! 3. Dispatch every command scheduled for t
//! 4. If still idle, take a project again (one inserted at t starts at t)
//! 5. Apply one unit of work to the active project
//! 6. Advance time
//! ```
//!
//! The active project's progress is held in the engine while it works and
//! is written back to its index entry at quantum boundaries and before
//! answering a query.
//!
//! A query answered while the resource is idle sees the published progress
//! as is. So a project inserted and queried at the same tick, before any
//! work, reports `0`, and a query on the next tick already reports `2`
//! (one unit applied plus the one-unit lookahead).
//!
//! # Example
//!
//! ```rust
//! use project_scheduler_core_rs::events::{CommandSchedule, ScheduledCommand};
//! use project_scheduler_core_rs::{EngineConfig, SimulationEngine};
//!
//! let commands = CommandSchedule::new(vec![
//!     ScheduledCommand::insert(0, 1, 5),
//!     ScheduledCommand::insert(0, 2, 10),
//! ]);
//! let mut engine = SimulationEngine::new(EngineConfig::default(), commands).unwrap();
//!
//! let mut output: Vec<String> = Vec::new();
//! engine.run(&mut output).unwrap();
//! assert_eq!(output, vec!["(1,5)", "(2,15)"]);
//! ```

use crate::core::time::TimeManager;
use crate::events::{Command, CommandSource, ScheduledCommand};
use crate::index::{IdentifierIndex, IndexError};
use crate::models::event::{Event, EventLog};
use crate::models::project::{ProjectError, ProjectHandle, ProjectId, ProjectRecord, ProjectSnapshot};
use crate::output::{OutputLine, ResultSink};
use crate::queue::{ProgressQueue, QueueError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Work units a project receives before yielding the resource
pub const DEFAULT_QUANTUM: u64 = 5;

/// Upper bound on simultaneously open projects
pub const DEFAULT_MAX_OPEN_PROJECTS: usize = 2000;

// ============================================================================
// Configuration Types
// ============================================================================

/// Engine configuration
///
/// Missing fields fall back to their defaults when deserialized, so a
/// partial JSON object such as `{"quantum": 3}` is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum work units per turn on the resource
    pub quantum: u64,

    /// Capacity of the progress queue
    pub max_open_projects: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            quantum: DEFAULT_QUANTUM,
            max_open_projects: DEFAULT_MAX_OPEN_PROJECTS,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.quantum == 0 {
            return Err(SimulationError::InvalidConfig(
                "quantum must be positive".to_string(),
            ));
        }
        if self.max_open_projects == 0 {
            return Err(SimulationError::InvalidConfig(
                "max_open_projects must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Fatal simulation errors; none of them is recovered from
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Project {0} is already open")]
    DuplicateKey(ProjectId),

    #[error("Progress queue capacity of {capacity} projects exceeded")]
    CapacityExceeded { capacity: usize },

    #[error("Invalid project: {0}")]
    InvalidProject(#[from] ProjectError),

    #[error("Command `{command}` arrived at tick {current_tick}, after its scheduled tick")]
    CommandOutOfOrder {
        command: ScheduledCommand,
        current_tick: usize,
    },

    #[error("Index inconsistency: {0}")]
    IndexInconsistency(String),

    #[error("Output sink failed: {0}")]
    Sink(#[from] std::io::Error),
}

impl From<QueueError> for SimulationError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::CapacityExceeded { capacity } => {
                SimulationError::CapacityExceeded { capacity }
            }
        }
    }
}

impl From<IndexError> for SimulationError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::DuplicateKey(id) => SimulationError::DuplicateKey(id),
            IndexError::NotFound(id) => {
                SimulationError::IndexInconsistency(format!("project {} missing from index", id))
            }
        }
    }
}

// ============================================================================
// Engine State
// ============================================================================

/// Observable state of the single work resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Working {
        project_id: ProjectId,
        /// Work applied so far, including this quantum
        progress: u64,
        /// Progress at which the project yields
        quantum_end: u64,
    },
}

/// The project currently holding the resource
#[derive(Debug)]
struct ActiveQuantum {
    project: ProjectHandle,
    progress: u64,
    quantum_end: u64,
}

/// What happened during one tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickResult {
    pub tick: usize,
    /// Project that received this tick's unit of work
    pub worked_on: Option<ProjectId>,
    pub commands_dispatched: usize,
    /// Lines for the output sink, in emission order
    pub output: Vec<OutputLine>,
}

/// Totals for a complete run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// First tick that was not simulated
    pub final_tick: usize,
    pub projects_completed: usize,
    pub lines_emitted: usize,
}

// ============================================================================
// Simulation Engine
// ============================================================================

/// Owns all run state: time, the queue/index pair, the active project, the
/// command source, and the event log.
pub struct SimulationEngine {
    config: EngineConfig,
    time_manager: TimeManager,
    queue: ProgressQueue,
    index: IdentifierIndex,
    active: Option<ActiveQuantum>,
    commands: Box<dyn CommandSource>,
    event_log: EventLog,
    projects_completed: usize,
}

impl SimulationEngine {
    /// Create an engine at tick 0 with no open projects
    ///
    /// # Errors
    /// `InvalidConfig` if the configuration does not validate.
    pub fn new(
        config: EngineConfig,
        commands: impl CommandSource + 'static,
    ) -> Result<Self, SimulationError> {
        config.validate()?;
        Ok(Self {
            queue: ProgressQueue::with_capacity(config.max_open_projects),
            index: IdentifierIndex::new(),
            time_manager: TimeManager::new(),
            active: None,
            commands: Box::new(commands),
            event_log: EventLog::new(),
            projects_completed: 0,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn current_tick(&self) -> usize {
        self.time_manager.current_tick()
    }

    pub fn queue(&self) -> &ProgressQueue {
        &self.queue
    }

    pub fn index(&self) -> &IdentifierIndex {
        &self.index
    }

    pub fn event_log(&self) -> &EventLog {
        &self.event_log
    }

    pub fn projects_completed(&self) -> usize {
        self.projects_completed
    }

    pub fn state(&self) -> EngineState {
        match &self.active {
            None => EngineState::Idle,
            Some(active) => EngineState::Working {
                project_id: active.project.id(),
                progress: active.progress,
                quantum_end: active.quantum_end,
            },
        }
    }

    /// Open projects as currently published in the index, ascending by id
    pub fn open_projects(&self) -> Vec<ProjectSnapshot> {
        self.index.in_order().iter().map(ProjectHandle::snapshot).collect()
    }

    /// True once the queue is empty, no project is active, and no command
    /// remains
    pub fn is_finished(&self) -> bool {
        self.queue.is_empty() && self.active.is_none() && self.commands.is_exhausted()
    }

    /// Run until finished, sending every output line to `sink`
    pub fn run<S: ResultSink + ?Sized>(&mut self, sink: &mut S) -> Result<RunSummary, SimulationError> {
        let mut lines_emitted = 0;
        while !self.is_finished() {
            let result = self.tick()?;
            for line in &result.output {
                sink.accept(line)?;
                lines_emitted += 1;
            }
        }
        Ok(RunSummary {
            final_tick: self.current_tick(),
            projects_completed: self.projects_completed,
            lines_emitted,
        })
    }

    /// Execute one tick
    pub fn tick(&mut self) -> Result<TickResult, SimulationError> {
        let tick = self.current_tick();
        let mut output = Vec::new();

        // STEP 1: QUANTUM CLOSE
        self.close_finished_quantum(tick, &mut output)?;

        // STEP 2: SELECTION
        self.start_next_quantum(tick);

        // STEP 3: COMMAND DISPATCH
        let mut commands_dispatched = 0;
        while let Some(scheduled) = self.next_due_command(tick)? {
            self.dispatch(scheduled.command, tick, &mut output)?;
            commands_dispatched += 1;
        }

        // STEP 4: SELECTION (a project opened this tick starts now)
        self.start_next_quantum(tick);

        // STEP 5: WORK
        let worked_on = self.active.as_mut().map(|active| {
            active.progress += 1;
            active.project.id()
        });

        self.time_manager.advance_tick();

        Ok(TickResult {
            tick,
            worked_on,
            commands_dispatched,
            output,
        })
    }

    /// Verify that the queue and index agree with each other
    ///
    /// Every queued or active project must be open in the index, no project
    /// may be scheduled twice, and both structures must satisfy their own
    /// invariants. O(n); meant for tests.
    pub fn check_consistency(&self) -> Result<(), SimulationError> {
        self.index
            .validate()
            .map_err(|violation| SimulationError::IndexInconsistency(violation.to_string()))?;
        if !self.queue.is_heap_ordered() {
            return Err(SimulationError::IndexInconsistency(
                "progress queue is not heap-ordered".to_string(),
            ));
        }

        let mut scheduled = HashSet::new();
        let active = self.active.iter().map(|active| &active.project);
        for project in self.queue.iter().chain(active) {
            let id = project.id();
            if !scheduled.insert(id) {
                return Err(SimulationError::IndexInconsistency(format!(
                    "project {} is scheduled twice",
                    id
                )));
            }
            if self.index.search(id).is_none() {
                return Err(SimulationError::IndexInconsistency(format!(
                    "project {} is scheduled but not open",
                    id
                )));
            }
        }
        if scheduled.len() != self.index.len() {
            return Err(SimulationError::IndexInconsistency(format!(
                "{} projects open but {} scheduled",
                self.index.len(),
                scheduled.len()
            )));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Tick phases
    // ------------------------------------------------------------------

    fn close_finished_quantum(
        &mut self,
        tick: usize,
        output: &mut Vec<OutputLine>,
    ) -> Result<(), SimulationError> {
        let Some(active) = self
            .active
            .as_ref()
            .filter(|active| active.progress >= active.quantum_end)
        else {
            return Ok(());
        };

        let project_id = active.project.id();
        let total_work = active.project.total_work();
        let progress = active.progress;
        let resting = ProjectRecord::with_progress(project_id, progress, total_work)?;

        // The active slot is cleared only once the project has landed
        if resting.is_complete() {
            self.index.remove(project_id)?;
            self.projects_completed += 1;
            info!(project_id, tick, "project completed");
            self.event_log.log(Event::ProjectCompleted {
                tick,
                project_id,
                total_work,
            });
            output.push(OutputLine::Completion { project_id, tick });
        } else {
            self.queue.insert(ProjectHandle::new(resting))?;
            self.publish_progress(project_id, progress)?;
            debug!(project_id, tick, progress, "quantum ended");
            self.event_log.log(Event::QuantumEnded {
                tick,
                project_id,
                accumulated_work: progress,
            });
        }
        self.active = None;
        Ok(())
    }

    fn start_next_quantum(&mut self, tick: usize) {
        if self.active.is_some() {
            return;
        }
        let Some(project) = self.queue.extract_min() else {
            return;
        };

        let progress = project.accumulated_work();
        let quantum_end = progress
            .saturating_add(self.config.quantum)
            .min(project.total_work());
        let project_id = project.id();

        debug!(project_id, tick, progress, quantum_end, "quantum started");
        self.event_log.log(Event::QuantumStarted {
            tick,
            project_id,
            accumulated_work: progress,
            quantum_end,
        });
        self.active = Some(ActiveQuantum {
            project,
            progress,
            quantum_end,
        });
    }

    fn next_due_command(&mut self, tick: usize) -> Result<Option<ScheduledCommand>, SimulationError> {
        match self.commands.peek_tick() {
            Some(due) if due == tick => Ok(self.commands.next_command()),
            Some(due) if due < tick => match self.commands.next_command() {
                Some(command) => {
                    warn!(tick, %command, "command scheduled for an earlier tick");
                    Err(SimulationError::CommandOutOfOrder {
                        command,
                        current_tick: tick,
                    })
                }
                None => Ok(None),
            },
            _ => Ok(None),
        }
    }

    fn dispatch(
        &mut self,
        command: Command,
        tick: usize,
        output: &mut Vec<OutputLine>,
    ) -> Result<(), SimulationError> {
        debug!(tick, %command, "dispatching command");
        if command.is_query() {
            self.sync_active_for_query()?;
        }
        match command {
            Command::Insert {
                project_id,
                total_work,
            } => self.open_project(project_id, total_work, tick),
            Command::Print { project_id } => {
                let projects = self
                    .index
                    .search(project_id)
                    .map(|project| vec![project.snapshot()])
                    .unwrap_or_default();
                self.answer_query(tick, project_id, project_id, projects, output);
                Ok(())
            }
            Command::PrintRange { low, high } => {
                let projects = self
                    .index
                    .range_query(low, high)
                    .iter()
                    .map(ProjectHandle::snapshot)
                    .collect();
                self.answer_query(tick, low, high, projects, output);
                Ok(())
            }
        }
    }

    fn open_project(
        &mut self,
        project_id: ProjectId,
        total_work: u64,
        tick: usize,
    ) -> Result<(), SimulationError> {
        let project = ProjectHandle::new(ProjectRecord::new(project_id, total_work)?);
        // The active project counts: it is open but not queued
        let capacity = self.queue.capacity();
        if self.index.len() >= capacity {
            warn!(project_id, tick, capacity, "open project limit reached");
            return Err(SimulationError::CapacityExceeded { capacity });
        }
        self.index.insert(project.clone())?;
        if let Err(err) = self.queue.insert(project) {
            warn!(project_id, tick, "progress queue full");
            // Leave the pair consistent even though the run is aborting
            self.index.remove(project_id)?;
            return Err(err.into());
        }

        self.event_log.log(Event::ProjectInserted {
            tick,
            project_id,
            total_work,
        });
        Ok(())
    }

    /// Publish the active project's progress before a query reads the index
    ///
    /// The published value is one unit ahead: it already counts the unit
    /// this tick is about to apply. Output depends on this.
    fn sync_active_for_query(&mut self) -> Result<(), SimulationError> {
        let pending = self
            .active
            .as_ref()
            .map(|active| (active.project.id(), active.progress + 1));
        if let Some((project_id, next_progress)) = pending {
            self.publish_progress(project_id, next_progress)?;
        }
        Ok(())
    }

    fn publish_progress(&mut self, project_id: ProjectId, work: u64) -> Result<(), SimulationError> {
        let project = self.index.search(project_id).ok_or_else(|| {
            SimulationError::IndexInconsistency(format!("active project {} is not open", project_id))
        })?;
        project.set_accumulated_work(work)?;
        Ok(())
    }

    fn answer_query(
        &mut self,
        tick: usize,
        low: ProjectId,
        high: ProjectId,
        projects: Vec<ProjectSnapshot>,
        output: &mut Vec<OutputLine>,
    ) {
        self.event_log.log(Event::QueryAnswered {
            tick,
            low,
            high,
            matches: projects.len(),
        });
        output.push(OutputLine::Query { projects });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::CommandSchedule;

    fn engine(commands: Vec<ScheduledCommand>) -> SimulationEngine {
        SimulationEngine::new(EngineConfig::default(), CommandSchedule::new(commands)).unwrap()
    }

    #[test]
    fn test_zero_quantum_rejected() {
        let config = EngineConfig {
            quantum: 0,
            ..EngineConfig::default()
        };
        let result = SimulationEngine::new(config, CommandSchedule::default());
        assert!(matches!(result, Err(SimulationError::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = EngineConfig {
            max_open_projects: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SimulationError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"quantum": 3}"#).unwrap();
        assert_eq!(config.quantum, 3);
        assert_eq!(config.max_open_projects, DEFAULT_MAX_OPEN_PROJECTS);
    }

    #[test]
    fn test_empty_engine_is_finished() {
        let engine = engine(vec![]);
        assert!(engine.is_finished());
        assert_eq!(engine.state(), EngineState::Idle);
    }

    #[test]
    fn test_insert_starts_work_on_same_tick() {
        let mut engine = engine(vec![ScheduledCommand::insert(0, 1, 10)]);
        let result = engine.tick().unwrap();

        assert_eq!(result.worked_on, Some(1));
        assert_eq!(result.commands_dispatched, 1);
        assert_eq!(
            engine.state(),
            EngineState::Working {
                project_id: 1,
                progress: 1,
                quantum_end: 5
            }
        );
    }

    #[test]
    fn test_quantum_capped_by_total_work() {
        let mut engine = engine(vec![ScheduledCommand::insert(0, 1, 3)]);
        engine.tick().unwrap();

        assert!(matches!(
            engine.state(),
            EngineState::Working { quantum_end: 3, .. }
        ));
    }

    #[test]
    fn test_out_of_order_command_is_fatal() {
        let mut engine = engine(vec![
            ScheduledCommand::insert(2, 1, 10),
            ScheduledCommand::insert(1, 2, 10),
        ]);
        engine.tick().unwrap();
        engine.tick().unwrap();

        let err = engine.tick().unwrap_err();
        assert!(matches!(
            err,
            SimulationError::CommandOutOfOrder { current_tick: 2, .. }
        ));
    }

    #[test]
    fn test_capacity_failure_leaves_index_untouched() {
        let config = EngineConfig {
            quantum: 5,
            max_open_projects: 1,
        };
        let commands = CommandSchedule::new(vec![
            ScheduledCommand::insert(0, 1, 10),
            ScheduledCommand::insert(0, 2, 10),
        ]);
        let mut engine = SimulationEngine::new(config, commands).unwrap();

        let err = engine.tick().unwrap_err();
        assert!(matches!(err, SimulationError::CapacityExceeded { capacity: 1 }));
        assert!(engine.index().search(1).is_some());
        assert!(engine.index().search(2).is_none());
    }

    #[test]
    fn test_active_project_counts_toward_capacity() {
        let config = EngineConfig {
            quantum: 5,
            max_open_projects: 1,
        };
        let commands = CommandSchedule::new(vec![
            ScheduledCommand::insert(0, 1, 10),
            ScheduledCommand::insert(1, 2, 10),
        ]);
        let mut engine = SimulationEngine::new(config, commands).unwrap();

        engine.tick().unwrap();
        let err = engine.tick().unwrap_err();

        assert!(matches!(err, SimulationError::CapacityExceeded { capacity: 1 }));
        assert_eq!(engine.index().len(), 1);
        assert!(engine.index().search(2).is_none());
        assert!(matches!(
            engine.state(),
            EngineState::Working { project_id: 1, .. }
        ));
        engine.check_consistency().unwrap();
    }

    #[test]
    fn test_full_engine_still_requeues_at_quantum_end() {
        let config = EngineConfig {
            quantum: 5,
            max_open_projects: 2,
        };
        let commands = CommandSchedule::new(vec![
            ScheduledCommand::insert(0, 1, 10),
            ScheduledCommand::insert(0, 2, 10),
        ]);
        let mut engine = SimulationEngine::new(config, commands).unwrap();

        for _ in 0..12 {
            engine.tick().unwrap();
            engine.check_consistency().unwrap();
        }
        assert_eq!(engine.index().len(), 2);
    }

    #[test]
    fn test_quantum_end_requeues_fresh_record() {
        let mut engine = engine(vec![ScheduledCommand::insert(0, 1, 20)]);
        for _ in 0..6 {
            engine.tick().unwrap();
        }

        // Tick 5 closed the first quantum and immediately restarted project 1
        let queued_in_index = engine.index().search(1).unwrap().clone();
        assert_eq!(queued_in_index.accumulated_work(), 5);
        assert!(matches!(
            engine.state(),
            EngineState::Working {
                project_id: 1,
                progress: 6,
                quantum_end: 10
            }
        ));
        assert_eq!(engine.event_log().events_of_type("QuantumEnded").len(), 1);
        engine.check_consistency().unwrap();
    }
}
