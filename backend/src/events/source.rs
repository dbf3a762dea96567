//! Command sources
//!
//! The engine pulls commands one at a time and dispatches every command
//! whose tick matches the current tick. Sources must yield commands in
//! non-decreasing tick order.

use crate::events::parser::{parse_commands, ParseError};
use crate::events::types::ScheduledCommand;
use std::collections::VecDeque;

/// Supplies commands to the engine in tick order
pub trait CommandSource {
    /// Tick of the next pending command, if any
    fn peek_tick(&self) -> Option<usize>;

    /// Take the next pending command
    fn next_command(&mut self) -> Option<ScheduledCommand>;

    /// True once every command has been taken
    fn is_exhausted(&self) -> bool {
        self.peek_tick().is_none()
    }
}

/// In-memory FIFO of commands
///
/// # Example
/// ```
/// use project_scheduler_core_rs::events::{CommandSchedule, CommandSource};
///
/// let mut schedule = CommandSchedule::parse("0: insert(1,5)\n4: print(1)").unwrap();
/// assert_eq!(schedule.len(), 2);
/// assert_eq!(schedule.peek_tick(), Some(0));
///
/// schedule.next_command();
/// assert_eq!(schedule.peek_tick(), Some(4));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CommandSchedule {
    pending: VecDeque<ScheduledCommand>,
}

impl CommandSchedule {
    pub fn new(commands: Vec<ScheduledCommand>) -> Self {
        Self {
            pending: commands.into(),
        }
    }

    /// Build a schedule from the textual command format
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        parse_commands(input).map(Self::new)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl From<Vec<ScheduledCommand>> for CommandSchedule {
    fn from(commands: Vec<ScheduledCommand>) -> Self {
        Self::new(commands)
    }
}

impl CommandSource for CommandSchedule {
    fn peek_tick(&self) -> Option<usize> {
        self.pending.front().map(|scheduled| scheduled.tick)
    }

    fn next_command(&mut self) -> Option<ScheduledCommand> {
        self.pending.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_preserves_order() {
        let mut schedule = CommandSchedule::new(vec![
            ScheduledCommand::insert(0, 1, 5),
            ScheduledCommand::insert(0, 2, 5),
            ScheduledCommand::print(3, 1),
        ]);

        assert_eq!(schedule.next_command(), Some(ScheduledCommand::insert(0, 1, 5)));
        assert_eq!(schedule.next_command(), Some(ScheduledCommand::insert(0, 2, 5)));
        assert_eq!(schedule.peek_tick(), Some(3));
        assert!(!schedule.is_exhausted());

        schedule.next_command();
        assert!(schedule.is_exhausted());
        assert_eq!(schedule.next_command(), None);
    }

    #[test]
    fn test_empty_schedule_is_exhausted() {
        let schedule = CommandSchedule::default();
        assert!(schedule.is_exhausted());
        assert!(schedule.is_empty());
    }
}
