//! Commands: structured types, sources, and the textual format

pub mod parser;
pub mod source;
pub mod types;

pub use parser::{parse_commands, parse_line, ParseError, ParseErrorReason};
pub use source::{CommandSchedule, CommandSource};
pub use types::{Command, ScheduledCommand};
