//! Textual command format
//!
//! One command per line, prefixed by its dispatch tick:
//!
//! ```text
//! 0: insert(5,25)
//! 9: print(5)
//! 12: print(1,100)
//! ```
//!
//! Command names are case-insensitive; `PrintBuilding` is accepted as an
//! alias of `print`. Whitespace around tokens is ignored and blank lines are
//! skipped.

use crate::events::types::{Command, ScheduledCommand};
use crate::models::project::ProjectId;
use thiserror::Error;

/// Why a line could not be parsed
#[derive(Debug, Error, PartialEq)]
pub enum ParseErrorReason {
    #[error("missing `T:` tick prefix")]
    MissingTick,

    #[error("invalid tick `{0}`")]
    InvalidTick(String),

    #[error("expected `name(arguments)`")]
    MalformedCall,

    #[error("unknown command `{0}`")]
    UnknownCommand(String),

    #[error("invalid argument `{0}`")]
    InvalidArgument(String),

    #[error("`{command}` takes {expected} argument(s), got {actual}")]
    WrongArity {
        command: String,
        expected: &'static str,
        actual: usize,
    },
}

/// A parse failure with its 1-based line number
#[derive(Debug, Error, PartialEq)]
#[error("line {line}: {reason}")]
pub struct ParseError {
    pub line: usize,
    pub reason: ParseErrorReason,
}

/// Parse a whole command file
///
/// # Example
/// ```
/// use project_scheduler_core_rs::events::{parse_commands, ScheduledCommand};
///
/// let commands = parse_commands("0: Insert(3,12)\n\n7: PrintBuilding(1,9)\n").unwrap();
/// assert_eq!(
///     commands,
///     vec![
///         ScheduledCommand::insert(0, 3, 12),
///         ScheduledCommand::print_range(7, 1, 9),
///     ]
/// );
/// ```
pub fn parse_commands(input: &str) -> Result<Vec<ScheduledCommand>, ParseError> {
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            parse_line(line).map_err(|reason| ParseError {
                line: index + 1,
                reason,
            })
        })
        .collect()
}

/// Parse a single `T: name(args)` line
pub fn parse_line(line: &str) -> Result<ScheduledCommand, ParseErrorReason> {
    let (tick, call) = line.split_once(':').ok_or(ParseErrorReason::MissingTick)?;
    let tick = tick.trim();
    let tick: usize = tick
        .parse()
        .map_err(|_| ParseErrorReason::InvalidTick(tick.to_string()))?;

    let call = call.trim();
    let (name, rest) = call.split_once('(').ok_or(ParseErrorReason::MalformedCall)?;
    let arguments = rest
        .trim_end()
        .strip_suffix(')')
        .ok_or(ParseErrorReason::MalformedCall)?;
    let name = name.trim().to_ascii_lowercase();
    let arguments = parse_arguments(arguments)?;

    let command = match (name.as_str(), arguments.as_slice()) {
        ("insert", &[project_id, total_work]) => Command::Insert {
            project_id,
            total_work,
        },
        ("insert", _) => {
            return Err(ParseErrorReason::WrongArity {
                command: name.clone(),
                expected: "2",
                actual: arguments.len(),
            })
        }
        ("print" | "printbuilding", &[project_id]) => Command::Print { project_id },
        ("print" | "printbuilding", &[low, high]) => Command::PrintRange { low, high },
        ("print" | "printbuilding", _) => {
            return Err(ParseErrorReason::WrongArity {
                command: name.clone(),
                expected: "1 or 2",
                actual: arguments.len(),
            })
        }
        _ => return Err(ParseErrorReason::UnknownCommand(name.clone())),
    };

    Ok(ScheduledCommand { tick, command })
}

fn parse_arguments(arguments: &str) -> Result<Vec<ProjectId>, ParseErrorReason> {
    if arguments.trim().is_empty() {
        return Ok(Vec::new());
    }
    arguments
        .split(',')
        .map(str::trim)
        .map(|arg| {
            arg.parse()
                .map_err(|_| ParseErrorReason::InvalidArgument(arg.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_insert() {
        assert_eq!(
            parse_line("0: insert(5,25)"),
            Ok(ScheduledCommand::insert(0, 5, 25))
        );
    }

    #[test]
    fn test_parse_tolerates_whitespace_and_case() {
        assert_eq!(
            parse_line("  12 :  Print( 3 , 40 ) "),
            Ok(ScheduledCommand::print_range(12, 3, 40))
        );
    }

    #[test]
    fn test_parse_legacy_print_alias() {
        assert_eq!(
            parse_line("4: PrintBuilding(9)"),
            Ok(ScheduledCommand::print(4, 9))
        );
    }

    #[test]
    fn test_missing_tick() {
        assert_eq!(parse_line("insert(1,2)"), Err(ParseErrorReason::MissingTick));
    }

    #[test]
    fn test_negative_tick_rejected() {
        assert_eq!(
            parse_line("-1: print(1)"),
            Err(ParseErrorReason::InvalidTick("-1".to_string()))
        );
    }

    #[test]
    fn test_missing_parenthesis() {
        assert_eq!(parse_line("3: print 1"), Err(ParseErrorReason::MalformedCall));
        assert_eq!(parse_line("3: print(1"), Err(ParseErrorReason::MalformedCall));
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            parse_line("3: delete(1)"),
            Err(ParseErrorReason::UnknownCommand("delete".to_string()))
        );
    }

    #[test]
    fn test_insert_arity() {
        assert_eq!(
            parse_line("3: insert(1)"),
            Err(ParseErrorReason::WrongArity {
                command: "insert".to_string(),
                expected: "2",
                actual: 1
            })
        );
    }

    #[test]
    fn test_print_without_arguments() {
        assert_eq!(
            parse_line("3: print()"),
            Err(ParseErrorReason::WrongArity {
                command: "print".to_string(),
                expected: "1 or 2",
                actual: 0
            })
        );
    }

    #[test]
    fn test_non_numeric_argument() {
        assert_eq!(
            parse_line("3: print(x)"),
            Err(ParseErrorReason::InvalidArgument("x".to_string()))
        );
    }

    #[test]
    fn test_error_reports_line_number() {
        let err = parse_commands("0: insert(1,2)\n\n2: bogus(1)").unwrap_err();
        assert_eq!(err.line, 3);
        assert_eq!(err.to_string(), "line 3: unknown command `bogus`");
    }
}
