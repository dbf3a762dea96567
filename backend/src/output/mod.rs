//! Result lines and the sinks that receive them
//!
//! Wire format, one line per engine event:
//! - Query: `(id,work,total)` tuples joined by `,`, ascending by id, or
//!   `(0,0,0)` when nothing matched
//! - Completion: `(id,tick)`

use crate::models::project::{ProjectId, ProjectSnapshot};
use serde::Serialize;
use std::fmt;
use std::io::{self, Write};

/// Placeholder printed for a query with no matching project
pub const EMPTY_QUERY: &str = "(0,0,0)";

/// One line of engine output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputLine {
    /// Answer to a print command
    Query { projects: Vec<ProjectSnapshot> },

    /// A project reached its total work
    Completion { project_id: ProjectId, tick: usize },
}

impl fmt::Display for OutputLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputLine::Query { projects } if projects.is_empty() => f.write_str(EMPTY_QUERY),
            OutputLine::Query { projects } => {
                for (i, project) in projects.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", project)?;
                }
                Ok(())
            }
            OutputLine::Completion { project_id, tick } => write!(f, "({},{})", project_id, tick),
        }
    }
}

/// Receives formatted engine output
pub trait ResultSink {
    fn accept(&mut self, line: &OutputLine) -> io::Result<()>;
}

/// Collects the rendered lines in memory
impl ResultSink for Vec<String> {
    fn accept(&mut self, line: &OutputLine) -> io::Result<()> {
        self.push(line.to_string());
        Ok(())
    }
}

/// Writes one rendered line per event to any `io::Write`
#[derive(Debug)]
pub struct WriterSink<W: Write> {
    writer: W,
    lines_written: usize,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            lines_written: 0,
        }
    }

    pub fn lines_written(&self) -> usize {
        self.lines_written
    }

    /// Flush and hand back the underlying writer
    pub fn finish(mut self) -> io::Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

impl<W: Write> ResultSink for WriterSink<W> {
    fn accept(&mut self, line: &OutputLine) -> io::Result<()> {
        writeln!(self.writer, "{}", line)?;
        self.lines_written += 1;
        Ok(())
    }
}
