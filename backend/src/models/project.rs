//! Project model
//!
//! Represents a construction project competing for the single work resource.
//! Each project has:
//! - An identifier, unique among open projects
//! - Accumulated work (units applied so far)
//! - Total work (units needed to complete, fixed at creation)
//!
//! A newly opened project's record is held by both the progress queue and
//! the identifier index through one [`ProjectHandle`]; writes through one
//! handle are visible through every clone of it. At its first quantum
//! boundary the project re-enters the queue as a fresh record, and from then
//! on the index entry is kept current by explicit writes.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

/// Project identifier
pub type ProjectId = u64;

/// Errors that can occur when building or updating a project record
#[derive(Debug, Error, PartialEq)]
pub enum ProjectError {
    #[error("Project {project_id} must have positive total work")]
    ZeroTotalWork { project_id: ProjectId },

    #[error("Accumulated work {accumulated} exceeds total work {total} for project {project_id}")]
    WorkExceedsTotal {
        project_id: ProjectId,
        accumulated: u64,
        total: u64,
    },
}

/// A construction project and its progress
///
/// # Example
/// ```
/// use project_scheduler_core_rs::ProjectRecord;
///
/// let project = ProjectRecord::new(7, 20).unwrap();
/// assert_eq!(project.id(), 7);
/// assert_eq!(project.accumulated_work(), 0);
/// assert!(!project.is_complete());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRecord {
    id: ProjectId,
    accumulated_work: u64,
    total_work: u64,
}

impl ProjectRecord {
    /// Create a fresh project with no work applied
    pub fn new(id: ProjectId, total_work: u64) -> Result<Self, ProjectError> {
        Self::with_progress(id, 0, total_work)
    }

    /// Create a project record that already carries progress
    ///
    /// Used when a project yields at a quantum boundary and re-enters the
    /// queue as a fresh record.
    pub fn with_progress(
        id: ProjectId,
        accumulated_work: u64,
        total_work: u64,
    ) -> Result<Self, ProjectError> {
        if total_work == 0 {
            return Err(ProjectError::ZeroTotalWork { project_id: id });
        }
        if accumulated_work > total_work {
            return Err(ProjectError::WorkExceedsTotal {
                project_id: id,
                accumulated: accumulated_work,
                total: total_work,
            });
        }
        Ok(Self {
            id,
            accumulated_work,
            total_work,
        })
    }

    pub fn id(&self) -> ProjectId {
        self.id
    }

    pub fn accumulated_work(&self) -> u64 {
        self.accumulated_work
    }

    pub fn total_work(&self) -> u64 {
        self.total_work
    }

    pub fn is_complete(&self) -> bool {
        self.accumulated_work == self.total_work
    }

    /// Overwrite accumulated work
    ///
    /// # Errors
    /// `WorkExceedsTotal` if `work` is larger than the project's total work.
    pub fn set_accumulated_work(&mut self, work: u64) -> Result<(), ProjectError> {
        if work > self.total_work {
            return Err(ProjectError::WorkExceedsTotal {
                project_id: self.id,
                accumulated: work,
                total: self.total_work,
            });
        }
        self.accumulated_work = work;
        Ok(())
    }

    /// Scheduling order: least accumulated work first, identifier breaks ties
    ///
    /// # Example
    /// ```
    /// use project_scheduler_core_rs::ProjectRecord;
    ///
    /// let a = ProjectRecord::with_progress(4, 2, 10).unwrap();
    /// let b = ProjectRecord::with_progress(9, 2, 10).unwrap();
    /// assert!(a.precedes(&b));
    /// assert!(!b.precedes(&a));
    /// ```
    pub fn precedes(&self, other: &ProjectRecord) -> bool {
        self.priority_key() < other.priority_key()
    }

    /// The (accumulated work, identifier) pair the progress queue orders by
    pub fn priority_key(&self) -> (u64, ProjectId) {
        (self.accumulated_work, self.id)
    }

    pub fn snapshot(&self) -> ProjectSnapshot {
        ProjectSnapshot {
            project_id: self.id,
            accumulated_work: self.accumulated_work,
            total_work: self.total_work,
        }
    }
}

/// Shared, mutable reference to a project record
///
/// Cloning the handle shares the record; it never copies it. The handle is
/// deliberately `!Send`: the scheduler is single-threaded.
#[derive(Debug, Clone)]
pub struct ProjectHandle(Rc<RefCell<ProjectRecord>>);

impl ProjectHandle {
    pub fn new(record: ProjectRecord) -> Self {
        Self(Rc::new(RefCell::new(record)))
    }

    pub fn id(&self) -> ProjectId {
        self.0.borrow().id()
    }

    pub fn accumulated_work(&self) -> u64 {
        self.0.borrow().accumulated_work()
    }

    pub fn total_work(&self) -> u64 {
        self.0.borrow().total_work()
    }

    pub fn priority_key(&self) -> (u64, ProjectId) {
        self.0.borrow().priority_key()
    }

    pub fn precedes(&self, other: &ProjectHandle) -> bool {
        self.priority_key() < other.priority_key()
    }

    pub fn set_accumulated_work(&self, work: u64) -> Result<(), ProjectError> {
        self.0.borrow_mut().set_accumulated_work(work)
    }

    pub fn snapshot(&self) -> ProjectSnapshot {
        self.0.borrow().snapshot()
    }

    /// True when both handles point at the same record
    pub fn shares_record_with(&self, other: &ProjectHandle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl From<ProjectRecord> for ProjectHandle {
    fn from(record: ProjectRecord) -> Self {
        Self::new(record)
    }
}

/// Immutable copy of a project's state, as reported to the output sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    pub project_id: ProjectId,
    pub accumulated_work: u64,
    pub total_work: u64,
}

impl fmt::Display for ProjectSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({},{},{})",
            self.project_id, self.accumulated_work, self.total_work
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_total_work_rejected() {
        assert_eq!(
            ProjectRecord::new(3, 0),
            Err(ProjectError::ZeroTotalWork { project_id: 3 })
        );
    }

    #[test]
    fn test_progress_beyond_total_rejected() {
        let err = ProjectRecord::with_progress(1, 11, 10).unwrap_err();
        assert_eq!(
            err,
            ProjectError::WorkExceedsTotal {
                project_id: 1,
                accumulated: 11,
                total: 10
            }
        );
    }

    #[test]
    fn test_precedes_is_strict() {
        let a = ProjectRecord::with_progress(1, 3, 10).unwrap();
        assert!(!a.precedes(&a.clone()));
    }

    #[test]
    fn test_handle_clones_share_record() {
        let handle = ProjectHandle::new(ProjectRecord::new(5, 10).unwrap());
        let alias = handle.clone();

        alias.set_accumulated_work(4).unwrap();

        assert_eq!(handle.accumulated_work(), 4);
        assert!(handle.shares_record_with(&alias));
    }

    #[test]
    fn test_fresh_handle_does_not_share() {
        let a = ProjectHandle::new(ProjectRecord::new(5, 10).unwrap());
        let b = ProjectHandle::new(ProjectRecord::new(5, 10).unwrap());
        assert!(!a.shares_record_with(&b));
    }

    #[test]
    fn test_snapshot_display() {
        let record = ProjectRecord::with_progress(12, 4, 30).unwrap();
        assert_eq!(record.snapshot().to_string(), "(12,4,30)");
    }
}
