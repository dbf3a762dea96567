//! Progress queue: a bounded binary min-heap of open projects
//!
//! Ordered by (accumulated work, identifier). The heap is laid out
//! 1-indexed: the root is position 1, the children of position `i` are
//! `2i` and `2i + 1`, and the parent of `i` is `i / 2`. Position `i` lives
//! at `slots[i - 1]`.
//!
//! # Example
//!
//! ```rust
//! use project_scheduler_core_rs::{ProgressQueue, ProjectHandle, ProjectRecord};
//!
//! let mut queue = ProgressQueue::with_capacity(8);
//! queue.insert(ProjectHandle::new(ProjectRecord::with_progress(3, 5, 10).unwrap())).unwrap();
//! queue.insert(ProjectHandle::new(ProjectRecord::with_progress(7, 0, 10).unwrap())).unwrap();
//!
//! assert_eq!(queue.extract_min().map(|p| p.id()), Some(7));
//! assert_eq!(queue.extract_min().map(|p| p.id()), Some(3));
//! assert!(queue.is_empty());
//! ```

use crate::models::project::ProjectHandle;
use thiserror::Error;

const ROOT: usize = 1;

/// Errors raised by the progress queue
#[derive(Debug, Error, PartialEq)]
pub enum QueueError {
    #[error("Progress queue is full ({capacity} projects)")]
    CapacityExceeded { capacity: usize },
}

/// Bounded min-heap over shared project handles
#[derive(Debug, Clone)]
pub struct ProgressQueue {
    slots: Vec<ProjectHandle>,
    capacity: usize,
}

impl ProgressQueue {
    /// Create an empty queue that can hold at most `capacity` projects
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Add a project, sifting it up past every parent it precedes
    ///
    /// # Errors
    /// `CapacityExceeded` when the queue already holds `capacity` projects.
    pub fn insert(&mut self, project: ProjectHandle) -> Result<(), QueueError> {
        if self.slots.len() >= self.capacity {
            return Err(QueueError::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        self.slots.push(project);
        self.sift_up(self.slots.len());
        Ok(())
    }

    /// Remove and return the least-progressed project
    pub fn extract_min(&mut self) -> Option<ProjectHandle> {
        if self.slots.is_empty() {
            return None;
        }
        let last = self.slots.len();
        self.swap(ROOT, last);
        let min = self.slots.pop();
        self.sift_down(ROOT);
        min
    }

    /// Check the heap property: no element precedes its parent
    pub fn is_heap_ordered(&self) -> bool {
        (ROOT + 1..=self.slots.len()).all(|pos| !self.at(pos).precedes(self.at(parent(pos))))
    }

    /// Queued projects in heap (not priority) order
    pub fn iter(&self) -> impl Iterator<Item = &ProjectHandle> {
        self.slots.iter()
    }

    fn sift_up(&mut self, mut pos: usize) {
        while pos > ROOT {
            let up = parent(pos);
            if self.at(up).precedes(self.at(pos)) {
                break;
            }
            self.swap(pos, up);
            pos = up;
        }
    }

    fn sift_down(&mut self, mut pos: usize) {
        let size = self.slots.len();
        while left_child(pos) <= size {
            let mut child = left_child(pos);
            let right = child + 1;
            if right <= size && !self.at(child).precedes(self.at(right)) {
                child = right;
            }
            if self.at(pos).precedes(self.at(child)) {
                break;
            }
            self.swap(pos, child);
            pos = child;
        }
    }

    fn at(&self, pos: usize) -> &ProjectHandle {
        &self.slots[pos - 1]
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.slots.swap(a - 1, b - 1);
    }
}

fn parent(pos: usize) -> usize {
    pos / 2
}

fn left_child(pos: usize) -> usize {
    2 * pos
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::project::ProjectRecord;

    fn project(id: u64, work: u64, total: u64) -> ProjectHandle {
        ProjectHandle::new(ProjectRecord::with_progress(id, work, total).unwrap())
    }

    #[test]
    fn test_new_queue_is_empty() {
        let mut queue = ProgressQueue::with_capacity(4);
        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);
        assert!(queue.extract_min().is_none());
    }

    #[test]
    fn test_lower_work_extracted_first() {
        let mut queue = ProgressQueue::with_capacity(4);
        queue.insert(project(1, 0, 10)).unwrap();
        queue.insert(project(2, 2, 10)).unwrap();

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.extract_min().unwrap().id(), 1);
        assert_eq!(queue.extract_min().unwrap().id(), 2);
    }

    #[test]
    fn test_equal_work_breaks_tie_by_id() {
        let mut queue = ProgressQueue::with_capacity(4);
        queue.insert(project(10, 2, 10)).unwrap();
        queue.insert(project(5, 2, 10)).unwrap();
        queue.insert(project(4, 2, 10)).unwrap();

        assert_eq!(queue.extract_min().unwrap().id(), 4);
        assert_eq!(queue.extract_min().unwrap().id(), 5);
        assert_eq!(queue.extract_min().unwrap().id(), 10);
    }

    #[test]
    fn test_minimum_work_wins_regardless_of_id() {
        let mut queue = ProgressQueue::with_capacity(4);
        queue.insert(project(1, 3, 10)).unwrap();
        queue.insert(project(2, 2, 10)).unwrap();
        queue.insert(project(3, 1, 10)).unwrap();

        assert_eq!(queue.extract_min().unwrap().accumulated_work(), 1);
    }

    #[test]
    fn test_capacity_is_enforced() {
        let mut queue = ProgressQueue::with_capacity(2);
        queue.insert(project(1, 0, 10)).unwrap();
        queue.insert(project(2, 0, 10)).unwrap();

        assert_eq!(
            queue.insert(project(3, 0, 10)),
            Err(QueueError::CapacityExceeded { capacity: 2 })
        );
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_extraction_frees_capacity() {
        let mut queue = ProgressQueue::with_capacity(1);
        queue.insert(project(1, 0, 10)).unwrap();
        queue.extract_min();

        assert!(queue.insert(project(2, 0, 10)).is_ok());
    }

    #[test]
    fn test_mixed_work_extraction_order() {
        let mut queue = ProgressQueue::with_capacity(8);
        for (id, work) in [(4, 3), (9, 1), (2, 1), (7, 0)] {
            queue.insert(project(id, work, 10)).unwrap();
        }

        assert!(queue.is_heap_ordered());
        assert_eq!(queue.extract_min().unwrap().id(), 7);
        assert_eq!(queue.extract_min().unwrap().id(), 2);
        assert!(queue.is_heap_ordered());
    }

    #[test]
    fn test_queue_holds_shared_records() {
        let handle = project(1, 0, 10);
        let mut queue = ProgressQueue::with_capacity(2);
        queue.insert(handle.clone()).unwrap();

        let extracted = queue.extract_min().unwrap();
        assert!(extracted.shares_record_with(&handle));
    }
}
