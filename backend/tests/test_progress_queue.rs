//! Tests for the progress queue
//!
//! Extraction order must match a sort by (accumulated work, id), and the
//! heap property must survive any mix of inserts and extractions.

use project_scheduler_core_rs::{ProgressQueue, ProjectHandle, ProjectRecord, QueueError};
use proptest::prelude::*;

fn project(id: u64, accumulated: u64, total: u64) -> ProjectHandle {
    ProjectHandle::new(ProjectRecord::with_progress(id, accumulated, total).unwrap())
}

fn drain(queue: &mut ProgressQueue) -> Vec<u64> {
    let mut ids = Vec::new();
    while let Some(next) = queue.extract_min() {
        ids.push(next.id());
    }
    ids
}

#[test]
fn test_extract_from_empty_queue() {
    let mut queue = ProgressQueue::with_capacity(4);
    assert!(queue.is_empty());
    assert!(queue.extract_min().is_none());
}

#[test]
fn test_least_work_first() {
    let mut queue = ProgressQueue::with_capacity(8);
    queue.insert(project(1, 9, 20)).unwrap();
    queue.insert(project(2, 0, 20)).unwrap();
    queue.insert(project(3, 4, 20)).unwrap();

    assert_eq!(drain(&mut queue), vec![2, 3, 1]);
}

#[test]
fn test_equal_work_breaks_ties_by_id() {
    let mut queue = ProgressQueue::with_capacity(8);
    for id in [40, 7, 19, 3] {
        queue.insert(project(id, 5, 10)).unwrap();
    }

    assert_eq!(drain(&mut queue), vec![3, 7, 19, 40]);
}

#[test]
fn test_capacity_is_enforced() {
    let mut queue = ProgressQueue::with_capacity(2);
    queue.insert(project(1, 0, 5)).unwrap();
    queue.insert(project(2, 0, 5)).unwrap();

    assert_eq!(
        queue.insert(project(3, 0, 5)),
        Err(QueueError::CapacityExceeded { capacity: 2 })
    );
    assert_eq!(queue.len(), 2);

    // Room frees up after an extraction
    queue.extract_min().unwrap();
    queue.insert(project(3, 0, 5)).unwrap();
    assert_eq!(queue.len(), 2);
}

#[test]
fn test_extracted_handle_shares_record() {
    let mut queue = ProgressQueue::with_capacity(2);
    let original = project(5, 0, 10);
    queue.insert(original.clone()).unwrap();

    let extracted = queue.extract_min().unwrap();
    assert!(extracted.shares_record_with(&original));
}

proptest! {
    #[test]
    fn prop_extraction_matches_sorted_order(
        work in prop::collection::vec(0u64..50, 1..64)
    ) {
        let mut queue = ProgressQueue::with_capacity(work.len());
        let mut expected: Vec<(u64, u64)> = Vec::new();
        for (id, accumulated) in work.iter().enumerate() {
            let id = id as u64;
            queue.insert(project(id, *accumulated, 50)).unwrap();
            expected.push((*accumulated, id));
            prop_assert!(queue.is_heap_ordered());
        }
        expected.sort();

        let mut extracted = Vec::new();
        while let Some(next) = queue.extract_min() {
            prop_assert!(queue.is_heap_ordered());
            extracted.push(next.priority_key());
        }
        prop_assert_eq!(extracted, expected);
    }

    #[test]
    fn prop_interleaved_operations_keep_heap_order(
        ops in prop::collection::vec(prop::option::of(0u64..20), 1..100)
    ) {
        let mut queue = ProgressQueue::with_capacity(128);
        let mut model: Vec<(u64, u64)> = Vec::new();
        let mut next_id = 0u64;

        for op in ops {
            match op {
                Some(accumulated) => {
                    queue.insert(project(next_id, accumulated, 20)).unwrap();
                    model.push((accumulated, next_id));
                    next_id += 1;
                }
                None => {
                    model.sort();
                    let expected = if model.is_empty() { None } else { Some(model.remove(0)) };
                    let actual = queue.extract_min().map(|p| p.priority_key());
                    prop_assert_eq!(actual, expected);
                }
            }
            prop_assert!(queue.is_heap_ordered());
            prop_assert_eq!(queue.len(), model.len());
        }
    }
}
