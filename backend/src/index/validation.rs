//! Structural validation for the identifier index
//!
//! Walks the whole tree and reports the first broken invariant:
//! - Ascending keys (binary-search-tree order)
//! - No red node with a red child
//! - Equal black height on every path
//! - Black root
//! - Parent links agree with child links, and every arena node is reachable
//!
//! O(n); intended for tests and debug assertions, not the hot path.

use super::tree::{Color, IdentifierIndex, NodeId};
use crate::models::project::ProjectId;
use thiserror::Error;

/// A broken red-black or linkage invariant
#[derive(Debug, Error, PartialEq)]
pub enum InvariantViolation {
    #[error("Root node {0} is red")]
    RedRoot(ProjectId),

    #[error("Root node {0} has a parent link")]
    RootHasParent(ProjectId),

    #[error("Key {key} is out of order")]
    OutOfOrder { key: ProjectId },

    #[error("Red node {parent} has red child {child}")]
    RedRedViolation { parent: ProjectId, child: ProjectId },

    #[error("Black height differs under node {key}: left {left}, right {right}")]
    BlackHeightMismatch {
        key: ProjectId,
        left: usize,
        right: usize,
    },

    #[error("Child {key} does not link back to its parent")]
    BrokenParentLink { key: ProjectId },

    #[error("Node keyed {key} holds project {project_id}")]
    KeyMismatch { key: ProjectId, project_id: ProjectId },

    #[error("Only {reachable} of {stored} stored nodes are reachable from the root")]
    UnreachableNodes { reachable: usize, stored: usize },
}

impl IdentifierIndex {
    /// Check every invariant and return the tree's black height
    ///
    /// Absent children are not counted, so an empty tree has black height 0.
    ///
    /// # Example
    /// ```
    /// use project_scheduler_core_rs::{IdentifierIndex, ProjectHandle, ProjectRecord};
    ///
    /// let mut index = IdentifierIndex::new();
    /// for id in 1..=10 {
    ///     index.insert(ProjectHandle::new(ProjectRecord::new(id, 3).unwrap())).unwrap();
    /// }
    /// assert!(index.validate().is_ok());
    /// ```
    pub fn validate(&self) -> Result<usize, InvariantViolation> {
        let Some(root) = self.root else {
            return if self.nodes.is_empty() {
                Ok(0)
            } else {
                Err(InvariantViolation::UnreachableNodes {
                    reachable: 0,
                    stored: self.nodes.len(),
                })
            };
        };

        let root_node = &self.nodes[root];
        if root_node.parent.is_some() {
            return Err(InvariantViolation::RootHasParent(root_node.key));
        }
        if root_node.color == Color::Red {
            return Err(InvariantViolation::RedRoot(root_node.key));
        }

        let mut reachable = 0;
        let height = self.check_subtree(root, None, None, &mut reachable)?;
        if reachable != self.nodes.len() {
            return Err(InvariantViolation::UnreachableNodes {
                reachable,
                stored: self.nodes.len(),
            });
        }
        Ok(height)
    }

    /// Black height of the subtree at `id`; keys must lie strictly in (lower, upper)
    fn check_subtree(
        &self,
        id: NodeId,
        lower: Option<ProjectId>,
        upper: Option<ProjectId>,
        reachable: &mut usize,
    ) -> Result<usize, InvariantViolation> {
        *reachable += 1;
        let node = &self.nodes[id];
        let key = node.key;

        if lower.is_some_and(|bound| key <= bound) || upper.is_some_and(|bound| key >= bound) {
            return Err(InvariantViolation::OutOfOrder { key });
        }
        let project_id = node.project.id();
        if project_id != key {
            return Err(InvariantViolation::KeyMismatch { key, project_id });
        }

        let mut heights = [0usize; 2];
        for (slot, (child, lo, hi)) in [
            (node.left, lower, Some(key)),
            (node.right, Some(key), upper),
        ]
        .into_iter()
        .enumerate()
        {
            let Some(child) = child else {
                continue;
            };
            let child_node = &self.nodes[child];
            if child_node.parent != Some(id) {
                return Err(InvariantViolation::BrokenParentLink {
                    key: child_node.key,
                });
            }
            if node.color == Color::Red && child_node.color == Color::Red {
                return Err(InvariantViolation::RedRedViolation {
                    parent: key,
                    child: child_node.key,
                });
            }
            heights[slot] = self.check_subtree(child, lo, hi, reachable)?;
        }

        let [left, right] = heights;
        if left != right {
            return Err(InvariantViolation::BlackHeightMismatch { key, left, right });
        }
        Ok(left + usize::from(node.color == Color::Black))
    }
}
