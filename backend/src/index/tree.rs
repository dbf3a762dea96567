//! Identifier index: a red-black tree keyed by project identifier
//!
//! Nodes live in an arena (`Vec<Node>`) and refer to each other by slot
//! number, so rotations and transplants are plain index rewrites. The arena
//! stays dense: when a node is removed, the last node moves into the freed
//! slot and its neighbours are repointed.
//!
//! Invariants restored after every insert and remove:
//!
//! 1. In-order traversal yields strictly ascending identifiers
//! 2. A red node never has a red child (absent children count as black)
//! 3. Every path from a node down to an absent child crosses the same number
//!    of black nodes
//! 4. The root is black
//!
//! See `validation.rs` for the checker.
//!
//! # Example
//!
//! ```rust
//! use project_scheduler_core_rs::{IdentifierIndex, ProjectHandle, ProjectRecord};
//!
//! let mut index = IdentifierIndex::new();
//! for (id, total) in [(20, 5), (4, 9), (13, 2)] {
//!     index.insert(ProjectHandle::new(ProjectRecord::new(id, total).unwrap())).unwrap();
//! }
//!
//! let ids: Vec<u64> = index.range_query(5, 20).iter().map(|p| p.id()).collect();
//! assert_eq!(ids, vec![13, 20]);
//! assert!(index.search(4).is_some());
//! assert!(index.search(5).is_none());
//! ```

use crate::models::project::{ProjectHandle, ProjectId};
use std::cmp::Ordering;
use thiserror::Error;

/// Arena slot of a tree node
pub(super) type NodeId = usize;

/// Errors raised by the identifier index
#[derive(Debug, Error, PartialEq)]
pub enum IndexError {
    #[error("Project {0} is already open")]
    DuplicateKey(ProjectId),

    #[error("Project {0} is not in the index")]
    NotFound(ProjectId),
}

/// Node color; black nodes count toward black height
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Black,
}

#[derive(Debug, Clone)]
pub(super) struct Node {
    pub(super) key: ProjectId,
    pub(super) project: ProjectHandle,
    pub(super) color: Color,
    pub(super) parent: Option<NodeId>,
    pub(super) left: Option<NodeId>,
    pub(super) right: Option<NodeId>,
}

/// Ordered map from project identifier to the open project's record
#[derive(Debug, Clone, Default)]
pub struct IdentifierIndex {
    pub(super) nodes: Vec<Node>,
    pub(super) root: Option<NodeId>,
}

impl IdentifierIndex {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            root: None,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Open a project in the index
    ///
    /// # Errors
    /// `DuplicateKey` if a project with the same identifier is already open;
    /// the index is left untouched.
    pub fn insert(&mut self, project: ProjectHandle) -> Result<(), IndexError> {
        let key = project.id();
        let mut parent = None;
        let mut cursor = self.root;
        while let Some(id) = cursor {
            parent = Some(id);
            cursor = match key.cmp(&self.nodes[id].key) {
                Ordering::Less => self.nodes[id].left,
                Ordering::Greater => self.nodes[id].right,
                Ordering::Equal => return Err(IndexError::DuplicateKey(key)),
            };
        }

        let node = self.nodes.len();
        self.nodes.push(Node {
            key,
            project,
            color: Color::Red,
            parent,
            left: None,
            right: None,
        });
        match parent {
            None => self.root = Some(node),
            Some(p) if key < self.nodes[p].key => self.nodes[p].left = Some(node),
            Some(p) => self.nodes[p].right = Some(node),
        }

        self.rebalance_after_insert(node);
        Ok(())
    }

    /// Look up an open project by identifier
    ///
    /// Absence is a normal outcome, not an error.
    pub fn search(&self, key: ProjectId) -> Option<&ProjectHandle> {
        self.find(key).map(|id| &self.nodes[id].project)
    }

    /// Remove a project from the index and hand back its record
    ///
    /// # Errors
    /// `NotFound` if no open project has this identifier.
    pub fn remove(&mut self, key: ProjectId) -> Result<ProjectHandle, IndexError> {
        let node = self.find(key).ok_or(IndexError::NotFound(key))?;
        self.unlink(node);
        Ok(self.release(node))
    }

    /// All open projects with `low <= id <= high`, ascending by id
    ///
    /// An inverted range (`low > high`) is empty.
    pub fn range_query(&self, low: ProjectId, high: ProjectId) -> Vec<ProjectHandle> {
        let mut found = Vec::new();
        if low <= high {
            self.collect_range(self.root, low, high, &mut found);
        }
        found
    }

    /// Every open project, ascending by id
    pub fn in_order(&self) -> Vec<ProjectHandle> {
        let mut ordered = Vec::with_capacity(self.nodes.len());
        let mut stack = Vec::new();
        let mut cursor = self.root;
        loop {
            while let Some(id) = cursor {
                stack.push(id);
                cursor = self.nodes[id].left;
            }
            let Some(id) = stack.pop() else {
                break;
            };
            ordered.push(self.nodes[id].project.clone());
            cursor = self.nodes[id].right;
        }
        ordered
    }

    fn find(&self, key: ProjectId) -> Option<NodeId> {
        let mut cursor = self.root;
        while let Some(id) = cursor {
            cursor = match key.cmp(&self.nodes[id].key) {
                Ordering::Less => self.nodes[id].left,
                Ordering::Greater => self.nodes[id].right,
                Ordering::Equal => return Some(id),
            };
        }
        None
    }

    fn collect_range(
        &self,
        node: Option<NodeId>,
        low: ProjectId,
        high: ProjectId,
        found: &mut Vec<ProjectHandle>,
    ) {
        let Some(id) = node else {
            return;
        };
        let key = self.nodes[id].key;
        if low < key {
            self.collect_range(self.nodes[id].left, low, high, found);
        }
        if low <= key && key <= high {
            found.push(self.nodes[id].project.clone());
        }
        if high > key {
            self.collect_range(self.nodes[id].right, low, high, found);
        }
    }

    // ------------------------------------------------------------------
    // Rebalancing
    // ------------------------------------------------------------------

    fn rebalance_after_insert(&mut self, mut node: NodeId) {
        while let Some(mut parent) = self.nodes[node].parent {
            if self.nodes[parent].color == Color::Black {
                break;
            }
            // A red parent is never the root
            let Some(grandparent) = self.nodes[parent].parent else {
                break;
            };
            let parent_is_left = self.nodes[grandparent].left == Some(parent);
            let uncle = if parent_is_left {
                self.nodes[grandparent].right
            } else {
                self.nodes[grandparent].left
            };

            if let Some(uncle) = uncle.filter(|&u| self.nodes[u].color == Color::Red) {
                self.nodes[parent].color = Color::Black;
                self.nodes[uncle].color = Color::Black;
                self.nodes[grandparent].color = Color::Red;
                node = grandparent;
                continue;
            }

            if parent_is_left {
                if self.nodes[parent].right == Some(node) {
                    self.rotate_left(parent);
                    std::mem::swap(&mut node, &mut parent);
                }
                self.nodes[parent].color = Color::Black;
                self.nodes[grandparent].color = Color::Red;
                self.rotate_right(grandparent);
            } else {
                if self.nodes[parent].left == Some(node) {
                    self.rotate_right(parent);
                    std::mem::swap(&mut node, &mut parent);
                }
                self.nodes[parent].color = Color::Black;
                self.nodes[grandparent].color = Color::Red;
                self.rotate_left(grandparent);
            }
        }

        if let Some(root) = self.root {
            self.nodes[root].color = Color::Black;
        }
    }

    /// Detach `node` from the tree, leaving its arena slot unreferenced
    fn unlink(&mut self, node: NodeId) {
        let left = self.nodes[node].left;
        let right = self.nodes[node].right;

        let (child, parent, removed_color) = match (left, right) {
            (Some(left), Some(right)) => {
                // Splice the in-order successor into the removed node's place
                let successor = self.leftmost(right);
                let child = self.nodes[successor].right;
                let mut parent = self.nodes[successor].parent;
                let removed_color = self.nodes[successor].color;

                let node_parent = self.nodes[node].parent;
                self.replace_child(node_parent, node, Some(successor));

                if parent == Some(node) {
                    parent = Some(successor);
                } else {
                    if let Some(child) = child {
                        self.nodes[child].parent = parent;
                    }
                    if let Some(p) = parent {
                        self.nodes[p].left = child;
                    }
                    self.nodes[successor].right = Some(right);
                    self.nodes[right].parent = Some(successor);
                }

                self.nodes[successor].color = self.nodes[node].color;
                self.nodes[successor].left = Some(left);
                self.nodes[left].parent = Some(successor);

                (child, parent, removed_color)
            }
            _ => {
                let child = left.or(right);
                let parent = self.nodes[node].parent;
                self.replace_child(parent, node, child);
                (child, parent, self.nodes[node].color)
            }
        };

        if removed_color == Color::Black {
            self.rebalance_after_remove(child, parent);
        }
    }

    fn rebalance_after_remove(&mut self, mut node: Option<NodeId>, mut parent: Option<NodeId>) {
        while node != self.root && !self.is_red(node) {
            let Some(p) = parent else {
                break;
            };

            if self.nodes[p].left == node {
                let Some(mut sibling) = self.nodes[p].right else {
                    break;
                };
                if self.is_red(Some(sibling)) {
                    self.nodes[sibling].color = Color::Black;
                    self.nodes[p].color = Color::Red;
                    self.rotate_left(p);
                    let Some(s) = self.nodes[p].right else {
                        break;
                    };
                    sibling = s;
                }

                if !self.is_red(self.nodes[sibling].left) && !self.is_red(self.nodes[sibling].right) {
                    self.nodes[sibling].color = Color::Red;
                    node = Some(p);
                    parent = self.nodes[p].parent;
                } else {
                    if !self.is_red(self.nodes[sibling].right) {
                        if let Some(near) = self.nodes[sibling].left {
                            self.nodes[near].color = Color::Black;
                        }
                        self.nodes[sibling].color = Color::Red;
                        self.rotate_right(sibling);
                        let Some(s) = self.nodes[p].right else {
                            break;
                        };
                        sibling = s;
                    }
                    self.nodes[sibling].color = self.nodes[p].color;
                    self.nodes[p].color = Color::Black;
                    if let Some(far) = self.nodes[sibling].right {
                        self.nodes[far].color = Color::Black;
                    }
                    self.rotate_left(p);
                    node = self.root;
                    break;
                }
            } else {
                let Some(mut sibling) = self.nodes[p].left else {
                    break;
                };
                if self.is_red(Some(sibling)) {
                    self.nodes[sibling].color = Color::Black;
                    self.nodes[p].color = Color::Red;
                    self.rotate_right(p);
                    let Some(s) = self.nodes[p].left else {
                        break;
                    };
                    sibling = s;
                }

                if !self.is_red(self.nodes[sibling].left) && !self.is_red(self.nodes[sibling].right) {
                    self.nodes[sibling].color = Color::Red;
                    node = Some(p);
                    parent = self.nodes[p].parent;
                } else {
                    if !self.is_red(self.nodes[sibling].left) {
                        if let Some(near) = self.nodes[sibling].right {
                            self.nodes[near].color = Color::Black;
                        }
                        self.nodes[sibling].color = Color::Red;
                        self.rotate_left(sibling);
                        let Some(s) = self.nodes[p].left else {
                            break;
                        };
                        sibling = s;
                    }
                    self.nodes[sibling].color = self.nodes[p].color;
                    self.nodes[p].color = Color::Black;
                    if let Some(far) = self.nodes[sibling].left {
                        self.nodes[far].color = Color::Black;
                    }
                    self.rotate_right(p);
                    node = self.root;
                    break;
                }
            }
        }

        if let Some(node) = node {
            self.nodes[node].color = Color::Black;
        }
    }

    // ------------------------------------------------------------------
    // Structural primitives
    // ------------------------------------------------------------------

    fn rotate_left(&mut self, node: NodeId) {
        let Some(pivot) = self.nodes[node].right else {
            return;
        };
        let inner = self.nodes[pivot].left;
        self.nodes[node].right = inner;
        if let Some(inner) = inner {
            self.nodes[inner].parent = Some(node);
        }
        let parent = self.nodes[node].parent;
        self.replace_child(parent, node, Some(pivot));
        self.nodes[pivot].left = Some(node);
        self.nodes[node].parent = Some(pivot);
    }

    fn rotate_right(&mut self, node: NodeId) {
        let Some(pivot) = self.nodes[node].left else {
            return;
        };
        let inner = self.nodes[pivot].right;
        self.nodes[node].left = inner;
        if let Some(inner) = inner {
            self.nodes[inner].parent = Some(node);
        }
        let parent = self.nodes[node].parent;
        self.replace_child(parent, node, Some(pivot));
        self.nodes[pivot].right = Some(node);
        self.nodes[node].parent = Some(pivot);
    }

    /// Point `parent`'s link to `old` (or the root, if `parent` is None) at `new`
    fn replace_child(&mut self, parent: Option<NodeId>, old: NodeId, new: Option<NodeId>) {
        match parent {
            None => self.root = new,
            Some(p) if self.nodes[p].left == Some(old) => self.nodes[p].left = new,
            Some(p) => self.nodes[p].right = new,
        }
        if let Some(new) = new {
            self.nodes[new].parent = parent;
        }
    }

    fn leftmost(&self, mut node: NodeId) -> NodeId {
        while let Some(left) = self.nodes[node].left {
            node = left;
        }
        node
    }

    fn is_red(&self, node: Option<NodeId>) -> bool {
        node.is_some_and(|id| self.nodes[id].color == Color::Red)
    }

    /// Free an unlinked slot, moving the last arena node into it
    fn release(&mut self, slot: NodeId) -> ProjectHandle {
        let last = self.nodes.len() - 1;
        if slot != last {
            let moved = &self.nodes[last];
            let (parent, left, right) = (moved.parent, moved.left, moved.right);
            match parent {
                None => self.root = Some(slot),
                Some(p) if self.nodes[p].left == Some(last) => self.nodes[p].left = Some(slot),
                Some(p) => self.nodes[p].right = Some(slot),
            }
            for child in [left, right].into_iter().flatten() {
                self.nodes[child].parent = Some(slot);
            }
        }
        self.nodes.swap_remove(slot).project
    }
}
