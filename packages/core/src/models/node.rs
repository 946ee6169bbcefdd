//! Nested set node position
//!
//! A [`Node`] is the positional part of one tree row: its key, its interval
//! `[left, right]`, its depth and the partition (root value) it belongs to.
//! The same type serves nodes fetched from a table and nodes built in memory,
//! so the relation predicates in [`crate::models::relations`] apply to both.

use crate::models::relations;
use serde::{Deserialize, Serialize};

/// Identifier of a tree row (SQLite `INTEGER PRIMARY KEY`)
pub type NodeId = i64;

/// Position of a node inside its partition
///
/// # Examples
///
/// ```
/// use nestree_core::Node;
///
/// let clothing = Node::new(1, 1, 22, 0, 1);
/// let slacks = Node::new(5, 4, 5, 3, 1);
///
/// assert!(clothing.is_root());
/// assert!(slacks.is_leaf());
/// assert!(clothing.is_ancestor_of(&slacks));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Node {
    /// Primary key value
    pub id: NodeId,

    /// Left coordinate
    pub left: i64,

    /// Right coordinate, always greater than `left`
    pub right: i64,

    /// Depth below the partition root (root = 0)
    pub level: i64,

    /// Partition (root column) value
    pub root: i64,
}

impl Node {
    pub fn new(id: NodeId, left: i64, right: i64, level: i64, root: i64) -> Self {
        Self {
            id,
            left,
            right,
            level,
            root,
        }
    }

    /// True when the node starts its partition (`left == 1`)
    pub fn is_root(&self) -> bool {
        relations::is_root(self.left)
    }

    /// True when the node has no children (`right == left + 1`)
    pub fn is_leaf(&self) -> bool {
        relations::is_leaf(self.left, self.right)
    }

    /// Number of coordinates the subtree occupies (`2 * subtree node count`)
    pub fn span(&self) -> i64 {
        self.right - self.left + 1
    }

    /// Number of nodes in the subtree, the node included
    pub fn subtree_size(&self) -> i64 {
        self.span() / 2
    }

    pub fn is_equal(&self, other: &Node) -> bool {
        relations::is_equal(self, other)
    }

    /// True when `self` lies strictly inside `other`
    pub fn is_descendant_of(&self, other: &Node) -> bool {
        relations::is_descendant(self, other)
    }

    pub fn is_descendant_of_or_equal(&self, other: &Node) -> bool {
        relations::is_descendant_or_equal(self, other)
    }

    /// True when `self` strictly contains `other`
    pub fn is_ancestor_of(&self, other: &Node) -> bool {
        relations::is_ancestor(self, other)
    }
}
