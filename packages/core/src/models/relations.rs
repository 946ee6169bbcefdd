//! Structural relations between nested set nodes
//!
//! Pure functions over `(left, right, root)`. Nodes from different
//! partitions are never related.

use crate::models::Node;

/// A node is a leaf when its interval holds no other coordinate
pub fn is_leaf(left: i64, right: i64) -> bool {
    right - left == 1
}

pub fn is_root(left: i64) -> bool {
    left == 1
}

/// Same interval in the same partition
pub fn is_equal(a: &Node, b: &Node) -> bool {
    a.left == b.left && a.right == b.right && a.root == b.root
}

/// `a` lies strictly inside `b`
pub fn is_descendant(a: &Node, b: &Node) -> bool {
    a.left > b.left && a.right < b.right && a.root == b.root
}

/// `a` lies inside `b` or is `b`
pub fn is_descendant_or_equal(a: &Node, b: &Node) -> bool {
    a.left >= b.left && a.right <= b.right && a.root == b.root
}

/// `a` strictly contains `b`
pub fn is_ancestor(a: &Node, b: &Node) -> bool {
    a.left < b.left && a.right > b.right && a.root == b.root
}
