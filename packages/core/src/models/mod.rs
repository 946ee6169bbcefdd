//! Data Models
//!
//! - `Node` - position of one row inside a nested set partition
//! - `relations` - structural predicates (leaf, root, ancestor, descendant)

mod node;
pub mod relations;

pub use node::{Node, NodeId};
