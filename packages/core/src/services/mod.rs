//! Nested Set Services
//!
//! - `NestedSet` - validated entry point handing out the components below
//! - `NodeStore` - resolves node ids into positions
//! - `NestedSetQueryFactory` - read queries (roots, children, subtrees, parents)
//! - `NestedSetWriter` - inserts, moves and deletes inside a caller transaction
//! - `NodeInspector` - structural predicates by node id
//! - `validation` - partition self-check
//!
//! All components share one [`crate::config::ColumnNames`] and take the
//! connection, table and root column on every call.

pub mod error;
pub mod inspector;
pub mod nested_set;
pub mod node_store;
pub mod query_factory;
pub mod validation;
pub mod writer;

pub use error::{NestedSetError, Result};
pub use inspector::NodeInspector;
pub use nested_set::NestedSet;
pub use node_store::NodeStore;
pub use query_factory::{NestedSetQueryFactory, DEFAULT_MIN_CHILD_LEVEL};
pub use validation::{check_partition, validate_partition, TreeViolation};
pub use writer::{NestedSetWriter, TreePosition};
