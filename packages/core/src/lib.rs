//! Nestree Core
//!
//! Hierarchical data stored in a relational table with the nested set
//! (modified preorder tree traversal) model. Every node carries `left`,
//! `right` and `level` coordinates plus a root value that partitions one
//! table into independent trees; reads and writes are plain set-based SQL,
//! never recursive.
//!
//! # Modules
//!
//! - [`models`] - `Node` positions and the structural predicates over them
//! - [`config`] - column naming
//! - [`services`] - reader, query factory, writer, inspector and validation
//! - [`db`] - libsql database service and SQL building blocks
//!
//! # Transactions
//!
//! Writes take a `libsql::Transaction`. An insert, move or delete runs
//! several statements, and the partition is only consistent again after the
//! last one; commit or roll back is up to the caller.

pub mod config;
pub mod db;
pub mod models;
pub mod services;

pub use config::{ColumnNames, NestedSetConfig};
pub use models::{Node, NodeId};
pub use services::{
    NestedSet, NestedSetError, NestedSetQueryFactory, NestedSetWriter, NodeInspector, NodeStore,
    TreePosition, TreeViolation, DEFAULT_MIN_CHILD_LEVEL,
};
