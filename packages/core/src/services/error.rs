//! Service Layer Error Types
//!
//! Errors raised by the nested set reader, query factory, inspector and
//! writer. Storage failures are wrapped unchanged; nothing here is retried.

use crate::db::DatabaseError;
use crate::models::NodeId;
use thiserror::Error;

/// Nested set operation errors
#[derive(Error, Debug)]
pub enum NestedSetError {
    /// No row carries the given primary key
    ///
    /// Signals a stale id or corrupted data; callers should not retry.
    #[error("No node found with id {node_id}")]
    NodeNotFound { node_id: NodeId },

    /// A move would place a node inside itself or its own subtree
    ///
    /// Raised before any statement executes, so storage is untouched.
    #[error("Invalid node operation: {reason}")]
    InvalidNodeOperation { reason: String },

    /// A coordinate column holds something that is not an integer
    #[error("Column '{column}' does not hold an integer coordinate: {value}")]
    InvalidCoordinate { column: String, value: String },

    /// Caller supplied row data is not a JSON object
    #[error("Invalid row data: {0}")]
    InvalidRowData(String),

    /// Column configuration rejected
    #[error("Invalid nested set configuration: {0}")]
    InvalidConfig(String),

    /// Database operation failed
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),
}

impl NestedSetError {
    /// Create a node not found error
    pub fn node_not_found(node_id: NodeId) -> Self {
        Self::NodeNotFound { node_id }
    }

    /// Create an invalid node operation error
    pub fn invalid_operation(reason: impl Into<String>) -> Self {
        Self::InvalidNodeOperation {
            reason: reason.into(),
        }
    }

    /// Create an invalid coordinate error
    pub fn invalid_coordinate(column: impl Into<String>, value: impl Into<String>) -> Self {
        Self::InvalidCoordinate {
            column: column.into(),
            value: value.into(),
        }
    }

    /// Wrap a failed statement with context, keeping the driver error
    pub(crate) fn sql(context: &str, source: libsql::Error) -> Self {
        Self::Database(DatabaseError::statement(context, source))
    }
}

pub type Result<T> = std::result::Result<T, NestedSetError>;
