//! Database Error Types
//!
//! Failures opening a database or running a statement. The libsql error is
//! kept as the `source` so callers can still tell a constraint violation
//! from a busy database.

use std::path::PathBuf;
use thiserror::Error;

/// Database layer errors
///
/// Tree-level failures (missing nodes, illegal moves) are reported by
/// [`NestedSetError`](crate::services::NestedSetError), which wraps this type.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Empty database path
    #[error("Invalid database path: '{}'", path.display())]
    InvalidPath { path: PathBuf },

    /// Parent directory of the database file could not be created
    #[error("Failed to create directory for database at {}: {source}", path.display())]
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Opening the database or one of its connections failed
    #[error("Failed to connect to database at {}: {source}", path.display())]
    ConnectionFailed {
        path: PathBuf,
        source: libsql::Error,
    },

    /// A statement failed to prepare, execute or step
    #[error("{context}: {source}")]
    Statement {
        context: String,
        source: libsql::Error,
    },
}

impl DatabaseError {
    pub fn invalid_path(path: PathBuf) -> Self {
        Self::InvalidPath { path }
    }

    pub fn directory_creation_failed(path: PathBuf, source: std::io::Error) -> Self {
        Self::DirectoryCreationFailed { path, source }
    }

    pub fn connection_failed(path: PathBuf, source: libsql::Error) -> Self {
        Self::ConnectionFailed { path, source }
    }

    /// Wrap a failed statement, keeping the driver error
    pub fn statement(context: impl Into<String>, source: libsql::Error) -> Self {
        Self::Statement {
            context: context.into(),
            source,
        }
    }

    /// The underlying driver error, if any
    pub fn libsql_error(&self) -> Option<&libsql::Error> {
        match self {
            Self::ConnectionFailed { source, .. } | Self::Statement { source, .. } => Some(source),
            Self::InvalidPath { .. } | Self::DirectoryCreationFailed { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_statement_keeps_driver_error() {
        let err = DatabaseError::statement(
            "Failed to shift subsequent nodes",
            libsql::Error::ConnectionFailed("closed".to_string()),
        );

        assert!(err.to_string().starts_with("Failed to shift subsequent nodes: "));
        assert!(err.source().is_some());
        assert!(matches!(
            err.libsql_error(),
            Some(libsql::Error::ConnectionFailed(_))
        ));
    }

    #[test]
    fn test_path_errors_have_no_driver_error() {
        let err = DatabaseError::invalid_path(PathBuf::new());
        assert!(err.libsql_error().is_none());
        assert!(err.source().is_none());
    }
}
