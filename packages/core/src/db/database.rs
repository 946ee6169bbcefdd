//! Database Connection Management
//!
//! Opens libsql databases for the nested set engine. The engine never creates
//! or migrates tables itself; callers own their schema and hand connections
//! (or transactions) to the reader, query factory and writer.
//!
//! # Database Connection Patterns
//!
//! **Use `connect_with_timeout()` in async functions.** The 5-second busy
//! timeout lets a statement wait for a competing writer instead of failing
//! immediately with `SQLITE_BUSY`.
//!
//! ```no_run
//! # use nestree_core::db::DatabaseService;
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let db_service = DatabaseService::in_memory().await?;
//! let conn = db_service.connect_with_timeout().await?;
//! # Ok(())
//! # }
//! ```

use crate::db::error::DatabaseError;
use libsql::{Builder, Database};
use std::path::PathBuf;
use std::sync::Arc;

/// Path understood by libsql as a private in-memory database
pub const IN_MEMORY_PATH: &str = ":memory:";

/// Database service for managing the libsql handle
///
/// # Examples
///
/// ```no_run
/// use nestree_core::db::DatabaseService;
/// use std::path::PathBuf;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let db_path = PathBuf::from("/path/to/catalog.db");
///     let db_service = DatabaseService::new(db_path).await?;
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct DatabaseService {
    /// libsql database handle (wrapped in Arc for sharing)
    pub db: Arc<Database>,

    /// Path to the database file
    pub db_path: PathBuf,
}

impl std::fmt::Debug for DatabaseService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseService")
            .field("db_path", &self.db_path)
            .finish_non_exhaustive()
    }
}

impl DatabaseService {
    /// Open (or create) a database at the specified path
    ///
    /// Ensures the parent directory exists before opening the file.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if:
    /// - The path is empty
    /// - Parent directory cannot be created
    /// - Database connection fails
    pub async fn new(db_path: PathBuf) -> Result<Self, DatabaseError> {
        if db_path.as_os_str().is_empty() {
            return Err(DatabaseError::invalid_path(db_path));
        }

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| DatabaseError::directory_creation_failed(db_path.clone(), e))?;
            }
        }

        Self::open(db_path).await
    }

    /// Open a private in-memory database
    ///
    /// SQLite gives each in-memory connection its own database, so keep
    /// one connection for the lifetime of the data. Useful for tests and tools.
    pub async fn in_memory() -> Result<Self, DatabaseError> {
        Self::open(PathBuf::from(IN_MEMORY_PATH)).await
    }

    async fn open(db_path: PathBuf) -> Result<Self, DatabaseError> {
        let db = Builder::new_local(&db_path)
            .build()
            .await
            .map_err(|e| DatabaseError::connection_failed(db_path.clone(), e))?;

        tracing::debug!("Opened nested set database at {}", db_path.display());

        Ok(Self {
            db: Arc::new(db),
            db_path,
        })
    }

    /// Execute a PRAGMA statement
    ///
    /// PRAGMA statements return rows, so we must use query() instead of execute().
    async fn execute_pragma(
        &self,
        conn: &libsql::Connection,
        pragma: &str,
    ) -> Result<(), DatabaseError> {
        let context = || format!("Failed to execute '{}'", pragma);
        let mut stmt = conn
            .prepare(pragma)
            .await
            .map_err(|e| DatabaseError::statement(context(), e))?;
        let _ = stmt
            .query(())
            .await
            .map_err(|e| DatabaseError::statement(context(), e))?;
        Ok(())
    }

    /// Get a connection without any session configuration
    ///
    /// Prefer `connect_with_timeout()` in async code.
    pub fn connect(&self) -> Result<libsql::Connection, DatabaseError> {
        self.db
            .connect()
            .map_err(|e| DatabaseError::connection_failed(self.db_path.clone(), e))
    }

    /// Get a connection with busy timeout configured
    ///
    /// Sets a 5-second busy timeout so a statement waits for a competing
    /// writer instead of failing immediately when the database is locked.
    pub async fn connect_with_timeout(&self) -> Result<libsql::Connection, DatabaseError> {
        let conn = self.connect()?;

        self.execute_pragma(&conn, "PRAGMA busy_timeout = 5000")
            .await?;

        Ok(conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_database_creation() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let db_service = DatabaseService::new(db_path.clone()).await.unwrap();
        let conn = db_service.connect().unwrap();
        conn.execute("CREATE TABLE category (id INTEGER PRIMARY KEY)", ())
            .await
            .unwrap();

        assert_eq!(db_service.db_path, db_path);
        assert!(db_path.exists());
    }

    #[tokio::test]
    async fn test_parent_directory_creation() {
        let temp_dir = TempDir::new().unwrap();
        let nested_path = temp_dir.path().join("nested").join("dirs").join("test.db");

        let _db_service = DatabaseService::new(nested_path.clone()).await.unwrap();

        assert!(nested_path.parent().unwrap().exists());
    }

    #[tokio::test]
    async fn test_empty_path_rejected() {
        let result = DatabaseService::new(PathBuf::new()).await;
        assert!(matches!(result, Err(DatabaseError::InvalidPath { .. })));
    }

    #[tokio::test]
    async fn test_busy_timeout_applied() {
        let db_service = DatabaseService::in_memory().await.unwrap();
        let conn = db_service.connect_with_timeout().await.unwrap();

        let mut rows = conn.query("PRAGMA busy_timeout", ()).await.unwrap();
        let row = rows.next().await.unwrap().unwrap();
        let timeout: i64 = row.get(0).unwrap();
        assert_eq!(timeout, 5000);
    }
}
