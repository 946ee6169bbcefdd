//! NestedSet - entry point
//!
//! Validates a [`NestedSetConfig`] once and hands out the reader, query
//! factory, writer and inspector, all sharing the same resolved columns.
//!
//! # Examples
//!
//! ```no_run
//! use nestree_core::{db::DatabaseService, NestedSet, NestedSetConfig};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let db = DatabaseService::new("./data/catalog.db".into()).await?;
//! let conn = db.connect_with_timeout().await?;
//!
//! let nested_set = NestedSet::new(NestedSetConfig::new("id", "lft", "rgt", "depth"))?;
//! let query = nested_set
//!     .query_factory()
//!     .create_subtree_query(&conn, "category", "c", "tree_id", 1)
//!     .await?;
//! let titles = query
//!     .select(["c.\"title\""])
//!     .fetch_all(&conn, |row| -> Result<String, Box<dyn std::error::Error>> {
//!         Ok(row.get::<String>(0)?)
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```

use crate::config::{ColumnNames, NestedSetConfig};
use crate::services::error::Result;
use crate::services::inspector::NodeInspector;
use crate::services::node_store::NodeStore;
use crate::services::query_factory::NestedSetQueryFactory;
use crate::services::validation::{validate_partition, TreeViolation};
use crate::services::writer::NestedSetWriter;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct NestedSet {
    columns: Arc<ColumnNames>,
}

impl NestedSet {
    /// Validate `config` and resolve its column names
    ///
    /// # Errors
    ///
    /// `InvalidConfig` when a column name is empty or two columns coincide.
    pub fn new(config: NestedSetConfig) -> Result<Self> {
        let columns = ColumnNames::resolve(config)?;
        tracing::debug!(config = ?columns.config(), "nested set configured");

        Ok(Self {
            columns: Arc::new(columns),
        })
    }

    pub fn config(&self) -> &NestedSetConfig {
        self.columns.config()
    }

    pub fn reader(&self) -> NodeStore {
        NodeStore::new(self.columns.clone())
    }

    pub fn query_factory(&self) -> NestedSetQueryFactory {
        NestedSetQueryFactory::new(self.columns.clone(), self.reader())
    }

    pub fn writer(&self) -> NestedSetWriter {
        NestedSetWriter::new(self.columns.clone(), self.reader())
    }

    pub fn inspector(&self) -> NodeInspector {
        NodeInspector::new(self.reader())
    }

    /// Check one partition against the nested set invariants
    pub async fn validate_partition(
        &self,
        conn: &libsql::Connection,
        table: &str,
        root_column: &str,
        root_value: i64,
    ) -> Result<Vec<TreeViolation>> {
        validate_partition(&self.reader(), conn, table, root_column, root_value).await
    }
}
