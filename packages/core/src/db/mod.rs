//! Database Layer
//!
//! Everything that talks to libsql directly:
//!
//! - [`DatabaseService`] - opening local or in-memory databases and handing out connections
//! - [`SelectQuery`] - composable SELECT statements with named parameters
//! - Identifier quoting for caller supplied table and column names
//!
//! Schema creation is left to the application; the nested set services only
//! read and renumber rows of tables that already exist.

mod database;
mod error;
mod sql;

pub use database::{DatabaseService, IN_MEMORY_PATH};
pub use error::DatabaseError;
pub(crate) use sql::json_to_sql_value;
pub use sql::{quote_identifier, quote_table, SelectQuery, SortOrder};
