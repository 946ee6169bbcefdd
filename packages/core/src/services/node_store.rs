//! NodeStore - positional reads
//!
//! Resolves node ids into their current coordinates. Every query and write
//! starts here, so the reader always runs on the caller's connection or
//! transaction and sees the caller's own uncommitted writes.

use crate::config::ColumnNames;
use crate::db::{SelectQuery, SortOrder};
use crate::models::{Node, NodeId};
use crate::services::error::{NestedSetError, Result};
use libsql::{Row, Value};
use std::sync::Arc;

const NODE_ALIAS: &str = "n";

/// Canonical projection names, in row order
const CANONICAL_COLUMNS: [&str; 5] = ["id", "left", "right", "level", "root"];

/// Reads node positions from a nested set table
#[derive(Debug, Clone)]
pub struct NodeStore {
    columns: Arc<ColumnNames>,
}

impl NodeStore {
    pub fn new(columns: Arc<ColumnNames>) -> Self {
        Self { columns }
    }

    /// SELECT projecting the five positional columns under canonical names
    fn positional_query(&self, table: &str, root_column: &str) -> SelectQuery {
        let physical = [
            self.columns.pk.clone(),
            self.columns.left.clone(),
            self.columns.right.clone(),
            self.columns.level.clone(),
            self.columns.root(root_column),
        ];

        let projection = physical
            .iter()
            .zip(CANONICAL_COLUMNS)
            .map(|(column, canonical)| format!("{}.{} AS \"{}\"", NODE_ALIAS, column, canonical));

        SelectQuery::table(table, NODE_ALIAS).select(projection)
    }

    /// Fetch a single node by primary key
    ///
    /// # Errors
    ///
    /// - `NodeNotFound` when no row has `node_id`
    /// - `InvalidCoordinate` when a positional column is not an integer
    pub async fn fetch_node(
        &self,
        conn: &libsql::Connection,
        table: &str,
        root_column: &str,
        node_id: NodeId,
    ) -> Result<Node> {
        let query = self
            .positional_query(table, root_column)
            .and_where(format!("{}.{} = :nodeId", NODE_ALIAS, self.columns.pk))
            .set_parameter("nodeId", node_id);

        let mut rows = query.execute(conn).await?;
        let row = rows
            .next()
            .await
            .map_err(|e| NestedSetError::sql("Failed to fetch node", e))?
            .ok_or_else(|| NestedSetError::node_not_found(node_id))?;

        row_to_node(&row)
    }

    /// Fetch every node of one partition, ordered by `left`
    pub async fn fetch_partition(
        &self,
        conn: &libsql::Connection,
        table: &str,
        root_column: &str,
        root_value: i64,
    ) -> Result<Vec<Node>> {
        let query = self
            .positional_query(table, root_column)
            .and_where(format!(
                "{}.{} = :rootValue",
                NODE_ALIAS,
                self.columns.root(root_column)
            ))
            .order_by(format!("{}.{}", NODE_ALIAS, self.columns.left), SortOrder::Asc)
            .set_parameter("rootValue", root_value);

        query.fetch_all(conn, row_to_node).await
    }
}

fn row_to_node(row: &Row) -> Result<Node> {
    Ok(Node {
        id: coordinate(row, 0)?,
        left: coordinate(row, 1)?,
        right: coordinate(row, 2)?,
        level: coordinate(row, 3)?,
        root: coordinate(row, 4)?,
    })
}

/// Read column `idx` as an integer, coercing integral reals and numeric text
fn coordinate(row: &Row, idx: usize) -> Result<i64> {
    let column = CANONICAL_COLUMNS[idx];
    let value = row
        .get_value(idx as i32)
        .map_err(|e| NestedSetError::sql("Failed to read node column", e))?;

    coerce_integer(column, value)
}

fn coerce_integer(column: &str, value: Value) -> Result<i64> {
    match value {
        Value::Integer(i) => Ok(i),
        Value::Real(f) if f.is_finite() && f.fract() == 0.0 => Ok(f as i64),
        Value::Text(text) => text
            .trim()
            .parse::<i64>()
            .map_err(|_| NestedSetError::invalid_coordinate(column, text)),
        other => Err(NestedSetError::invalid_coordinate(
            column,
            format!("{:?}", other),
        )),
    }
}
