//! Write-side tree mutations
//!
//! Inserts, moves and deletes renumber `left`/`right`/`level` with a handful
//! of set-based UPDATE statements. Each public operation takes the caller's
//! [`libsql::Transaction`]: the statements of one operation leave the
//! partition inconsistent between each other, so they must commit or roll
//! back together. The writer never commits, rolls back or retries.
//!
//! # Examples
//!
//! ```no_run
//! use nestree_core::{db::DatabaseService, NestedSet, NestedSetConfig};
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let db = DatabaseService::in_memory().await?;
//! let conn = db.connect_with_timeout().await?;
//! let writer = NestedSet::new(NestedSetConfig::default())?.writer();
//!
//! let tx = conn.transaction().await?;
//! let root = writer.insert_root(&tx, "tree", "root_id", 1, json!({"name": "Clothing"})).await?;
//! writer.insert_as_last_child(&tx, "tree", "root_id", root, json!({"name": "Men"})).await?;
//! tx.commit().await?;
//! # Ok(())
//! # }
//! ```

use crate::config::ColumnNames;
use crate::db::{json_to_sql_value, quote_identifier, quote_table};
use crate::models::{Node, NodeId};
use crate::services::error::{NestedSetError, Result};
use crate::services::node_store::NodeStore;
use libsql::params::Params;
use libsql::{Transaction, Value};
use std::sync::Arc;
use tracing::instrument;

/// Where a node goes relative to its anchor node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TreePosition {
    /// As the first child of the anchor
    FirstChild,
    /// As the last child of the anchor
    LastChild,
    /// Directly before the anchor, under the same parent
    PrevSibling,
    /// Directly after the anchor, under the same parent
    NextSibling,
}

impl TreePosition {
    fn is_sibling(self) -> bool {
        matches!(self, Self::PrevSibling | Self::NextSibling)
    }

    /// First coordinate a node placed here will occupy
    fn destination_left(self, anchor: &Node) -> i64 {
        match self {
            Self::FirstChild => anchor.left + 1,
            Self::LastChild => anchor.right,
            Self::PrevSibling => anchor.left,
            Self::NextSibling => anchor.right + 1,
        }
    }

    /// Level a node placed here will have
    fn destination_level(self, anchor: &Node) -> i64 {
        match self {
            Self::FirstChild | Self::LastChild => anchor.level + 1,
            Self::PrevSibling | Self::NextSibling => anchor.level,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Self::FirstChild => "first child",
            Self::LastChild => "last child",
            Self::PrevSibling => "prev sibling",
            Self::NextSibling => "next sibling",
        }
    }
}

/// Inserts, moves and removes nested set nodes
#[derive(Debug, Clone)]
pub struct NestedSetWriter {
    columns: Arc<ColumnNames>,
    reader: NodeStore,
}

impl NestedSetWriter {
    pub fn new(columns: Arc<ColumnNames>, reader: NodeStore) -> Self {
        Self { columns, reader }
    }

    /// Start a new partition with a single node at `left=1, right=2, level=0`
    ///
    /// Choosing a `root_value` that is not already in use is the caller's
    /// responsibility. Caller data may set the primary key; the nested set
    /// columns are always computed here.
    ///
    /// Returns the id of the inserted row.
    #[instrument(skip(self, tx, data))]
    pub async fn insert_root(
        &self,
        tx: &Transaction,
        table: &str,
        root_column: &str,
        root_value: i64,
        data: serde_json::Value,
    ) -> Result<NodeId> {
        let position = Node::new(0, 1, 2, 0, root_value);
        self.do_insert(tx, table, root_column, data, &position).await
    }

    pub async fn insert_as_first_child(
        &self,
        tx: &Transaction,
        table: &str,
        root_column: &str,
        parent_id: NodeId,
        data: serde_json::Value,
    ) -> Result<NodeId> {
        self.insert(tx, table, root_column, parent_id, TreePosition::FirstChild, data)
            .await
    }

    pub async fn insert_as_last_child(
        &self,
        tx: &Transaction,
        table: &str,
        root_column: &str,
        parent_id: NodeId,
        data: serde_json::Value,
    ) -> Result<NodeId> {
        self.insert(tx, table, root_column, parent_id, TreePosition::LastChild, data)
            .await
    }

    pub async fn insert_as_prev_sibling(
        &self,
        tx: &Transaction,
        table: &str,
        root_column: &str,
        sibling_id: NodeId,
        data: serde_json::Value,
    ) -> Result<NodeId> {
        self.insert(tx, table, root_column, sibling_id, TreePosition::PrevSibling, data)
            .await
    }

    pub async fn insert_as_next_sibling(
        &self,
        tx: &Transaction,
        table: &str,
        root_column: &str,
        sibling_id: NodeId,
        data: serde_json::Value,
    ) -> Result<NodeId> {
        self.insert(tx, table, root_column, sibling_id, TreePosition::NextSibling, data)
            .await
    }

    /// Insert a new leaf at `position` relative to `anchor_id`
    ///
    /// Opens a two-coordinate gap at the insertion point, then inserts the
    /// row into it. Returns the id of the inserted row.
    ///
    /// # Errors
    ///
    /// - `NodeNotFound` when the anchor does not exist
    /// - `InvalidNodeOperation` when asked for a sibling of a partition root
    #[instrument(skip(self, tx, data))]
    pub async fn insert(
        &self,
        tx: &Transaction,
        table: &str,
        root_column: &str,
        anchor_id: NodeId,
        position: TreePosition,
        data: serde_json::Value,
    ) -> Result<NodeId> {
        let anchor = self.reader.fetch_node(tx, table, root_column, anchor_id).await?;

        if position.is_sibling() && anchor.is_root() {
            return Err(NestedSetError::invalid_operation(format!(
                "Cannot insert a {} of partition root {}",
                position.describe(),
                anchor.id
            )));
        }

        let new_left = position.destination_left(&anchor);
        tracing::debug!(anchor = anchor.id, new_left, "opening insertion gap");

        self.shift_subsequent(tx, table, root_column, anchor.root, new_left, 2)
            .await?;

        let new_node = Node::new(
            0,
            new_left,
            new_left + 1,
            position.destination_level(&anchor),
            anchor.root,
        );

        self.do_insert(tx, table, root_column, data, &new_node).await
    }

    pub async fn move_as_first_child(
        &self,
        tx: &Transaction,
        table: &str,
        root_column: &str,
        parent_id: NodeId,
        child_id: NodeId,
    ) -> Result<()> {
        self.move_node(tx, table, root_column, parent_id, child_id, TreePosition::FirstChild)
            .await
    }

    pub async fn move_as_last_child(
        &self,
        tx: &Transaction,
        table: &str,
        root_column: &str,
        parent_id: NodeId,
        child_id: NodeId,
    ) -> Result<()> {
        self.move_node(tx, table, root_column, parent_id, child_id, TreePosition::LastChild)
            .await
    }

    pub async fn move_as_prev_sibling(
        &self,
        tx: &Transaction,
        table: &str,
        root_column: &str,
        sibling_id: NodeId,
        child_id: NodeId,
    ) -> Result<()> {
        self.move_node(tx, table, root_column, sibling_id, child_id, TreePosition::PrevSibling)
            .await
    }

    pub async fn move_as_next_sibling(
        &self,
        tx: &Transaction,
        table: &str,
        root_column: &str,
        sibling_id: NodeId,
        child_id: NodeId,
    ) -> Result<()> {
        self.move_node(tx, table, root_column, sibling_id, child_id, TreePosition::NextSibling)
            .await
    }

    /// Move `child_id` and its subtree to `position` relative to `anchor_id`
    ///
    /// # Errors
    ///
    /// `InvalidNodeOperation`, before anything is written, when the anchor
    /// is the child itself or one of its descendants, when the two nodes
    /// belong to different partitions, or when a sibling position is asked
    /// of a partition root.
    #[instrument(skip(self, tx))]
    pub async fn move_node(
        &self,
        tx: &Transaction,
        table: &str,
        root_column: &str,
        anchor_id: NodeId,
        child_id: NodeId,
        position: TreePosition,
    ) -> Result<()> {
        let anchor = self.reader.fetch_node(tx, table, root_column, anchor_id).await?;
        let child = self.reader.fetch_node(tx, table, root_column, child_id).await?;

        validate_move(&anchor, &child, position)?;

        let destination_left = position.destination_left(&anchor);
        let level_diff = position.destination_level(&anchor) - child.level;

        self.update_node_position(tx, table, root_column, &child, destination_left, level_diff)
            .await
    }

    /// Delete `node_id` with its whole subtree and close the gap
    #[instrument(skip(self, tx))]
    pub async fn remove_node(
        &self,
        tx: &Transaction,
        table: &str,
        root_column: &str,
        node_id: NodeId,
    ) -> Result<()> {
        let node = self.reader.fetch_node(tx, table, root_column, node_id).await?;
        let root_col = self.columns.root(root_column);

        let sql = format!(
            "DELETE FROM {} WHERE {} >= :left AND {} <= :right AND {} = :rootValue",
            quote_table(table),
            self.columns.left,
            self.columns.right,
            root_col
        );
        let deleted = self
            .execute(
                tx,
                "Failed to delete subtree",
                &sql,
                vec![
                    (":left".to_string(), Value::Integer(node.left)),
                    (":right".to_string(), Value::Integer(node.right)),
                    (":rootValue".to_string(), Value::Integer(node.root)),
                ],
            )
            .await?;

        if deleted != node.subtree_size() as u64 {
            tracing::warn!(
                node = node.id,
                deleted,
                expected = node.subtree_size(),
                "subtree row count does not match its interval"
            );
        }

        let first = node.right + 1;
        let delta = node.left - node.right - 1;
        self.shift_subsequent(tx, table, root_column, node.root, first, delta)
            .await
    }

    /// Add `delta` to every `left` and every `right` that is `>= first`
    ///
    /// The two columns are updated by independent statements. Runs inside
    /// the caller's transaction; `delta` may be negative.
    pub async fn shift_subsequent(
        &self,
        tx: &Transaction,
        table: &str,
        root_column: &str,
        root_value: i64,
        first: i64,
        delta: i64,
    ) -> Result<()> {
        let root_col = self.columns.root(root_column);

        for column in [&self.columns.left, &self.columns.right] {
            let sql = format!(
                "UPDATE {} SET {col} = {col} + :delta WHERE {col} >= :first AND {} = :rootValue",
                quote_table(table),
                root_col,
                col = column
            );
            self.execute(
                tx,
                "Failed to shift subsequent nodes",
                &sql,
                vec![
                    (":delta".to_string(), Value::Integer(delta)),
                    (":first".to_string(), Value::Integer(first)),
                    (":rootValue".to_string(), Value::Integer(root_value)),
                ],
            )
            .await?;
        }

        Ok(())
    }

    /// Add `delta` to every `left` and every `right` within `first..=last`
    ///
    /// Used to relocate exactly one subtree's own interval.
    #[allow(clippy::too_many_arguments)]
    pub async fn shift_range(
        &self,
        tx: &Transaction,
        table: &str,
        root_column: &str,
        root_value: i64,
        first: i64,
        last: i64,
        delta: i64,
    ) -> Result<()> {
        let root_col = self.columns.root(root_column);

        for column in [&self.columns.left, &self.columns.right] {
            let sql = format!(
                "UPDATE {} SET {col} = {col} + :delta WHERE {col} >= :first AND {col} <= :last AND {} = :rootValue",
                quote_table(table),
                root_col,
                col = column
            );
            self.execute(
                tx,
                "Failed to shift subtree range",
                &sql,
                vec![
                    (":delta".to_string(), Value::Integer(delta)),
                    (":first".to_string(), Value::Integer(first)),
                    (":last".to_string(), Value::Integer(last)),
                    (":rootValue".to_string(), Value::Integer(root_value)),
                ],
            )
            .await?;
        }

        Ok(())
    }

    /// Relocate `node`'s subtree so it starts at `destination_left`
    ///
    /// Phases run in this order so no two intervals overlap at the end:
    /// 1. open a gap of the subtree's span at the destination;
    /// 2. adjust `level` of the node and its descendants;
    /// 3. shift the subtree into the gap;
    /// 4. close the gap left at the old location.
    async fn update_node_position(
        &self,
        tx: &Transaction,
        table: &str,
        root_column: &str,
        node: &Node,
        destination_left: i64,
        level_diff: i64,
    ) -> Result<()> {
        let span = node.span();
        let mut left = node.left;
        let mut right = node.right;

        tracing::debug!(
            node = node.id,
            destination_left,
            level_diff,
            span,
            "moving subtree"
        );

        self.shift_subsequent(tx, table, root_column, node.root, destination_left, span)
            .await?;

        // the opened gap lies before the subtree, which moved with it
        if left >= destination_left {
            left += span;
            right += span;
        }

        if level_diff != 0 {
            let sql = format!(
                "UPDATE {} SET {lvl} = {lvl} + :levelDiff WHERE {} >= :left AND {} <= :right AND {} = :rootValue",
                quote_table(table),
                self.columns.left,
                self.columns.right,
                self.columns.root(root_column),
                lvl = self.columns.level
            );
            self.execute(
                tx,
                "Failed to update subtree levels",
                &sql,
                vec![
                    (":levelDiff".to_string(), Value::Integer(level_diff)),
                    (":left".to_string(), Value::Integer(left)),
                    (":right".to_string(), Value::Integer(right)),
                    (":rootValue".to_string(), Value::Integer(node.root)),
                ],
            )
            .await?;
        }

        self.shift_range(
            tx,
            table,
            root_column,
            node.root,
            left,
            right,
            destination_left - left,
        )
        .await?;

        self.shift_subsequent(tx, table, root_column, node.root, right + 1, -span)
            .await
    }

    /// INSERT caller data merged with the computed nested set columns
    async fn do_insert(
        &self,
        tx: &Transaction,
        table: &str,
        root_column: &str,
        data: serde_json::Value,
        position: &Node,
    ) -> Result<NodeId> {
        let mut data = match data {
            serde_json::Value::Object(map) => map,
            serde_json::Value::Null => serde_json::Map::new(),
            other => {
                return Err(NestedSetError::InvalidRowData(format!(
                    "expected a JSON object, got {}",
                    other
                )))
            }
        };

        let config = self.columns.config();
        data.retain(|key, _| !config.is_managed_column(key) && key != root_column);

        let mut columns: Vec<String> = data.keys().map(|key| quote_identifier(key)).collect();
        let mut values: Vec<Value> = data.values().map(json_to_sql_value).collect();

        columns.extend([
            self.columns.left.clone(),
            self.columns.right.clone(),
            self.columns.level.clone(),
            self.columns.root(root_column),
        ]);
        values.extend([
            Value::Integer(position.left),
            Value::Integer(position.right),
            Value::Integer(position.level),
            Value::Integer(position.root),
        ]);

        let placeholders = vec!["?"; values.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_table(table),
            columns.join(", "),
            placeholders
        );
        tracing::trace!(sql = %sql, "inserting nested set node");

        tx.execute(&sql, Params::Positional(values))
            .await
            .map_err(|e| NestedSetError::sql("Failed to insert node", e))?;

        let id = tx.last_insert_rowid();
        tracing::debug!(
            id,
            left = position.left,
            right = position.right,
            level = position.level,
            "inserted node"
        );

        Ok(id)
    }

    async fn execute(
        &self,
        tx: &Transaction,
        context: &str,
        sql: &str,
        params: Vec<(String, Value)>,
    ) -> Result<u64> {
        tracing::trace!(sql = %sql, "executing nested set update");

        let affected = tx
            .execute(sql, Params::Named(params))
            .await
            .map_err(|e| NestedSetError::sql(context, e))?;

        Ok(affected)
    }
}

/// Reject moves that would put a subtree inside itself
///
/// Works on already fetched positions only; nothing is queried.
fn validate_move(anchor: &Node, child: &Node, position: TreePosition) -> Result<()> {
    if anchor.root != child.root {
        return Err(NestedSetError::invalid_operation(format!(
            "Cannot move node {} as {} of node {} in another partition",
            child.id,
            position.describe(),
            anchor.id
        )));
    }

    if anchor.is_equal(child) || child.is_ancestor_of(anchor) {
        return Err(NestedSetError::invalid_operation(format!(
            "Cannot move node {} as {} of itself or into a descendant",
            child.id,
            position.describe()
        )));
    }

    if position.is_sibling() && anchor.is_root() {
        return Err(NestedSetError::invalid_operation(format!(
            "Cannot move node {} as {} of partition root {}",
            child.id,
            position.describe(),
            anchor.id
        )));
    }

    Ok(())
}
