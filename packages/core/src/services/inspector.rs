//! Structural predicates resolved against the table
//!
//! Same questions as [`crate::models::relations`], asked by node id. Each
//! call reads the current coordinates, so answers reflect uncommitted writes
//! made on the same connection.

use crate::models::{relations, NodeId};
use crate::services::error::Result;
use crate::services::node_store::NodeStore;

#[derive(Debug, Clone)]
pub struct NodeInspector {
    reader: NodeStore,
}

impl NodeInspector {
    pub fn new(reader: NodeStore) -> Self {
        Self { reader }
    }

    pub async fn is_leaf(
        &self,
        conn: &libsql::Connection,
        table: &str,
        root_column: &str,
        node_id: NodeId,
    ) -> Result<bool> {
        let node = self.reader.fetch_node(conn, table, root_column, node_id).await?;
        Ok(node.is_leaf())
    }

    pub async fn is_root(
        &self,
        conn: &libsql::Connection,
        table: &str,
        root_column: &str,
        node_id: NodeId,
    ) -> Result<bool> {
        let node = self.reader.fetch_node(conn, table, root_column, node_id).await?;
        Ok(node.is_root())
    }

    /// Same position in the same partition
    pub async fn is_equal(
        &self,
        conn: &libsql::Connection,
        table: &str,
        root_column: &str,
        node_id: NodeId,
        other_id: NodeId,
    ) -> Result<bool> {
        self.compare(conn, table, root_column, node_id, other_id, relations::is_equal)
            .await
    }

    /// `node_id` lies strictly inside `other_id`
    pub async fn is_descendant(
        &self,
        conn: &libsql::Connection,
        table: &str,
        root_column: &str,
        node_id: NodeId,
        other_id: NodeId,
    ) -> Result<bool> {
        self.compare(conn, table, root_column, node_id, other_id, relations::is_descendant)
            .await
    }

    pub async fn is_descendant_or_equal(
        &self,
        conn: &libsql::Connection,
        table: &str,
        root_column: &str,
        node_id: NodeId,
        other_id: NodeId,
    ) -> Result<bool> {
        self.compare(
            conn,
            table,
            root_column,
            node_id,
            other_id,
            relations::is_descendant_or_equal,
        )
        .await
    }

    /// `node_id` strictly contains `other_id`
    pub async fn is_ancestor(
        &self,
        conn: &libsql::Connection,
        table: &str,
        root_column: &str,
        node_id: NodeId,
        other_id: NodeId,
    ) -> Result<bool> {
        self.compare(conn, table, root_column, node_id, other_id, relations::is_ancestor)
            .await
    }

    async fn compare(
        &self,
        conn: &libsql::Connection,
        table: &str,
        root_column: &str,
        node_id: NodeId,
        other_id: NodeId,
        predicate: fn(&crate::models::Node, &crate::models::Node) -> bool,
    ) -> Result<bool> {
        let node = self.reader.fetch_node(conn, table, root_column, node_id).await?;
        let other = self.reader.fetch_node(conn, table, root_column, other_id).await?;

        Ok(predicate(&node, &other))
    }
}
