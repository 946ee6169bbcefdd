//! Read-side query construction
//!
//! Every method returns a [`SelectQuery`] with its filter, ordering and
//! parameters set; the caller may replace the projection and then executes it
//! on its own connection. Methods anchored at a node resolve that node through
//! [`NodeStore`] first, so an unknown id fails with `NodeNotFound` before any
//! query is built.
//!
//! Parameter names are prefixed with the query alias (`tLeft`, `tRoot`, ...)
//! so several factory queries can be merged into one statement.

use crate::config::ColumnNames;
use crate::db::{quote_table, SelectQuery, SortOrder};
use crate::models::NodeId;
use crate::services::error::Result;
use crate::services::node_store::NodeStore;
use std::sync::Arc;

/// Depth of descendant expansion below explicitly selected nodes (direct children)
pub const DEFAULT_MIN_CHILD_LEVEL: u32 = 1;

/// Builds nested set read queries
#[derive(Debug, Clone)]
pub struct NestedSetQueryFactory {
    columns: Arc<ColumnNames>,
    reader: NodeStore,
}

impl NestedSetQueryFactory {
    pub fn new(columns: Arc<ColumnNames>, reader: NodeStore) -> Self {
        Self { columns, reader }
    }

    /// All partition roots (`left = 1`), ordered by `left`
    pub fn create_fetch_roots_query(&self, table: &str, alias: &str) -> SelectQuery {
        let left = format!("{}.{}", alias, self.columns.left);

        SelectQuery::table(table, alias)
            .and_where(format!("{} = :{}Left", left, alias))
            .order_by(left, SortOrder::Asc)
            .set_parameter(&format!("{}Left", alias), 1_i64)
    }

    /// Direct children of `parent_id`, ordered by `left`
    pub async fn create_children_query(
        &self,
        conn: &libsql::Connection,
        table: &str,
        alias: &str,
        root_column: &str,
        parent_id: NodeId,
    ) -> Result<SelectQuery> {
        let parent = self.reader.fetch_node(conn, table, root_column, parent_id).await?;
        let c = self.aliased(alias, root_column);

        Ok(SelectQuery::table(table, alias)
            .and_where(format!("{} = :{}Level", c.level, alias))
            .and_where(format!("{} > :{}Left", c.left, alias))
            .and_where(format!("{} < :{}Right", c.left, alias))
            .and_where(format!("{} = :{}Root", c.root, alias))
            .order_by(c.left, SortOrder::Asc)
            .set_parameter(&format!("{}Level", alias), parent.level + 1)
            .set_parameter(&format!("{}Left", alias), parent.left)
            .set_parameter(&format!("{}Right", alias), parent.right)
            .set_parameter(&format!("{}Root", alias), parent.root))
    }

    /// `parent_id` itself followed by its descendants down to `min_child_level` levels
    ///
    /// With [`DEFAULT_MIN_CHILD_LEVEL`] this is the node and its direct children.
    pub async fn create_parent_and_children_query(
        &self,
        conn: &libsql::Connection,
        table: &str,
        alias: &str,
        root_column: &str,
        parent_id: NodeId,
        min_child_level: u32,
    ) -> Result<SelectQuery> {
        let parent = self.reader.fetch_node(conn, table, root_column, parent_id).await?;
        let c = self.aliased(alias, root_column);

        Ok(SelectQuery::table(table, alias)
            .and_where(format!("{} >= :{}Level", c.level, alias))
            .and_where(format!("{} <= :{}MaxLevel", c.level, alias))
            .and_where(format!("{} >= :{}Left", c.left, alias))
            .and_where(format!("{} <= :{}Right", c.left, alias))
            .and_where(format!("{} = :{}Root", c.root, alias))
            .order_by(c.left, SortOrder::Asc)
            .set_parameter(&format!("{}Level", alias), parent.level)
            .set_parameter(
                &format!("{}MaxLevel", alias),
                parent.level + i64::from(min_child_level),
            )
            .set_parameter(&format!("{}Left", alias), parent.left)
            .set_parameter(&format!("{}Right", alias), parent.right)
            .set_parameter(&format!("{}Root", alias), parent.root))
    }

    /// Every descendant of `node_id`, the node excluded, ordered by `left`
    pub async fn create_subtree_query(
        &self,
        conn: &libsql::Connection,
        table: &str,
        alias: &str,
        root_column: &str,
        node_id: NodeId,
    ) -> Result<SelectQuery> {
        let node = self.reader.fetch_node(conn, table, root_column, node_id).await?;
        let c = self.aliased(alias, root_column);

        Ok(SelectQuery::table(table, alias)
            .and_where(format!("{} > :{}Left", c.left, alias))
            .and_where(format!("{} < :{}Right", c.left, alias))
            .and_where(format!("{} = :{}Root", c.root, alias))
            .order_by(c.left, SortOrder::Asc)
            .set_parameter(&format!("{}Left", alias), node.left)
            .set_parameter(&format!("{}Right", alias), node.right)
            .set_parameter(&format!("{}Root", alias), node.root))
    }

    /// Ancestor chain of `node_id`, nearest ancestor first
    pub async fn create_parents_query(
        &self,
        conn: &libsql::Connection,
        table: &str,
        alias: &str,
        root_column: &str,
        node_id: NodeId,
    ) -> Result<SelectQuery> {
        let node = self.reader.fetch_node(conn, table, root_column, node_id).await?;
        let c = self.aliased(alias, root_column);

        Ok(SelectQuery::table(table, alias)
            .and_where(format!("{} < :{}Left", c.left, alias))
            .and_where(format!("{} > :{}Right", c.right, alias))
            .and_where(format!("{} = :{}Root", c.root, alias))
            .order_by(c.left, SortOrder::Desc)
            .set_parameter(&format!("{}Left", alias), node.left)
            .set_parameter(&format!("{}Right", alias), node.right)
            .set_parameter(&format!("{}Root", alias), node.root))
    }

    /// The tree as seen through several selected nodes, as one composed query
    ///
    /// Union (deduplicated) of:
    /// 1. the children of every strict ancestor of a selected node, which
    ///    covers the ancestor chain, the selected node and its siblings;
    /// 2. descendants of a selected node at most `min_child_level` levels
    ///    below it (skipped when `min_child_level` is 0);
    /// 3. the partition root of every selected node.
    ///
    /// The id set is joined back to the table and ordered by `left`.
    pub fn create_subtree_through_multiple_nodes_query(
        &self,
        table: &str,
        alias: &str,
        root_column: &str,
        node_ids: &[NodeId],
        min_child_level: u32,
    ) -> SelectQuery {
        let direct = format!("{}Direct", alias);
        let ancestor = format!("{}Ancestor", alias);
        let sibling = format!("{}Sibling", alias);
        let child = format!("{}Child", alias);
        let root = format!("{}Root", alias);
        let selection = format!("{}Selection", alias);

        let d = self.aliased(&direct, root_column);
        let a = self.aliased(&ancestor, root_column);
        let s = self.aliased(&sibling, root_column);
        let ch = self.aliased(&child, root_column);
        let r = self.aliased(&root, root_column);

        let id_params: Vec<String> = (0..node_ids.len())
            .map(|i| format!("{}NodeId{}", alias, i))
            .collect();
        let direct_filter = format!(
            "{} IN ({})",
            d.pk,
            id_params
                .iter()
                .map(|name| format!(":{}", name))
                .collect::<Vec<_>>()
                .join(", ")
        );
        let quoted_table = quote_table(table);

        let parents_and_siblings = SelectQuery::table(table, &direct)
            .select([format!("{} AS \"id\"", s.pk)])
            .inner_join(
                quoted_table.clone(),
                &ancestor,
                format!(
                    "{} < {} AND {} > {} AND {} = {}",
                    a.left, d.left, a.right, d.right, a.root, d.root
                ),
            )
            .inner_join(
                quoted_table.clone(),
                &sibling,
                format!(
                    "{} = {} + 1 AND {} > {} AND {} < {} AND {} = {}",
                    s.level, a.level, s.left, a.left, s.right, a.right, s.root, a.root
                ),
            )
            .and_where(direct_filter.clone());

        let roots = SelectQuery::table(table, &direct)
            .select([format!("{} AS \"id\"", r.pk)])
            .inner_join(
                quoted_table.clone(),
                &root,
                format!("{} = 1 AND {} = {}", r.left, r.root, d.root),
            )
            .and_where(direct_filter.clone());

        let mut branches = vec![parents_and_siblings.sql()];

        if min_child_level > 0 {
            let children = SelectQuery::table(table, &direct)
                .select([format!("{} AS \"id\"", ch.pk)])
                .inner_join(
                    quoted_table,
                    &child,
                    format!(
                        "{} > {} AND {} < {} AND {} = {} AND {} <= {} + :{}MinChildLevel",
                        ch.left, d.left, ch.right, d.right, ch.root, d.root, ch.level, d.level, alias
                    ),
                )
                .and_where(direct_filter);
            branches.push(children.sql());
        }

        branches.push(roots.sql());

        let c = self.aliased(alias, root_column);
        let mut query = SelectQuery::table(table, alias)
            .inner_join(
                format!("({})", branches.join(" UNION ")),
                &selection,
                format!("{}.\"id\" = {}", selection, c.pk),
            )
            .order_by(c.left, SortOrder::Asc);

        for (name, id) in id_params.iter().zip(node_ids) {
            query = query.set_parameter(name, *id);
        }

        if min_child_level > 0 {
            query = query.set_parameter(
                &format!("{}MinChildLevel", alias),
                i64::from(min_child_level),
            );
        }

        query
    }

    /// Quoted, alias-qualified column references for one query alias
    fn aliased(&self, alias: &str, root_column: &str) -> AliasedColumns {
        AliasedColumns {
            pk: format!("{}.{}", alias, self.columns.pk),
            left: format!("{}.{}", alias, self.columns.left),
            right: format!("{}.{}", alias, self.columns.right),
            level: format!("{}.{}", alias, self.columns.level),
            root: format!("{}.{}", alias, self.columns.root(root_column)),
        }
    }
}

struct AliasedColumns {
    pk: String,
    left: String,
    right: String,
    level: String,
    root: String,
}
