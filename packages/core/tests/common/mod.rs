//! Shared fixtures for the nested set integration tests
//!
//! Every fixture uses an in-memory database and keeps exactly one connection:
//! a second connection would see a different, empty database.

#![allow(dead_code)]

use anyhow::Result;
use libsql::Connection;
use nestree_core::db::{DatabaseService, SelectQuery};
use nestree_core::{NestedSet, NestedSetConfig, Node};

pub const TABLE: &str = "tree";
pub const ROOT_COLUMN: &str = "root_id";

/// The demo partition as (id, left, right, level, name)
pub const CLOTHING: [(i64, i64, i64, i64, &str); 11] = [
    (1, 1, 22, 0, "Clothing"),
    (2, 2, 9, 1, "Mens"),
    (4, 3, 8, 2, "Suits"),
    (5, 4, 5, 3, "Slacks"),
    (6, 6, 7, 3, "Jackets"),
    (3, 10, 21, 1, "Women"),
    (7, 11, 16, 2, "Dresses"),
    (10, 12, 13, 3, "Evening Gowns"),
    (11, 14, 15, 3, "Sun Dresses"),
    (8, 17, 18, 2, "Skirts"),
    (9, 19, 20, 2, "Blouses"),
];

/// Ids in the second demo partition are offset by this much
pub const SECOND_PARTITION_OFFSET: i64 = 20;

pub struct TestTree {
    pub db: DatabaseService,
    pub conn: Connection,
    pub nested_set: NestedSet,
}

/// Empty `tree` table with the default column names
pub async fn create_test_tree() -> Result<TestTree> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let db = DatabaseService::in_memory().await?;
    let conn = db.connect_with_timeout().await?;

    conn.execute(
        "CREATE TABLE tree (
            id INTEGER PRIMARY KEY,
            \"left\" INTEGER NOT NULL,
            \"right\" INTEGER NOT NULL,
            \"level\" INTEGER NOT NULL,
            root_id INTEGER NOT NULL,
            name TEXT
        )",
        (),
    )
    .await?;

    let nested_set = NestedSet::new(NestedSetConfig::default())?;

    Ok(TestTree {
        db,
        conn,
        nested_set,
    })
}

/// Two copies of the demo tree: partition 1 with the plain ids and
/// partition 2 with ids offset by [`SECOND_PARTITION_OFFSET`]
pub async fn create_demo_forest() -> Result<TestTree> {
    let tree = create_test_tree().await?;

    insert_demo_partition(&tree.conn, 1, 0).await?;
    insert_demo_partition(&tree.conn, 2, SECOND_PARTITION_OFFSET).await?;

    Ok(tree)
}

async fn insert_demo_partition(conn: &Connection, root_id: i64, id_offset: i64) -> Result<()> {
    for (id, left, right, level, name) in CLOTHING {
        conn.execute(
            "INSERT INTO tree (id, \"left\", \"right\", \"level\", root_id, name) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            libsql::params![id + id_offset, left, right, level, root_id, name],
        )
        .await?;
    }

    Ok(())
}

/// Run a query built with alias `t`, projected onto the `name` column
pub async fn names(conn: &Connection, query: SelectQuery) -> Result<Vec<String>> {
    query
        .select(["t.\"name\""])
        .fetch_all(conn, |row| -> Result<String> { Ok(row.get::<String>(0)?) })
        .await
}

/// Positions of one partition as (id, left, right, level), ordered by id
pub async fn positions(tree: &TestTree, root_id: i64) -> Result<Vec<(i64, i64, i64, i64)>> {
    let mut nodes = tree
        .nested_set
        .reader()
        .fetch_partition(&tree.conn, TABLE, ROOT_COLUMN, root_id)
        .await?;
    nodes.sort_by_key(|node| node.id);

    Ok(nodes
        .iter()
        .map(|node| (node.id, node.left, node.right, node.level))
        .collect())
}

/// Expected (id, left, right, level) rows, sorted by id for comparison
pub fn expected(rows: &[(i64, i64, i64, i64)]) -> Vec<(i64, i64, i64, i64)> {
    let mut rows = rows.to_vec();
    rows.sort_by_key(|row| row.0);
    rows
}

/// Shape of one partition as (name, left, right, level), ordered by left
pub async fn shape(tree: &TestTree, root_id: i64) -> Result<Vec<(String, i64, i64, i64)>> {
    let mut rows = tree
        .conn
        .query(
            "SELECT name, \"left\", \"right\", \"level\" FROM tree WHERE root_id = ?1 ORDER BY \"left\"",
            libsql::params![root_id],
        )
        .await?;

    let mut shape = Vec::new();
    while let Some(row) = rows.next().await? {
        shape.push((
            row.get::<String>(0)?,
            row.get::<i64>(1)?,
            row.get::<i64>(2)?,
            row.get::<i64>(3)?,
        ));
    }

    Ok(shape)
}

/// The demo partition as (name, left, right, level)
pub fn clothing_shape() -> Vec<(String, i64, i64, i64)> {
    CLOTHING
        .iter()
        .map(|(_, left, right, level, name)| (name.to_string(), *left, *right, *level))
        .collect()
}

/// Fail when partition `root_id` breaks any nested set invariant
pub async fn assert_valid_partition(tree: &TestTree, root_id: i64) -> Result<()> {
    let violations = tree
        .nested_set
        .validate_partition(&tree.conn, TABLE, ROOT_COLUMN, root_id)
        .await?;

    assert!(
        violations.is_empty(),
        "partition {} is inconsistent: {:?}",
        root_id,
        violations
    );

    Ok(())
}

/// Fetch a node position
pub async fn node(tree: &TestTree, id: i64) -> Result<Node> {
    Ok(tree
        .nested_set
        .reader()
        .fetch_node(&tree.conn, TABLE, ROOT_COLUMN, id)
        .await?)
}
