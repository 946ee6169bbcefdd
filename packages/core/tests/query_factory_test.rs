//! Query Factory Tests
//!
//! Runs every read query against the two-partition demo forest and compares
//! the returned names in order.

mod common;

#[cfg(test)]
mod query_factory_tests {
    use super::common::*;
    use anyhow::Result;
    use nestree_core::{NestedSetError, DEFAULT_MIN_CHILD_LEVEL};

    #[tokio::test]
    async fn test_fetch_roots() -> Result<()> {
        let tree = create_demo_forest().await?;
        let factory = tree.nested_set.query_factory();

        let query = factory.create_fetch_roots_query(TABLE, "t");

        assert_eq!(names(&tree.conn, query).await?, ["Clothing", "Clothing"]);

        Ok(())
    }

    #[tokio::test]
    async fn test_children() -> Result<()> {
        let tree = create_demo_forest().await?;
        let factory = tree.nested_set.query_factory();

        let mens = factory
            .create_children_query(&tree.conn, TABLE, "t", ROOT_COLUMN, 2)
            .await?;
        assert_eq!(names(&tree.conn, mens).await?, ["Suits"]);

        let women = factory
            .create_children_query(&tree.conn, TABLE, "t", ROOT_COLUMN, 23)
            .await?;
        assert_eq!(
            names(&tree.conn, women).await?,
            ["Dresses", "Skirts", "Blouses"]
        );

        let leaf = factory
            .create_children_query(&tree.conn, TABLE, "t", ROOT_COLUMN, 5)
            .await?;
        assert!(names(&tree.conn, leaf).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_parent_and_children() -> Result<()> {
        let tree = create_demo_forest().await?;
        let factory = tree.nested_set.query_factory();

        let suits = factory
            .create_parent_and_children_query(
                &tree.conn,
                TABLE,
                "t",
                ROOT_COLUMN,
                24,
                DEFAULT_MIN_CHILD_LEVEL,
            )
            .await?;
        assert_eq!(
            names(&tree.conn, suits).await?,
            ["Suits", "Slacks", "Jackets"]
        );

        let women_two_levels = factory
            .create_parent_and_children_query(&tree.conn, TABLE, "t", ROOT_COLUMN, 3, 2)
            .await?;
        assert_eq!(
            names(&tree.conn, women_two_levels).await?,
            [
                "Women",
                "Dresses",
                "Evening Gowns",
                "Sun Dresses",
                "Skirts",
                "Blouses"
            ]
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_subtree() -> Result<()> {
        let tree = create_demo_forest().await?;
        let factory = tree.nested_set.query_factory();

        let query = factory
            .create_subtree_query(&tree.conn, TABLE, "t", ROOT_COLUMN, 2)
            .await?;

        assert_eq!(
            names(&tree.conn, query).await?,
            ["Suits", "Slacks", "Jackets"]
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_parents() -> Result<()> {
        let tree = create_demo_forest().await?;
        let factory = tree.nested_set.query_factory();

        let mens = factory
            .create_parents_query(&tree.conn, TABLE, "t", ROOT_COLUMN, 2)
            .await?;
        assert_eq!(names(&tree.conn, mens).await?, ["Clothing"]);

        let jackets = factory
            .create_parents_query(&tree.conn, TABLE, "t", ROOT_COLUMN, 6)
            .await?;
        assert_eq!(
            names(&tree.conn, jackets).await?,
            ["Suits", "Mens", "Clothing"]
        );

        let root = factory
            .create_parents_query(&tree.conn, TABLE, "t", ROOT_COLUMN, 21)
            .await?;
        assert!(names(&tree.conn, root).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_anchor() -> Result<()> {
        let tree = create_demo_forest().await?;
        let factory = tree.nested_set.query_factory();

        let result = factory
            .create_subtree_query(&tree.conn, TABLE, "t", ROOT_COLUMN, 404)
            .await;

        assert!(matches!(
            result,
            Err(NestedSetError::NodeNotFound { node_id: 404 })
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_subtree_through_multiple_nodes() -> Result<()> {
        let tree = create_demo_forest().await?;
        let factory = tree.nested_set.query_factory();

        let cases: [(&[i64], u32, &[&str]); 7] = [
            (&[], 1, &[]),
            (&[1], 1, &["Clothing", "Mens", "Women"]),
            (
                &[5],
                1,
                &["Clothing", "Mens", "Suits", "Slacks", "Jackets", "Women"],
            ),
            (
                &[2, 7],
                1,
                &[
                    "Clothing",
                    "Mens",
                    "Suits",
                    "Women",
                    "Dresses",
                    "Evening Gowns",
                    "Sun Dresses",
                    "Skirts",
                    "Blouses",
                ],
            ),
            (
                &[3, 2],
                1,
                &[
                    "Clothing", "Mens", "Suits", "Women", "Dresses", "Skirts", "Blouses",
                ],
            ),
            (
                &[2, 3],
                2,
                &[
                    "Clothing",
                    "Mens",
                    "Suits",
                    "Slacks",
                    "Jackets",
                    "Women",
                    "Dresses",
                    "Evening Gowns",
                    "Sun Dresses",
                    "Skirts",
                    "Blouses",
                ],
            ),
            (&[3, 2], 0, &["Clothing", "Mens", "Women"]),
        ];

        for (node_ids, min_child_level, expected_names) in cases {
            let query = factory.create_subtree_through_multiple_nodes_query(
                TABLE,
                "t",
                ROOT_COLUMN,
                node_ids,
                min_child_level,
            );

            assert_eq!(
                names(&tree.conn, query).await?,
                expected_names,
                "nodes {:?} with min child level {}",
                node_ids,
                min_child_level
            );
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_subtree_through_nodes_of_second_partition() -> Result<()> {
        let tree = create_demo_forest().await?;
        let factory = tree.nested_set.query_factory();

        let query = factory.create_subtree_through_multiple_nodes_query(
            TABLE,
            "t",
            ROOT_COLUMN,
            &[24],
            DEFAULT_MIN_CHILD_LEVEL,
        );
        let ids = query
            .select(["t.\"id\""])
            .fetch_all(&tree.conn, |row| -> Result<i64> { Ok(row.get::<i64>(0)?) })
            .await?;

        assert_eq!(ids, [21, 22, 24, 25, 26, 23]);

        Ok(())
    }

    #[tokio::test]
    async fn test_queries_see_uncommitted_writes() -> Result<()> {
        let tree = create_demo_forest().await?;
        let factory = tree.nested_set.query_factory();
        let writer = tree.nested_set.writer();

        let tx = tree.conn.transaction().await?;
        writer
            .insert_as_last_child(&tx, TABLE, ROOT_COLUMN, 2, serde_json::json!({"name": "Shirts"}))
            .await?;

        let query = factory
            .create_children_query(&tx, TABLE, "t", ROOT_COLUMN, 2)
            .await?;
        assert_eq!(names(&tx, query).await?, ["Suits", "Shirts"]);

        tx.rollback().await?;

        Ok(())
    }
}
