//! Partition self-check
//!
//! Walks one partition in `left` order and reports every structural problem
//! found instead of stopping at the first. An empty report means the
//! partition is a well-formed nested set.

use crate::models::{Node, NodeId};
use crate::services::error::Result;
use crate::services::node_store::NodeStore;
use std::collections::BTreeMap;
use thiserror::Error;

/// One broken nested set invariant
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TreeViolation {
    #[error("Partition has no node with left = 1")]
    MissingRoot,

    #[error("Partition has several nodes with left = 1: {node_ids:?}")]
    MultipleRoots { node_ids: Vec<NodeId> },

    #[error("Root node {node_id} has level {level}, expected 0")]
    RootLevel { node_id: NodeId, level: i64 },

    #[error("Node {node_id} has left {left} >= right {right}")]
    EmptyInterval { node_id: NodeId, left: i64, right: i64 },

    #[error("Coordinate {coordinate} is used {count} times")]
    DuplicateCoordinate { coordinate: i64, count: usize },

    #[error("Coordinate {coordinate} is outside 1..={max}")]
    CoordinateOutOfRange { coordinate: i64, max: i64 },

    #[error("Coordinate {coordinate} is never used")]
    MissingCoordinate { coordinate: i64 },

    #[error("Node {node_id} has left {left} and right {right} of the same parity")]
    Parity { node_id: NodeId, left: i64, right: i64 },

    #[error("Node {node_id} overlaps node {other_id} without being nested in it")]
    Overlap { node_id: NodeId, other_id: NodeId },

    #[error("Node {node_id} has level {actual}, expected {expected}")]
    Level {
        node_id: NodeId,
        expected: i64,
        actual: i64,
    },
}

/// Check the nodes of one partition
///
/// `nodes` need not be sorted. An empty slice is an empty partition and
/// passes.
pub fn check_partition(nodes: &[Node]) -> Vec<TreeViolation> {
    let mut violations = Vec::new();
    if nodes.is_empty() {
        return violations;
    }

    let mut sorted = nodes.to_vec();
    sorted.sort_by_key(|node| node.left);

    check_root(&sorted, &mut violations);
    check_coordinates(&sorted, &mut violations);
    check_nesting(&sorted, &mut violations);

    violations
}

/// Fetch partition `root_value` and check it
pub async fn validate_partition(
    reader: &NodeStore,
    conn: &libsql::Connection,
    table: &str,
    root_column: &str,
    root_value: i64,
) -> Result<Vec<TreeViolation>> {
    let nodes = reader
        .fetch_partition(conn, table, root_column, root_value)
        .await?;
    let violations = check_partition(&nodes);

    if !violations.is_empty() {
        tracing::warn!(
            table,
            root_value,
            count = violations.len(),
            "nested set partition is inconsistent"
        );
    }

    Ok(violations)
}

fn check_root(nodes: &[Node], violations: &mut Vec<TreeViolation>) {
    let roots: Vec<&Node> = nodes.iter().filter(|node| node.is_root()).collect();

    match roots.as_slice() {
        [] => violations.push(TreeViolation::MissingRoot),
        [root] => {
            if root.level != 0 {
                violations.push(TreeViolation::RootLevel {
                    node_id: root.id,
                    level: root.level,
                });
            }
        }
        many => violations.push(TreeViolation::MultipleRoots {
            node_ids: many.iter().map(|node| node.id).collect(),
        }),
    }
}

fn check_coordinates(nodes: &[Node], violations: &mut Vec<TreeViolation>) {
    let max = 2 * nodes.len() as i64;
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();

    for node in nodes {
        if node.left >= node.right {
            violations.push(TreeViolation::EmptyInterval {
                node_id: node.id,
                left: node.left,
                right: node.right,
            });
        }
        if (node.left + node.right) % 2 == 0 {
            violations.push(TreeViolation::Parity {
                node_id: node.id,
                left: node.left,
                right: node.right,
            });
        }
        *counts.entry(node.left).or_default() += 1;
        *counts.entry(node.right).or_default() += 1;
    }

    for (&coordinate, &count) in &counts {
        if coordinate < 1 || coordinate > max {
            violations.push(TreeViolation::CoordinateOutOfRange { coordinate, max });
        } else if count > 1 {
            violations.push(TreeViolation::DuplicateCoordinate { coordinate, count });
        }
    }

    for coordinate in 1..=max {
        if !counts.contains_key(&coordinate) {
            violations.push(TreeViolation::MissingCoordinate { coordinate });
        }
    }
}

/// Intervals must nest and `level` must equal the number of enclosing nodes
fn check_nesting(sorted: &[Node], violations: &mut Vec<TreeViolation>) {
    let mut open: Vec<&Node> = Vec::new();

    for node in sorted {
        while open.last().is_some_and(|top| top.right < node.left) {
            open.pop();
        }

        if let Some(parent) = open.last() {
            if node.right > parent.right {
                violations.push(TreeViolation::Overlap {
                    node_id: node.id,
                    other_id: parent.id,
                });
            }
        }

        let expected = open.len() as i64;
        if node.level != expected {
            violations.push(TreeViolation::Level {
                node_id: node.id,
                expected,
                actual: node.level,
            });
        }

        open.push(node);
    }
}
