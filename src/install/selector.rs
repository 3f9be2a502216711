//! Node selection expressions
//!
//! `all` selects every node. Otherwise the expression is a comma separated
//! list of node numbers and inclusive ranges, e.g. `1,3-5`.

use crate::error::{ClusterError, Result};
use std::collections::BTreeSet;

/// Expression selecting every node
pub const ALL_NODES: &str = "all";

/// Resolves a selection expression to node indices
pub trait NodeSelector {
    /// Ordered, 1-based node indices selected by `expr` in a cluster of `node_count` nodes
    fn list_nodes(&self, expr: &str, node_count: usize) -> Result<Vec<usize>>;
}

/// Selector for `all` / `N` / `A-B` lists
#[derive(Debug, Clone, Copy, Default)]
pub struct RangeSelector;

impl NodeSelector for RangeSelector {
    fn list_nodes(&self, expr: &str, node_count: usize) -> Result<Vec<usize>> {
        list_nodes(expr, node_count)
    }
}

/// Resolve `expr` against a cluster of `node_count` nodes.
///
/// The result is ascending with duplicates removed.
pub fn list_nodes(expr: &str, node_count: usize) -> Result<Vec<usize>> {
    if expr == ALL_NODES {
        return Ok((1..=node_count).collect());
    }
    if expr.is_empty() {
        return Err(ClusterError::NodeSelection(
            "empty node specification".to_string(),
        ));
    }

    let mut nodes = BTreeSet::new();
    for term in expr.split(',') {
        let (from, to) = match term.split_once('-') {
            Some((a, b)) => (parse_node(a, expr)?, parse_node(b, expr)?),
            None => {
                let n = parse_node(term, expr)?;
                (n, n)
            }
        };
        if from > to {
            return Err(ClusterError::NodeSelection(format!(
                "invalid node range {}-{} in {:?}",
                from, to, expr
            )));
        }
        if to > node_count {
            return Err(ClusterError::NodeSelection(format!(
                "invalid node {} (cluster has {} nodes)",
                to, node_count
            )));
        }
        nodes.extend(from..=to);
    }

    Ok(nodes.into_iter().collect())
}

fn parse_node(s: &str, expr: &str) -> Result<usize> {
    match s.parse::<usize>() {
        Ok(0) => Err(ClusterError::NodeSelection(format!(
            "invalid node 0 in {:?}: nodes are numbered from 1",
            expr
        ))),
        Ok(n) => Ok(n),
        Err(_) => Err(ClusterError::NodeSelection(format!(
            "unable to parse node {:?} in {:?}",
            s, expr
        ))),
    }
}
