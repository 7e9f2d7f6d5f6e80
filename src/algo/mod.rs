//! Graph algorithms module
//!
//! Algorithms are implemented in the `seven-degrees-graph-algorithms` crate.
//! This module provides the integration/adapter layer: it projects a
//! [`GraphStore`] snapshot into a dense [`GraphView`], applying the edge
//! constraints of a discovery request.

use crate::graph::{Edge, GraphStore, NodeId};
use seven_degrees_graph_algorithms::{GraphView, NodeId as AlgoNodeId};

// Re-export algorithms
pub use seven_degrees_graph_algorithms::{
    a_star, all_simple_paths, articulation_points, average_clustering, bfs_distances,
    bounded_bfs, connected_components, dijkstra, local_clustering, path_from_nodes,
    sampled_betweenness, shortest_path_tree, PathResult, SearchBudget, SearchReport,
    SearchStatus, ShortestPathTree,
};

/// Which edges a projection keeps
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EdgeFilter {
    /// Drop edges weaker than this
    pub min_strength: Option<f64>,
    /// Drop unverified edges
    pub verified_only: bool,
}

impl EdgeFilter {
    /// Keep every edge
    pub fn all() -> Self {
        Self::default()
    }

    pub fn accepts(&self, edge: &Edge) -> bool {
        if self.verified_only && !edge.verified {
            return false;
        }
        match self.min_strength {
            Some(min) => edge.strength >= min,
            None => true,
        }
    }
}

/// Build a GraphView from the store for algorithm execution.
///
/// Every node is kept so that endpoints stay addressable even when all their
/// edges are filtered out. Parallel edges of different relationship types
/// collapse to the strongest accepted one.
pub fn build_view(store: &GraphStore, filter: &EdgeFilter) -> GraphView {
    let nodes: Vec<AlgoNodeId> = store.all_nodes().map(|n| n.key.as_u64()).collect();

    let edges = store
        .all_edges()
        .filter(|edge| filter.accepts(edge))
        .map(|edge| {
            (
                edge.source.as_u64(),
                edge.target.as_u64(),
                edge.strength,
                edge.id.as_u64(),
            )
        });

    GraphView::from_edges(nodes, edges)
}

/// Arena key for a view node
pub fn to_node_id(node: AlgoNodeId) -> NodeId {
    NodeId::new(node)
}
