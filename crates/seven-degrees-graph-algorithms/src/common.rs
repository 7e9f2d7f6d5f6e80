//! Shared utilities for graph algorithms
//!
//! Provides a read-only, optimized view of the relationship graph for algorithm execution.

use std::collections::HashMap;

/// Node Identifier type (u64)
pub type NodeId = u64;

/// Opaque reference back to the edge a neighbor entry came from
pub type EdgeRef = u64;

/// A dense, integer-indexed view of an undirected relationship graph using
/// Compressed Sparse Row (CSR) format.
///
/// Every undirected edge appears twice, once in each endpoint's row. Parallel
/// edges between the same pair are collapsed to the strongest one when the view
/// is built, so a pair of adjacent indices maps to exactly one `EdgeRef`.
#[derive(Debug, Clone)]
pub struct GraphView {
    /// Number of nodes
    pub node_count: usize,
    /// Mapping from dense index (0..N) back to NodeId
    pub index_to_node: Vec<NodeId>,
    /// Mapping from NodeId to dense index
    pub node_to_index: HashMap<NodeId, usize>,

    /// Offsets into `targets`. Size = node_count + 1
    pub offsets: Vec<usize>,
    /// Contiguous array of neighbor indices
    pub targets: Vec<usize>,
    /// Relationship strength in [0, 1], aligned with `targets`
    pub strengths: Vec<f64>,
    /// Originating edge, aligned with `targets`
    pub edge_refs: Vec<EdgeRef>,
}

impl GraphView {
    /// Number of undirected edges in the view
    pub fn edge_count(&self) -> usize {
        self.targets.len() / 2
    }

    /// Dense index of a node, if it is part of the view
    pub fn index_of(&self, node: NodeId) -> Option<usize> {
        self.node_to_index.get(&node).copied()
    }

    /// Get the degree of a node (by index)
    pub fn degree(&self, idx: usize) -> usize {
        self.offsets[idx + 1] - self.offsets[idx]
    }

    /// Get neighbors of a node
    pub fn neighbors(&self, idx: usize) -> &[usize] {
        &self.targets[self.offsets[idx]..self.offsets[idx + 1]]
    }

    /// Get strengths for the edges of a node, aligned with `neighbors`
    pub fn strengths(&self, idx: usize) -> &[f64] {
        &self.strengths[self.offsets[idx]..self.offsets[idx + 1]]
    }

    /// Get edge references for a node, aligned with `neighbors`
    pub fn edge_refs(&self, idx: usize) -> &[EdgeRef] {
        &self.edge_refs[self.offsets[idx]..self.offsets[idx + 1]]
    }

    /// Traversal cost of an edge: stronger relationships are shorter.
    pub fn cost(strength: f64) -> f64 {
        (1.0 - strength).max(0.0)
    }

    /// Strength and edge reference of the edge joining two adjacent indices
    pub fn edge_between(&self, u: usize, v: usize) -> Option<(f64, EdgeRef)> {
        let start = self.offsets[u];
        let row = self.neighbors(u);
        row.binary_search(&v)
            .ok()
            .map(|pos| (self.strengths[start + pos], self.edge_refs[start + pos]))
    }

    /// Build a view from a node list and undirected weighted edges.
    ///
    /// Edges touching unknown nodes and self-loops are skipped. When several edges
    /// join the same pair the strongest wins.
    pub fn from_edges<I>(nodes: Vec<NodeId>, edges: I) -> Self
    where
        I: IntoIterator<Item = (NodeId, NodeId, f64, EdgeRef)>,
    {
        let node_count = nodes.len();
        let mut node_to_index = HashMap::with_capacity(node_count);
        for (idx, &node_id) in nodes.iter().enumerate() {
            node_to_index.insert(node_id, idx);
        }

        let mut best: HashMap<(usize, usize), (f64, EdgeRef)> = HashMap::new();
        for (a, b, strength, edge_ref) in edges {
            let (Some(&u), Some(&v)) = (node_to_index.get(&a), node_to_index.get(&b)) else {
                continue;
            };
            if u == v {
                continue;
            }
            let key = if u < v { (u, v) } else { (v, u) };
            let entry = best.entry(key).or_insert((strength, edge_ref));
            if strength > entry.0 {
                *entry = (strength, edge_ref);
            }
        }

        let mut adjacency: Vec<Vec<(usize, f64, EdgeRef)>> = vec![Vec::new(); node_count];
        for ((u, v), (strength, edge_ref)) in best {
            adjacency[u].push((v, strength, edge_ref));
            adjacency[v].push((u, strength, edge_ref));
        }

        Self::from_adjacency_list(nodes, node_to_index, adjacency)
    }

    /// Helper to create GraphView from adjacency lists (legacy/test support)
    ///
    /// Rows are sorted by neighbor index so `edge_between` can binary search.
    pub fn from_adjacency_list(
        index_to_node: Vec<NodeId>,
        node_to_index: HashMap<NodeId, usize>,
        adjacency: Vec<Vec<(usize, f64, EdgeRef)>>,
    ) -> Self {
        let node_count = index_to_node.len();
        let mut offsets = Vec::with_capacity(node_count + 1);
        let mut targets = Vec::new();
        let mut strengths = Vec::new();
        let mut edge_refs = Vec::new();

        offsets.push(0);
        for mut row in adjacency {
            row.sort_by_key(|&(v, _, _)| v);
            for (v, strength, edge_ref) in row {
                targets.push(v);
                strengths.push(strength);
                edge_refs.push(edge_ref);
            }
            offsets.push(targets.len());
        }

        GraphView {
            node_count,
            index_to_node,
            node_to_index,
            offsets,
            targets,
            strengths,
            edge_refs,
        }
    }
}
