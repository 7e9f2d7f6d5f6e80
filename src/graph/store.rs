//! In-memory graph storage implementation
//!
//! Nodes and edges live in arenas addressed by [`NodeId`] / [`EdgeId`];
//! external string ids are interned through `key_index`. The store itself is a
//! plain value. Concurrent access goes through [`super::SharedGraph`].

use super::edge::{ordered, Edge, EdgeInput};
use super::node::{Node, NodeInput};
use super::types::{EdgeId, NodeId, RelationshipType};
use rustc_hash::FxHashMap;
use thiserror::Error;

/// Errors that can occur during graph operations
#[derive(Error, Debug, PartialEq)]
pub enum GraphError {
    #[error("Node '{0}' not found")]
    NodeNotFound(String),

    #[error("Edge {0} not found")]
    EdgeNotFound(EdgeId),

    #[error("Invalid edge: source node '{0}' does not exist")]
    InvalidEdgeSource(String),

    #[error("Invalid edge: target node '{0}' does not exist")]
    InvalidEdgeTarget(String),

    #[error("Invalid edge: node '{0}' cannot relate to itself")]
    SelfLoop(String),

    #[error("Invalid strength {0}: must be within [0, 1]")]
    InvalidStrength(f64),

    #[error("Node id must not be empty")]
    EmptyNodeId,

    #[error("Graph inconsistency: {0}")]
    Inconsistent(String),
}

pub type GraphResult<T> = Result<T, GraphError>;

/// Arena-backed relationship graph for a single tenant
///
/// - nodes: NodeId -> Node
/// - edges: EdgeId -> Edge
/// - adjacency: NodeId -> Vec<EdgeId> (both endpoints list every edge)
/// - key_index: external id -> NodeId
/// - pair_index: (low, high, type) -> EdgeId, enforcing one edge per pair and type
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    adjacency: Vec<Vec<EdgeId>>,
    key_index: FxHashMap<String, NodeId>,
    pair_index: FxHashMap<(NodeId, NodeId, RelationshipType), EdgeId>,
    /// Bumped by every upsert that changes stored data
    version: u64,
    /// Bumped when an edge is added or strengthened, i.e. when some weighted
    /// distance may have shrunk
    shortcut_epoch: u64,
}

impl GraphStore {
    /// Create a new empty graph store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node or update the caller-owned fields of an existing one.
    pub fn upsert_node(&mut self, input: NodeInput) -> GraphResult<NodeId> {
        if input.id.trim().is_empty() {
            return Err(GraphError::EmptyNodeId);
        }

        if let Some(&key) = self.key_index.get(&input.id) {
            if self.nodes[key.index()].apply_input(input) {
                self.version += 1;
            }
            return Ok(key);
        }

        let key = NodeId::new(self.nodes.len() as u64);
        self.key_index.insert(input.id.clone(), key);
        self.nodes.push(Node::from_input(key, input));
        self.adjacency.push(Vec::new());
        self.version += 1;
        Ok(key)
    }

    /// Insert an edge or refresh strength/verified/timestamp of the existing
    /// edge for the same unordered pair and relationship type.
    ///
    /// Both endpoints must already exist; dangling edges are rejected.
    pub fn upsert_edge(&mut self, input: EdgeInput) -> GraphResult<EdgeId> {
        if !input.strength.is_finite() || !(0.0..=1.0).contains(&input.strength) {
            return Err(GraphError::InvalidStrength(input.strength));
        }
        let source = self
            .resolve(&input.source_id)
            .ok_or_else(|| GraphError::InvalidEdgeSource(input.source_id.clone()))?;
        let target = self
            .resolve(&input.target_id)
            .ok_or_else(|| GraphError::InvalidEdgeTarget(input.target_id.clone()))?;
        if source == target {
            return Err(GraphError::SelfLoop(input.source_id));
        }

        let (low, high) = ordered(source, target);
        let pair_key = (low, high, input.relationship_type.clone());

        if let Some(&edge_id) = self.pair_index.get(&pair_key) {
            let edge = &mut self.edges[edge_id.index()];
            let strengthened = input.strength > edge.strength;
            if edge.refresh(input.strength, input.verified, input.last_interaction) {
                self.version += 1;
            }
            if strengthened {
                self.shortcut_epoch += 1;
            }
            return Ok(edge_id);
        }

        let edge_id = EdgeId::new(self.edges.len() as u64);
        self.edges.push(Edge {
            id: edge_id,
            source,
            target,
            relationship_type: input.relationship_type,
            strength: input.strength,
            verified: input.verified,
            last_interaction: input.last_interaction,
        });
        self.adjacency[source.index()].push(edge_id);
        self.adjacency[target.index()].push(edge_id);
        self.pair_index.insert(pair_key, edge_id);
        self.version += 1;
        self.shortcut_epoch += 1;
        Ok(edge_id)
    }

    /// Look up a node by external id
    pub fn node(&self, id: &str) -> GraphResult<&Node> {
        self.resolve(id)
            .and_then(|key| self.get_node(key))
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))
    }

    /// Arena key of an external id
    pub fn resolve(&self, id: &str) -> Option<NodeId> {
        self.key_index.get(id).copied()
    }

    /// Get a node by arena key
    pub fn get_node(&self, key: NodeId) -> Option<&Node> {
        self.nodes.get(key.index())
    }

    /// Check if a node exists
    pub fn has_node(&self, key: NodeId) -> bool {
        key.index() < self.nodes.len()
    }

    /// Get an edge by ID
    pub fn get_edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.index())
    }

    /// Neighbors of a node together with the connecting edge.
    ///
    /// A neighbor joined by several relationship types is yielded once per edge.
    pub fn neighbors(&self, key: NodeId) -> impl Iterator<Item = (NodeId, &Edge)> + '_ {
        self.adjacency
            .get(key.index())
            .into_iter()
            .flatten()
            .filter_map(move |&edge_id| {
                let edge = self.edges.get(edge_id.index())?;
                Some((edge.other(key)?, edge))
            })
    }

    /// All edges joining two nodes, any relationship type
    pub fn edges_between(&self, a: NodeId, b: NodeId) -> impl Iterator<Item = &Edge> + '_ {
        self.neighbors(a)
            .filter(move |(other, _)| *other == b)
            .map(|(_, edge)| edge)
    }

    /// Number of incident edges
    pub fn degree(&self, key: NodeId) -> usize {
        self.adjacency.get(key.index()).map_or(0, Vec::len)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn shortcut_epoch(&self) -> u64 {
        self.shortcut_epoch
    }

    pub fn all_nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.iter()
    }

    pub fn all_edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.edges.iter()
    }

    /// External id of an arena key
    pub fn external_id(&self, key: NodeId) -> Option<&str> {
        self.get_node(key).map(|n| n.id.as_str())
    }

    /// Write analytics-derived scores. Unknown keys are skipped.
    ///
    /// Derived scores do not bump `version`; they never change topology.
    pub fn apply_derived_scores(&mut self, scores: &[(NodeId, f64, f64)]) {
        for &(key, centrality, influence) in scores {
            if let Some(node) = self.nodes.get_mut(key.index()) {
                node.centrality_score = centrality.clamp(0.0, 1.0);
                node.influence_score = influence.max(0.0);
            }
        }
    }

    /// Flag exactly the given nodes as landmarks
    pub fn mark_landmarks(&mut self, landmarks: &[NodeId]) {
        for node in &mut self.nodes {
            node.is_landmark = false;
        }
        for key in landmarks {
            if let Some(node) = self.nodes.get_mut(key.index()) {
                node.is_landmark = true;
            }
        }
    }

    /// Verify arena invariants: every edge endpoint exists, adjacency lists only
    /// reference incident edges, and the pair index matches the edge arena.
    pub fn consistency_check(&self) -> GraphResult<()> {
        if self.adjacency.len() != self.nodes.len() {
            return Err(GraphError::Inconsistent(format!(
                "{} adjacency rows for {} nodes",
                self.adjacency.len(),
                self.nodes.len()
            )));
        }
        for edge in &self.edges {
            if !self.has_node(edge.source) || !self.has_node(edge.target) {
                return Err(GraphError::Inconsistent(format!("dangling edge {}", edge.id)));
            }
        }
        for (idx, row) in self.adjacency.iter().enumerate() {
            let key = NodeId::new(idx as u64);
            for &edge_id in row {
                let edge = self
                    .get_edge(edge_id)
                    .ok_or(GraphError::EdgeNotFound(edge_id))?;
                if edge.other(key).is_none() {
                    return Err(GraphError::Inconsistent(format!(
                        "{} listed on non-incident {}",
                        edge_id, key
                    )));
                }
            }
        }
        if self.pair_index.len() != self.edges.len() {
            return Err(GraphError::Inconsistent(format!(
                "pair index holds {} entries for {} edges",
                self.pair_index.len(),
                self.edges.len()
            )));
        }
        Ok(())
    }
}
