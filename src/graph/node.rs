//! Entity nodes of the relationship graph
//!
//! A node is created or updated from a [`NodeInput`] supplied by the ingestion
//! side. The derived scores (`centrality_score`, `influence_score`,
//! `is_landmark`) are owned by the engine and never appear on the input.

use super::types::{NodeId, NodeType, Tier};
use serde::{Deserialize, Serialize};

/// Caller-supplied description of an entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeInput {
    /// External, stable identifier (unique within a tenant graph)
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default)]
    pub tier: Tier,
    #[serde(default)]
    pub name: Option<String>,
}

impl NodeInput {
    pub fn new(id: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            id: id.into(),
            node_type,
            tier: Tier::default(),
            name: None,
        }
    }

    pub fn with_tier(mut self, tier: Tier) -> Self {
        self.tier = tier;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// A node in the relationship graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Arena index
    #[serde(skip)]
    pub key: NodeId,

    /// External identifier
    pub id: String,

    #[serde(rename = "type")]
    pub node_type: NodeType,

    pub tier: Tier,

    pub name: Option<String>,

    /// Normalized betweenness in [0, 1]; recomputed by analytics
    pub centrality_score: f64,

    /// Tier-weighted sum of incident strengths; recomputed by analytics
    pub influence_score: f64,

    /// Member of the current landmark set
    pub is_landmark: bool,
}

impl Node {
    pub(crate) fn from_input(key: NodeId, input: NodeInput) -> Self {
        Node {
            key,
            id: input.id,
            node_type: input.node_type,
            tier: input.tier,
            name: input.name,
            centrality_score: 0.0,
            influence_score: 0.0,
            is_landmark: false,
        }
    }

    /// Apply caller-owned fields; returns true when anything changed.
    pub(crate) fn apply_input(&mut self, input: NodeInput) -> bool {
        let changed = self.node_type != input.node_type
            || self.tier != input.tier
            || self.name != input.name;
        self.node_type = input.node_type;
        self.tier = input.tier;
        self.name = input.name;
        changed
    }

    /// Display label, falling back to the external id
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}
