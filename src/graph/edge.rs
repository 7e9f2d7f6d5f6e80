//! Relationship edges
//!
//! Edges are undirected for traversal: `source`/`target` only record the
//! orientation of the first insertion. At most one edge exists per unordered
//! pair and relationship type.

use super::types::{EdgeId, NodeId, RelationshipType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Caller-supplied relationship between two external node ids
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeInput {
    pub source_id: String,
    pub target_id: String,
    pub relationship_type: RelationshipType,
    /// Relationship strength in [0, 1]; higher is stronger
    pub strength: f64,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub last_interaction: Option<DateTime<Utc>>,
}

impl EdgeInput {
    pub fn new(
        source_id: impl Into<String>,
        target_id: impl Into<String>,
        relationship_type: impl Into<RelationshipType>,
        strength: f64,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            relationship_type: relationship_type.into(),
            strength,
            verified: false,
            last_interaction: None,
        }
    }

    pub fn verified(mut self, verified: bool) -> Self {
        self.verified = verified;
        self
    }

    pub fn last_interaction(mut self, at: DateTime<Utc>) -> Self {
        self.last_interaction = Some(at);
        self
    }
}

/// An undirected, weighted relationship edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Unique identifier for this edge
    pub id: EdgeId,

    /// Endpoint recorded as source on first insertion
    pub source: NodeId,

    /// Endpoint recorded as target on first insertion
    pub target: NodeId,

    pub relationship_type: RelationshipType,

    pub strength: f64,

    pub verified: bool,

    pub last_interaction: Option<DateTime<Utc>>,
}

impl Edge {
    /// Check if this edge connects two specific nodes (in either direction)
    pub fn connects(&self, node1: NodeId, node2: NodeId) -> bool {
        (self.source == node1 && self.target == node2)
            || (self.source == node2 && self.target == node1)
    }

    /// The endpoint opposite `node`, if `node` is an endpoint at all
    pub fn other(&self, node: NodeId) -> Option<NodeId> {
        if self.source == node {
            Some(self.target)
        } else if self.target == node {
            Some(self.source)
        } else {
            None
        }
    }

    /// Endpoints ordered (low, high), used as the undirected identity
    pub fn unordered_pair(&self) -> (NodeId, NodeId) {
        ordered(self.source, self.target)
    }

    /// Overwrite the mutable attributes; returns true when anything changed.
    pub(crate) fn refresh(
        &mut self,
        strength: f64,
        verified: bool,
        last_interaction: Option<DateTime<Utc>>,
    ) -> bool {
        let changed = self.strength != strength
            || self.verified != verified
            || self.last_interaction != last_interaction;
        self.strength = strength;
        self.verified = verified;
        self.last_interaction = last_interaction;
        changed
    }
}

pub(crate) fn ordered(a: NodeId, b: NodeId) -> (NodeId, NodeId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
