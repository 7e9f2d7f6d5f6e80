//! Core type definitions for the relationship graph

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Arena index of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord, Default)]
pub struct NodeId(pub u64);

impl NodeId {
    pub fn new(id: u64) -> Self {
        NodeId(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub(crate) fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Arena index of an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord, Default)]
pub struct EdgeId(pub u64);

impl EdgeId {
    pub fn new(id: u64) -> Self {
        EdgeId(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub(crate) fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "edge#{}", self.0)
    }
}

/// Relationship tag (e.g. "partnership", "funding", "referral")
///
/// Free-form, normalized to trimmed lower case so "Funding" and "funding " are
/// the same relationship.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(from = "String", into = "String")]
pub struct RelationshipType(String);

impl RelationshipType {
    pub fn new(tag: impl Into<String>) -> Self {
        RelationshipType(tag.into().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RelationshipType {
    fn from(s: String) -> Self {
        RelationshipType::new(s)
    }
}

impl From<&str> for RelationshipType {
    fn from(s: &str) -> Self {
        RelationshipType::new(s)
    }
}

impl From<RelationshipType> for String {
    fn from(t: RelationshipType) -> Self {
        t.0
    }
}

/// Kind of entity a node represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Person,
    Organization,
    Sponsor,
    Grant,
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NodeType::Person => "person",
            NodeType::Organization => "organization",
            NodeType::Sponsor => "sponsor",
            NodeType::Grant => "grant",
        };
        f.write_str(name)
    }
}

/// Ordinal relationship tier; `A` ranks highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Tier {
    A,
    B,
    #[default]
    C,
    D,
}

impl Tier {
    /// Multiplier applied to a node's weighted degree when computing influence
    pub fn weight(&self) -> f64 {
        match self {
            Tier::A => 1.0,
            Tier::B => 0.75,
            Tier::C => 0.5,
            Tier::D => 0.25,
        }
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(Tier::A),
            "B" => Ok(Tier::B),
            "C" => Ok(Tier::C),
            "D" => Ok(Tier::D),
            other => Err(format!("unknown tier '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arena_keys() {
        let node = NodeId::new(42);
        assert_eq!(node.index(), 42);
        assert_eq!(node.to_string(), "node#42");
        assert!(NodeId::new(3) < node);

        let edge = EdgeId::new(7);
        assert_eq!(edge.index(), 7);
        assert_eq!(edge.to_string(), "edge#7");
        assert_eq!(EdgeId::default().as_u64(), 0);
    }

    #[test]
    fn test_relationship_type_normalized() {
        let a = RelationshipType::new(" Funding ");
        let b: RelationshipType = "funding".into();
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "funding");

        let parsed: RelationshipType = serde_json::from_str("\"Advisory\"").unwrap();
        assert_eq!(parsed.as_str(), "advisory");
    }

    #[test]
    fn test_tier_ordering() {
        assert!(Tier::A < Tier::B);
        assert!(Tier::C < Tier::D);
        assert_eq!("b".parse::<Tier>(), Ok(Tier::B));
        assert!("Z".parse::<Tier>().is_err());
        assert!(Tier::A.weight() > Tier::D.weight());
    }

    #[test]
    fn test_node_type_serde() {
        let json = serde_json::to_string(&NodeType::Organization).unwrap();
        assert_eq!(json, "\"organization\"");
        assert_eq!(NodeType::Sponsor.to_string(), "sponsor");
    }
}
