//! Relationship graph
//!
//! This module implements the tenant graph the engine searches:
//! - Typed entity nodes interned by external id
//! - Undirected, weighted relationship edges (one per pair and type)
//! - An arena store with a serialized, copy-on-write writer path

pub mod edge;
pub mod node;
pub mod shared;
pub mod store;
pub mod types;

// Re-export main types
pub use edge::{Edge, EdgeInput};
pub use node::{Node, NodeInput};
pub use shared::{GraphMutation, SharedGraph};
pub use store::{GraphError, GraphResult, GraphStore};
pub use types::{EdgeId, NodeId, NodeType, RelationshipType, Tier};
