//! Seven Degrees
//!
//! Relationship path discovery over a weighted, undirected graph of people,
//! organizations, sponsors and grants: find, score and rank the chains of
//! relationships that connect two entities within a bounded number of hops.
//!
//! # Architecture
//!
//! - [`graph`]: arena-backed relationship graph with a single serialized
//!   writer and copy-on-write snapshots for readers
//! - [`landmark`]: precomputed shortest-path trees from well-connected nodes,
//!   used as an admissible A* heuristic and for approximate routing
//! - [`discovery`]: bounded BFS, Dijkstra, A*, landmark routing and all-paths
//!   enumeration, plus path scoring, risk analysis and ranking
//! - [`analytics`]: clustering, sampled betweenness, articulation points and
//!   vulnerability for the whole graph
//! - [`task`]: asynchronous discovery tasks with in-loop cancellation
//! - [`http`]: axum API over the task coordinator
//!
//! Graph algorithms live in the `seven-degrees-graph-algorithms` crate and
//! run over a dense projection built by [`algo::build_view`].
//!
//! # Example
//!
//! ```
//! use seven_degrees::{DiscoveryRequest, EdgeInput, Engine, EngineConfig, NodeInput, NodeType};
//!
//! let engine = Engine::new(EngineConfig::default()).unwrap();
//! for id in ["A", "B", "C"] {
//!     engine.upsert_node(NodeInput::new(id, NodeType::Person)).unwrap();
//! }
//! engine.upsert_edge(EdgeInput::new("A", "B", "referral", 0.9)).unwrap();
//! engine.upsert_edge(EdgeInput::new("B", "C", "referral", 0.8)).unwrap();
//!
//! let response = engine
//!     .discover(&DiscoveryRequest::new("A", "C"), &engine.search_budget(None))
//!     .unwrap();
//! assert_eq!(response.paths[0].nodes, vec!["A", "B", "C"]);
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod analytics;
pub mod config;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod graph;
pub mod http;
pub mod landmark;
pub mod task;

pub use algo::{EdgeFilter, SearchBudget, SearchStatus};
pub use analytics::{NetworkReport, RankedNode};
pub use config::{
    AnalyticsConfig, EngineConfig, LandmarkConfig, ScoringConfig, SearchConfig, ServerConfig,
    TaskConfig, MAX_DEGREES,
};
pub use discovery::{
    confidence, Algorithm, DiscoveryRequest, DiscoveryResponse, NetworkAnalysis, OptimizationGoal, PathAnalysis,
    PathEdge, PathQuality, PathType, RankedPath, RiskFactor,
};
pub use engine::{spawn_maintenance, Engine, EngineStats};
pub use error::{EngineError, EngineResult, ErrorBody, ErrorKind};
pub use graph::{
    Edge, EdgeId, EdgeInput, GraphError, GraphMutation, GraphResult, GraphStore, Node, NodeId,
    NodeInput, NodeType, RelationshipType, SharedGraph, Tier,
};
pub use http::{router, AppState, HttpServer};
pub use landmark::LandmarkIndex;
pub use task::{spawn_purger, DiscoveryCoordinator, TaskId, TaskSnapshot, TaskStatus};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        let ver = version();
        assert!(!ver.is_empty());
        assert_eq!(ver, "0.1.0");
    }
}
