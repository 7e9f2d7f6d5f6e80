//! Discovery request and response types

use crate::algo::{EdgeFilter, SearchStatus};
use crate::config::{SearchConfig, MAX_DEGREES};
use crate::error::{EngineError, EngineResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Search algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// Fewest hops
    Bfs,
    /// Cheapest path over `1 - strength` costs
    Dijkstra,
    /// Dijkstra guided by the landmark lower bound
    AStar,
    /// Approximate route through the best landmark
    LandmarkRouting,
    /// Bounded enumeration of every simple path
    AllPaths,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Algorithm::Bfs => "bfs",
            Algorithm::Dijkstra => "dijkstra",
            Algorithm::AStar => "a_star",
            Algorithm::LandmarkRouting => "landmark_routing",
            Algorithm::AllPaths => "all_paths",
        };
        f.write_str(name)
    }
}

/// What the caller wants the top-ranked path to be best at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OptimizationGoal {
    #[default]
    Shortest,
    Strongest,
    Fastest,
    MostReliable,
}

impl OptimizationGoal {
    /// Algorithm used when the request leaves it open
    pub fn default_algorithm(&self) -> Algorithm {
        match self {
            OptimizationGoal::Shortest | OptimizationGoal::Fastest => Algorithm::Bfs,
            OptimizationGoal::Strongest => Algorithm::Dijkstra,
            OptimizationGoal::MostReliable => Algorithm::AStar,
        }
    }
}

fn default_max_degrees() -> usize {
    MAX_DEGREES
}

fn default_true() -> bool {
    true
}

/// A single path discovery query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryRequest {
    pub source_id: String,
    pub target_id: String,
    #[serde(default = "default_max_degrees")]
    pub max_degrees: usize,
    #[serde(default)]
    pub algorithm: Option<Algorithm>,
    #[serde(default = "default_true")]
    pub include_weak_connections: bool,
    #[serde(default)]
    pub require_verified_only: bool,
    #[serde(default)]
    pub optimization_goal: OptimizationGoal,
    /// Attach the cached network metrics to the analysis
    #[serde(default = "default_true")]
    pub include_network_analysis: bool,
}

impl DiscoveryRequest {
    pub fn new(source_id: impl Into<String>, target_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            max_degrees: MAX_DEGREES,
            algorithm: None,
            include_weak_connections: true,
            require_verified_only: false,
            optimization_goal: OptimizationGoal::default(),
            include_network_analysis: true,
        }
    }

    pub fn with_max_degrees(mut self, max_degrees: usize) -> Self {
        self.max_degrees = max_degrees;
        self
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = Some(algorithm);
        self
    }

    pub fn with_goal(mut self, goal: OptimizationGoal) -> Self {
        self.optimization_goal = goal;
        self
    }

    pub fn without_weak_connections(mut self) -> Self {
        self.include_weak_connections = false;
        self
    }

    pub fn verified_only(mut self) -> Self {
        self.require_verified_only = true;
        self
    }

    /// The same query with endpoints swapped
    pub fn reversed(&self) -> Self {
        let mut reversed = self.clone();
        std::mem::swap(&mut reversed.source_id, &mut reversed.target_id);
        reversed
    }

    pub fn resolved_algorithm(&self) -> Algorithm {
        self.algorithm
            .unwrap_or_else(|| self.optimization_goal.default_algorithm())
    }

    pub fn edge_filter(&self, config: &SearchConfig) -> EdgeFilter {
        EdgeFilter {
            min_strength: (!self.include_weak_connections).then_some(config.weak_connection_threshold),
            verified_only: self.require_verified_only,
        }
    }

    /// Checks that need no graph
    pub fn validate(&self) -> EngineResult<()> {
        if !(1..=MAX_DEGREES).contains(&self.max_degrees) {
            return Err(EngineError::InvalidInput(format!(
                "max_degrees must be within 1..={}, got {}",
                MAX_DEGREES, self.max_degrees
            )));
        }
        if self.source_id == self.target_id {
            return Err(EngineError::InvalidInput(format!(
                "source and target are the same node '{}'",
                self.source_id
            )));
        }
        Ok(())
    }
}

/// Hop-count class of a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathType {
    Direct,
    Indirect,
    MultiHop,
}

impl PathType {
    pub fn from_length(length: usize) -> Self {
        match length {
            0 | 1 => PathType::Direct,
            2 | 3 => PathType::Indirect,
            _ => PathType::MultiHop,
        }
    }
}

/// Confidence band of a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathQuality {
    Excellent,
    Good,
    Fair,
    Weak,
}

impl PathQuality {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= 0.8 {
            PathQuality::Excellent
        } else if confidence >= 0.6 {
            PathQuality::Good
        } else if confidence >= 0.4 {
            PathQuality::Fair
        } else {
            PathQuality::Weak
        }
    }
}

/// Why a path might fail in practice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RiskFactor {
    /// Intermediate node every known route passes through
    Bottleneck { node_id: String },
    /// Weakest hop of the path, below the weak-link threshold
    WeakLink {
        source_id: String,
        target_id: String,
        strength: f64,
    },
}

/// One hop of a returned path, oriented along the path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathEdge {
    pub source_id: String,
    pub target_id: String,
    pub relationship_type: String,
    pub strength: f64,
    pub verified: bool,
    pub last_interaction: Option<DateTime<Utc>>,
}

/// A scored path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPath {
    pub path_id: String,
    pub nodes: Vec<String>,
    pub edges: Vec<PathEdge>,
    pub total_strength: f64,
    pub average_strength: f64,
    pub path_length: usize,
    pub confidence_score: f64,
    pub path_quality: PathQuality,
    pub path_type: PathType,
    /// Distinct known routes between the same endpoints, this one excluded
    pub alternative_routes: usize,
    pub risk_factors: Vec<RiskFactor>,
}

impl RankedPath {
    pub fn verified_edges(&self) -> usize {
        self.edges.iter().filter(|e| e.verified).count()
    }

    pub fn latest_interaction(&self) -> Option<DateTime<Utc>> {
        self.edges.iter().filter_map(|e| e.last_interaction).max()
    }

    /// Intermediate node ids
    pub fn intermediates(&self) -> &[String] {
        if self.nodes.len() < 2 {
            return &[];
        }
        &self.nodes[1..self.nodes.len() - 1]
    }

    pub fn bottlenecks(&self) -> impl Iterator<Item = &str> + '_ {
        self.risk_factors.iter().filter_map(|risk| match risk {
            RiskFactor::Bottleneck { node_id } => Some(node_id.as_str()),
            RiskFactor::WeakLink { .. } => None,
        })
    }
}

/// Graph-level context for a response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkAnalysis {
    /// Average clustering coefficient from the cached network report
    pub clustering_coefficient: Option<f64>,
    /// Mean centrality of the recommended path's intermediate nodes
    pub betweenness_centrality: f64,
    /// Share of the recommended path's intermediates that can be routed around
    pub path_redundancy: f64,
    /// Sampled vulnerability from the cached network report
    pub vulnerability_score: Option<f64>,
}

/// Summary over all paths of one discovery
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathAnalysis {
    pub total_paths_found: usize,
    pub shortest_path_length: Option<usize>,
    pub strongest_path_strength: Option<f64>,
    pub average_confidence: f64,
    pub recommended_path_id: Option<String>,
    /// Landmarks lying on returned paths
    pub landmark_nodes: Vec<String>,
    /// Articulation points lying on returned paths
    pub bridge_nodes: Vec<String>,
    /// The enumeration behind alternatives and bottlenecks hit its ceiling
    pub alternatives_truncated: bool,
    pub network_analysis: Option<NetworkAnalysis>,
}

/// Ranked paths plus analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryResponse {
    pub paths: Vec<RankedPath>,
    pub analysis: PathAnalysis,
    pub status: SearchStatus,
}

impl DiscoveryResponse {
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn recommended(&self) -> Option<&RankedPath> {
        self.paths.first()
    }
}
