//! Path scoring, risk analysis and ranking

use super::request::{
    OptimizationGoal, PathEdge, PathQuality, PathType, RankedPath, RiskFactor,
};
use crate::algo::{to_node_id, PathResult};
use crate::config::ScoringConfig;
use crate::error::{EngineError, EngineResult};
use crate::graph::{EdgeId, GraphStore};
use rustc_hash::{FxHashMap, FxHashSet};
use std::cmp::Ordering;

/// `average_strength × (1 − length_weight × length / max_degrees)`, clamped to [0, 1].
///
/// Non-increasing in `length` for a fixed average strength.
pub fn confidence(average_strength: f64, length: usize, max_degrees: usize, length_weight: f64) -> f64 {
    let penalty = 1.0 - length_weight * length as f64 / max_degrees.max(1) as f64;
    let score = average_strength * penalty;
    if score.is_nan() {
        return 0.0;
    }
    score.clamp(0.0, 1.0)
}

/// Every route found between one pair of endpoints, indexed for scoring
pub struct KnownRoutes<'r> {
    distinct: Vec<&'r PathResult>,
    members: FxHashSet<&'r [u64]>,
    /// Routes passing through each node
    node_counts: FxHashMap<u64, usize>,
}

impl<'r> KnownRoutes<'r> {
    pub fn new(routes: &'r [PathResult]) -> Self {
        let mut distinct: Vec<&PathResult> = Vec::with_capacity(routes.len());
        let mut members = FxHashSet::default();
        let mut node_counts: FxHashMap<u64, usize> = FxHashMap::default();
        for route in routes {
            if !members.insert(route.path.as_slice()) {
                continue;
            }
            distinct.push(route);
            for &node in &route.path {
                *node_counts.entry(node).or_default() += 1;
            }
        }
        Self { distinct, members, node_counts }
    }

    pub fn len(&self) -> usize {
        self.distinct.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distinct.is_empty()
    }

    pub fn contains(&self, path: &PathResult) -> bool {
        self.members.contains(path.path.as_slice())
    }

    pub fn shortest_hops(&self) -> Option<usize> {
        self.distinct.iter().map(|r| r.hops()).min()
    }

    fn count(&self, node: u64) -> usize {
        self.node_counts.get(&node).copied().unwrap_or(0)
    }
}

/// Scores raw paths against the graph they were found in
pub struct PathScorer<'a> {
    store: &'a GraphStore,
    config: &'a ScoringConfig,
    max_degrees: usize,
}

impl<'a> PathScorer<'a> {
    pub fn new(store: &'a GraphStore, config: &'a ScoringConfig, max_degrees: usize) -> Self {
        Self { store, config, max_degrees }
    }

    fn external_id(&self, node: u64) -> EngineResult<String> {
        self.store
            .external_id(to_node_id(node))
            .map(str::to_string)
            .ok_or_else(|| EngineError::GraphInconsistency(format!("path references unknown node {}", node)))
    }

    fn node_ids(&self, path: &PathResult) -> EngineResult<Vec<String>> {
        path.path.iter().map(|&n| self.external_id(n)).collect()
    }

    /// Score one path against every route known between the same endpoints.
    ///
    /// An intermediate node is a bottleneck when every other known route also
    /// passes through it; with no other route, every intermediate is one.
    pub fn score(&self, path: &PathResult, known: &KnownRoutes<'_>) -> EngineResult<RankedPath> {
        if path.edges.len() != path.hops() || path.hops() == 0 {
            return Err(EngineError::GraphInconsistency(format!(
                "path of {} nodes carries {} edges",
                path.path.len(),
                path.edges.len()
            )));
        }

        let nodes = self.node_ids(path)?;
        let mut edges = Vec::with_capacity(path.edges.len());
        for (i, &edge_ref) in path.edges.iter().enumerate() {
            let edge = self
                .store
                .get_edge(EdgeId::new(edge_ref))
                .ok_or_else(|| EngineError::GraphInconsistency(format!("path references unknown edge {}", edge_ref)))?;
            edges.push(PathEdge {
                source_id: nodes[i].clone(),
                target_id: nodes[i + 1].clone(),
                relationship_type: edge.relationship_type.to_string(),
                strength: edge.strength,
                verified: edge.verified,
                last_interaction: edge.last_interaction,
            });
        }

        let path_length = edges.len();
        let total_strength: f64 = edges.iter().map(|e| e.strength).sum();
        let average_strength = total_strength / path_length as f64;
        let confidence_score = confidence(
            average_strength,
            path_length,
            self.max_degrees,
            self.config.length_weight,
        );

        let own = usize::from(known.contains(path));
        let alternatives = known.len() - own;
        let mut risk_factors: Vec<RiskFactor> = path.path[1..path.path.len() - 1]
            .iter()
            .zip(&nodes[1..nodes.len() - 1])
            .filter(|(node, _)| known.count(**node).saturating_sub(own) == alternatives)
            .map(|(_, id)| RiskFactor::Bottleneck { node_id: id.clone() })
            .collect();

        if let Some(weakest) = edges
            .iter()
            .min_by(|a, b| a.strength.partial_cmp(&b.strength).unwrap_or(Ordering::Equal))
        {
            if weakest.strength < self.config.weak_link_threshold {
                risk_factors.push(RiskFactor::WeakLink {
                    source_id: weakest.source_id.clone(),
                    target_id: weakest.target_id.clone(),
                    strength: weakest.strength,
                });
            }
        }

        Ok(RankedPath {
            path_id: String::new(),
            nodes,
            edges,
            total_strength,
            average_strength,
            path_length,
            confidence_score,
            path_quality: PathQuality::from_confidence(confidence_score),
            path_type: PathType::from_length(path_length),
            alternative_routes: alternatives,
            risk_factors,
        })
    }
}

fn desc(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

fn compare(goal: OptimizationGoal, a: &RankedPath, b: &RankedPath) -> Ordering {
    let primary = match goal {
        OptimizationGoal::Shortest => a
            .path_length
            .cmp(&b.path_length)
            .then(desc(a.confidence_score, b.confidence_score)),
        OptimizationGoal::Strongest => desc(a.average_strength, b.average_strength),
        OptimizationGoal::MostReliable => desc(a.confidence_score, b.confidence_score),
        OptimizationGoal::Fastest => a
            .path_length
            .cmp(&b.path_length)
            .then(b.verified_edges().cmp(&a.verified_edges()))
            .then(b.latest_interaction().cmp(&a.latest_interaction())),
    };
    primary
        .then(desc(a.confidence_score, b.confidence_score))
        .then(a.path_length.cmp(&b.path_length))
}

/// Order paths best-first for the goal, keep `limit`, and assign path ids.
pub fn rank(paths: &mut Vec<RankedPath>, goal: OptimizationGoal, limit: usize) {
    paths.sort_by(|a, b| compare(goal, a, b));
    paths.truncate(limit);
    for (i, path) in paths.iter_mut().enumerate() {
        path.path_id = format!("path-{}", i + 1);
    }
}
