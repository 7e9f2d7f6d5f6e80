//! Path discovery
//!
//! A request flows through three stages against one graph snapshot:
//! - [`finder::PathFinder`] validates it, projects the filtered view and runs
//!   the algorithm plus a bounded enumeration of alternatives
//! - [`scorer::PathScorer`] turns raw paths into scored, risk-annotated paths
//! - [`discover`] ranks them for the optimization goal and builds the analysis

pub mod finder;
pub mod request;
pub mod scorer;

pub use finder::{FoundPaths, PathFinder};
pub use request::{
    Algorithm, DiscoveryRequest, DiscoveryResponse, NetworkAnalysis, OptimizationGoal, PathAnalysis,
    PathEdge, PathQuality, PathType, RankedPath, RiskFactor,
};
pub use scorer::{confidence, rank, KnownRoutes, PathScorer};

use crate::algo::{articulation_points, PathResult, SearchBudget};
use crate::analytics::NetworkReport;
use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::graph::{GraphStore, NodeId};
use crate::landmark::LandmarkIndex;
use rustc_hash::FxHashSet;

/// Everything a discovery reads, all from one point in time
#[derive(Clone, Copy)]
pub struct DiscoveryContext<'a> {
    pub store: &'a GraphStore,
    pub landmarks: &'a LandmarkIndex,
    /// Most recent network report, if any
    pub network: Option<&'a NetworkReport>,
    pub config: &'a EngineConfig,
}

/// Find, score and rank paths for one request.
///
/// No path within the bound is a successful, empty response.
pub fn discover(
    ctx: DiscoveryContext<'_>,
    request: &DiscoveryRequest,
    budget: &SearchBudget,
) -> EngineResult<DiscoveryResponse> {
    let found = PathFinder::new(ctx.store, ctx.landmarks, &ctx.config.search).find(request, budget)?;

    let routes: Vec<PathResult> = found.enumerated.iter().chain(&found.paths).cloned().collect();
    let known = KnownRoutes::new(&routes);

    let scorer = PathScorer::new(ctx.store, &ctx.config.scoring, request.max_degrees);
    let mut paths = found
        .paths
        .iter()
        .map(|path| scorer.score(path, &known))
        .collect::<EngineResult<Vec<_>>>()?;
    rank(&mut paths, request.optimization_goal, ctx.config.search.max_results);

    let analysis = analyze_paths(ctx, request, &found, &known, &paths);
    Ok(DiscoveryResponse {
        paths,
        analysis,
        status: found.status,
    })
}

fn analyze_paths(
    ctx: DiscoveryContext<'_>,
    request: &DiscoveryRequest,
    found: &FoundPaths,
    known: &KnownRoutes<'_>,
    paths: &[RankedPath],
) -> PathAnalysis {
    let on_paths: Vec<(&str, NodeId)> = {
        let mut seen = FxHashSet::default();
        paths
            .iter()
            .flat_map(|p| p.nodes.iter())
            .filter(|id| seen.insert(id.as_str()))
            .filter_map(|id| Some((id.as_str(), ctx.store.resolve(id)?)))
            .collect()
    };
    let is_endpoint = |key: NodeId| key == found.source || key == found.target;

    let landmark_keys: FxHashSet<NodeId> = ctx.landmarks.landmark_keys().into_iter().collect();
    let landmark_nodes = on_paths
        .iter()
        .filter(|(_, key)| landmark_keys.contains(key))
        .map(|(id, _)| id.to_string())
        .collect();

    let bridge_nodes = if paths.is_empty() {
        Vec::new()
    } else {
        let cuts: FxHashSet<usize> = articulation_points(&found.view).into_iter().collect();
        on_paths
            .iter()
            .filter(|(_, key)| !is_endpoint(*key))
            .filter(|(_, key)| {
                found
                    .view
                    .index_of(key.as_u64())
                    .map_or(false, |idx| cuts.contains(&idx))
            })
            .map(|(id, _)| id.to_string())
            .collect()
    };

    let average_confidence = if paths.is_empty() {
        0.0
    } else {
        paths.iter().map(|p| p.confidence_score).sum::<f64>() / paths.len() as f64
    };

    let network_analysis = request
        .include_network_analysis
        .then(|| network_analysis(ctx, paths.first()));

    PathAnalysis {
        total_paths_found: known.len(),
        shortest_path_length: known.shortest_hops(),
        strongest_path_strength: paths
            .iter()
            .map(|p| p.average_strength)
            .fold(None, |best: Option<f64>, s| Some(best.map_or(s, |b| b.max(s)))),
        average_confidence,
        recommended_path_id: paths.first().map(|p| p.path_id.clone()),
        landmark_nodes,
        bridge_nodes,
        alternatives_truncated: found.alternatives_truncated(),
        network_analysis,
    }
}

fn network_analysis(ctx: DiscoveryContext<'_>, recommended: Option<&RankedPath>) -> NetworkAnalysis {
    let (betweenness_centrality, path_redundancy) = match recommended {
        None => (0.0, 0.0),
        Some(path) => {
            let intermediates = path.intermediates();
            if intermediates.is_empty() {
                (0.0, 1.0)
            } else {
                let centrality: f64 = intermediates
                    .iter()
                    .filter_map(|id| ctx.store.node(id).ok())
                    .map(|node| node.centrality_score)
                    .sum();
                let bottlenecks = path.bottlenecks().count();
                let count = intermediates.len() as f64;
                (centrality / count, 1.0 - bottlenecks as f64 / count)
            }
        }
    };

    NetworkAnalysis {
        clustering_coefficient: ctx.network.map(|r| r.clustering_coefficient),
        betweenness_centrality,
        path_redundancy,
        vulnerability_score: ctx.network.map(|r| r.vulnerability_score),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::SearchStatus;
    use crate::graph::{EdgeInput, NodeInput, NodeType};

    fn abc() -> GraphStore {
        let mut store = GraphStore::new();
        for id in ["A", "B", "C"] {
            store.upsert_node(NodeInput::new(id, NodeType::Person)).unwrap();
        }
        store.upsert_edge(EdgeInput::new("A", "B", "referral", 0.9)).unwrap();
        store.upsert_edge(EdgeInput::new("B", "C", "referral", 0.8)).unwrap();
        store
    }

    #[test]
    fn test_abc_scenario() {
        let store = abc();
        let landmarks = LandmarkIndex::build(&store, 1, &SearchBudget::unlimited()).unwrap();
        let config = EngineConfig::default();
        let ctx = DiscoveryContext { store: &store, landmarks: &landmarks, network: None, config: &config };

        let request = DiscoveryRequest::new("A", "C").with_algorithm(Algorithm::Bfs);
        let response = discover(ctx, &request, &SearchBudget::unlimited()).unwrap();

        assert_eq!(response.status, SearchStatus::Complete);
        assert_eq!(response.paths.len(), 1);
        let path = &response.paths[0];
        assert_eq!(path.nodes, vec!["A", "B", "C"]);
        assert_eq!(path.path_length, 2);
        assert!((path.average_strength - 0.85).abs() < 1e-9);
        assert!((path.confidence_score - 0.85 * 5.0 / 7.0).abs() < 1e-9);
        assert_eq!(path.bottlenecks().collect::<Vec<_>>(), vec!["B"]);

        let analysis = &response.analysis;
        assert_eq!(analysis.total_paths_found, 1);
        assert_eq!(analysis.shortest_path_length, Some(2));
        assert_eq!(analysis.recommended_path_id.as_deref(), Some("path-1"));
        assert_eq!(analysis.bridge_nodes, vec!["B"]);
        assert_eq!(analysis.landmark_nodes, vec!["B"]);

        let network = analysis.network_analysis.as_ref().unwrap();
        assert_eq!(network.path_redundancy, 0.0);
        assert_eq!(network.clustering_coefficient, None);
    }

    #[test]
    fn test_no_path_is_empty_success() {
        let mut store = abc();
        store.upsert_node(NodeInput::new("Z", NodeType::Grant)).unwrap();
        let landmarks = LandmarkIndex::empty();
        let config = EngineConfig::default();
        let ctx = DiscoveryContext { store: &store, landmarks: &landmarks, network: None, config: &config };

        let response = discover(ctx, &DiscoveryRequest::new("A", "Z"), &SearchBudget::unlimited()).unwrap();
        assert!(response.is_empty());
        assert_eq!(response.status, SearchStatus::Complete);
        assert_eq!(response.analysis.total_paths_found, 0);
        assert_eq!(response.analysis.shortest_path_length, None);
        assert_eq!(response.analysis.recommended_path_id, None);
        assert_eq!(response.analysis.average_confidence, 0.0);
    }

    #[test]
    fn test_network_analysis_optional() {
        let store = abc();
        let landmarks = LandmarkIndex::empty();
        let config = EngineConfig::default();
        let ctx = DiscoveryContext { store: &store, landmarks: &landmarks, network: None, config: &config };

        let mut request = DiscoveryRequest::new("A", "B");
        request.include_network_analysis = false;
        let response = discover(ctx, &request, &SearchBudget::unlimited()).unwrap();
        assert!(response.analysis.network_analysis.is_none());
        assert_eq!(response.paths[0].path_type, PathType::Direct);
    }
}
