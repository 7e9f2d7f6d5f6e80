//! Path finder
//!
//! Resolves a request against one graph snapshot, projects the filtered view
//! and runs the requested algorithm. Every algorithm is hop bounded and runs
//! under the caller's [`SearchBudget`].

use super::request::{Algorithm, DiscoveryRequest};
use crate::algo::{
    a_star, all_simple_paths, bounded_bfs, build_view, dijkstra, path_from_nodes, to_node_id,
    PathResult, SearchBudget, SearchReport, SearchStatus,
};
use crate::config::SearchConfig;
use crate::error::{EngineError, EngineResult};
use crate::graph::{GraphStore, NodeId};
use crate::landmark::LandmarkIndex;
use seven_degrees_graph_algorithms::GraphView;
use tracing::debug;

/// Raw search output before scoring
#[derive(Debug)]
pub struct FoundPaths {
    pub view: GraphView,
    pub source: NodeId,
    pub target: NodeId,
    pub algorithm: Algorithm,
    /// Paths produced by the requested algorithm
    pub paths: Vec<PathResult>,
    /// Bounded enumeration used for alternatives and bottlenecks
    pub enumerated: Vec<PathResult>,
    pub status: SearchStatus,
    pub enumeration_status: SearchStatus,
}

impl FoundPaths {
    pub fn alternatives_truncated(&self) -> bool {
        self.enumeration_status.is_partial()
    }
}

/// Runs searches over one snapshot
pub struct PathFinder<'a> {
    store: &'a GraphStore,
    landmarks: &'a LandmarkIndex,
    config: &'a SearchConfig,
}

impl<'a> PathFinder<'a> {
    pub fn new(store: &'a GraphStore, landmarks: &'a LandmarkIndex, config: &'a SearchConfig) -> Self {
        Self { store, landmarks, config }
    }

    fn resolve(&self, id: &str) -> EngineResult<NodeId> {
        self.store
            .resolve(id)
            .ok_or_else(|| EngineError::InvalidInput(format!("unknown node id '{}'", id)))
    }

    /// Fail when the constraints removed every edge of an endpoint that has some
    fn check_reachable(&self, view: &GraphView, key: NodeId, id: &str) -> EngineResult<()> {
        let filtered_degree = view.index_of(key.as_u64()).map_or(0, |idx| view.degree(idx));
        if self.store.degree(key) > 0 && filtered_degree == 0 {
            return Err(EngineError::InvalidInput(format!(
                "every relationship of '{}' is excluded by the request constraints",
                id
            )));
        }
        Ok(())
    }

    pub fn find(&self, request: &DiscoveryRequest, budget: &SearchBudget) -> EngineResult<FoundPaths> {
        request.validate()?;
        let source = self.resolve(&request.source_id)?;
        let target = self.resolve(&request.target_id)?;

        let view = build_view(self.store, &request.edge_filter(self.config));
        self.check_reachable(&view, source, &request.source_id)?;
        self.check_reachable(&view, target, &request.target_id)?;

        let algorithm = request.resolved_algorithm();
        let max_hops = request.max_degrees;
        let (s, t) = (source.as_u64(), target.as_u64());
        let missing = || EngineError::GraphInconsistency("endpoint missing from graph view".into());

        let primary: SearchReport<Vec<PathResult>> = match algorithm {
            Algorithm::Bfs => bounded_bfs(&view, s, t, max_hops, self.config.max_results, budget)
                .ok_or_else(missing)?,
            Algorithm::Dijkstra => dijkstra(&view, s, t, max_hops, budget)
                .ok_or_else(missing)?
                .map(Vec::from_iter),
            Algorithm::AStar => self.guided(&view, source, target, max_hops, budget).ok_or_else(missing)?,
            Algorithm::LandmarkRouting => match self.landmark_route(&view, source, target, max_hops) {
                Some(path) => SearchReport::new(vec![path], SearchStatus::Complete, 0),
                None => {
                    debug!(source = %request.source_id, target = %request.target_id, "no landmark route, falling back to a_star");
                    self.guided(&view, source, target, max_hops, budget).ok_or_else(missing)?
                }
            },
            Algorithm::AllPaths => {
                all_simple_paths(&view, s, t, max_hops, self.config.max_enumerated_paths, budget)
                    .ok_or_else(missing)?
            }
        };

        // the requested algorithm alone decides the status; the enumeration
        // only feeds alternatives and bottlenecks
        let status = primary.status;
        let enumeration = if algorithm == Algorithm::AllPaths {
            SearchReport::new(primary.value.clone(), primary.status, primary.expansions)
        } else if budget.is_cancelled() {
            SearchReport::new(Vec::new(), SearchStatus::Cancelled, 0)
        } else if status == SearchStatus::Complete && primary.value.is_empty() {
            // proven unreachable within the bound
            SearchReport::new(Vec::new(), SearchStatus::Complete, 0)
        } else {
            all_simple_paths(&view, s, t, max_hops, self.config.max_enumerated_paths, budget)
                .ok_or_else(missing)?
        };

        let mut paths = primary.value;
        if paths.is_empty() && status.is_partial() {
            // interrupted before the requested algorithm finished; hand back
            // whatever the enumeration reached
            paths = enumeration.value.clone();
        }

        debug!(
            algorithm = %algorithm,
            paths = paths.len(),
            enumerated = enumeration.value.len(),
            expansions = primary.expansions + enumeration.expansions,
            ?status,
            "search finished"
        );

        Ok(FoundPaths {
            view,
            source,
            target,
            algorithm,
            paths,
            enumerated: enumeration.value,
            status,
            enumeration_status: enumeration.status,
        })
    }

    /// A* with the landmark lower bound; unguided where coverage is missing
    /// or the index no longer bounds current distances
    fn guided(
        &self,
        view: &GraphView,
        source: NodeId,
        target: NodeId,
        max_hops: usize,
        budget: &SearchBudget,
    ) -> Option<SearchReport<Vec<PathResult>>> {
        let landmarks = self.landmarks.is_admissible(self.store).then_some(self.landmarks);
        if landmarks.is_none() && !self.landmarks.is_empty() {
            debug!("landmark index predates a shortcut, searching unguided");
        }
        let heuristic = |idx: usize| {
            landmarks
                .and_then(|l| l.estimate_distance(to_node_id(view.index_to_node[idx]), target))
                .unwrap_or(0.0)
        };
        a_star(view, source.as_u64(), target.as_u64(), max_hops, budget, heuristic)
            .map(|report| report.map(Vec::from_iter))
    }

    /// Landmark route if it survives the request's filters and hop bound
    fn landmark_route(&self, view: &GraphView, source: NodeId, target: NodeId, max_hops: usize) -> Option<PathResult> {
        let route = self.landmarks.route_via_landmark(source, target)?;
        if route.len() - 1 > max_hops {
            return None;
        }
        let nodes: Vec<u64> = route.iter().map(NodeId::as_u64).collect();
        path_from_nodes(view, &nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeInput, NodeInput, NodeType};
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    fn store(edges: &[(&str, &str, f64, bool)]) -> GraphStore {
        let mut store = GraphStore::new();
        for (s, t, _, _) in edges {
            for id in [s, t] {
                store.upsert_node(NodeInput::new(*id, NodeType::Person)).unwrap();
            }
        }
        for &(s, t, w, verified) in edges {
            store
                .upsert_edge(EdgeInput::new(s, t, "partnership", w).verified(verified))
                .unwrap();
        }
        store
    }

    fn find(store: &GraphStore, request: &DiscoveryRequest) -> EngineResult<FoundPaths> {
        let landmarks = LandmarkIndex::build(store, 2, &SearchBudget::unlimited())?;
        let config = SearchConfig::default();
        PathFinder::new(store, &landmarks, &config).find(request, &SearchBudget::unlimited())
    }

    fn ids(store: &GraphStore, path: &PathResult) -> Vec<String> {
        path.path
            .iter()
            .filter_map(|&n| store.external_id(to_node_id(n)).map(str::to_string))
            .collect()
    }

    #[test]
    fn test_every_algorithm_finds_chain() {
        let store = store(&[("a", "b", 0.9, true), ("b", "c", 0.8, true)]);
        for algorithm in [
            Algorithm::Bfs,
            Algorithm::Dijkstra,
            Algorithm::AStar,
            Algorithm::LandmarkRouting,
            Algorithm::AllPaths,
        ] {
            let found = find(&store, &DiscoveryRequest::new("a", "c").with_algorithm(algorithm)).unwrap();
            assert_eq!(found.status, SearchStatus::Complete, "{}", algorithm);
            assert_eq!(found.paths.len(), 1, "{}", algorithm);
            assert_eq!(ids(&store, &found.paths[0]), vec!["a", "b", "c"]);
        }
    }

    #[test]
    fn test_unknown_ids_are_invalid_input() {
        let store = store(&[("a", "b", 0.9, true)]);
        let err = find(&store, &DiscoveryRequest::new("a", "ghost")).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(msg) if msg.contains("ghost")));
    }

    #[test]
    fn test_filtered_out_endpoint_is_invalid_input() {
        let store = store(&[("a", "b", 0.9, false), ("b", "c", 0.8, true)]);
        let err = find(&store, &DiscoveryRequest::new("a", "c").verified_only()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }

    #[test]
    fn test_weak_edges_dropped_on_request() {
        // direct edge is weak; the detour is not
        let store = store(&[("a", "c", 0.2, true), ("a", "b", 0.9, true), ("b", "c", 0.9, true)]);
        let found = find(&store, &DiscoveryRequest::new("a", "c")).unwrap();
        assert_eq!(found.paths[0].hops(), 1);

        let found = find(&store, &DiscoveryRequest::new("a", "c").without_weak_connections()).unwrap();
        assert_eq!(ids(&store, &found.paths[0]), vec!["a", "b", "c"]);
        assert_eq!(found.enumerated.len(), 1);
    }

    #[test]
    fn test_hop_bound_excludes_longer_paths() {
        let store = store(&[("a", "b", 0.9, true), ("b", "c", 0.8, true)]);
        for algorithm in [Algorithm::Bfs, Algorithm::Dijkstra, Algorithm::AllPaths, Algorithm::LandmarkRouting] {
            let request = DiscoveryRequest::new("a", "c").with_max_degrees(1).with_algorithm(algorithm);
            let found = find(&store, &request).unwrap();
            assert!(found.paths.is_empty(), "{}", algorithm);
            assert_eq!(found.status, SearchStatus::Complete);
        }
    }

    #[test]
    fn test_cancelled_budget() {
        let store = store(&[("a", "b", 0.9, true), ("b", "c", 0.8, true)]);
        let landmarks = LandmarkIndex::empty();
        let config = SearchConfig::default();
        let budget = SearchBudget::unlimited().with_cancel_flag(Arc::new(AtomicBool::new(true)));
        let found = PathFinder::new(&store, &landmarks, &config)
            .find(&DiscoveryRequest::new("a", "c").with_algorithm(Algorithm::Dijkstra), &budget)
            .unwrap();
        assert_eq!(found.status, SearchStatus::Cancelled);
        assert!(found.paths.is_empty());
    }

    fn clique_with_island(size: usize) -> GraphStore {
        let mut store = GraphStore::new();
        let ids: Vec<String> = (0..size).map(|i| format!("k{}", i)).collect();
        for id in ids.iter().map(String::as_str).chain(["island", "shore"]) {
            store.upsert_node(NodeInput::new(id, NodeType::Person)).unwrap();
        }
        for i in 0..size {
            for j in i + 1..size {
                store
                    .upsert_edge(EdgeInput::new(ids[i].as_str(), ids[j].as_str(), "collaboration", 0.5))
                    .unwrap();
            }
        }
        store.upsert_edge(EdgeInput::new("island", "shore", "referral", 0.6)).unwrap();
        store
    }

    #[test]
    fn test_unreachable_target_in_dense_component_completes() {
        let store = clique_with_island(24);
        let landmarks = LandmarkIndex::empty();
        let config = SearchConfig::default();
        let budget = SearchBudget::unlimited().with_max_expansions(100_000);
        let finder = PathFinder::new(&store, &landmarks, &config);

        for algorithm in [Algorithm::Bfs, Algorithm::Dijkstra, Algorithm::AStar, Algorithm::AllPaths] {
            let found = finder
                .find(&DiscoveryRequest::new("k0", "island").with_algorithm(algorithm), &budget)
                .unwrap();
            assert_eq!(found.status, SearchStatus::Complete, "{}", algorithm);
            assert!(found.paths.is_empty());
            assert!(found.enumerated.is_empty());
            assert!(!found.alternatives_truncated());
        }
    }

    #[test]
    fn test_enumeration_budget_does_not_override_primary() {
        let store = clique_with_island(12);
        let landmarks = LandmarkIndex::empty();
        let config = SearchConfig::default();
        let finder = PathFinder::new(&store, &landmarks, &config);

        // the BFS finishes in a few hundred steps; enumeration runs out
        let budget = SearchBudget::unlimited().with_max_expansions(2_000);
        let found = finder.find(&DiscoveryRequest::new("k0", "k11"), &budget).unwrap();
        assert_eq!(found.status, SearchStatus::Complete);
        assert_eq!(ids(&store, &found.paths[0]), vec!["k0", "k11"]);
        assert!(found.alternatives_truncated());
    }

    #[test]
    fn test_strengthened_edge_disables_landmark_guidance() {
        // tail t0 .. t5 hangs off a; b reaches e through a or through x - y
        let mut store = store(&[
            ("t0", "t1", 0.9, false),
            ("t1", "t2", 0.9, false),
            ("t2", "t3", 0.9, false),
            ("t3", "t4", 0.9, false),
            ("t4", "t5", 0.9, false),
            ("t5", "a", 0.9, false),
            ("b", "a", 0.95, false),
            ("b", "x", 0.9, false),
            ("x", "y", 0.9, false),
            ("y", "e", 0.9, false),
            ("a", "e", 0.1, false),
        ]);
        let landmarks = LandmarkIndex::build(&store, 32, &SearchBudget::unlimited()).unwrap();
        // old trees put e 0.35 past a as seen from t0; now it is adjacent
        store.upsert_edge(EdgeInput::new("a", "e", "partnership", 1.0)).unwrap();
        assert!(!landmarks.is_admissible(&store));

        let config = SearchConfig::default();
        let finder = PathFinder::new(&store, &landmarks, &config);
        let mut costs = Vec::new();
        for algorithm in [Algorithm::Dijkstra, Algorithm::AStar] {
            let request = DiscoveryRequest::new("b", "e").with_algorithm(algorithm);
            let found = finder.find(&request, &SearchBudget::unlimited()).unwrap();
            assert_eq!(ids(&store, &found.paths[0]), vec!["b", "a", "e"], "{}", algorithm);
            costs.push(found.paths[0].cost);
        }
        assert!((costs[0] - costs[1]).abs() < 1e-9);
    }
}
