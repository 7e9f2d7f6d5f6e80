//! Landmark index
//!
//! A handful of well-connected nodes with precomputed shortest-path trees over
//! `1 - strength` costs. The trees give an admissible A* heuristic and a cheap
//! approximate route for long-distance queries.
//!
//! The index is derived state. It is rebuilt when the graph has drifted by more
//! than the configured delta, or when an edge was added or strengthened since
//! the build. A stale index stays usable for approximate routing: nodes added
//! after the build are simply not covered. Its distance bounds only hold while
//! no distance has shrunk, so [`LandmarkIndex::is_admissible`] gates their use
//! as an A* heuristic.

use crate::algo::{build_view, shortest_path_tree, EdgeFilter, SearchBudget, SearchStatus};
use crate::error::{EngineError, EngineResult};
use crate::graph::{GraphStore, NodeId};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use tracing::{debug, info};

/// One landmark and its shortest-path tree
#[derive(Debug, Clone)]
pub struct Landmark {
    pub node: NodeId,
    pub external_id: String,
    dist: FxHashMap<NodeId, f64>,
    parent: FxHashMap<NodeId, NodeId>,
}

impl Landmark {
    /// Distance from this landmark, if the node was reachable at build time
    pub fn distance_to(&self, node: NodeId) -> Option<f64> {
        self.dist.get(&node).copied()
    }

    pub fn reach(&self) -> usize {
        self.dist.len()
    }

    /// Tree path from `node` up to the landmark, `node` first
    fn path_to_root(&self, node: NodeId) -> Option<Vec<NodeId>> {
        self.dist.get(&node)?;
        let mut path = vec![node];
        let mut curr = node;
        while curr != self.node {
            curr = *self.parent.get(&curr)?;
            path.push(curr);
            if path.len() > self.dist.len() {
                // a cycle in a parent table means the tree is corrupt
                return None;
            }
        }
        Some(path)
    }
}

/// Precomputed landmark distances for one graph snapshot
#[derive(Debug, Clone, Default)]
pub struct LandmarkIndex {
    landmarks: Vec<Landmark>,
    built_node_count: usize,
    built_edge_count: usize,
    built_version: u64,
    built_shortcut_epoch: u64,
    built_at: Option<DateTime<Utc>>,
}

impl LandmarkIndex {
    /// An index with no landmarks; every estimate is `None`
    pub fn empty() -> Self {
        Self::default()
    }

    /// Rank nodes by degree × centrality and keep the top `count`.
    ///
    /// Before analytics has produced centrality scores every product is zero, so
    /// degree (then external id) breaks the tie.
    pub fn select(store: &GraphStore, count: usize) -> Vec<NodeId> {
        let mut candidates: Vec<(NodeId, f64, usize, &str)> = store
            .all_nodes()
            .filter_map(|node| {
                let degree = store.degree(node.key);
                (degree > 0).then(|| {
                    (node.key, degree as f64 * node.centrality_score, degree, node.id.as_str())
                })
            })
            .collect();

        candidates.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(Ordering::Equal)
                .then(b.2.cmp(&a.2))
                .then(a.3.cmp(b.3))
        });

        candidates.into_iter().take(count).map(|(key, ..)| key).collect()
    }

    /// Build shortest-path trees from the selected landmarks.
    ///
    /// Trees are computed in parallel; each honours the budget, and a cancelled
    /// or timed-out build yields an error instead of a partial index.
    pub fn build(store: &GraphStore, count: usize, budget: &SearchBudget) -> EngineResult<Self> {
        let selected = Self::select(store, count);
        let view = build_view(store, &EdgeFilter::all());

        let trees: Vec<_> = selected
            .par_iter()
            .filter_map(|&key| view.index_of(key.as_u64()).map(|idx| (key, idx)))
            .map(|(key, idx)| (key, shortest_path_tree(&view, idx, budget)))
            .collect();

        let mut landmarks = Vec::with_capacity(trees.len());
        for (key, report) in trees {
            match report.status {
                SearchStatus::Cancelled => return Err(EngineError::Cancelled),
                SearchStatus::Timeout => return Err(EngineError::Timeout),
                _ => {}
            }

            let tree = report.value;
            let mut dist = FxHashMap::default();
            let mut parent = FxHashMap::default();
            for (idx, &d) in tree.dist.iter().enumerate() {
                if d.is_finite() {
                    let node = NodeId::new(view.index_to_node[idx]);
                    dist.insert(node, d);
                    if let Some(p) = tree.parent[idx] {
                        parent.insert(node, NodeId::new(view.index_to_node[p]));
                    }
                }
            }

            let external_id = store.external_id(key).unwrap_or_default().to_string();
            debug!(landmark = %external_id, reach = dist.len(), "landmark tree built");
            landmarks.push(Landmark { node: key, external_id, dist, parent });
        }

        info!(
            landmarks = landmarks.len(),
            nodes = store.node_count(),
            edges = store.edge_count(),
            "landmark index built"
        );

        Ok(Self {
            landmarks,
            built_node_count: store.node_count(),
            built_edge_count: store.edge_count(),
            built_version: store.version(),
            built_shortcut_epoch: store.shortcut_epoch(),
            built_at: Some(Utc::now()),
        })
    }

    pub fn landmarks(&self) -> &[Landmark] {
        &self.landmarks
    }

    pub fn landmark_keys(&self) -> Vec<NodeId> {
        self.landmarks.iter().map(|l| l.node).collect()
    }

    pub fn landmark_ids(&self) -> Vec<String> {
        self.landmarks.iter().map(|l| l.external_id.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.landmarks.is_empty()
    }

    pub fn built_version(&self) -> u64 {
        self.built_version
    }

    pub fn built_at(&self) -> Option<DateTime<Utc>> {
        self.built_at
    }

    /// Whether any landmark reached the node at build time
    pub fn covers(&self, node: NodeId) -> bool {
        self.landmarks.iter().any(|l| l.dist.contains_key(&node))
    }

    /// Admissible lower bound on the weighted distance between `a` and `b`.
    ///
    /// By the triangle inequality `|d(L,a) - d(L,b)| <= d(a,b)` for every
    /// landmark `L`; the best bound is the maximum. `None` when no landmark
    /// reached both nodes.
    pub fn estimate_distance(&self, a: NodeId, b: NodeId) -> Option<f64> {
        self.landmarks
            .iter()
            .filter_map(|l| Some((l.distance_to(a)? - l.distance_to(b)?).abs()))
            .fold(None, |best: Option<f64>, d| Some(best.map_or(d, |b| b.max(d))))
    }

    /// Upper bound on the weighted distance: the cheapest detour through a
    /// landmark, `min_L d(L,a) + d(L,b)`.
    pub fn upper_bound_distance(&self, a: NodeId, b: NodeId) -> Option<f64> {
        self.best_landmark(a, b).map(|(_, d)| d)
    }

    fn best_landmark(&self, a: NodeId, b: NodeId) -> Option<(&Landmark, f64)> {
        self.landmarks
            .iter()
            .filter_map(|l| Some((l, l.distance_to(a)? + l.distance_to(b)?)))
            .min_by(|x, y| x.1.partial_cmp(&y.1).unwrap_or(Ordering::Equal))
    }

    /// Approximate route from `a` to `b` through the cheapest landmark.
    ///
    /// The two tree branches are spliced at their first shared node, so the
    /// result never repeats a node. Routes come from the build-time snapshot;
    /// callers must check each hop against the current graph.
    pub fn route_via_landmark(&self, a: NodeId, b: NodeId) -> Option<Vec<NodeId>> {
        if a == b {
            return None;
        }
        let (landmark, _) = self.best_landmark(a, b)?;
        let up = landmark.path_to_root(a)?;
        let down = landmark.path_to_root(b)?;

        let position_in_down: FxHashMap<NodeId, usize> =
            down.iter().enumerate().map(|(i, &n)| (n, i)).collect();

        let (cut_up, cut_down) = up
            .iter()
            .enumerate()
            .find_map(|(i, n)| position_in_down.get(n).map(|&j| (i, j)))?;

        let mut route: Vec<NodeId> = up[..=cut_up].to_vec();
        route.extend(down[..cut_down].iter().rev());
        Some(route)
    }

    /// Whether the distance tables are still lower bounds for `store`.
    ///
    /// Removing or weakening edges only lengthens distances; any added or
    /// strengthened edge may create a shortcut the trees do not know about.
    pub fn is_admissible(&self, store: &GraphStore) -> bool {
        self.built_at.is_some() && self.built_shortcut_epoch == store.shortcut_epoch()
    }

    /// Whether the graph changed enough since the build to warrant a rebuild
    pub fn is_stale(&self, store: &GraphStore, delta: f64) -> bool {
        if self.built_at.is_none() {
            return store.edge_count() > 0;
        }
        !self.is_admissible(store)
            || drift(self.built_node_count, store.node_count()) > delta
            || drift(self.built_edge_count, store.edge_count()) > delta
    }
}

fn drift(built: usize, now: usize) -> f64 {
    (now as f64 - built as f64).abs() / built.max(1) as f64
}
