//! Network analytics
//!
//! Graph-wide metrics over one snapshot: clustering, sampled betweenness,
//! articulation points, components and a sampled vulnerability estimate. The
//! report is advisory. Discovery attaches the most recent one and never waits
//! for a fresh computation.

use crate::algo::{
    articulation_points, average_clustering, bfs_distances, build_view, connected_components,
    sampled_betweenness, EdgeFilter,
};
use crate::config::AnalyticsConfig;
use crate::graph::{GraphStore, NodeId};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use seven_degrees_graph_algorithms::GraphView;
use std::cmp::Ordering;
use tracing::info;

/// A node in one of the report's ranked lists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedNode {
    pub id: String,
    /// Sampled betweenness in [0, 1]
    pub score: f64,
    pub degree: usize,
}

/// Graph-level metrics for one graph version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkReport {
    pub graph_version: u64,
    pub computed_at: DateTime<Utc>,
    pub node_count: usize,
    pub edge_count: usize,
    pub component_count: usize,
    pub clustering_coefficient: f64,
    pub average_betweenness: f64,
    pub vulnerability_score: f64,
    /// Betweenness source nodes actually used
    pub betweenness_samples: usize,
    pub bridge_nodes: Vec<RankedNode>,
    pub central_nodes: Vec<RankedNode>,
    pub landmark_nodes: Vec<RankedNode>,
    /// (node, centrality, influence) for every node
    #[serde(skip)]
    pub scores: Vec<(NodeId, f64, f64)>,
}

/// Number of betweenness sources for a graph of `n` nodes
pub fn betweenness_sample_size(n: usize, config: &AnalyticsConfig) -> usize {
    let by_rate = (n as f64 * config.betweenness_sample_rate).ceil() as usize;
    by_rate.max(config.min_betweenness_samples).min(n)
}

/// Compute a full report. `landmarks` are ranked into `landmark_nodes`.
pub fn analyze(store: &GraphStore, landmarks: &[NodeId], config: &AnalyticsConfig) -> NetworkReport {
    let view = build_view(store, &EdgeFilter::all());
    let n = view.node_count;

    let samples = betweenness_sample_size(n, config);
    let betweenness = sampled_betweenness(&view, samples, config.seed);
    let clustering_coefficient = average_clustering(&view);
    let component_count = connected_components(&view).count();
    let cuts = articulation_points(&view);
    let vulnerability_score = vulnerability(
        &view,
        config.vulnerability_removals,
        config.vulnerability_pairs,
        config.seed,
    );

    let scores: Vec<(NodeId, f64, f64)> = store
        .all_nodes()
        .filter_map(|node| {
            let idx = view.index_of(node.key.as_u64())?;
            let weighted_degree: f64 = store.neighbors(node.key).map(|(_, edge)| edge.strength).sum();
            Some((node.key, betweenness[idx], node.tier.weight() * weighted_degree))
        })
        .collect();

    let ranked = |indices: &mut dyn Iterator<Item = usize>| -> Vec<RankedNode> {
        let mut nodes: Vec<RankedNode> = indices
            .filter_map(|idx| {
                let key = NodeId::new(view.index_to_node[idx]);
                Some(RankedNode {
                    id: store.external_id(key)?.to_string(),
                    score: betweenness[idx],
                    degree: view.degree(idx),
                })
            })
            .collect();
        nodes.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then(b.degree.cmp(&a.degree))
                .then(a.id.cmp(&b.id))
        });
        nodes.truncate(config.top_k);
        nodes
    };

    let bridge_nodes = ranked(&mut cuts.iter().copied());
    let central_nodes = ranked(&mut (0..n).filter(|&idx| view.degree(idx) > 0));
    let landmark_nodes = ranked(&mut landmarks.iter().filter_map(|key| view.index_of(key.as_u64())));

    let average_betweenness = if n == 0 {
        0.0
    } else {
        betweenness.iter().sum::<f64>() / n as f64
    };

    info!(
        version = store.version(),
        nodes = n,
        edges = view.edge_count(),
        components = component_count,
        bridges = cuts.len(),
        samples,
        "network analysis computed"
    );

    NetworkReport {
        graph_version: store.version(),
        computed_at: Utc::now(),
        node_count: n,
        edge_count: store.edge_count(),
        component_count,
        clustering_coefficient,
        average_betweenness,
        vulnerability_score,
        betweenness_samples: samples,
        bridge_nodes,
        central_nodes,
        landmark_nodes,
        scores,
    }
}

/// Fraction of sampled connected pairs whose hop distance grows, or that
/// disconnect, when one sampled node is removed.
///
/// Removals run in parallel; pairs touching the removed node are skipped.
pub fn vulnerability(view: &GraphView, removals: usize, pairs: usize, seed: u64) -> f64 {
    let n = view.node_count;
    if n < 3 || removals == 0 || pairs == 0 {
        return 0.0;
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let removed = sample(&mut rng, n, removals.min(n)).into_vec();

    let mut by_source: FxHashMap<usize, Vec<usize>> = FxHashMap::default();
    let mut drawn = 0;
    for _ in 0..pairs.saturating_mul(4) {
        if drawn == pairs {
            break;
        }
        let u = rng.gen_range(0..n);
        let v = rng.gen_range(0..n);
        if u != v {
            by_source.entry(u).or_default().push(v);
            drawn += 1;
        }
    }

    let baseline: FxHashMap<usize, Vec<Option<usize>>> = by_source
        .keys()
        .map(|&u| (u, bfs_distances(view, u, None)))
        .collect();

    let (affected, observed) = removed
        .par_iter()
        .map(|&r| {
            let mut affected = 0usize;
            let mut observed = 0usize;
            for (&u, targets) in &by_source {
                if u == r {
                    continue;
                }
                let before = &baseline[&u];
                let mut after: Option<Vec<Option<usize>>> = None;
                for &v in targets {
                    let Some(d) = before[v] else { continue };
                    if v == r {
                        continue;
                    }
                    observed += 1;
                    let cut = after.get_or_insert_with(|| bfs_distances(view, u, Some(r)));
                    if cut[v].map_or(true, |d2| d2 > d) {
                        affected += 1;
                    }
                }
            }
            (affected, observed)
        })
        .reduce(|| (0, 0), |a, b| (a.0 + b.0, a.1 + b.1));

    if observed == 0 {
        0.0
    } else {
        affected as f64 / observed as f64
    }
}
