//! Approximate betweenness centrality
//!
//! Brandes' dependency accumulation from a random sample of source nodes.
//! Exact betweenness needs a traversal from every node; sampling `k` sources
//! costs `k / n` of that and the estimate is scaled back up by `n / k`.

use super::common::GraphView;
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::SeedableRng;
use rayon::prelude::*;
use std::collections::VecDeque;

/// Sampled betweenness centrality per node (by index), normalized to [0, 1].
///
/// Uses unweighted shortest paths. `sample_size` is clamped to the node count;
/// passing the node count gives the exact value. `seed` makes the sample
/// reproducible.
pub fn sampled_betweenness(view: &GraphView, sample_size: usize, seed: u64) -> Vec<f64> {
    let n = view.node_count;
    if n < 3 || sample_size == 0 {
        return vec![0.0; n];
    }

    let k = sample_size.min(n);
    let sources: Vec<usize> = if k == n {
        (0..n).collect()
    } else {
        let mut rng = StdRng::seed_from_u64(seed);
        sample(&mut rng, n, k).into_vec()
    };

    let totals = sources
        .par_iter()
        .map(|&s| single_source_dependencies(view, s))
        .reduce(
            || vec![0.0; n],
            |mut acc, part| {
                for (a, p) in acc.iter_mut().zip(part) {
                    *a += p;
                }
                acc
            },
        );

    // Each unordered pair is seen from both ends, hence the halving.
    let scale = n as f64 / k as f64 / 2.0;
    let pairs = ((n - 1) * (n - 2)) as f64 / 2.0;

    totals
        .into_iter()
        .map(|raw| (raw * scale / pairs).clamp(0.0, 1.0))
        .collect()
}

fn single_source_dependencies(view: &GraphView, s: usize) -> Vec<f64> {
    let n = view.node_count;
    let mut sigma = vec![0.0f64; n];
    let mut dist = vec![usize::MAX; n];
    let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut order = Vec::with_capacity(n);
    let mut queue = VecDeque::new();

    sigma[s] = 1.0;
    dist[s] = 0;
    queue.push_back(s);

    while let Some(v) = queue.pop_front() {
        order.push(v);
        for &w in view.neighbors(v) {
            if dist[w] == usize::MAX {
                dist[w] = dist[v] + 1;
                queue.push_back(w);
            }
            if dist[w] == dist[v] + 1 {
                sigma[w] += sigma[v];
                preds[w].push(v);
            }
        }
    }

    let mut delta = vec![0.0f64; n];
    for &w in order.iter().rev() {
        for &v in &preds[w] {
            delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
        }
    }
    delta[s] = 0.0;
    delta
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::test_support::view;

    #[test]
    fn test_star_center_is_maximal() {
        // Center 0 with four leaves: every leaf pair routes through 0
        let view = view(5, &[(0, 1, 0.5), (0, 2, 0.5), (0, 3, 0.5), (0, 4, 0.5)]);
        let scores = sampled_betweenness(&view, 5, 7);
        assert!((scores[0] - 1.0).abs() < 1e-9);
        for leaf in 1..5 {
            assert_eq!(scores[leaf], 0.0);
        }
    }

    #[test]
    fn test_chain_middle() {
        // 0-1-2: pair (0,2) passes through 1, normalized by one pair
        let view = view(3, &[(0, 1, 0.5), (1, 2, 0.5)]);
        let scores = sampled_betweenness(&view, 3, 7);
        assert!((scores[1] - 1.0).abs() < 1e-9);
        assert_eq!(scores[0], 0.0);
    }

    #[test]
    fn test_sampling_is_reproducible() {
        let edges: Vec<(u64, u64, f64)> = (0..30).map(|i| (i, (i + 1) % 31, 0.5)).collect();
        let view = view(31, &edges);
        let a = sampled_betweenness(&view, 8, 99);
        let b = sampled_betweenness(&view, 8, 99);
        assert_eq!(a, b);
        assert!(a.iter().all(|&s| (0.0..=1.0).contains(&s)));
    }

    #[test]
    fn test_tiny_graph() {
        let view = view(2, &[(0, 1, 0.5)]);
        assert_eq!(sampled_betweenness(&view, 2, 1), vec![0.0, 0.0]);
    }
}
