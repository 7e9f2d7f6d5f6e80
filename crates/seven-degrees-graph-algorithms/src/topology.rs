//! Graph topology analysis algorithms
//!
//! Local clustering coefficients and articulation points.

use super::common::GraphView;

/// Local clustering coefficient per node (by index).
///
/// Fraction of neighbor pairs that are themselves connected; nodes with fewer
/// than two neighbors score 0.
pub fn local_clustering(view: &GraphView) -> Vec<f64> {
    (0..view.node_count)
        .map(|u| {
            let neighbors = view.neighbors(u);
            let k = neighbors.len();
            if k < 2 {
                return 0.0;
            }

            let mut links = 0usize;
            for &v in neighbors {
                for &w in view.neighbors(v) {
                    // Count each neighbor pair once (v < w)
                    if w > v && neighbors.binary_search(&w).is_ok() {
                        links += 1;
                    }
                }
            }

            let possible = k * (k - 1) / 2;
            links as f64 / possible as f64
        })
        .collect()
}

/// Clustering coefficient averaged over all nodes
pub fn average_clustering(view: &GraphView) -> f64 {
    if view.node_count == 0 {
        return 0.0;
    }
    local_clustering(view).iter().sum::<f64>() / view.node_count as f64
}

/// Articulation points (bridge nodes), by index, ascending.
///
/// Tarjan's low-link DFS, run iteratively so deep chains cannot overflow the
/// stack.
pub fn articulation_points(view: &GraphView) -> Vec<usize> {
    let n = view.node_count;
    let mut disc = vec![usize::MAX; n];
    let mut low = vec![0usize; n];
    let mut parent = vec![usize::MAX; n];
    let mut is_cut = vec![false; n];
    let mut timer = 0;

    for root in 0..n {
        if disc[root] != usize::MAX {
            continue;
        }
        disc[root] = timer;
        low[root] = timer;
        timer += 1;

        let mut root_children = 0;
        let mut stack: Vec<(usize, usize)> = vec![(root, 0)];

        while let Some(top) = stack.last_mut() {
            let u = top.0;
            if top.1 < view.degree(u) {
                let v = view.neighbors(u)[top.1];
                top.1 += 1;

                if disc[v] == usize::MAX {
                    parent[v] = u;
                    disc[v] = timer;
                    low[v] = timer;
                    timer += 1;
                    if u == root {
                        root_children += 1;
                    }
                    stack.push((v, 0));
                } else if v != parent[u] {
                    low[u] = low[u].min(disc[v]);
                }
            } else {
                stack.pop();
                if let Some(&(p, _)) = stack.last() {
                    low[p] = low[p].min(low[u]);
                    if p != root && low[u] >= disc[p] {
                        is_cut[p] = true;
                    }
                }
            }
        }

        if root_children > 1 {
            is_cut[root] = true;
        }
    }

    (0..n).filter(|&i| is_cut[i]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::test_support::view;

    #[test]
    fn test_clustering_triangle_with_tail() {
        // Triangle 0-1-2 plus tail 2-3
        let view = view(4, &[(0, 1, 0.5), (1, 2, 0.5), (0, 2, 0.5), (2, 3, 0.5)]);
        let local = local_clustering(&view);
        assert_eq!(local[0], 1.0);
        assert_eq!(local[1], 1.0);
        assert!((local[2] - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(local[3], 0.0);

        let avg = average_clustering(&view);
        assert!((avg - (2.0 + 1.0 / 3.0) / 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_complete_graph_clustering() {
        let mut edges = Vec::new();
        for u in 0..4 {
            for v in (u + 1)..4 {
                edges.push((u, v, 0.5));
            }
        }
        let view = view(4, &edges);
        assert!((average_clustering(&view) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_articulation_points_chain() {
        let view = view(4, &[(0, 1, 0.5), (1, 2, 0.5), (2, 3, 0.5)]);
        assert_eq!(articulation_points(&view), vec![1, 2]);
    }

    #[test]
    fn test_articulation_points_cycle_has_none() {
        let view = view(4, &[(0, 1, 0.5), (1, 2, 0.5), (2, 3, 0.5), (3, 0, 0.5)]);
        assert!(articulation_points(&view).is_empty());
    }

    #[test]
    fn test_articulation_points_bowtie() {
        // Two triangles sharing node 2, plus an isolated node 5
        let view = view(
            6,
            &[(0, 1, 0.5), (1, 2, 0.5), (0, 2, 0.5), (2, 3, 0.5), (3, 4, 0.5), (2, 4, 0.5)],
        );
        assert_eq!(articulation_points(&view), vec![2]);
    }
}
