//! Pathfinding algorithms
//!
//! Every search here is bounded by a hop limit and a [`SearchBudget`]; the
//! budget is consulted once per expansion step so callers can cancel or time
//! out a search that is already running.

use super::budget::{SearchBudget, SearchReport, SearchStatus};
use super::common::{EdgeRef, GraphView, NodeId};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, VecDeque};

/// Result of a pathfinding algorithm
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathResult {
    pub source: NodeId,
    pub target: NodeId,
    pub path: Vec<NodeId>,
    /// Edges traversed, aligned with consecutive pairs of `path`
    pub edges: Vec<EdgeRef>,
    /// Sum of `1 - strength` over the traversed edges
    pub cost: f64,
    /// Sum of strengths over the traversed edges
    pub strength: f64,
}

impl PathResult {
    /// Hop count
    pub fn hops(&self) -> usize {
        self.path.len().saturating_sub(1)
    }

    fn from_indices(view: &GraphView, indices: &[usize]) -> Self {
        let mut edges = Vec::with_capacity(indices.len().saturating_sub(1));
        let mut cost = 0.0;
        let mut strength = 0.0;
        for pair in indices.windows(2) {
            if let Some((s, edge_ref)) = view.edge_between(pair[0], pair[1]) {
                edges.push(edge_ref);
                strength += s;
                cost += GraphView::cost(s);
            }
        }

        PathResult {
            source: view.index_to_node[indices[0]],
            target: view.index_to_node[indices[indices.len() - 1]],
            path: indices.iter().map(|&idx| view.index_to_node[idx]).collect(),
            edges,
            cost,
            strength,
        }
    }
}

/// Materialize a node sequence as a path.
///
/// Returns `None` unless the sequence has at least two nodes, never repeats a
/// node, and every consecutive pair is adjacent in the view.
pub fn path_from_nodes(view: &GraphView, nodes: &[NodeId]) -> Option<PathResult> {
    if nodes.len() < 2 {
        return None;
    }
    let indices = nodes
        .iter()
        .map(|&node| view.index_of(node))
        .collect::<Option<Vec<usize>>>()?;

    let mut seen = vec![false; view.node_count];
    for &idx in &indices {
        if std::mem::replace(&mut seen[idx], true) {
            return None;
        }
    }
    if indices.windows(2).any(|pair| view.edge_between(pair[0], pair[1]).is_none()) {
        return None;
    }
    Some(PathResult::from_indices(view, &indices))
}

/// Bounded Breadth-First Search (unweighted shortest paths)
///
/// Explores level by level up to `max_hops`. All shortest paths are collected
/// from the BFS predecessor DAG, strongest first, and at most `max_results` are
/// returned. Returns `None` when either endpoint is not part of the view.
pub fn bounded_bfs(
    view: &GraphView,
    source: NodeId,
    target: NodeId,
    max_hops: usize,
    max_results: usize,
    budget: &SearchBudget,
) -> Option<SearchReport<Vec<PathResult>>> {
    let source_idx = view.index_of(source)?;
    let target_idx = view.index_of(target)?;

    if source_idx == target_idx || max_hops == 0 || max_results == 0 {
        return Some(SearchReport::new(Vec::new(), SearchStatus::Complete, 0));
    }

    let mut depth = vec![usize::MAX; view.node_count];
    let mut preds: Vec<Vec<usize>> = vec![Vec::new(); view.node_count];
    let mut order = vec![source_idx];
    depth[source_idx] = 0;

    let mut frontier = vec![source_idx];
    let mut level = 0;
    let mut expansions = 0;

    while !frontier.is_empty() && level < max_hops && depth[target_idx] == usize::MAX {
        level += 1;
        let mut next = Vec::new();
        for &u in &frontier {
            if let Err(status) = budget.check(expansions) {
                return Some(SearchReport::new(Vec::new(), status, expansions));
            }
            expansions += 1;

            for &v in view.neighbors(u) {
                if depth[v] == usize::MAX {
                    depth[v] = level;
                    preds[v].push(u);
                    next.push(v);
                    order.push(v);
                } else if depth[v] == level {
                    preds[v].push(u);
                }
            }
        }
        frontier = next;
    }

    if depth[target_idx] == usize::MAX {
        return Some(SearchReport::new(Vec::new(), SearchStatus::Complete, expansions));
    }

    // Strongest aggregate strength from the source along the DAG. `order` is
    // non-decreasing in depth so predecessors are settled first.
    let mut best = vec![0.0f64; view.node_count];
    for &v in order.iter().skip(1) {
        let mut top = f64::NEG_INFINITY;
        for &p in &preds[v] {
            let s = view.edge_between(p, v).map(|(s, _)| s).unwrap_or(0.0);
            top = top.max(best[p] + s);
        }
        best[v] = top;
        let ranked = &mut preds[v];
        ranked.sort_by(|&a, &b| {
            let sa = best[a] + view.edge_between(a, v).map(|(s, _)| s).unwrap_or(0.0);
            let sb = best[b] + view.edge_between(b, v).map(|(s, _)| s).unwrap_or(0.0);
            sb.partial_cmp(&sa).unwrap_or(Ordering::Equal).then(a.cmp(&b))
        });
    }

    // Walk the DAG backwards from the target; strongest-first ordering means
    // the first path found is the tie-break winner.
    let cap = max_results.saturating_mul(4).max(max_results);
    let mut found: Vec<Vec<usize>> = Vec::new();
    let mut trail = vec![target_idx];
    let mut cursor = vec![0usize];
    let mut status = SearchStatus::Complete;

    while let Some(&v) = trail.last() {
        if let Err(interrupt) = budget.check(expansions) {
            status = interrupt;
            break;
        }
        expansions += 1;

        if v == source_idx {
            found.push(trail.iter().rev().copied().collect());
            if found.len() >= cap {
                break;
            }
            trail.pop();
            cursor.pop();
            continue;
        }

        let Some(pos) = cursor.last_mut() else { break };
        if *pos < preds[v].len() {
            let p = preds[v][*pos];
            *pos += 1;
            trail.push(p);
            cursor.push(0);
        } else {
            trail.pop();
            cursor.pop();
        }
    }

    let mut paths: Vec<PathResult> = found
        .iter()
        .map(|indices| PathResult::from_indices(view, indices))
        .collect();
    paths.sort_by(|a, b| b.strength.partial_cmp(&a.strength).unwrap_or(Ordering::Equal));
    paths.truncate(max_results);

    Some(SearchReport::new(paths, status, expansions))
}

/// State for the best-first priority queue
#[derive(Copy, Clone, PartialEq)]
struct State {
    priority: f64,
    cost: f64,
    hops: usize,
    node_idx: usize,
}

impl Eq for State {}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap; fewer hops wins ties so results stay simple
        other
            .priority
            .partial_cmp(&self.priority)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.hops.cmp(&self.hops))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Best-first search over (node, hops) labels.
///
/// A label is only recorded when no label for the same node with fewer or equal
/// hops is at least as cheap, which keeps the search within the hop bound and
/// guarantees the reconstructed path never revisits a node.
fn hop_bounded_search<H>(
    view: &GraphView,
    source_idx: usize,
    target_idx: usize,
    max_hops: usize,
    budget: &SearchBudget,
    heuristic: H,
) -> SearchReport<Option<PathResult>>
where
    H: Fn(usize) -> f64,
{
    let layers = max_hops + 1;
    let slot = |node: usize, hops: usize| node * layers + hops;

    let mut dist: HashMap<usize, f64> = HashMap::new();
    let mut parent: HashMap<usize, usize> = HashMap::new();
    let mut heap = BinaryHeap::new();
    let mut expansions = 0;

    dist.insert(slot(source_idx, 0), 0.0);
    heap.push(State {
        priority: heuristic(source_idx),
        cost: 0.0,
        hops: 0,
        node_idx: source_idx,
    });

    while let Some(State { cost, hops, node_idx, .. }) = heap.pop() {
        let here = slot(node_idx, hops);
        if cost > *dist.get(&here).unwrap_or(&f64::INFINITY) {
            continue;
        }

        if node_idx == target_idx {
            let mut indices = Vec::with_capacity(hops + 1);
            let mut curr = Some(here);
            while let Some(s) = curr {
                indices.push(s / layers);
                curr = parent.get(&s).copied();
            }
            indices.reverse();
            return SearchReport::new(
                Some(PathResult::from_indices(view, &indices)),
                SearchStatus::Complete,
                expansions,
            );
        }

        if let Err(status) = budget.check(expansions) {
            return SearchReport::new(None, status, expansions);
        }
        expansions += 1;

        if hops == max_hops {
            continue;
        }

        let next_hops = hops + 1;
        for (&next_idx, &strength) in view.neighbors(node_idx).iter().zip(view.strengths(node_idx)) {
            let next_cost = cost + GraphView::cost(strength);

            let dominated = (0..=next_hops).any(|h| {
                dist.get(&slot(next_idx, h))
                    .map_or(false, |&known| known <= next_cost)
            });
            if dominated {
                continue;
            }

            let next_slot = slot(next_idx, next_hops);
            dist.insert(next_slot, next_cost);
            parent.insert(next_slot, here);
            heap.push(State {
                priority: next_cost + heuristic(next_idx),
                cost: next_cost,
                hops: next_hops,
                node_idx: next_idx,
            });
        }
    }

    SearchReport::new(None, SearchStatus::Complete, expansions)
}

/// Dijkstra's Algorithm (weighted shortest path within a hop bound)
///
/// Edge cost is `1 - strength`, so the cheapest path is the strongest one.
pub fn dijkstra(
    view: &GraphView,
    source: NodeId,
    target: NodeId,
    max_hops: usize,
    budget: &SearchBudget,
) -> Option<SearchReport<Option<PathResult>>> {
    a_star(view, source, target, max_hops, budget, |_| 0.0)
}

/// A* search with a caller-supplied heuristic (by dense index).
///
/// The heuristic must never overestimate the remaining cost to `target`;
/// returning `0.0` degrades to Dijkstra.
pub fn a_star<H>(
    view: &GraphView,
    source: NodeId,
    target: NodeId,
    max_hops: usize,
    budget: &SearchBudget,
    heuristic: H,
) -> Option<SearchReport<Option<PathResult>>>
where
    H: Fn(usize) -> f64,
{
    let source_idx = view.index_of(source)?;
    let target_idx = view.index_of(target)?;

    if source_idx == target_idx || max_hops == 0 {
        return Some(SearchReport::new(None, SearchStatus::Complete, 0));
    }

    Some(hop_bounded_search(
        view,
        source_idx,
        target_idx,
        max_hops,
        budget,
        heuristic,
    ))
}

/// Bounded enumeration of all simple paths.
///
/// Depth-first, at most `max_hops` per path and at most `max_paths` paths. When
/// another path exists beyond the ceiling the report is marked
/// [`SearchStatus::Truncated`].
///
/// A breadth-first pass from the target bounds the descent: a node is only
/// entered when the target is still within the remaining hops. An unreachable
/// target returns at once.
pub fn all_simple_paths(
    view: &GraphView,
    source: NodeId,
    target: NodeId,
    max_hops: usize,
    max_paths: usize,
    budget: &SearchBudget,
) -> Option<SearchReport<Vec<PathResult>>> {
    let source_idx = view.index_of(source)?;
    let target_idx = view.index_of(target)?;

    let mut paths = Vec::new();
    if source_idx == target_idx || max_hops == 0 {
        return Some(SearchReport::new(paths, SearchStatus::Complete, 0));
    }

    let to_target = bfs_distances(view, target_idx, None);
    let within = |idx: usize, hops_left: usize| to_target[idx].map_or(false, |d| d <= hops_left);
    if !within(source_idx, max_hops) {
        return Some(SearchReport::new(paths, SearchStatus::Complete, 0));
    }

    let mut on_path = vec![false; view.node_count];
    let mut stack: Vec<(usize, usize)> = vec![(source_idx, 0)];
    on_path[source_idx] = true;
    let mut expansions = 0;
    let mut status = SearchStatus::Complete;

    while let Some(&(u, pos)) = stack.last() {
        if let Err(interrupt) = budget.check(expansions) {
            status = interrupt;
            break;
        }
        expansions += 1;

        let neighbors = view.neighbors(u);
        if pos >= neighbors.len() || stack.len() > max_hops {
            on_path[u] = false;
            stack.pop();
            continue;
        }
        if let Some(top) = stack.last_mut() {
            top.1 += 1;
        }

        let v = neighbors[pos];
        if v == target_idx {
            if paths.len() >= max_paths {
                status = SearchStatus::Truncated;
                break;
            }
            let mut indices: Vec<usize> = stack.iter().map(|&(node, _)| node).collect();
            indices.push(v);
            paths.push(PathResult::from_indices(view, &indices));
        } else if !on_path[v] && stack.len() < max_hops && within(v, max_hops - stack.len()) {
            on_path[v] = true;
            stack.push((v, 0));
        }
    }

    Some(SearchReport::new(paths, status, expansions))
}

/// Single-source shortest-path tree over `1 - strength` costs
#[derive(Debug, Clone)]
pub struct ShortestPathTree {
    pub root: usize,
    /// Distance per dense index; `INFINITY` when unreachable
    pub dist: Vec<f64>,
    /// Predecessor towards the root per dense index
    pub parent: Vec<Option<usize>>,
}

/// Unbounded Dijkstra from one node to every reachable node.
pub fn shortest_path_tree(
    view: &GraphView,
    root: usize,
    budget: &SearchBudget,
) -> SearchReport<ShortestPathTree> {
    let mut dist = vec![f64::INFINITY; view.node_count];
    let mut parent = vec![None; view.node_count];
    let mut heap = BinaryHeap::new();
    let mut expansions = 0;
    let mut status = SearchStatus::Complete;

    dist[root] = 0.0;
    heap.push(State { priority: 0.0, cost: 0.0, hops: 0, node_idx: root });

    while let Some(State { cost, node_idx, .. }) = heap.pop() {
        if cost > dist[node_idx] {
            continue;
        }
        if let Err(interrupt) = budget.check(expansions) {
            status = interrupt;
            break;
        }
        expansions += 1;

        for (&next_idx, &strength) in view.neighbors(node_idx).iter().zip(view.strengths(node_idx)) {
            let next_cost = cost + GraphView::cost(strength);
            if next_cost < dist[next_idx] {
                dist[next_idx] = next_cost;
                parent[next_idx] = Some(node_idx);
                heap.push(State { priority: next_cost, cost: next_cost, hops: 0, node_idx: next_idx });
            }
        }
    }

    SearchReport::new(ShortestPathTree { root, dist, parent }, status, expansions)
}

/// Hop distances from `source` to every node, optionally pretending `excluded`
/// has been removed from the graph.
pub fn bfs_distances(view: &GraphView, source: usize, excluded: Option<usize>) -> Vec<Option<usize>> {
    let mut dist = vec![None; view.node_count];
    if Some(source) == excluded {
        return dist;
    }

    let mut queue = VecDeque::new();
    dist[source] = Some(0);
    queue.push_back(source);

    while let Some(u) = queue.pop_front() {
        let next = dist[u].map_or(0, |d| d + 1);
        for &v in view.neighbors(u) {
            if Some(v) == excluded || dist[v].is_some() {
                continue;
            }
            dist[v] = Some(next);
            queue.push_back(v);
        }
    }

    dist
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::test_support::view;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    fn diamond() -> GraphView {
        // 0 - 1 - 3 strong, 0 - 2 - 3 weak, 3 - 4 tail
        view(
            5,
            &[(0, 1, 0.9), (1, 3, 0.9), (0, 2, 0.4), (2, 3, 0.4), (3, 4, 0.7)],
        )
    }

    #[test]
    fn test_bfs_chain() {
        let view = view(3, &[(0, 1, 0.9), (1, 2, 0.8)]);
        let report = bounded_bfs(&view, 0, 2, 7, 10, &SearchBudget::unlimited()).unwrap();
        assert_eq!(report.status, SearchStatus::Complete);
        assert_eq!(report.value.len(), 1);
        let path = &report.value[0];
        assert_eq!(path.path, vec![0, 1, 2]);
        assert_eq!(path.edges, vec![0, 1]);
        assert!((path.strength - 1.7).abs() < 1e-9);
    }

    #[test]
    fn test_bfs_tie_broken_by_strength() {
        let view = diamond();
        let report = bounded_bfs(&view, 0, 3, 7, 10, &SearchBudget::unlimited()).unwrap();
        assert_eq!(report.value.len(), 2);
        assert_eq!(report.value[0].path, vec![0, 1, 3]);
        assert_eq!(report.value[1].path, vec![0, 2, 3]);
    }

    #[test]
    fn test_bfs_respects_hop_bound() {
        let view = view(3, &[(0, 1, 0.9), (1, 2, 0.8)]);
        let report = bounded_bfs(&view, 0, 2, 1, 10, &SearchBudget::unlimited()).unwrap();
        assert!(report.value.is_empty());
        assert_eq!(report.status, SearchStatus::Complete);
    }

    #[test]
    fn test_bfs_unknown_node() {
        let view = diamond();
        assert!(bounded_bfs(&view, 0, 42, 7, 10, &SearchBudget::unlimited()).is_none());
    }

    #[test]
    fn test_dijkstra_prefers_strong_detour() {
        // Direct 0-2 is weak (cost 0.9), 0-1-2 costs 0.2
        let view = view(3, &[(0, 2, 0.1), (0, 1, 0.9), (1, 2, 0.9)]);
        let report = dijkstra(&view, 0, 2, 7, &SearchBudget::unlimited()).unwrap();
        let path = report.value.unwrap();
        assert_eq!(path.path, vec![0, 1, 2]);
        assert!((path.cost - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_dijkstra_hop_bound_forces_direct_edge() {
        let view = view(3, &[(0, 2, 0.1), (0, 1, 0.9), (1, 2, 0.9)]);
        let report = dijkstra(&view, 0, 2, 1, &SearchBudget::unlimited()).unwrap();
        assert_eq!(report.value.unwrap().path, vec![0, 2]);
    }

    #[test]
    fn test_dijkstra_zero_cost_edges_stay_simple() {
        let view = view(4, &[(0, 1, 1.0), (1, 2, 1.0), (2, 0, 1.0), (2, 3, 1.0)]);
        let path = dijkstra(&view, 0, 3, 7, &SearchBudget::unlimited())
            .unwrap()
            .value
            .unwrap();
        assert_eq!(path.path, vec![0, 2, 3]);
    }

    #[test]
    fn test_a_star_matches_dijkstra() {
        let view = diamond();
        let plain = dijkstra(&view, 0, 4, 7, &SearchBudget::unlimited()).unwrap().value.unwrap();
        let guided = a_star(&view, 0, 4, 7, &SearchBudget::unlimited(), |idx| {
            // exact remaining hops * minimum cost is a valid lower bound here
            if idx == 4 { 0.0 } else { 0.1 }
        })
        .unwrap()
        .value
        .unwrap();
        assert_eq!(plain.path, guided.path);
        assert!((plain.cost - guided.cost).abs() < 1e-9);
    }

    #[test]
    fn test_all_paths_enumeration() {
        let view = diamond();
        let report = all_simple_paths(&view, 0, 3, 7, 100, &SearchBudget::unlimited()).unwrap();
        assert_eq!(report.status, SearchStatus::Complete);
        assert_eq!(report.value.len(), 2);
        for path in &report.value {
            let mut seen = path.path.clone();
            seen.sort();
            seen.dedup();
            assert_eq!(seen.len(), path.path.len());
        }
    }

    #[test]
    fn test_all_paths_truncation() {
        // K6: many simple paths between 0 and 5
        let mut edges = Vec::new();
        for u in 0..6 {
            for v in (u + 1)..6 {
                edges.push((u, v, 0.5));
            }
        }
        let view = view(6, &edges);
        let report = all_simple_paths(&view, 0, 5, 7, 10, &SearchBudget::unlimited()).unwrap();
        assert_eq!(report.status, SearchStatus::Truncated);
        assert_eq!(report.value.len(), 10);
    }

    #[test]
    fn test_all_paths_unreachable_target_is_immediate() {
        // K8 on 0..8, target 8 only reachable through a four hop tail
        let mut edges = Vec::new();
        for u in 0..8 {
            for v in (u + 1)..8 {
                edges.push((u, v, 0.5));
            }
        }
        edges.extend([(7, 9, 0.5), (9, 10, 0.5), (10, 11, 0.5), (11, 8, 0.5)]);
        let view = view(13, &edges);
        let budget = SearchBudget::unlimited().with_max_expansions(1_000);

        let report = all_simple_paths(&view, 0, 12, 7, 1000, &budget).unwrap();
        assert_eq!(report.status, SearchStatus::Complete);
        assert!(report.value.is_empty());
        assert_eq!(report.expansions, 0);

        // within three hops the clique is never worth entering
        let report = all_simple_paths(&view, 0, 8, 3, 1000, &budget).unwrap();
        assert_eq!(report.status, SearchStatus::Complete);
        assert!(report.value.is_empty());

        // straight to 7 in five hops, or via one more clique node in six
        let report = all_simple_paths(&view, 0, 8, 6, 1000, &budget).unwrap();
        assert_eq!(report.status, SearchStatus::Complete);
        assert_eq!(report.value.len(), 7);
        assert!(report.expansions < 1_000);
    }

    #[test]
    fn test_bfs_never_longer_than_enumerated_paths() {
        let view = view(
            7,
            &[(0, 1, 0.5), (1, 2, 0.5), (2, 6, 0.5), (0, 3, 0.9), (3, 4, 0.9), (4, 5, 0.9), (5, 6, 0.9), (1, 4, 0.2)],
        );
        let shortest = bounded_bfs(&view, 0, 6, 7, 10, &SearchBudget::unlimited()).unwrap();
        let all = all_simple_paths(&view, 0, 6, 7, 1000, &SearchBudget::unlimited()).unwrap();
        let bfs_len = shortest.value[0].hops();
        assert!(all.value.iter().all(|p| p.hops() >= bfs_len));
        assert_eq!(bfs_len, 3);
    }

    #[test]
    fn test_cancelled_search_returns_partial() {
        let view = diamond();
        let flag = Arc::new(AtomicBool::new(true));
        let budget = SearchBudget::unlimited().with_cancel_flag(flag);
        let report = all_simple_paths(&view, 0, 3, 7, 100, &budget).unwrap();
        assert_eq!(report.status, SearchStatus::Cancelled);
        let report = dijkstra(&view, 0, 3, 7, &budget).unwrap();
        assert_eq!(report.status, SearchStatus::Cancelled);
        assert!(report.value.is_none());
    }

    #[test]
    fn test_shortest_path_tree() {
        let view = view(4, &[(0, 1, 0.5), (1, 2, 0.5), (0, 2, 0.1)]);
        let tree = shortest_path_tree(&view, 0, &SearchBudget::unlimited()).value;
        assert!((tree.dist[2] - 0.9).abs() < 1e-9);
        assert_eq!(tree.parent[2], Some(0));
        assert!(tree.dist[3].is_infinite());
    }

    #[test]
    fn test_path_from_nodes() {
        let view = diamond();
        let path = path_from_nodes(&view, &[0, 1, 3, 4]).unwrap();
        assert_eq!(path.edges.len(), 3);
        assert!(path_from_nodes(&view, &[0, 3]).is_none());
        assert!(path_from_nodes(&view, &[0, 1, 0]).is_none());
        assert!(path_from_nodes(&view, &[0]).is_none());
        assert!(path_from_nodes(&view, &[0, 99]).is_none());
    }

    #[test]
    fn test_bfs_distances_with_exclusion() {
        let view = view(4, &[(0, 1, 0.5), (1, 2, 0.5), (0, 3, 0.5), (3, 2, 0.5)]);
        let full = bfs_distances(&view, 0, None);
        assert_eq!(full[2], Some(2));
        let cut = bfs_distances(&view, 0, Some(1));
        assert_eq!(cut[2], Some(2));
        let cut = bfs_distances(&view, 0, Some(3));
        assert_eq!(cut[3], None);
    }
}
