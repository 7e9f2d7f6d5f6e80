pub mod common;
pub mod budget;
pub mod pathfinding;
pub mod connectivity;
pub mod topology;
pub mod centrality;

pub use common::{EdgeRef, GraphView, NodeId};
pub use budget::{SearchBudget, SearchReport, SearchStatus};
pub use pathfinding::{
    a_star, all_simple_paths, bfs_distances, bounded_bfs, dijkstra, path_from_nodes, shortest_path_tree,
    PathResult, ShortestPathTree,
};
pub use connectivity::{connected_components, Components};
pub use topology::{articulation_points, average_clustering, local_clustering};
pub use centrality::sampled_betweenness;
