//! Leiden algorithm for community detection.
//!
//! An improvement over Louvain that guarantees well-connected communities.
//!
//! ## Phases
//!
//! 1. **Local moving**: greedily move nodes to the neighboring community with
//!    the best modularity gain.
//! 2. **Refinement**: split every community that is not internally connected
//!    into its connected components.
//! 3. **Aggregation**: contract each community into a node (internal weight
//!    becomes a self-loop) and repeat on the coarse graph.
//!
//! ```text
//! Louvain can produce:        Leiden guarantees:
//!     A---B                       A---B
//!         |                           |
//!     C   D                       C   D
//!                                 (C in separate community)
//! ```
//!
//! Because each coarse node is a connected set of original nodes, splitting
//! at every level keeps the final communities connected in the input graph.
//!
//! Node order and tie-breaks are fixed (index order, smallest community
//! id), so repeated runs on the same graph give the same partition.
//!
//! ## References
//!
//! Traag, Waltman, van Eck (2019). "From Louvain to Leiden: guaranteeing
//! well-connected communities." Scientific Reports 9, 5233.

use std::collections::VecDeque;

use tracing::debug;

use super::modularity::WeightedGraph;
use super::traits::CommunityDetection;
use super::canonicalize;
use crate::config::CommunityConfig;
use crate::error::{Error, Result};
use crate::graph::CollabGraph;

/// Leiden community detection algorithm.
#[derive(Debug, Clone)]
pub struct Leiden {
    /// Resolution parameter (gamma). Higher = smaller communities.
    resolution: f64,
    /// Maximum aggregation levels.
    max_levels: usize,
    /// Maximum local-moving sweeps per level.
    max_iter: usize,
    /// Minimum modularity gain for a move.
    min_gain: f64,
}

impl Leiden {
    /// Create a new Leiden detector.
    pub fn new() -> Self {
        Self {
            resolution: 1.0,
            max_levels: 10,
            max_iter: 100,
            min_gain: 1e-7,
        }
    }

    /// Detector from the community section of the configuration.
    pub fn from_config(config: &CommunityConfig) -> Self {
        Self {
            resolution: config.resolution,
            max_levels: config.max_levels,
            max_iter: config.max_iterations,
            min_gain: config.min_modularity_gain,
        }
    }

    /// Set resolution parameter.
    ///
    /// Higher values produce smaller communities.
    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    /// Set maximum aggregation levels.
    pub fn with_max_levels(mut self, max_levels: usize) -> Self {
        self.max_levels = max_levels;
        self
    }

    /// Set maximum sweeps per level.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set minimum modularity gain threshold.
    pub fn with_min_gain(mut self, min_gain: f64) -> Self {
        self.min_gain = min_gain;
        self
    }
}

impl Default for Leiden {
    fn default() -> Self {
        Self::new()
    }
}

impl CommunityDetection for Leiden {
    fn detect(&self, graph: &CollabGraph) -> Result<Vec<usize>> {
        let n = graph.node_count();
        if n == 0 {
            return Err(Error::EmptyInput);
        }

        // membership[i] = node of the current level that contains node i
        let mut membership: Vec<usize> = (0..n).collect();
        let mut wg = WeightedGraph::from_graph(graph);
        if wg.m == 0.0 {
            return Ok(membership);
        }

        for level in 0..self.max_levels {
            let mut assignment: Vec<usize> = (0..wg.n).collect();
            let moves = wg.local_moving(&mut assignment, self.resolution, self.max_iter, self.min_gain);
            if moves == 0 {
                break;
            }

            let assignment = split_disconnected(&wg, &assignment);
            let k = assignment.iter().copied().max().map_or(0, |c| c + 1);
            for m in &mut membership {
                *m = assignment[*m];
            }
            debug!(
                level,
                moves,
                communities = k,
                modularity = wg.modularity(&assignment, self.resolution),
                "leiden level"
            );

            if k == wg.n {
                break;
            }
            wg = wg.aggregate(&assignment);
        }

        Ok(canonicalize(&membership))
    }

    fn resolution(&self) -> f64 {
        self.resolution
    }
}

/// Relabel so that every community is a connected component of its
/// induced subgraph. Output labels are canonical (first appearance).
fn split_disconnected(wg: &WeightedGraph, assignment: &[usize]) -> Vec<usize> {
    let mut labels = vec![usize::MAX; wg.n];
    let mut next = 0;
    let mut queue = VecDeque::new();

    for start in 0..wg.n {
        if labels[start] != usize::MAX {
            continue;
        }
        let comm = assignment[start];
        labels[start] = next;
        queue.push_back(start);
        while let Some(node) = queue.pop_front() {
            for &(nb, _) in &wg.adj[node] {
                if labels[nb] == usize::MAX && assignment[nb] == comm {
                    labels[nb] = next;
                    queue.push_back(nb);
                }
            }
        }
        next += 1;
    }
    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::community::modularity;
    use crate::graph::tests::{numbered, two_triangles};
    use std::collections::{HashMap, HashSet};

    #[test]
    fn test_leiden_basic() {
        let graph = numbered(3, &[(0, 1), (1, 2), (0, 2)]);
        let communities = Leiden::new().detect(&graph).unwrap();

        // All in one community (triangle)
        assert_eq!(communities, vec![0, 0, 0]);
    }

    #[test]
    fn test_leiden_two_cliques() {
        let graph = two_triangles();
        let communities = Leiden::new().detect(&graph).unwrap();

        assert_eq!(communities, vec![0, 0, 0, 1, 1, 1]);
        assert!(modularity(&graph, &communities) > 0.3);
    }

    #[test]
    fn test_leiden_disconnected_components() {
        // A--B--C  D--E
        let graph = numbered(5, &[(0, 1), (1, 2), (3, 4)]);
        let communities = Leiden::new().detect(&graph).unwrap();

        assert_eq!(communities[0], communities[1]);
        assert_eq!(communities[1], communities[2]);
        assert_eq!(communities[3], communities[4]);
        assert_ne!(communities[0], communities[3]);
    }

    #[test]
    fn test_leiden_empty_graph() {
        let graph = numbered(0, &[]);
        assert!(matches!(Leiden::new().detect(&graph), Err(Error::EmptyInput)));
    }

    #[test]
    fn test_leiden_edgeless_graph_is_singletons() {
        let graph = numbered(3, &[]);
        assert_eq!(Leiden::new().detect(&graph).unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_leiden_single_node() {
        let graph = numbered(1, &[]);
        assert_eq!(Leiden::new().detect(&graph).unwrap(), vec![0]);
    }

    #[test]
    fn test_split_disconnected() {
        // community 0 = {0, 1, 3} but 3 is only linked to 2
        let graph = numbered(4, &[(0, 1), (2, 3)]);
        let wg = WeightedGraph::from_graph(&graph);
        assert_eq!(split_disconnected(&wg, &[0, 0, 1, 0]), vec![0, 0, 1, 2]);
    }

    #[test]
    fn test_leiden_is_deterministic() {
        let edges: Vec<(usize, usize)> = (0..29)
            .map(|i| (i, i + 1))
            .chain([(0, 7), (3, 12), (14, 22), (5, 27), (9, 18)])
            .collect();
        let graph = numbered(30, &edges);
        let first = Leiden::new().detect(&graph).unwrap();
        let second = Leiden::new().detect(&graph).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_leiden_resolution_parameter() {
        // Higher resolution should not produce fewer communities on a chain.
        let edges: Vec<(usize, usize)> = (0..9).map(|i| (i, i + 1)).collect();
        let graph = numbered(10, &edges);

        let low = Leiden::new().with_resolution(0.5).detect(&graph).unwrap();
        let high = Leiden::new().with_resolution(2.0).detect(&graph).unwrap();

        assert_eq!(low.len(), 10);
        assert_eq!(high.len(), 10);
        let unique_low: HashSet<_> = low.iter().collect();
        let unique_high: HashSet<_> = high.iter().collect();
        assert!(!unique_low.is_empty());
        assert!(unique_high.len() >= unique_low.len());
    }

    #[test]
    fn test_leiden_connectivity_guarantee() {
        let mut edges: Vec<(usize, usize)> = (0..15).map(|i| (i, i + 1)).collect();
        edges.extend([(0, 5), (10, 15)]);
        let graph = numbered(20, &edges);
        let communities = Leiden::new().detect(&graph).unwrap();

        let mut by_community: HashMap<usize, Vec<usize>> = HashMap::new();
        for (node, &comm) in communities.iter().enumerate() {
            by_community.entry(comm).or_default().push(node);
        }

        for nodes in by_community.values() {
            let node_set: HashSet<usize> = nodes.iter().copied().collect();
            let mut visited = HashSet::new();
            let mut queue = VecDeque::from([nodes[0]]);
            while let Some(node) = queue.pop_front() {
                if !visited.insert(node) {
                    continue;
                }
                for &(nb, _) in graph.neighbors(node) {
                    if node_set.contains(&nb) && !visited.contains(&nb) {
                        queue.push_back(nb);
                    }
                }
            }
            assert_eq!(visited.len(), nodes.len(), "Community is not fully connected!");
        }
    }
}
