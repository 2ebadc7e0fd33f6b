//! Weighted, undirected developer collaboration graph.
//!
//! Nodes are developers, edges are collaboration strength accumulated over
//! shared repositories. The graph is built once ([`GraphBuilder`]) and is
//! immutable afterwards; every later stage reads it through `&CollabGraph`
//! and may share it across threads.
//!
//! ## Invariants
//!
//! - At most one edge per unordered node pair, weight > 0
//! - No self-loops
//! - Node indices are dense `0..n` and follow ascending developer id
//!
//! The last point matters: every algorithm downstream iterates nodes by
//! index, so id-ordered indices make runs reproducible regardless of the
//! order records arrived in.

mod builder;

pub use builder::{ContributionRecord, GraphBuilder};

use std::collections::HashMap;

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A developer node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Developer {
    /// Unique developer identifier.
    pub id: String,
    /// Sum of contribution counts over all accepted records.
    pub total_contributions: u64,
}

impl Developer {
    /// Developer with no recorded contributions.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            total_contributions: 0,
        }
    }
}

/// Immutable collaboration graph.
#[derive(Debug, Clone)]
pub struct CollabGraph {
    graph: UnGraph<Developer, f64>,
    index: HashMap<String, NodeIndex>,
    /// node -> [(neighbor, weight)], sorted by neighbor.
    adj: Vec<Vec<(usize, f64)>>,
    degrees: Vec<f64>,
    total_weight: f64,
}

impl CollabGraph {
    /// Build from developers and an edge list of `(i, j, w)` by node position.
    ///
    /// Developers are reordered by id; edges are remapped accordingly.
    /// Duplicate pairs are merged additively. Self-loops and non-positive
    /// weights are rejected.
    pub fn from_parts(developers: Vec<Developer>, edges: &[(usize, usize, f64)]) -> Result<Self> {
        let n = developers.len();
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| developers[a].id.cmp(&developers[b].id));
        let mut position = vec![0usize; n];
        for (new, &old) in order.iter().enumerate() {
            position[old] = new;
        }

        let mut graph = UnGraph::<Developer, f64>::with_capacity(n, edges.len());
        let mut index = HashMap::with_capacity(n);
        let mut slots: Vec<Option<Developer>> = developers.into_iter().map(Some).collect();
        for &old in &order {
            let dev = slots[old].take().ok_or(Error::EmptyInput)?;
            if index.contains_key(&dev.id) {
                return Err(Error::InvalidParameter {
                    name: "developers",
                    message: format!("duplicate developer id '{}'", dev.id),
                });
            }
            let id = dev.id.clone();
            let idx = graph.add_node(dev);
            index.insert(id, idx);
        }

        let mut merged: HashMap<(usize, usize), f64> = HashMap::with_capacity(edges.len());
        for &(i, j, w) in edges {
            if i >= n || j >= n {
                return Err(Error::DimensionMismatch {
                    expected: n,
                    found: i.max(j) + 1,
                });
            }
            if i == j {
                return Err(Error::InvalidParameter {
                    name: "edges",
                    message: format!("self-loop on node {i}"),
                });
            }
            if !(w > 0.0) || !w.is_finite() {
                return Err(Error::InvalidParameter {
                    name: "edges",
                    message: format!("edge weight {w} must be positive"),
                });
            }
            let (a, b) = (position[i], position[j]);
            let key = if a < b { (a, b) } else { (b, a) };
            *merged.entry(key).or_insert(0.0) += w;
        }

        let mut pairs: Vec<((usize, usize), f64)> = merged.into_iter().collect();
        pairs.sort_by(|x, y| x.0.cmp(&y.0));
        for ((a, b), w) in pairs {
            graph.add_edge(NodeIndex::new(a), NodeIndex::new(b), w);
        }

        Ok(Self::index_graph(graph, index))
    }

    fn index_graph(graph: UnGraph<Developer, f64>, index: HashMap<String, NodeIndex>) -> Self {
        let n = graph.node_count();
        let mut adj: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
        let mut degrees = vec![0.0; n];
        let mut total_weight = 0.0;
        for edge in graph.edge_references() {
            let (i, j, w) = (edge.source().index(), edge.target().index(), *edge.weight());
            adj[i].push((j, w));
            adj[j].push((i, w));
            degrees[i] += w;
            degrees[j] += w;
            total_weight += w;
        }
        for row in &mut adj {
            row.sort_by_key(|&(j, _)| j);
        }
        Self {
            graph,
            index,
            adj,
            degrees,
            total_weight,
        }
    }

    /// Number of developers.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of collaboration edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Sum of edge weights (m in the modularity formula).
    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    /// Developer at node index `i`.
    pub fn developer(&self, i: usize) -> &Developer {
        &self.graph[NodeIndex::new(i)]
    }

    /// Developer id at node index `i`.
    pub fn id(&self, i: usize) -> &str {
        &self.developer(i).id
    }

    /// Node index of a developer id.
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).map(|idx| idx.index())
    }

    /// Developers in index (id) order.
    pub fn developers(&self) -> impl Iterator<Item = &Developer> + '_ {
        self.graph.node_weights()
    }

    /// Weighted neighbors of node `i`, ascending by neighbor index.
    pub fn neighbors(&self, i: usize) -> &[(usize, f64)] {
        &self.adj[i]
    }

    /// Weighted degree (strength) of node `i`.
    pub fn weighted_degree(&self, i: usize) -> f64 {
        self.degrees[i]
    }

    /// Weighted degrees of all nodes.
    pub fn weighted_degrees(&self) -> &[f64] {
        &self.degrees
    }

    /// Edge weight between two nodes, if connected.
    pub fn weight(&self, i: usize, j: usize) -> Option<f64> {
        self.adj[i]
            .binary_search_by_key(&j, |&(k, _)| k)
            .ok()
            .map(|pos| self.adj[i][pos].1)
    }

    /// Edges as `(i, j, w)` with `i < j`, in insertion (sorted) order.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.graph.edge_references().map(|e| {
            let (a, b) = (e.source().index(), e.target().index());
            if a < b {
                (a, b, *e.weight())
            } else {
                (b, a, *e.weight())
            }
        })
    }

    /// Underlying petgraph graph.
    pub fn inner(&self) -> &UnGraph<Developer, f64> {
        &self.graph
    }

    /// Subgraph induced by `keep` (node indices into `self`).
    ///
    /// Edges with an endpoint outside `keep` are dropped. Duplicate indices
    /// are ignored.
    pub fn induced(&self, keep: &[usize]) -> Result<CollabGraph> {
        let mut local = vec![usize::MAX; self.node_count()];
        let mut developers = Vec::with_capacity(keep.len());
        for &i in keep {
            if i >= self.node_count() {
                return Err(Error::DimensionMismatch {
                    expected: self.node_count(),
                    found: i + 1,
                });
            }
            if local[i] == usize::MAX {
                local[i] = developers.len();
                developers.push(self.developer(i).clone());
            }
        }

        let edges: Vec<(usize, usize, f64)> = self
            .edges()
            .filter(|&(i, j, _)| local[i] != usize::MAX && local[j] != usize::MAX)
            .map(|(i, j, w)| (local[i], local[j], w))
            .collect();

        CollabGraph::from_parts(developers, &edges)
    }
}
