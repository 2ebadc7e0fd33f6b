//! Hybrid community ensemble.
//!
//! Several partitioning strategies with incompatible internals run over the
//! same reduced graph:
//!
//! | Strategy | Output space | Partition from |
//! |----------|--------------|----------------|
//! | Modularity | discrete | Leiden |
//! | Spectral | continuous (Laplacian eigenvectors) | k-means |
//! | Embedding | continuous (FastRP vectors) | k-means |
//!
//! Every strategy is a [`Partitioner`]: graph in, labels out. Embedding
//! strategies are an embedding composed with a clustering step, behind the
//! same trait. Each labeling is locally refined, then all of them vote:
//!
//! ```text
//! C_ij = #{candidates placing i and j together}
//! final = Leiden(C)
//! agreement_i = #{candidates whose community of i maps to i's final community} / #candidates
//! ```
//!
//! A strategy that fails is dropped from the vote and reported. The engine
//! only fails if no strategy succeeds.

mod engine;
mod fusion;
mod strategy;

pub use engine::CommunityEngine;
pub use fusion::{agreement, co_association, fuse};
pub use strategy::{EmbeddingPartitioner, ModularityPartitioner, PartitionRequest, Partitioner};

use std::collections::BTreeMap;

use serde::Serialize;

use crate::community::canonicalize;
use crate::config::StrategyKind;
use crate::error::Warning;
use crate::graph::CollabGraph;

/// A disjoint assignment of every node to one community.
///
/// Labels are canonical: communities are numbered `0..k` in order of first
/// appearance by node index, so equal partitions compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Partition {
    labels: Vec<usize>,
}

impl Partition {
    /// Partition from arbitrary labels (canonicalized).
    pub fn new(labels: &[usize]) -> Self {
        Self {
            labels: canonicalize(labels),
        }
    }

    /// Community per node index.
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Number of nodes covered.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Whether the partition covers no nodes.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Community of node `i`.
    pub fn community_of(&self, i: usize) -> usize {
        self.labels[i]
    }

    /// Number of communities.
    pub fn n_communities(&self) -> usize {
        self.labels.iter().copied().max().map_or(0, |c| c + 1)
    }

    /// Size of each community, by community id.
    pub fn sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.n_communities()];
        for &c in &self.labels {
            sizes[c] += 1;
        }
        sizes
    }

    /// Node indices of each community, ascending.
    pub fn members(&self) -> Vec<Vec<usize>> {
        let mut members = vec![Vec::new(); self.n_communities()];
        for (i, &c) in self.labels.iter().enumerate() {
            members[c].push(i);
        }
        members
    }

    /// Developer id → community id.
    pub fn to_id_map(&self, graph: &CollabGraph) -> BTreeMap<String, usize> {
        self.labels
            .iter()
            .enumerate()
            .map(|(i, &c)| (graph.id(i).to_string(), c))
            .collect()
    }
}

/// One strategy's (refined) output, as it enters the vote.
#[derive(Debug, Clone, Serialize)]
pub struct CandidatePartition {
    /// Producing strategy.
    pub strategy: StrategyKind,
    /// Labels after refinement.
    pub partition: Partition,
    /// Modularity of `partition` on the reduced graph.
    pub modularity: f64,
    /// Nodes moved by refinement.
    pub refinement_moves: usize,
}

/// Output of [`CommunityEngine::detect`].
#[derive(Debug, Clone)]
pub struct EnsembleResult {
    /// Fused partition.
    pub partition: Partition,
    /// Per-node agreement in [0, 1], by node index.
    pub agreement: Vec<f64>,
    /// Modularity of the fused partition on the reduced graph.
    pub modularity: f64,
    /// The candidates that voted.
    pub candidates: Vec<CandidatePartition>,
    /// Strategies excluded from the vote.
    pub warnings: Vec<Warning>,
}

impl EnsembleResult {
    /// Mean per-node agreement; 1.0 when every candidate agrees everywhere.
    pub fn stability(&self) -> f64 {
        if self.agreement.is_empty() {
            return 0.0;
        }
        self.agreement.iter().sum::<f64>() / self.agreement.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::tests::two_triangles;

    #[test]
    fn test_partition_is_canonical() {
        let a = Partition::new(&[3, 3, 1, 1, 7]);
        let b = Partition::new(&[0, 0, 5, 5, 2]);
        assert_eq!(a, b);
        assert_eq!(a.labels(), &[0, 0, 1, 1, 2]);
        assert_eq!(a.n_communities(), 3);
        assert_eq!(a.sizes(), vec![2, 2, 1]);
        assert_eq!(a.members(), vec![vec![0, 1], vec![2, 3], vec![4]]);
    }

    #[test]
    fn test_id_map_uses_developer_ids() {
        let graph = two_triangles();
        let map = Partition::new(&[0, 0, 0, 1, 1, 1]).to_id_map(&graph);
        assert_eq!(map["A"], 0);
        assert_eq!(map["F"], 1);
        assert_eq!(map.len(), 6);
    }

    #[test]
    fn test_empty_partition() {
        let p = Partition::new(&[]);
        assert!(p.is_empty());
        assert_eq!(p.n_communities(), 0);
        assert!(p.sizes().is_empty());
    }
}
