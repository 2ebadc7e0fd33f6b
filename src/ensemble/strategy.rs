//! Partitioning strategies.

use tracing::debug;

use crate::cluster::Kmeans;
use crate::community::{CommunityDetection, Leiden};
use crate::config::{CommunityConfig, StrategyKind};
use crate::embedding::{is_degenerate, EmbeddingRequest, FastRp, LaplacianEigenmap, NodeEmbedding};
use crate::error::{Error, Result};
use crate::graph::CollabGraph;

/// Per-run inputs shared by all strategies.
#[derive(Debug, Clone, Copy)]
pub struct PartitionRequest {
    /// Target community count for strategies that need one.
    pub clusters: usize,
    /// Seed for every randomized step.
    pub seed: u64,
}

/// A strategy producing a candidate labeling of a graph.
///
/// Implementations only read the graph, so the engine may run several at
/// once on the same `&CollabGraph`.
pub trait Partitioner: Send + Sync {
    /// Which strategy family this is.
    fn strategy(&self) -> StrategyKind;

    /// Label every node. Labels need not be canonical.
    fn partition(&self, graph: &CollabGraph, request: &PartitionRequest) -> Result<Vec<usize>>;
}

/// Modularity optimization (Leiden). Ignores the requested cluster count.
#[derive(Debug, Clone, Default)]
pub struct ModularityPartitioner {
    leiden: Leiden,
}

impl ModularityPartitioner {
    /// Partitioner wrapping a configured detector.
    pub fn new(leiden: Leiden) -> Self {
        Self { leiden }
    }

    /// Partitioner from the community section of the configuration.
    pub fn from_config(config: &CommunityConfig) -> Self {
        Self::new(Leiden::from_config(config))
    }
}

impl Partitioner for ModularityPartitioner {
    fn strategy(&self) -> StrategyKind {
        StrategyKind::Modularity
    }

    fn partition(&self, graph: &CollabGraph, _request: &PartitionRequest) -> Result<Vec<usize>> {
        self.leiden.detect(graph)
    }
}

/// Embed nodes, then k-means the vectors.
#[derive(Debug, Clone)]
pub struct EmbeddingPartitioner<E> {
    strategy: StrategyKind,
    embedding: E,
    restarts: usize,
    max_iter: usize,
}

impl<E: NodeEmbedding> EmbeddingPartitioner<E> {
    /// Partitioner reporting itself as `strategy`.
    pub fn new(strategy: StrategyKind, embedding: E) -> Self {
        Self {
            strategy,
            embedding,
            restarts: 4,
            max_iter: 100,
        }
    }

    /// Set k-means restarts.
    pub fn with_restarts(mut self, restarts: usize) -> Self {
        self.restarts = restarts;
        self
    }

    /// Set k-means iteration cap.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }
}

impl EmbeddingPartitioner<LaplacianEigenmap> {
    /// Spectral strategy: Laplacian eigenmap + k-means.
    pub fn spectral(config: &CommunityConfig) -> Self {
        Self::new(StrategyKind::Spectral, LaplacianEigenmap::new())
            .with_restarts(config.kmeans_restarts)
            .with_max_iter(config.kmeans_max_iterations)
    }
}

impl EmbeddingPartitioner<FastRp> {
    /// Embedding strategy: FastRP + k-means.
    pub fn fastrp(config: &CommunityConfig) -> Self {
        Self::new(StrategyKind::Embedding, FastRp::from_config(config))
            .with_restarts(config.kmeans_restarts)
            .with_max_iter(config.kmeans_max_iterations)
    }
}

impl<E: NodeEmbedding> Partitioner for EmbeddingPartitioner<E> {
    fn strategy(&self) -> StrategyKind {
        self.strategy
    }

    fn partition(&self, graph: &CollabGraph, request: &PartitionRequest) -> Result<Vec<usize>> {
        let n = graph.node_count();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        let k = request.clusters.clamp(1, n);
        let vectors = self.embedding.embed(
            graph,
            &EmbeddingRequest {
                clusters: k,
                seed: request.seed,
            },
        )?;
        if k > 1 && is_degenerate(&vectors) {
            return Err(Error::DegenerateEmbedding {
                strategy: self.embedding.name(),
            });
        }

        let fit = Kmeans::new(k)
            .with_seed(request.seed)
            .with_restarts(self.restarts)
            .with_max_iter(self.max_iter)
            .fit(&vectors)?;
        debug!(
            strategy = %self.strategy,
            embedding = self.embedding.name(),
            k,
            inertia = fit.inertia,
            "clustered embedding"
        );
        Ok(fit.labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::tests::two_triangles;

    /// Embedding that puts every node at the same point.
    struct Constant;

    impl NodeEmbedding for Constant {
        fn name(&self) -> &'static str {
            "constant"
        }

        fn embed(&self, graph: &CollabGraph, _request: &EmbeddingRequest) -> Result<Vec<Vec<f32>>> {
            Ok(vec![vec![1.0, 1.0]; graph.node_count()])
        }
    }

    fn request(clusters: usize) -> PartitionRequest {
        PartitionRequest { clusters, seed: 42 }
    }

    #[test]
    fn test_modularity_strategy_ignores_k() {
        let graph = two_triangles();
        let labels = ModularityPartitioner::default().partition(&graph, &request(5)).unwrap();
        assert_eq!(labels, vec![0, 0, 0, 1, 1, 1]);
    }

    #[test]
    fn test_spectral_strategy_splits_triangles() {
        let graph = two_triangles();
        let labels = EmbeddingPartitioner::spectral(&CommunityConfig::default())
            .partition(&graph, &request(2))
            .unwrap();
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[4], labels[5]);
        assert_ne!(labels[0], labels[5]);
    }

    #[test]
    fn test_degenerate_embedding_is_an_error() {
        let graph = two_triangles();
        let result = EmbeddingPartitioner::new(StrategyKind::Embedding, Constant).partition(&graph, &request(2));
        assert_eq!(result, Err(Error::DegenerateEmbedding { strategy: "constant" }));
    }

    #[test]
    fn test_single_cluster_tolerates_constant_vectors() {
        let graph = two_triangles();
        let labels = EmbeddingPartitioner::new(StrategyKind::Embedding, Constant)
            .partition(&graph, &request(1))
            .unwrap();
        assert_eq!(labels, vec![0; 6]);
    }

    #[test]
    fn test_cluster_count_is_clamped_to_graph_size() {
        let graph = two_triangles();
        let labels = EmbeddingPartitioner::fastrp(&CommunityConfig::default())
            .partition(&graph, &request(50))
            .unwrap();
        assert_eq!(labels.len(), 6);
        assert!(labels.iter().all(|&l| l < 6));
    }
}
