//! FastRP: fast random projection embeddings (Chen et al. 2019).
//!
//! Nodes with overlapping multi-hop neighborhoods get similar vectors:
//!
//! ```text
//! R   = sparse random n × d matrix, entries √3 × {+1, 0, −1} w.p. {1/6, 2/3, 1/6}
//! N_1 = S R,   N_t = S N_{t−1},   S = D^{−1} A
//! X   = Σ_t α_t × rownorm(N_t)
//! ```
//!
//! `α` are the iteration weights; the default `[0, 1, 1]` ignores direct
//! neighbors alone and emphasizes 2- and 3-hop structure, which is what
//! separates communities joined by a single bridge. Final rows are
//! L2-normalized so k-means compares directions.
//!
//! Isolated nodes embed to the zero vector.
//!
//! # References
//!
//! - Chen et al. (2019). "Fast and Accurate Network Embeddings via Very
//!   Sparse Random Projection"
//! - Achlioptas (2003). "Database-friendly random projections"

use ndarray::Array2;
use rand::prelude::*;
use tracing::debug;

use super::{normalize_rows, propagate, to_rows, EmbeddingRequest, NodeEmbedding};
use crate::config::CommunityConfig;
use crate::error::{Error, Result};
use crate::graph::CollabGraph;

/// FastRP embedding parameters.
#[derive(Debug, Clone)]
pub struct FastRp {
    dimension: usize,
    iteration_weights: Vec<f64>,
}

impl FastRp {
    /// FastRP with 64 dimensions and weights `[0, 1, 1]`.
    pub fn new() -> Self {
        Self {
            dimension: 64,
            iteration_weights: vec![0.0, 1.0, 1.0],
        }
    }

    /// FastRP from the community section of the configuration.
    pub fn from_config(config: &CommunityConfig) -> Self {
        Self {
            dimension: config.embedding_dimension,
            iteration_weights: config.embedding_iteration_weights.clone(),
        }
    }

    /// Set embedding dimension.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    /// Set per-order weights (order 1 first).
    pub fn with_iteration_weights(mut self, weights: Vec<f64>) -> Self {
        self.iteration_weights = weights;
        self
    }

    fn projection(&self, n: usize, seed: u64) -> Array2<f64> {
        let scale = 3.0_f64.sqrt();
        let mut rng = StdRng::seed_from_u64(seed);
        Array2::from_shape_fn((n, self.dimension), |_| {
            let r: f64 = rng.random();
            if r < 1.0 / 6.0 {
                scale
            } else if r < 1.0 / 3.0 {
                -scale
            } else {
                0.0
            }
        })
    }
}

impl Default for FastRp {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeEmbedding for FastRp {
    fn name(&self) -> &'static str {
        "fastrp"
    }

    fn embed(&self, graph: &CollabGraph, request: &EmbeddingRequest) -> Result<Vec<Vec<f32>>> {
        let n = graph.node_count();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        if self.dimension == 0 || self.iteration_weights.is_empty() {
            return Err(Error::InvalidParameter {
                name: "embedding_dimension",
                message: "dimension and iteration weights must be non-empty".into(),
            });
        }

        let inv_degree: Vec<f64> = graph
            .weighted_degrees()
            .iter()
            .map(|&d| if d > 0.0 { 1.0 / d } else { 0.0 })
            .collect();

        let mut current = self.projection(n, request.seed);
        let mut embedding = Array2::<f64>::zeros((n, self.dimension));
        for (order, &alpha) in self.iteration_weights.iter().enumerate() {
            current = propagate(graph, &current, |i, _, w| w * inv_degree[i]);
            normalize_rows(&mut current);
            if alpha != 0.0 {
                embedding.scaled_add(alpha, &current);
            }
            debug!(order = order + 1, alpha, "fastrp propagation");
        }

        normalize_rows(&mut embedding);
        Ok(to_rows(&embedding))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::tests::{numbered, two_triangles};

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn test_shape_and_unit_rows() {
        let graph = two_triangles();
        let rows = FastRp::new()
            .with_dimension(16)
            .embed(&graph, &EmbeddingRequest { clusters: 2, seed: 42 })
            .unwrap();
        assert_eq!(rows.len(), 6);
        for row in &rows {
            assert_eq!(row.len(), 16);
            let norm: f32 = row.iter().map(|v| v * v).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_same_triangle_nodes_are_closer() {
        let graph = two_triangles();
        let rows = FastRp::new()
            .embed(&graph, &EmbeddingRequest { clusters: 2, seed: 3 })
            .unwrap();
        // A·B vs A·F, E·F vs F·B
        assert!(cosine(&rows[0], &rows[1]) > cosine(&rows[0], &rows[5]));
        assert!(cosine(&rows[4], &rows[5]) > cosine(&rows[5], &rows[1]));
    }

    #[test]
    fn test_isolated_node_is_zero() {
        let graph = numbered(3, &[(0, 1)]);
        let rows = FastRp::new()
            .with_dimension(8)
            .embed(&graph, &EmbeddingRequest { clusters: 1, seed: 1 })
            .unwrap();
        assert!(rows[2].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_same_seed_same_embedding() {
        let graph = two_triangles();
        let request = EmbeddingRequest { clusters: 2, seed: 11 };
        let fastrp = FastRp::new().with_dimension(8);
        assert_eq!(fastrp.embed(&graph, &request).unwrap(), fastrp.embed(&graph, &request).unwrap());
    }

    #[test]
    fn test_zero_dimension_is_rejected() {
        let graph = two_triangles();
        let result = FastRp::new()
            .with_dimension(0)
            .embed(&graph, &EmbeddingRequest { clusters: 2, seed: 1 });
        assert!(matches!(result, Err(Error::InvalidParameter { .. })));
    }
}
