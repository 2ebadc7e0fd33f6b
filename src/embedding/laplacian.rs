//! Laplacian eigenmap: the spectral embedding of Ng, Jordan & Weiss.
//!
//! ```text
//! 1. A = weighted adjacency of the (reduced) graph
//! 2. L_sym = I - D^{-1/2} A D^{-1/2}
//! 3. U = k eigenvectors of L_sym with the smallest eigenvalues
//! 4. Normalize rows of U to unit length
//! ```
//!
//! Steps 2 and 3 are delegated to `lapl`, which owns the Laplacian and
//! eigensolver policy. The graph is densified for that call, which is fine
//! for the top-K subgraphs this runs on.
//!
//! # References
//!
//! - Ng, Jordan, Weiss (2001). "On Spectral Clustering"
//! - von Luxburg (2007). "A Tutorial on Spectral Clustering"

use lapl::{spectral_embedding, SpectralEmbeddingConfig};
use ndarray::Array2;
use tracing::{debug, warn};

use super::{normalize_rows, to_rows, EmbeddingRequest, NodeEmbedding};
use crate::error::{Error, Result};
use crate::graph::CollabGraph;

/// Spectral embedding via the normalized Laplacian.
#[derive(Debug, Clone)]
pub struct LaplacianEigenmap {
    skip_first: bool,
}

impl LaplacianEigenmap {
    /// Eigenmap keeping the first (degree-aligned) eigenvector.
    pub fn new() -> Self {
        Self { skip_first: false }
    }

    /// Drop the first eigenvector. NJW keeps it; row normalization then
    /// removes its degree scaling.
    pub fn with_skip_first(mut self, skip_first: bool) -> Self {
        self.skip_first = skip_first;
        self
    }

    /// The `k`-column embedding before row normalization.
    fn eigenvectors(&self, graph: &CollabGraph, k: usize) -> Result<Array2<f64>> {
        let affinity = affinity(graph);
        let mut cfg = SpectralEmbeddingConfig::default();
        cfg.skip_first = self.skip_first;
        let embedding = spectral_embedding(&affinity, k, &cfg).map_err(|e| {
            warn!(error = %e, nodes = graph.node_count(), k, "laplacian eigensolver failed");
            Error::Convergence {
                stage: "spectral",
                iterations: 0,
                residual: f64::INFINITY,
            }
        })?;
        if embedding.nrows() != graph.node_count() {
            return Err(Error::DimensionMismatch {
                expected: graph.node_count(),
                found: embedding.nrows(),
            });
        }
        debug!(nodes = graph.node_count(), k, columns = embedding.ncols(), "laplacian eigenvectors");
        Ok(embedding)
    }
}

impl Default for LaplacianEigenmap {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeEmbedding for LaplacianEigenmap {
    fn name(&self) -> &'static str {
        "laplacian"
    }

    fn embed(&self, graph: &CollabGraph, request: &EmbeddingRequest) -> Result<Vec<Vec<f32>>> {
        let n = graph.node_count();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        let k = request.clusters.clamp(1, n);
        let mut u = self.eigenvectors(graph, k)?;
        if u.iter().any(|v| !v.is_finite()) {
            return Err(Error::DegenerateEmbedding { strategy: self.name() });
        }
        normalize_rows(&mut u);
        Ok(to_rows(&u))
    }
}

/// Dense symmetric weighted adjacency, zero diagonal.
fn affinity(graph: &CollabGraph) -> Array2<f64> {
    let n = graph.node_count();
    let mut a = Array2::zeros((n, n));
    for (i, j, w) in graph.edges() {
        a[[i, j]] = w;
        a[[j, i]] = w;
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::tests::{numbered, ring_of_cliques, two_triangles};

    fn dist(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum::<f32>().sqrt()
    }

    #[test]
    fn test_affinity_is_symmetric_adjacency() {
        let a = affinity(&two_triangles());
        assert_eq!(a.dim(), (6, 6));
        assert_eq!(a[[2, 3]], 1.0);
        assert_eq!(a[[3, 2]], 1.0);
        assert_eq!(a[[0, 4]], 0.0);
        assert!((0..6).all(|i| a[[i, i]] == 0.0));
    }

    #[test]
    fn test_two_triangles_separate_in_embedding() {
        let graph = two_triangles();
        let request = EmbeddingRequest { clusters: 2, seed: 42 };
        let rows = LaplacianEigenmap::new().embed(&graph, &request).unwrap();
        assert_eq!(rows.len(), 6);
        assert!(rows.iter().all(|r| r.len() == 2));

        // A and B are closer to each other than to E
        assert!(dist(&rows[0], &rows[1]) < dist(&rows[0], &rows[4]));
        assert!(dist(&rows[4], &rows[5]) < dist(&rows[5], &rows[1]));
    }

    #[test]
    fn test_many_communities_embed_without_error() {
        let graph = ring_of_cliques(8, 10);
        let request = EmbeddingRequest { clusters: 8, seed: 42 };
        let rows = LaplacianEigenmap::new().embed(&graph, &request).unwrap();
        assert_eq!(rows.len(), 80);
        assert!(rows.iter().all(|r| r.len() == 8));
        // interior clique members sit together, away from other cliques
        assert!(dist(&rows[5], &rows[6]) < dist(&rows[5], &rows[15]));
        assert!(dist(&rows[45], &rows[46]) < dist(&rows[45], &rows[75]));
    }

    #[test]
    fn test_repeated_runs_match() {
        let graph = two_triangles();
        let request = EmbeddingRequest { clusters: 2, seed: 5 };
        let eigenmap = LaplacianEigenmap::new();
        assert_eq!(
            eigenmap.embed(&graph, &request).unwrap(),
            eigenmap.embed(&graph, &request).unwrap()
        );
    }

    #[test]
    fn test_empty_graph_is_an_error() {
        let graph = numbered(0, &[]);
        let result = LaplacianEigenmap::new().embed(&graph, &EmbeddingRequest { clusters: 2, seed: 1 });
        assert_eq!(result, Err(Error::EmptyInput));
    }
}
