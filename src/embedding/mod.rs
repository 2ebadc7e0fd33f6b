//! Node embeddings: one fixed-length vector per node, from graph structure.
//!
//! Embedding-based strategies are "embed, then cluster". This module owns
//! the first half; any technique that produces one vector per node can be
//! plugged into the ensemble through [`NodeEmbedding`].
//!
//! | Embedding | Captures | Cost |
//! |-----------|----------|------|
//! | [`LaplacianEigenmap`] | global cut structure (smallest eigenvectors of L_sym) | O(n³) dense eigensolve |
//! | [`FastRp`] | multi-hop neighborhood overlap (random projection) | O(E × d × orders) |

mod fastrp;
mod laplacian;

pub use fastrp::FastRp;
pub use laplacian::LaplacianEigenmap;

use ndarray::Array2;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::Result;
use crate::graph::CollabGraph;

/// Per-call parameters for an embedding run.
#[derive(Debug, Clone, Copy)]
pub struct EmbeddingRequest {
    /// Number of clusters the caller will look for. Spectral embeddings use
    /// it as their dimension; others may ignore it.
    pub clusters: usize,
    /// Seed for every random choice made by the embedding.
    pub seed: u64,
}

/// Trait for node embedding techniques.
pub trait NodeEmbedding: Send + Sync {
    /// Short name used in logs and error reports.
    fn name(&self) -> &'static str;

    /// Embed every node of `graph`. Row `i` is the vector for node `i`.
    fn embed(&self, graph: &CollabGraph, request: &EmbeddingRequest) -> Result<Vec<Vec<f32>>>;
}

/// Sparse-dense product `Y = S X` where `S_ij = coeff(i, j, w_ij)` on edges.
pub(crate) fn propagate<F>(graph: &CollabGraph, x: &Array2<f64>, coeff: F) -> Array2<f64>
where
    F: Fn(usize, usize, f64) -> f64 + Sync,
{
    let (n, d) = x.dim();
    let row = |i: usize| -> Vec<f64> {
        let mut out = vec![0.0; d];
        for &(j, w) in graph.neighbors(i) {
            let c = coeff(i, j, w);
            for (o, v) in out.iter_mut().zip(x.row(j)) {
                *o += c * v;
            }
        }
        out
    };

    #[cfg(feature = "parallel")]
    let rows: Vec<Vec<f64>> = (0..n).into_par_iter().map(row).collect();

    #[cfg(not(feature = "parallel"))]
    let rows: Vec<Vec<f64>> = (0..n).map(row).collect();

    Array2::from_shape_fn((n, d), |(i, j)| rows[i][j])
}

/// Scale each row to unit L2 norm; zero rows stay zero.
pub(crate) fn normalize_rows(x: &mut Array2<f64>) {
    for mut row in x.rows_mut() {
        let norm = row.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            row.mapv_inplace(|v| v / norm);
        }
    }
}

pub(crate) fn to_rows(x: &Array2<f64>) -> Vec<Vec<f32>> {
    x.rows()
        .into_iter()
        .map(|row| row.iter().map(|&v| v as f32).collect())
        .collect()
}

/// True when the vectors carry no information to cluster on: a non-finite
/// entry, or every row equal to the first (within `1e-9`).
pub fn is_degenerate(rows: &[Vec<f32>]) -> bool {
    let Some(first) = rows.first() else {
        return true;
    };
    if rows.iter().flatten().any(|v| !v.is_finite()) {
        return true;
    }
    rows.iter()
        .all(|row| row.iter().zip(first).all(|(a, b)| (a - b).abs() <= 1e-9))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::tests::two_triangles;
    use ndarray::array;

    #[test]
    fn test_propagate_sums_neighbors() {
        let graph = two_triangles();
        let x = Array2::from_shape_fn((6, 1), |(i, _)| i as f64);
        let y = propagate(&graph, &x, |_, _, w| w);
        // C (2) neighbors A (0), B (1), D (3)
        assert_eq!(y[[2, 0]], 4.0);
        // A (0) neighbors B (1), C (2)
        assert_eq!(y[[0, 0]], 3.0);
    }

    #[test]
    fn test_normalize_rows_keeps_zero_rows() {
        let mut x = array![[3.0, 4.0], [0.0, 0.0]];
        normalize_rows(&mut x);
        assert_eq!(x, array![[0.6, 0.8], [0.0, 0.0]]);
    }

    #[test]
    fn test_degenerate_detection() {
        assert!(is_degenerate(&[vec![1.0, 0.0], vec![1.0, 0.0]]));
        assert!(is_degenerate(&[vec![f32::NAN], vec![1.0]]));
        assert!(is_degenerate(&[]));
        assert!(!is_degenerate(&[vec![1.0, 0.0], vec![0.0, 1.0]]));
    }
}
