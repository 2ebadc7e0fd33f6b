//! PageRank over the weighted, undirected collaboration graph.
//!
//! Power iteration with transition probability `w_ij / k_i`:
//!
//! ```text
//! PR(v) = (1-d)/n + d × Σ_u PR(u) × w_uv / k_u + d × dangling / n
//! ```
//!
//! Isolated developers (k_u = 0) are dangling: their mass is spread
//! uniformly. Scores are renormalized to sum to 1 after the last iteration.
//! Hitting the iteration cap is not fatal: the last iterate is returned and
//! the caller reports a [`Error::Convergence`] warning.

use tracing::debug;

use crate::error::Error;
use crate::graph::CollabGraph;

/// PageRank parameters.
#[derive(Debug, Clone)]
pub struct PageRank {
    damping: f64,
    tolerance: f64,
    max_iter: usize,
}

/// PageRank output.
#[derive(Debug, Clone)]
pub struct PageRankScores {
    /// Score per node index; sums to 1.
    pub scores: Vec<f64>,
    /// Iterations performed.
    pub iterations: usize,
    /// L1 change of the last iteration.
    pub residual: f64,
    /// Whether `residual < tolerance` was reached.
    pub converged: bool,
}

impl PageRankScores {
    /// The convergence warning to report, if any.
    pub fn convergence_error(&self) -> Option<Error> {
        (!self.converged).then(|| Error::Convergence {
            stage: "pagerank",
            iterations: self.iterations,
            residual: self.residual,
        })
    }
}

impl PageRank {
    /// PageRank with damping 0.85, tolerance 1e-6, 100 iterations.
    pub fn new() -> Self {
        Self {
            damping: 0.85,
            tolerance: 1e-6,
            max_iter: 100,
        }
    }

    /// Set damping factor.
    pub fn with_damping(mut self, damping: f64) -> Self {
        self.damping = damping;
        self
    }

    /// Set L1 convergence tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set iteration cap.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Run power iteration.
    pub fn compute(&self, graph: &CollabGraph) -> PageRankScores {
        let n = graph.node_count();
        if n == 0 {
            return PageRankScores {
                scores: Vec::new(),
                iterations: 0,
                residual: 0.0,
                converged: true,
            };
        }

        let d = self.damping;
        let n_f = n as f64;
        let degrees = graph.weighted_degrees();
        let mut scores = vec![1.0 / n_f; n];
        let mut next = vec![0.0; n];
        let mut residual = f64::INFINITY;
        let mut iterations = 0;

        while iterations < self.max_iter {
            iterations += 1;

            let dangling: f64 = (0..n).filter(|&i| degrees[i] == 0.0).map(|i| scores[i]).sum();
            let base = (1.0 - d) / n_f + d * dangling / n_f;
            next.iter_mut().for_each(|s| *s = base);

            for i in 0..n {
                if degrees[i] == 0.0 {
                    continue;
                }
                let share = d * scores[i] / degrees[i];
                for &(j, w) in graph.neighbors(i) {
                    next[j] += share * w;
                }
            }

            residual = scores.iter().zip(&next).map(|(a, b)| (a - b).abs()).sum();
            std::mem::swap(&mut scores, &mut next);

            if residual < self.tolerance {
                break;
            }
        }

        let total: f64 = scores.iter().sum();
        if total > 0.0 {
            scores.iter_mut().for_each(|s| *s /= total);
        }

        let converged = residual < self.tolerance;
        debug!(iterations, residual, converged, "pagerank finished");
        PageRankScores {
            scores,
            iterations,
            residual,
            converged,
        }
    }
}

impl Default for PageRank {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::tests::two_triangles;
    use crate::graph::{CollabGraph, Developer};
    use proptest::prelude::*;

    #[test]
    fn test_pagerank_sums_to_one() {
        let result = PageRank::new().compute(&two_triangles());
        let total: f64 = result.scores.iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert!(result.converged);
        assert!(result.convergence_error().is_none());
    }

    #[test]
    fn test_bridge_nodes_rank_highest() {
        let graph = two_triangles();
        let scores = PageRank::new().compute(&graph).scores;
        let c = graph.index_of("C").unwrap();
        let a = graph.index_of("A").unwrap();
        assert!(scores[c] > scores[a]);
        // symmetric structure gives symmetric scores
        let d = graph.index_of("D").unwrap();
        assert!((scores[c] - scores[d]).abs() < 1e-9);
    }

    #[test]
    fn test_iteration_cap_returns_last_iterate() {
        let result = PageRank::new()
            .with_max_iter(1)
            .with_tolerance(1e-15)
            .compute(&two_triangles());
        assert!(!result.converged);
        assert_eq!(result.iterations, 1);
        assert!(matches!(
            result.convergence_error(),
            Some(Error::Convergence { stage: "pagerank", iterations: 1, .. })
        ));
        let total: f64 = result.scores.iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_isolated_nodes_get_teleport_mass() {
        let devs = vec![Developer::new("a"), Developer::new("b"), Developer::new("c")];
        let graph = CollabGraph::from_parts(devs, &[(0, 1, 1.0)]).unwrap();
        let scores = PageRank::new().compute(&graph).scores;
        assert!(scores[2] > 0.0);
        assert!(scores[0] > scores[2]);
    }

    proptest! {
        #[test]
        fn pagerank_is_a_distribution(
            edges in proptest::collection::vec((0usize..15, 0usize..15, 1u8..5), 0..60),
            damping in 0.5f64..0.95,
        ) {
            let devs = (0..15).map(|i| Developer::new(format!("d{i:02}"))).collect();
            let edges: Vec<(usize, usize, f64)> = edges
                .into_iter()
                .filter(|(i, j, _)| i != j)
                .map(|(i, j, w)| (i, j, w as f64))
                .collect();
            let graph = CollabGraph::from_parts(devs, &edges).unwrap();
            let scores = PageRank::new().with_damping(damping).compute(&graph).scores;
            let total: f64 = scores.iter().sum();
            prop_assert!((total - 1.0).abs() < 1e-6);
            prop_assert!(scores.iter().all(|&s| s > 0.0));
        }
    }
}
