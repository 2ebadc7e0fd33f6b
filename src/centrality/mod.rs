//! Node ranking by combined centrality.
//!
//! Three views of "importance" in a collaboration graph:
//!
//! | Measure | Captures | Cost |
//! |---------|----------|------|
//! | Degree | how much a developer collaborates | O(E) |
//! | PageRank | collaborating with well-connected developers | O(E × iter) |
//! | Betweenness | brokering between otherwise separate groups | O(V·E), sampled above a threshold |
//!
//! Each raw score vector is min-max normalized to [0, 1] and the composite
//! rank is their weighted sum:
//!
//! ```text
//! composite_i = w_deg × deg'_i + w_pr × pr'_i + w_btw × btw'_i
//! ```
//!
//! The weights are configuration, not constants: the right mix depends on
//! whether hubs or brokers matter more for the downstream analysis.
//! Ordering ties are broken by developer id.

mod betweenness;
mod pagerank;

pub use betweenness::{Betweenness, BetweennessScores};
pub use pagerank::{PageRank, PageRankScores};

use std::cmp::Ordering;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::AnalysisConfig;
use crate::error::{Stage, Warning};
use crate::graph::CollabGraph;

/// A developer annotated with raw and composite centrality scores.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedNode {
    /// Node index in the ranked graph.
    pub index: usize,
    /// Developer id.
    pub id: String,
    /// Weighted degree divided by the maximum weighted degree.
    pub degree: f64,
    /// PageRank score (sums to 1 over the graph).
    pub pagerank: f64,
    /// Normalized betweenness.
    pub betweenness: f64,
    /// Weighted sum of the min-max normalized scores.
    pub composite: f64,
}

/// Ranking output: one [`RankedNode`] per node, in node-index order.
#[derive(Debug, Clone, Default)]
pub struct Ranking {
    /// Ranked nodes by node index.
    pub nodes: Vec<RankedNode>,
    /// Recoverable conditions (e.g. PageRank non-convergence).
    pub warnings: Vec<Warning>,
}

impl Ranking {
    /// Number of ranked nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether nothing was ranked.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node indices ordered by composite score (descending), ties by id.
    pub fn ordered(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.nodes.len()).collect();
        order.sort_by(|&a, &b| rank_order(&self.nodes[a], &self.nodes[b]));
        order
    }

    /// Composite score by node index.
    pub fn composite_scores(&self) -> Vec<f64> {
        self.nodes.iter().map(|n| n.composite).collect()
    }
}

/// Descending composite, then ascending id.
pub(crate) fn rank_order(a: &RankedNode, b: &RankedNode) -> Ordering {
    b.composite
        .total_cmp(&a.composite)
        .then_with(|| a.id.cmp(&b.id))
}

/// Computes degree, PageRank, and betweenness and fuses them.
#[derive(Debug, Clone)]
pub struct CentralityRanker {
    weights: [f64; 3],
    pagerank: PageRank,
    betweenness: Betweenness,
}

impl CentralityRanker {
    /// Ranker from configuration.
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            weights: config.centrality_weights,
            pagerank: PageRank::new()
                .with_damping(config.pagerank_damping)
                .with_tolerance(config.pagerank_tolerance)
                .with_max_iter(config.pagerank_max_iterations),
            betweenness: Betweenness::new()
                .with_sampling_fraction(config.betweenness_sampling_fraction)
                .with_sampling_threshold(config.betweenness_sampling_threshold)
                .with_weighted(config.betweenness_weighted)
                .with_seed(config.random_seed),
        }
    }

    /// Set (degree, pagerank, betweenness) weights.
    pub fn with_weights(mut self, weights: [f64; 3]) -> Self {
        self.weights = weights;
        self
    }

    /// Rank every node of `graph`.
    pub fn rank(&self, graph: &CollabGraph) -> Ranking {
        let n = graph.node_count();
        if n == 0 {
            return Ranking::default();
        }

        #[cfg(feature = "parallel")]
        let (pr, btw) = rayon::join(
            || self.pagerank.compute(graph),
            || self.betweenness.compute(graph),
        );

        #[cfg(not(feature = "parallel"))]
        let (pr, btw) = (self.pagerank.compute(graph), self.betweenness.compute(graph));

        let mut warnings = Vec::new();
        if let Some(err) = pr.convergence_error() {
            warn!(%err, "pagerank fell back to last iterate");
            warnings.push(Warning::new(Stage::Centrality, err));
        }

        let degrees = degree_centrality(graph);
        let [w_deg, w_pr, w_btw] = self.weights;
        let (deg_n, pr_n, btw_n) = (
            min_max(&degrees),
            min_max(&pr.scores),
            min_max(&btw.scores),
        );

        let nodes: Vec<RankedNode> = (0..n)
            .map(|i| RankedNode {
                index: i,
                id: graph.id(i).to_string(),
                degree: degrees[i],
                pagerank: pr.scores[i],
                betweenness: btw.scores[i],
                composite: w_deg * deg_n[i] + w_pr * pr_n[i] + w_btw * btw_n[i],
            })
            .collect();

        info!(
            nodes = n,
            pagerank_iterations = pr.iterations,
            betweenness_sources = btw.sources,
            betweenness_sampled = btw.sampled,
            "ranked nodes"
        );
        Ranking { nodes, warnings }
    }
}

/// Weighted degree over the maximum weighted degree; zeros without edges.
pub fn degree_centrality(graph: &CollabGraph) -> Vec<f64> {
    let degrees = graph.weighted_degrees();
    let max = degrees.iter().copied().fold(0.0_f64, f64::max);
    if max == 0.0 {
        return vec![0.0; degrees.len()];
    }
    degrees.iter().map(|d| d / max).collect()
}

/// Min-max normalize to [0, 1]; a constant vector maps to zeros.
pub fn min_max(values: &[f64]) -> Vec<f64> {
    let (lo, hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let span = hi - lo;
    if !(span > 0.0) {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| (v - lo) / span).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::tests::two_triangles;

    #[test]
    fn test_min_max() {
        assert_eq!(min_max(&[2.0, 4.0, 3.0]), vec![0.0, 1.0, 0.5]);
        assert_eq!(min_max(&[5.0, 5.0]), vec![0.0, 0.0]);
        assert!(min_max(&[]).is_empty());
    }

    #[test]
    fn test_bridge_nodes_rank_first() {
        let graph = two_triangles();
        let ranking = CentralityRanker::from_config(&AnalysisConfig::default()).rank(&graph);
        assert_eq!(ranking.len(), 6);
        assert!(ranking.warnings.is_empty());

        let ordered: Vec<&str> = ranking.ordered().iter().map(|&i| graph.id(i)).collect();
        let mut top: Vec<&str> = ordered[..2].to_vec();
        top.sort_unstable();
        assert_eq!(top, vec!["C", "D"]);
        let c = &ranking.nodes[graph.index_of("C").unwrap()];
        assert!((c.composite - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_measure_weights() {
        let graph = two_triangles();
        let ranker = CentralityRanker::from_config(&AnalysisConfig::default())
            .with_weights([0.0, 0.0, 1.0]);
        let ranking = ranker.rank(&graph);
        for node in &ranking.nodes {
            let expected = if node.id == "C" || node.id == "D" { 1.0 } else { 0.0 };
            assert!((node.composite - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_nonconvergence_is_reported_not_fatal() {
        let mut config = AnalysisConfig::default();
        config.pagerank_max_iterations = 1;
        config.pagerank_tolerance = 1e-15;
        let ranking = CentralityRanker::from_config(&config).rank(&two_triangles());
        assert_eq!(ranking.len(), 6);
        assert_eq!(ranking.warnings.len(), 1);
        assert_eq!(ranking.warnings[0].stage, Stage::Centrality);
    }
}
