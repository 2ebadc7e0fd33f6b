//! Partition statistics and agreement between partitions.
//!
//! # Metrics Overview
//!
//! | Metric | Range | Best | Measures |
//! |--------|-------|------|----------|
//! | modularity | [-1/2, 1] | high | density inside communities vs. chance |
//! | intra edge fraction | [0, 1] | high | edges that stay inside a community |
//! | composite η² | [0, 1] | - | how much of the centrality spread is explained by community |
//! | [`nmi`] | [0, 1] | 1 | agreement of two partitions, normalized |
//! | [`ari`] | [-1, 1] | 1 | agreement of two partitions, chance-corrected |
//!
//! NMI and ARI are used here to compare the ensemble's candidates with each
//! other: low values mean the strategies disagree and the fused partition
//! should be read with the per-node agreement in hand.
//!
//! # Example
//!
//! ```rust
//! use guild::metrics::{nmi, ari};
//!
//! let pred = [0, 0, 1, 1, 2, 2];
//! let truth = [0, 0, 0, 1, 1, 1];
//!
//! let nmi_score = nmi(&pred, &truth);
//! let ari_score = ari(&pred, &truth);
//! assert!(nmi_score < 1.0 && ari_score < 1.0);
//! ```
//!
//! # References
//!
//! - Hubert & Arabie (1985). "Comparing partitions" (ARI)
//! - Strehl & Ghosh (2002). "Cluster ensembles" (NMI)

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::info;

use crate::centrality::{rank_order, RankedNode};
use crate::config::StrategyKind;
use crate::ensemble::EnsembleResult;
use crate::error::{Error, Result};
use crate::graph::CollabGraph;

/// Normalized Mutual Information between two clusterings.
///
/// ```text
/// NMI(U, V) = 2 * I(U; V) / (H(U) + H(V))
/// ```
///
/// Returns 1.0 when both clusterings are constant, 0.0 on length mismatch.
///
/// ```rust
/// use guild::metrics::nmi;
///
/// // Perfect clustering
/// assert!((nmi(&[0, 0, 1, 1], &[0, 0, 1, 1]) - 1.0).abs() < 0.01);
///
/// // Random clustering has low NMI
/// assert!(nmi(&[0, 1, 0, 1], &[0, 0, 1, 1]) < 0.5);
/// ```
pub fn nmi(pred: &[usize], truth: &[usize]) -> f64 {
    if pred.len() != truth.len() || pred.is_empty() {
        return 0.0;
    }

    let joint = build_contingency_table(pred, truth);
    let n_f = pred.len() as f64;
    let p_pred = marginal(pred);
    let p_truth = marginal(truth);

    let entropy = |counts: &BTreeMap<usize, usize>| -> f64 {
        counts
            .values()
            .map(|&c| {
                let p = c as f64 / n_f;
                -p * p.ln()
            })
            .sum()
    };
    let h_pred = entropy(&p_pred);
    let h_truth = entropy(&p_truth);

    let mut mi = 0.0;
    for (&(p, t), &count) in &joint {
        let p_joint = count as f64 / n_f;
        let p_p = p_pred.get(&p).copied().unwrap_or(0) as f64 / n_f;
        let p_t = p_truth.get(&t).copied().unwrap_or(0) as f64 / n_f;
        if p_p > 0.0 && p_t > 0.0 {
            mi += p_joint * (p_joint / (p_p * p_t)).ln();
        }
    }

    let denom = h_pred + h_truth;
    if denom > 0.0 {
        2.0 * mi / denom
    } else {
        1.0 // Both are constant
    }
}

/// Adjusted Rand Index between two clusterings.
///
/// 0 = chance-level agreement, 1 = identical partitions. Returns 0.0 on
/// length mismatch.
///
/// ```rust
/// use guild::metrics::ari;
///
/// assert!((ari(&[0, 0, 1, 1], &[1, 1, 0, 0]) - 1.0).abs() < 0.01);
/// ```
pub fn ari(pred: &[usize], truth: &[usize]) -> f64 {
    if pred.len() != truth.len() || pred.is_empty() {
        return 0.0;
    }

    let joint = build_contingency_table(pred, truth);

    // Sum of C(n_ij, 2), C(a_i, 2), C(b_j, 2)
    let sum_comb_ij: f64 = joint.values().map(|&c| comb2(c) as f64).sum();
    let sum_comb_a: f64 = marginal(pred).values().map(|&a| comb2(a) as f64).sum();
    let sum_comb_b: f64 = marginal(truth).values().map(|&b| comb2(b) as f64).sum();

    let comb_n = comb2(pred.len()) as f64;
    if comb_n == 0.0 {
        return 1.0;
    }

    // ARI = (index - expected) / (max - expected)
    let expected = sum_comb_a * sum_comb_b / comb_n;
    let max_index = (sum_comb_a + sum_comb_b) / 2.0;

    let denom = max_index - expected;
    if denom.abs() < 1e-10 {
        return 1.0; // Perfect agreement when both clusterings are identical
    }

    (sum_comb_ij - expected) / denom
}

fn build_contingency_table(pred: &[usize], truth: &[usize]) -> BTreeMap<(usize, usize), usize> {
    let mut table = BTreeMap::new();
    for (&p, &t) in pred.iter().zip(truth.iter()) {
        *table.entry((p, t)).or_insert(0) += 1;
    }
    table
}

fn marginal(labels: &[usize]) -> BTreeMap<usize, usize> {
    let mut counts = BTreeMap::new();
    for &l in labels {
        *counts.entry(l).or_insert(0) += 1;
    }
    counts
}

fn comb2(n: usize) -> usize {
    if n < 2 {
        0
    } else {
        n * (n - 1) / 2
    }
}

/// Correlation ratio η² of `values` grouped by `labels`:
/// between-group variance over total variance. 0 when `values` is constant.
pub fn eta_squared(values: &[f64], labels: &[usize]) -> f64 {
    if values.len() != labels.len() || values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let total: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    if total <= 0.0 {
        return 0.0;
    }

    let mut groups: BTreeMap<usize, (f64, usize)> = BTreeMap::new();
    for (&v, &l) in values.iter().zip(labels) {
        let g = groups.entry(l).or_insert((0.0, 0));
        g.0 += v;
        g.1 += 1;
    }
    let between: f64 = groups
        .values()
        .map(|&(sum, count)| {
            let group_mean = sum / count as f64;
            count as f64 * (group_mean - mean).powi(2)
        })
        .sum();
    (between / total).clamp(0.0, 1.0)
}

/// Statistics for one community.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommunitySummary {
    /// Community id.
    pub id: usize,
    /// Member count.
    pub size: usize,
    /// Edges with both endpoints inside.
    pub internal_edges: usize,
    /// Weight of edges with exactly one endpoint inside.
    pub boundary_weight: f64,
    /// Mean composite centrality of members.
    pub mean_composite: f64,
    /// Mean per-node agreement of members.
    pub mean_agreement: f64,
    /// Highest-ranked member.
    pub hub: String,
}

/// NMI / ARI between two voted candidates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateComparison {
    /// First strategy.
    pub left: StrategyKind,
    /// Second strategy.
    pub right: StrategyKind,
    /// Normalized mutual information.
    pub nmi: f64,
    /// Adjusted Rand index.
    pub ari: f64,
}

/// Partition-level report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSummary {
    /// Nodes in the reduced graph.
    pub nodes: usize,
    /// Edges in the reduced graph.
    pub edges: usize,
    /// Number of communities.
    pub communities: usize,
    /// Modularity of the fused partition.
    pub modularity: f64,
    /// Fraction of edges inside a community (0 without edges).
    pub intra_edge_fraction: f64,
    /// Fraction of edges across communities (0 without edges).
    pub inter_edge_fraction: f64,
    /// Fraction of edge weight inside a community.
    pub weighted_intra_fraction: f64,
    /// Community sizes, largest first.
    pub size_distribution: Vec<usize>,
    /// Mean per-node agreement.
    pub mean_agreement: f64,
    /// η² of composite centrality by community.
    pub composite_eta_squared: f64,
    /// One entry per community, by id.
    pub community_details: Vec<CommunitySummary>,
    /// Pairwise comparison of the voted candidates.
    pub candidate_agreement: Vec<CandidateComparison>,
}

/// Aggregates a fused partition into a [`MetricsSummary`].
#[derive(Debug, Clone, Default)]
pub struct MetricsReporter;

impl MetricsReporter {
    /// Reporter.
    pub fn new() -> Self {
        Self
    }

    /// Summarize `result` over the reduced `graph` whose ranked nodes are
    /// `ranked` (by node index).
    pub fn report(
        &self,
        graph: &CollabGraph,
        ranked: &[RankedNode],
        result: &EnsembleResult,
    ) -> Result<MetricsSummary> {
        let n = graph.node_count();
        for found in [ranked.len(), result.partition.len(), result.agreement.len()] {
            if found != n {
                return Err(Error::DimensionMismatch { expected: n, found });
            }
        }
        let labels = result.partition.labels();
        let k = result.partition.n_communities();

        let mut internal_edges = vec![0usize; k];
        let mut boundary_weight = vec![0.0; k];
        let (mut intra, mut intra_weight) = (0usize, 0.0);
        for (i, j, w) in graph.edges() {
            let (ci, cj) = (labels[i], labels[j]);
            if ci == cj {
                internal_edges[ci] += 1;
                intra += 1;
                intra_weight += w;
            } else {
                boundary_weight[ci] += w;
                boundary_weight[cj] += w;
            }
        }
        let edges = graph.edge_count();
        let fraction = |part: f64, whole: f64| if whole > 0.0 { part / whole } else { 0.0 };

        let community_details: Vec<CommunitySummary> = result
            .partition
            .members()
            .into_iter()
            .enumerate()
            .map(|(id, members)| {
                let size = members.len();
                let mean = |f: &dyn Fn(usize) -> f64| members.iter().map(|&i| f(i)).sum::<f64>() / size as f64;
                let hub = members
                    .iter()
                    .map(|&i| &ranked[i])
                    .min_by(|a, b| rank_order(a, b))
                    .map(|node| node.id.clone())
                    .unwrap_or_default();
                CommunitySummary {
                    id,
                    size,
                    internal_edges: internal_edges[id],
                    boundary_weight: boundary_weight[id],
                    mean_composite: mean(&|i| ranked[i].composite),
                    mean_agreement: mean(&|i| result.agreement[i]),
                    hub,
                }
            })
            .collect();

        let mut size_distribution = result.partition.sizes();
        size_distribution.sort_unstable_by(|a, b| b.cmp(a));

        let composite: Vec<f64> = ranked.iter().map(|r| r.composite).collect();
        let candidate_agreement = compare_candidates(result);

        let summary = MetricsSummary {
            nodes: n,
            edges,
            communities: k,
            modularity: result.modularity,
            intra_edge_fraction: fraction(intra as f64, edges as f64),
            inter_edge_fraction: fraction((edges - intra) as f64, edges as f64),
            weighted_intra_fraction: fraction(intra_weight, graph.total_weight()),
            size_distribution,
            mean_agreement: result.stability(),
            composite_eta_squared: eta_squared(&composite, labels),
            community_details,
            candidate_agreement,
        };
        info!(
            communities = summary.communities,
            modularity = summary.modularity,
            intra_edge_fraction = summary.intra_edge_fraction,
            "partition metrics"
        );
        Ok(summary)
    }
}

fn compare_candidates(result: &EnsembleResult) -> Vec<CandidateComparison> {
    let candidates = &result.candidates;
    let mut out = Vec::new();
    for (a, left) in candidates.iter().enumerate() {
        for right in &candidates[a + 1..] {
            let (l, r) = (left.partition.labels(), right.partition.labels());
            out.push(CandidateComparison {
                left: left.strategy,
                right: right.strategy,
                nmi: nmi(l, r),
                ari: ari(l, r),
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ensemble::{CandidatePartition, Partition};
    use crate::graph::tests::two_triangles;

    #[test]
    fn test_nmi_perfect() {
        let pred = [0, 0, 1, 1, 2, 2];
        let truth = [0, 0, 1, 1, 2, 2];
        assert!((nmi(&pred, &truth) - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_nmi_permuted() {
        // Same clustering, different labels
        let pred = [1, 1, 0, 0, 2, 2];
        let truth = [0, 0, 1, 1, 2, 2];
        assert!((nmi(&pred, &truth) - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_ari_perfect() {
        let pred = [0, 0, 1, 1];
        let truth = [0, 0, 1, 1];
        assert!((ari(&pred, &truth) - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_ari_disagreement_is_below_one() {
        let pred = [0, 0, 0, 1, 1, 1];
        let truth = [0, 0, 1, 0, 1, 1];
        assert!(ari(&pred, &truth) < 0.5);
        assert_eq!(ari(&pred, &truth[..3]), 0.0);
    }

    #[test]
    fn test_eta_squared() {
        // groups perfectly separate the values
        assert!((eta_squared(&[1.0, 1.0, 0.0, 0.0], &[0, 0, 1, 1]) - 1.0).abs() < 1e-12);
        // group means equal the overall mean
        assert!(eta_squared(&[1.0, 0.0, 1.0, 0.0], &[0, 0, 1, 1]).abs() < 1e-12);
        assert_eq!(eta_squared(&[0.5, 0.5], &[0, 1]), 0.0);
    }

    fn ranked(graph: &CollabGraph, composite: &[f64]) -> Vec<RankedNode> {
        (0..graph.node_count())
            .map(|i| RankedNode {
                index: i,
                id: graph.id(i).to_string(),
                degree: 0.0,
                pagerank: 0.0,
                betweenness: 0.0,
                composite: composite[i],
            })
            .collect()
    }

    fn result(labels: &[usize]) -> EnsembleResult {
        let partition = Partition::new(labels);
        EnsembleResult {
            candidates: vec![
                CandidatePartition {
                    strategy: StrategyKind::Modularity,
                    partition: partition.clone(),
                    modularity: 0.357,
                    refinement_moves: 0,
                },
                CandidatePartition {
                    strategy: StrategyKind::Spectral,
                    partition: Partition::new(&[0, 0, 1, 1, 1, 1]),
                    modularity: 0.1,
                    refinement_moves: 2,
                },
            ],
            agreement: vec![1.0, 1.0, 0.5, 0.5, 1.0, 1.0],
            modularity: 0.357,
            partition,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_report_on_two_triangles() -> Result<()> {
        let graph = two_triangles();
        let ranked = ranked(&graph, &[0.2, 0.2, 1.0, 0.9, 0.1, 0.1]);
        let summary = MetricsReporter::new().report(&graph, &ranked, &result(&[0, 0, 0, 1, 1, 1]))?;

        assert_eq!(summary.communities, 2);
        assert_eq!(summary.size_distribution, vec![3, 3]);
        assert!((summary.intra_edge_fraction - 6.0 / 7.0).abs() < 1e-12);
        assert!((summary.inter_edge_fraction - 1.0 / 7.0).abs() < 1e-12);
        assert!((summary.weighted_intra_fraction - 6.0 / 7.0).abs() < 1e-12);

        let first = &summary.community_details[0];
        assert_eq!(first.hub, "C");
        assert_eq!(first.internal_edges, 3);
        assert_eq!(first.boundary_weight, 1.0);
        assert!((first.mean_agreement - 2.5 / 3.0).abs() < 1e-12);
        assert_eq!(summary.community_details[1].hub, "D");

        assert_eq!(summary.candidate_agreement.len(), 1);
        assert_eq!(summary.candidate_agreement[0].left, StrategyKind::Modularity);
        assert!(summary.candidate_agreement[0].nmi < 1.0);
        Ok(())
    }

    #[test]
    fn test_report_rejects_mismatched_inputs() {
        let graph = two_triangles();
        let ranked = ranked(&graph, &[0.0; 6]);
        let summary = MetricsReporter::new().report(&graph, &ranked[..4], &result(&[0, 0, 0, 1, 1, 1]));
        assert!(matches!(summary, Err(Error::DimensionMismatch { expected: 6, found: 4 })));
    }
}
