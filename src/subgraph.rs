//! Top-K subgraph extraction.
//!
//! Keeps the K best-ranked developers and every edge between them. Edges
//! with an endpoint outside the top K are dropped, never rerouted, so the
//! reduced graph's weights are a subset of the full graph's.

use tracing::{info, warn};

use crate::centrality::{RankedNode, Ranking};
use crate::error::{Error, Result, Stage, Warning};
use crate::graph::CollabGraph;

/// The reduced graph plus rankings re-indexed to it.
#[derive(Debug, Clone)]
pub struct Subgraph {
    /// Induced subgraph on the top-K developers.
    pub graph: CollabGraph,
    /// Ranked nodes by subgraph node index.
    pub ranked: Vec<RankedNode>,
    /// K clamping, if it happened.
    pub warnings: Vec<Warning>,
}

/// Selects the top-K ranked nodes and induces their subgraph.
#[derive(Debug, Clone)]
pub struct SubgraphExtractor {
    top_k: usize,
}

impl SubgraphExtractor {
    /// Extractor for the given K.
    pub fn new(top_k: usize) -> Self {
        Self { top_k }
    }

    /// Extract the top-K subgraph of `graph` using `ranking`.
    ///
    /// If the graph has fewer than K nodes, K is clamped and an
    /// [`Error::InsufficientNodes`] warning is attached.
    pub fn extract(&self, graph: &CollabGraph, ranking: &Ranking) -> Result<Subgraph> {
        let n = graph.node_count();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        if ranking.len() != n {
            return Err(Error::DimensionMismatch {
                expected: n,
                found: ranking.len(),
            });
        }
        if self.top_k == 0 {
            return Err(Error::InvalidParameter {
                name: "top_k",
                message: "must be at least 1".into(),
            });
        }

        let mut warnings = Vec::new();
        let k = if self.top_k > n {
            let err = Error::InsufficientNodes {
                requested: self.top_k,
                available: n,
            };
            warn!(%err, "clamping subgraph size");
            warnings.push(Warning::new(Stage::Extraction, err));
            n
        } else {
            self.top_k
        };

        let keep: Vec<usize> = ranking.ordered().into_iter().take(k).collect();
        let sub = graph.induced(&keep)?;

        let ranked: Vec<RankedNode> = (0..sub.node_count())
            .map(|i| {
                let original = graph.index_of(sub.id(i)).ok_or(Error::EmptyInput)?;
                let mut node = ranking.nodes[original].clone();
                node.index = i;
                Ok(node)
            })
            .collect::<Result<_>>()?;

        info!(
            requested = self.top_k,
            nodes = sub.node_count(),
            edges = sub.edge_count(),
            dropped_edges = graph.edge_count() - sub.edge_count(),
            "extracted top-k subgraph"
        );
        Ok(Subgraph {
            graph: sub,
            ranked,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::centrality::RankedNode;
    use crate::graph::tests::two_triangles;
    use crate::graph::Developer;
    use proptest::prelude::*;

    fn ranking_with(graph: &CollabGraph, composite: &[f64]) -> Ranking {
        Ranking {
            nodes: (0..graph.node_count())
                .map(|i| RankedNode {
                    index: i,
                    id: graph.id(i).to_string(),
                    degree: 0.0,
                    pagerank: 0.0,
                    betweenness: 0.0,
                    composite: composite[i],
                })
                .collect(),
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_top_three_keeps_only_internal_edges() -> Result<()> {
        let graph = two_triangles();
        // A, B, C have the three highest composite scores.
        let ranking = ranking_with(&graph, &[0.9, 0.8, 0.7, 0.3, 0.2, 0.1]);
        let sub = SubgraphExtractor::new(3).extract(&graph, &ranking)?;

        let ids: Vec<&str> = sub.graph.developers().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B", "C"]);
        assert_eq!(sub.graph.edge_count(), 3);
        assert!(sub.warnings.is_empty());
        assert_eq!(sub.ranked[2].id, "C");
        assert_eq!(sub.ranked[2].index, 2);
        Ok(())
    }

    #[test]
    fn test_ties_break_by_id() -> Result<()> {
        let graph = two_triangles();
        let ranking = ranking_with(&graph, &[0.5; 6]);
        let sub = SubgraphExtractor::new(2).extract(&graph, &ranking)?;
        let ids: Vec<&str> = sub.graph.developers().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B"]);
        Ok(())
    }

    #[test]
    fn test_k_larger_than_graph_is_clamped() -> Result<()> {
        let graph = two_triangles();
        let ranking = ranking_with(&graph, &[0.0; 6]);
        let sub = SubgraphExtractor::new(10).extract(&graph, &ranking)?;
        assert_eq!(sub.graph.node_count(), 6);
        assert_eq!(sub.graph.edge_count(), 7);
        assert_eq!(
            sub.warnings[0].error,
            Error::InsufficientNodes { requested: 10, available: 6 }
        );
        Ok(())
    }

    #[test]
    fn test_mismatched_ranking_fails() {
        let graph = two_triangles();
        let ranking = Ranking::default();
        assert!(SubgraphExtractor::new(3).extract(&graph, &ranking).is_err());
    }

    proptest! {
        #[test]
        fn extracted_subgraph_is_bounded_and_closed(
            edges in proptest::collection::vec((0usize..20, 0usize..20), 0..80),
            scores in proptest::collection::vec(0.0f64..1.0, 20),
            k in 1usize..25,
        ) {
            let devs = (0..20).map(|i| Developer::new(format!("d{i:02}"))).collect();
            let edges: Vec<(usize, usize, f64)> =
                edges.into_iter().filter(|(i, j)| i != j).map(|(i, j)| (i, j, 1.0)).collect();
            let graph = CollabGraph::from_parts(devs, &edges).unwrap();
            let ranking = ranking_with(&graph, &scores);
            let sub = SubgraphExtractor::new(k).extract(&graph, &ranking).unwrap();

            prop_assert!(sub.graph.node_count() <= k);
            for (i, j, w) in sub.graph.edges() {
                let (a, b) = (
                    graph.index_of(sub.graph.id(i)).unwrap(),
                    graph.index_of(sub.graph.id(j)).unwrap(),
                );
                prop_assert_eq!(graph.weight(a, b), Some(w));
            }
            // every full-graph edge among kept nodes survives
            let kept: usize = graph
                .edges()
                .filter(|&(i, j, _)| {
                    sub.graph.index_of(graph.id(i)).is_some() && sub.graph.index_of(graph.id(j)).is_some()
                })
                .count();
            prop_assert_eq!(kept, sub.graph.edge_count());
        }
    }
}
