//! Co-association voting.
//!
//! Candidates are fused by treating "how many candidates put i and j
//! together" as an edge weight and running modularity optimization on that
//! vote graph. Pairs no candidate co-assigns get no edge, so the vote graph
//! is as sparse as the candidate communities are small.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use super::{CandidatePartition, Partition};
use crate::community::{CommunityDetection, Leiden};
use crate::error::{Error, Result};
use crate::graph::CollabGraph;

/// Co-association edges `(i, j, votes)` with `i < j`, sorted by pair.
pub fn co_association(candidates: &[CandidatePartition]) -> Vec<(usize, usize, f64)> {
    let mut votes: HashMap<(usize, usize), usize> = HashMap::new();
    for candidate in candidates {
        for members in candidate.partition.members() {
            for (a, &i) in members.iter().enumerate() {
                for &j in &members[a + 1..] {
                    *votes.entry((i, j)).or_insert(0) += 1;
                }
            }
        }
    }
    let mut edges: Vec<(usize, usize, f64)> = votes
        .into_iter()
        .map(|((i, j), count)| (i, j, count as f64))
        .collect();
    edges.sort_unstable_by_key(|&(i, j, _)| (i, j));
    edges
}

/// Per-node agreement of `candidates` with `fused`.
///
/// Each candidate community maps to the fused community it overlaps most
/// (smallest id on ties). A candidate votes for node i when i's candidate
/// community maps to i's fused community; agreement is the vote share.
pub fn agreement(fused: &Partition, candidates: &[CandidatePartition]) -> Vec<f64> {
    let n = fused.len();
    if candidates.is_empty() {
        return vec![0.0; n];
    }
    let mut votes = vec![0usize; n];
    for candidate in candidates {
        let p = &candidate.partition;
        let mut overlap: BTreeMap<(usize, usize), usize> = BTreeMap::new();
        for i in 0..n {
            *overlap
                .entry((p.community_of(i), fused.community_of(i)))
                .or_insert(0) += 1;
        }
        // (count, fused id) per candidate community
        let mut target = vec![(0usize, usize::MAX); p.n_communities()];
        for (&(c, f), &count) in &overlap {
            if count > target[c].0 {
                target[c] = (count, f);
            }
        }
        for (i, vote) in votes.iter_mut().enumerate() {
            if target[p.community_of(i)].1 == fused.community_of(i) {
                *vote += 1;
            }
        }
    }
    let total = candidates.len() as f64;
    votes.iter().map(|&v| v as f64 / total).collect()
}

/// Fuse candidates into one partition plus per-node agreement.
///
/// A lone candidate is returned unchanged with agreement 1.0 everywhere.
pub fn fuse(
    graph: &CollabGraph,
    candidates: &[CandidatePartition],
    detector: &Leiden,
) -> Result<(Partition, Vec<f64>)> {
    let n = graph.node_count();
    if let Some(bad) = candidates.iter().find(|c| c.partition.len() != n) {
        return Err(Error::DimensionMismatch {
            expected: n,
            found: bad.partition.len(),
        });
    }
    match candidates {
        [] => Err(Error::NoCandidatePartition {
            attempted: 0,
            failures: Vec::new(),
        }),
        [only] => Ok((only.partition.clone(), vec![1.0; n])),
        _ => {
            let edges = co_association(candidates);
            let vote_graph = CollabGraph::from_parts(graph.developers().cloned().collect(), &edges)?;
            let fused = Partition::new(&detector.detect(&vote_graph)?);
            let agreement = agreement(&fused, candidates);
            debug!(
                candidates = candidates.len(),
                vote_edges = edges.len(),
                communities = fused.n_communities(),
                "fused candidates"
            );
            Ok((fused, agreement))
        }
    }
}
