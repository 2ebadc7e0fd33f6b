//! Modularity-based partitioning of collaboration graphs.
//!
//! [`modularity`] scores a labeling with the weighted Newman-Girvan Q;
//! [`modularity_with_resolution`] adds the γ multiplier on the null model.
//! The ensemble reports plain Q and uses γ only while optimizing.
//!
//! [`Leiden`] optimizes Q from singletons: local moving (strict gain, ties to
//! the smaller community id), a split of communities that are not internally
//! connected, then aggregation until nothing moves. [`LocalRefiner`] runs the
//! local-moving pass alone, seeded with an existing partition, to tidy
//! candidates from the spectral and embedding strategies.
//!
//! Labels are dense and ordered by first appearance ([`canonicalize`]).
//!
//! ```rust
//! use guild::community::{modularity, CommunityDetection, Leiden};
//! use guild::graph::{CollabGraph, Developer};
//!
//! let devs = vec![Developer::new("a"), Developer::new("b"), Developer::new("c")];
//! let graph = CollabGraph::from_parts(devs, &[(0, 1, 1.0), (1, 2, 1.0)]).unwrap();
//!
//! let communities = Leiden::new().detect(&graph).unwrap();
//! assert_eq!(communities.len(), 3);
//! assert!(modularity(&graph, &communities) >= 0.0);
//! ```
//!
//! Traag, Waltman, van Eck (2019), "From Louvain to Leiden: guaranteeing
//! well-connected communities."

mod leiden;
mod modularity;
mod refine;
mod traits;

pub use leiden::Leiden;
pub use modularity::{modularity, modularity_with_resolution};
pub use refine::{LocalRefiner, Refinement};
pub use traits::CommunityDetection;

/// Relabel communities `0..k` in order of first appearance.
///
/// Two labelings describing the same partition canonicalize identically.
pub fn canonicalize(labels: &[usize]) -> Vec<usize> {
    let mut mapping = std::collections::HashMap::new();
    labels
        .iter()
        .map(|&c| {
            let next = mapping.len();
            *mapping.entry(c).or_insert(next)
        })
        .collect()
}
