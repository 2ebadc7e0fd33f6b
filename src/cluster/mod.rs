//! Clustering of node embeddings.
//!
//! The spectral and embedding strategies both end the same way: every node
//! is a point in R^d and the partition is a k-means clustering of those
//! points.
//!
//! ## K-means
//!
//! Assign each point to the nearest centroid, then update centroids to the
//! mean of their points. Repeat.
//!
//! **Objective**: Minimize within-cluster sum of squares:
//!
//! ```text
//! J = Σ_k Σ_{x ∈ C_k} ||x - μ_k||²
//! ```
//!
//! Lloyd's algorithm only finds a local minimum, so several seeded
//! k-means++ restarts are run and the lowest J wins.
//!
//! ## Usage
//!
//! ```rust
//! use guild::cluster::{Clustering, Kmeans};
//!
//! let data = vec![
//!     vec![0.0, 0.0],
//!     vec![0.1, 0.1],
//!     vec![10.0, 10.0],
//!     vec![10.1, 10.1],
//! ];
//!
//! let labels = Kmeans::new(2).fit_predict(&data).unwrap();
//! assert_eq!(labels[0], labels[1]);  // First two together
//! assert_ne!(labels[0], labels[2]);  // Separate from last two
//! ```

mod kmeans;
mod traits;

pub use kmeans::{Kmeans, KmeansFit};
pub use traits::Clustering;
