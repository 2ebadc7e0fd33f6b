//! K-means clustering.
//!
//! Partitions data into k clusters by minimizing **within-cluster sum of squares**
//! (WCSS).
//!
//! ```text
//! WCSS = Σₖ Σᵢ∈Cₖ ||xᵢ - μₖ||²
//! ```
//!
//! # Lloyd's Algorithm
//!
//! 1. Initialize k centroids via k-means++
//! 2. **Assign**: Each point → nearest centroid (lowest index on ties)
//! 3. **Update**: Each centroid → mean of assigned points
//! 4. Repeat until the centroid shift drops below `tol`
//!
//! ## K-means++ Initialization
//!
//! 1. Choose first centroid uniformly at random
//! 2. Choose next centroid with probability proportional to D(x)²
//!    (squared distance to nearest existing centroid)
//!
//! Every run is seeded. Restart `t` uses `seed + t`, and the run with the
//! lowest WCSS is kept (the first one on ties), so results are reproducible.

use super::traits::Clustering;
use crate::error::{Error, Result};
use ndarray::{Array2, ArrayView1};
use rand::prelude::*;
use tracing::debug;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// K-means clustering algorithm.
#[derive(Debug, Clone)]
pub struct Kmeans {
    /// Number of clusters.
    k: usize,
    /// Maximum iterations.
    max_iter: usize,
    /// Convergence tolerance on squared centroid shift.
    tol: f64,
    /// Base random seed.
    seed: u64,
    /// Independent k-means++ runs.
    restarts: usize,
}

/// Best run of [`Kmeans::fit`].
#[derive(Debug, Clone)]
pub struct KmeansFit {
    /// Cluster per point.
    pub labels: Vec<usize>,
    /// Final centroids, `k × d`.
    pub centroids: Array2<f32>,
    /// Within-cluster sum of squares.
    pub inertia: f64,
}

impl Kmeans {
    /// Create a new K-means clusterer (seed 42, one run).
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iter: 100,
            tol: 1e-4,
            seed: 42,
            restarts: 1,
        }
    }

    /// Set maximum iterations.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set convergence tolerance.
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the number of seeded restarts (at least one run is made).
    pub fn with_restarts(mut self, restarts: usize) -> Self {
        self.restarts = restarts;
        self
    }

    /// Run all restarts and keep the lowest-WCSS clustering.
    pub fn fit(&self, data: &[Vec<f32>]) -> Result<KmeansFit> {
        let data_arr = self.validate(data)?;

        let mut best: Option<KmeansFit> = None;
        for t in 0..self.restarts.max(1) as u64 {
            let run = self.lloyd(&data_arr, self.seed.wrapping_add(t));
            debug!(restart = t, inertia = run.inertia, "kmeans run");
            if best.as_ref().map_or(true, |b| run.inertia < b.inertia) {
                best = Some(run);
            }
        }
        best.ok_or(Error::EmptyInput)
    }

    fn validate(&self, data: &[Vec<f32>]) -> Result<Array2<f32>> {
        if data.is_empty() {
            return Err(Error::EmptyInput);
        }

        let n = data.len();
        let d = data[0].len();

        if self.k == 0 || self.k > n {
            return Err(Error::InvalidClusterCount {
                requested: self.k,
                n_items: n,
            });
        }
        if let Some(point) = data.iter().find(|p| p.len() != d) {
            return Err(Error::DimensionMismatch {
                expected: d,
                found: point.len(),
            });
        }

        Ok(Array2::from_shape_fn((n, d), |(i, j)| data[i][j]))
    }

    /// Initialize centroids using k-means++ algorithm.
    fn init_centroids(&self, data: &Array2<f32>, rng: &mut impl Rng) -> Array2<f32> {
        let n = data.nrows();
        let d = data.ncols();
        let mut centroids = Array2::zeros((self.k, d));

        // First centroid: random point
        let first = rng.random_range(0..n);
        centroids.row_mut(0).assign(&data.row(first));

        // Nearest-centroid distance, updated as centroids are added
        let mut distances: Vec<f32> = (0..n)
            .map(|j| squared_distance(&data.row(j), &centroids.row(0)))
            .collect();

        for i in 1..self.k {
            // Sample proportional to squared distance
            let total: f32 = distances.iter().sum();
            let selected = if total == 0.0 {
                rng.random_range(0..n)
            } else {
                let threshold = rng.random::<f32>() * total;
                let mut cumsum = 0.0;
                let mut selected = n - 1;
                for (j, &dist) in distances.iter().enumerate() {
                    cumsum += dist;
                    if cumsum >= threshold && dist > 0.0 {
                        selected = j;
                        break;
                    }
                }
                selected
            };

            centroids.row_mut(i).assign(&data.row(selected));
            for (j, dist) in distances.iter_mut().enumerate() {
                *dist = dist.min(squared_distance(&data.row(j), &centroids.row(i)));
            }
        }

        centroids
    }

    /// One seeded Lloyd run.
    fn lloyd(&self, data: &Array2<f32>, seed: u64) -> KmeansFit {
        let n = data.nrows();
        let d = data.ncols();
        let mut rng = StdRng::seed_from_u64(seed);

        let mut centroids = self.init_centroids(data, &mut rng);
        let mut labels = vec![0usize; n];

        for _iter in 0..self.max_iter {
            assign(data, &centroids, &mut labels);

            // Update step
            let mut new_centroids = Array2::zeros((self.k, d));
            let mut counts = vec![0usize; self.k];

            for i in 0..n {
                let k = labels[i];
                for j in 0..d {
                    new_centroids[[k, j]] += data[[i, j]];
                }
                counts[k] += 1;
            }

            for k in 0..self.k {
                if counts[k] > 0 {
                    for j in 0..d {
                        new_centroids[[k, j]] /= counts[k] as f32;
                    }
                } else {
                    // Empty cluster: reinitialize from a seeded random point
                    let idx = rng.random_range(0..n);
                    new_centroids.row_mut(k).assign(&data.row(idx));
                }
            }

            // Check convergence
            let shift: f32 = centroids
                .iter()
                .zip(new_centroids.iter())
                .map(|(a, b)| (a - b).powi(2))
                .sum();

            centroids = new_centroids;

            if shift < self.tol as f32 {
                break;
            }
        }

        let inertia = assign(data, &centroids, &mut labels);
        KmeansFit {
            labels,
            centroids,
            inertia,
        }
    }
}

impl Clustering for Kmeans {
    fn fit_predict(&self, data: &[Vec<f32>]) -> Result<Vec<usize>> {
        Ok(self.fit(data)?.labels)
    }

    fn n_clusters(&self) -> usize {
        self.k
    }
}

/// Compute squared Euclidean distance.
fn squared_distance(a: &ArrayView1<'_, f32>, b: &ArrayView1<'_, f32>) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

fn nearest(point: &ArrayView1<'_, f32>, centroids: &Array2<f32>) -> (usize, f32) {
    let mut best_cluster = 0;
    let mut best_dist = f32::MAX;
    for k in 0..centroids.nrows() {
        let dist = squared_distance(point, &centroids.row(k));
        if dist < best_dist {
            best_dist = dist;
            best_cluster = k;
        }
    }
    (best_cluster, best_dist)
}

/// Assignment step; returns the WCSS of the new assignment.
fn assign(data: &Array2<f32>, centroids: &Array2<f32>, labels: &mut [usize]) -> f64 {
    #[cfg(feature = "parallel")]
    let dists: Vec<f32> = labels
        .par_iter_mut()
        .enumerate()
        .map(|(i, label)| {
            let (k, dist) = nearest(&data.row(i), centroids);
            *label = k;
            dist
        })
        .collect();

    #[cfg(not(feature = "parallel"))]
    let dists: Vec<f32> = labels
        .iter_mut()
        .enumerate()
        .map(|(i, label)| {
            let (k, dist) = nearest(&data.row(i), centroids);
            *label = k;
            dist
        })
        .collect();

    dists.iter().map(|&d| d as f64).sum()
}
