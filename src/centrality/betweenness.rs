//! Betweenness centrality (Brandes 2001), exact or source-sampled.
//!
//! Exact betweenness costs O(V·E) for hop-count paths; above a node-count
//! threshold a seeded sample of sources is used instead and the partial
//! dependencies are scaled by `n / sources` (Brandes & Pich 2007). The sample
//! is drawn from a seeded RNG, so sampled runs are reproducible.
//!
//! Path length is either hop count (default) or `1 / weight`, so that heavy
//! collaboration edges count as short.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};

use rand::prelude::*;
use tracing::debug;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::graph::CollabGraph;

/// Sources accumulated per work unit. Fixed so that the floating-point
/// summation order does not depend on thread scheduling.
const SOURCE_CHUNK: usize = 32;

/// Betweenness parameters.
#[derive(Debug, Clone)]
pub struct Betweenness {
    sampling_fraction: f64,
    sampling_threshold: usize,
    weighted: bool,
    seed: u64,
}

/// Betweenness output.
#[derive(Debug, Clone)]
pub struct BetweennessScores {
    /// Normalized score per node index, in [0, 1] for exact runs.
    pub scores: Vec<f64>,
    /// Number of source nodes used.
    pub sources: usize,
    /// Whether sources were sampled.
    pub sampled: bool,
}

impl Betweenness {
    /// Exact hop-count betweenness.
    pub fn new() -> Self {
        Self {
            sampling_fraction: 1.0,
            sampling_threshold: 5000,
            weighted: false,
            seed: 42,
        }
    }

    /// Fraction of sources to use when sampling.
    pub fn with_sampling_fraction(mut self, fraction: f64) -> Self {
        self.sampling_fraction = fraction;
        self
    }

    /// Graphs with more nodes than this are sampled.
    pub fn with_sampling_threshold(mut self, threshold: usize) -> Self {
        self.sampling_threshold = threshold;
        self
    }

    /// Use `1 / weight` path lengths.
    pub fn with_weighted(mut self, weighted: bool) -> Self {
        self.weighted = weighted;
        self
    }

    /// Seed for source sampling.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn select_sources(&self, n: usize) -> (Vec<usize>, bool) {
        if n <= self.sampling_threshold || self.sampling_fraction >= 1.0 {
            return ((0..n).collect(), false);
        }
        let count = ((n as f64 * self.sampling_fraction).ceil() as usize).clamp(1, n);
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut sources = rand::seq::index::sample(&mut rng, n, count).into_vec();
        sources.sort_unstable();
        (sources, true)
    }

    /// Compute betweenness for every node.
    pub fn compute(&self, graph: &CollabGraph) -> BetweennessScores {
        let n = graph.node_count();
        let (sources, sampled) = self.select_sources(n);
        if n < 3 {
            return BetweennessScores {
                scores: vec![0.0; n],
                sources: sources.len(),
                sampled,
            };
        }

        let accumulate_chunk = |chunk: &[usize]| -> Vec<f64> {
            let mut partial = vec![0.0; n];
            let mut scratch = Scratch::new(n);
            for &s in chunk {
                if self.weighted {
                    scratch.dijkstra(graph, s);
                } else {
                    scratch.bfs(graph, s);
                }
                scratch.accumulate(s, &mut partial);
            }
            partial
        };

        #[cfg(feature = "parallel")]
        let partials: Vec<Vec<f64>> = sources.par_chunks(SOURCE_CHUNK).map(accumulate_chunk).collect();

        #[cfg(not(feature = "parallel"))]
        let partials: Vec<Vec<f64>> = sources.chunks(SOURCE_CHUNK).map(accumulate_chunk).collect();

        let mut scores = vec![0.0; n];
        for partial in &partials {
            for (s, p) in scores.iter_mut().zip(partial) {
                *s += p;
            }
        }

        // Undirected: every pair was counted from both ends.
        let scale = n as f64 / sources.len() as f64;
        let norm = ((n - 1) * (n - 2)) as f64 / 2.0;
        for s in &mut scores {
            *s = *s * scale / 2.0 / norm;
        }

        debug!(sources = sources.len(), sampled, weighted = self.weighted, "betweenness finished");
        BetweennessScores {
            scores,
            sources: sources.len(),
            sampled,
        }
    }
}

impl Default for Betweenness {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-source single-source shortest path state, reused across sources.
struct Scratch {
    order: Vec<usize>,
    preds: Vec<Vec<usize>>,
    sigma: Vec<f64>,
    dist: Vec<f64>,
    delta: Vec<f64>,
}

#[derive(PartialEq)]
struct Frontier {
    dist: f64,
    node: usize,
}

impl Eq for Frontier {}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        // min-heap on distance, then node for determinism
        other
            .dist
            .total_cmp(&self.dist)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Scratch {
    fn new(n: usize) -> Self {
        Self {
            order: Vec::with_capacity(n),
            preds: vec![Vec::new(); n],
            sigma: vec![0.0; n],
            dist: vec![f64::INFINITY; n],
            delta: vec![0.0; n],
        }
    }

    fn reset(&mut self, s: usize) {
        self.order.clear();
        for p in &mut self.preds {
            p.clear();
        }
        self.sigma.iter_mut().for_each(|x| *x = 0.0);
        self.dist.iter_mut().for_each(|x| *x = f64::INFINITY);
        self.delta.iter_mut().for_each(|x| *x = 0.0);
        self.sigma[s] = 1.0;
        self.dist[s] = 0.0;
    }

    fn bfs(&mut self, graph: &CollabGraph, s: usize) {
        self.reset(s);
        let mut queue = VecDeque::new();
        queue.push_back(s);
        while let Some(v) = queue.pop_front() {
            self.order.push(v);
            let next = self.dist[v] + 1.0;
            for &(w, _) in graph.neighbors(v) {
                if self.dist[w].is_infinite() {
                    self.dist[w] = next;
                    queue.push_back(w);
                }
                if self.dist[w] == next {
                    self.sigma[w] += self.sigma[v];
                    self.preds[w].push(v);
                }
            }
        }
    }

    fn dijkstra(&mut self, graph: &CollabGraph, s: usize) {
        self.reset(s);
        let mut settled = vec![false; self.dist.len()];
        let mut heap = BinaryHeap::new();
        heap.push(Frontier { dist: 0.0, node: s });
        while let Some(Frontier { dist, node: v }) = heap.pop() {
            if settled[v] || dist > self.dist[v] {
                continue;
            }
            settled[v] = true;
            self.order.push(v);
            for &(w, weight) in graph.neighbors(v) {
                let candidate = dist + 1.0 / weight;
                let current = self.dist[w];
                let tol = 1e-12 * candidate.max(1.0);
                if candidate < current - tol {
                    self.dist[w] = candidate;
                    self.sigma[w] = self.sigma[v];
                    self.preds[w].clear();
                    self.preds[w].push(v);
                    heap.push(Frontier { dist: candidate, node: w });
                } else if (candidate - current).abs() <= tol && !settled[w] {
                    self.sigma[w] += self.sigma[v];
                    self.preds[w].push(v);
                }
            }
        }
    }

    fn accumulate(&mut self, s: usize, into: &mut [f64]) {
        while let Some(w) = self.order.pop() {
            let coeff = (1.0 + self.delta[w]) / self.sigma[w];
            for &v in &self.preds[w] {
                self.delta[v] += self.sigma[v] * coeff;
            }
            if w != s {
                into[w] += self.delta[w];
            }
        }
    }
}
