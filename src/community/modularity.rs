//! Modularity evaluation and the weighted working graph used by local moving.

use std::collections::HashMap;

use crate::graph::CollabGraph;

/// Modularity Q of `labels` on `graph` at resolution 1.
pub fn modularity(graph: &CollabGraph, labels: &[usize]) -> f64 {
    modularity_with_resolution(graph, labels, 1.0)
}

/// Modularity Q at resolution γ:
///
/// ```text
/// Q = Σ_c [ L_c / m − γ (d_c / 2m)² ]
/// ```
///
/// where `L_c` is the weight inside community c and `d_c` its total degree.
/// Zero for graphs without edges.
pub fn modularity_with_resolution(graph: &CollabGraph, labels: &[usize], resolution: f64) -> f64 {
    WeightedGraph::from_graph(graph).modularity(labels, resolution)
}

/// Adjacency-list graph with self-loops, the unit local moving and
/// aggregation operate on.
#[derive(Debug, Clone)]
pub(crate) struct WeightedGraph {
    pub(crate) n: usize,
    /// node -> [(neighbor, weight)], no self entries.
    pub(crate) adj: Vec<Vec<(usize, f64)>>,
    /// Internal weight folded into each node by aggregation.
    pub(crate) self_loops: Vec<f64>,
    /// Weighted degree; a self-loop counts twice.
    pub(crate) degrees: Vec<f64>,
    /// Total edge weight m (self-loops counted once).
    pub(crate) m: f64,
}

impl WeightedGraph {
    pub(crate) fn from_graph(graph: &CollabGraph) -> Self {
        let adj: Vec<Vec<(usize, f64)>> =
            (0..graph.node_count()).map(|i| graph.neighbors(i).to_vec()).collect();
        Self::from_parts(adj, vec![0.0; graph.node_count()])
    }

    fn from_parts(adj: Vec<Vec<(usize, f64)>>, self_loops: Vec<f64>) -> Self {
        let n = adj.len();
        let mut degrees = vec![0.0; n];
        let mut twice_edges = 0.0;
        for (i, row) in adj.iter().enumerate() {
            let d: f64 = row.iter().map(|&(_, w)| w).sum();
            degrees[i] = d + 2.0 * self_loops[i];
            twice_edges += d;
        }
        let m = twice_edges / 2.0 + self_loops.iter().sum::<f64>();
        Self {
            n,
            adj,
            self_loops,
            degrees,
            m,
        }
    }

    pub(crate) fn modularity(&self, labels: &[usize], resolution: f64) -> f64 {
        if self.m == 0.0 {
            return 0.0;
        }
        let n_comms = labels.iter().copied().max().map_or(0, |c| c + 1);
        let mut internal = vec![0.0; n_comms];
        let mut totals = vec![0.0; n_comms];
        for i in 0..self.n {
            let c = labels[i];
            totals[c] += self.degrees[i];
            internal[c] += self.self_loops[i];
            for &(j, w) in &self.adj[i] {
                if j > i && labels[j] == c {
                    internal[c] += w;
                }
            }
        }
        let two_m = 2.0 * self.m;
        internal
            .iter()
            .zip(&totals)
            .map(|(l, d)| l / self.m - resolution * (d / two_m).powi(2))
            .sum()
    }

    /// Greedy local moving starting from `assignment` (labels < n).
    ///
    /// Sweeps nodes in index order and moves each to the neighboring
    /// community with the largest modularity gain, but only when that gain
    /// beats staying by more than `min_gain`. Returns the number of moves.
    ///
    /// ```text
    /// gain(i → c) = k_i,c / m − γ Σ_c k_i / (2m²)
    /// ```
    ///
    /// with i removed from its own community before both sides are scored.
    pub(crate) fn local_moving(
        &self,
        assignment: &mut [usize],
        resolution: f64,
        max_sweeps: usize,
        min_gain: f64,
    ) -> usize {
        if self.m == 0.0 {
            return 0;
        }
        let mut comm_total = vec![0.0; self.n];
        for i in 0..self.n {
            comm_total[assignment[i]] += self.degrees[i];
        }

        let m = self.m;
        let mut link = vec![0.0; self.n];
        let mut touched: Vec<usize> = Vec::new();
        let mut moves = 0;

        for _sweep in 0..max_sweeps {
            let mut moved = false;
            for node in 0..self.n {
                let current = assignment[node];
                let ki = self.degrees[node];

                for &(nb, w) in &self.adj[node] {
                    let c = assignment[nb];
                    if link[c] == 0.0 {
                        touched.push(c);
                    }
                    link[c] += w;
                }

                comm_total[current] -= ki;
                let gain = |c: usize, link_c: f64| {
                    link_c / m - resolution * comm_total[c] * ki / (2.0 * m * m)
                };
                let stay = gain(current, link[current]);

                let mut best = current;
                let mut best_gain = stay;
                for &c in &touched {
                    if c == current {
                        continue;
                    }
                    let g = gain(c, link[c]);
                    if g > best_gain + min_gain || (g > stay + min_gain && g == best_gain && c < best) {
                        best = c;
                        best_gain = g;
                    }
                }

                comm_total[best] += ki;
                if best != current {
                    assignment[node] = best;
                    moves += 1;
                    moved = true;
                }

                for &c in &touched {
                    link[c] = 0.0;
                }
                touched.clear();
            }
            if !moved {
                break;
            }
        }
        moves
    }

    /// Contract communities into nodes. `labels` must be canonical (0..k).
    pub(crate) fn aggregate(&self, labels: &[usize]) -> WeightedGraph {
        let k = labels.iter().copied().max().map_or(0, |c| c + 1);
        let mut self_loops = vec![0.0; k];
        let mut between: HashMap<(usize, usize), f64> = HashMap::new();
        for i in 0..self.n {
            let ci = labels[i];
            self_loops[ci] += self.self_loops[i];
            for &(j, w) in &self.adj[i] {
                if j <= i {
                    continue;
                }
                let cj = labels[j];
                if ci == cj {
                    self_loops[ci] += w;
                } else {
                    let key = if ci < cj { (ci, cj) } else { (cj, ci) };
                    *between.entry(key).or_insert(0.0) += w;
                }
            }
        }
        let mut pairs: Vec<((usize, usize), f64)> = between.into_iter().collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        let mut adj = vec![Vec::new(); k];
        for ((a, b), w) in pairs {
            adj[a].push((b, w));
            adj[b].push((a, w));
        }
        WeightedGraph::from_parts(adj, self_loops)
    }
}
