//! Analysis configuration.
//!
//! One immutable [`AnalysisConfig`] value is threaded by reference through
//! every component, so a run is fully determined by `(records, config)`.
//!
//! ## Example
//!
//! ```toml
//! top_k = 1000
//! centrality_weights = [0.5, 0.25, 0.25]
//! ensemble_strategies = ["modularity", "spectral"]
//! random_seed = 7
//!
//! [builder]
//! strength = "min_contributions"
//! min_contribution_count = 2
//!
//! [community]
//! resolution = 1.2
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Community detection strategy families that take part in the ensemble vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Leiden-style modularity optimization.
    Modularity,
    /// Normalized-Laplacian eigenvectors + k-means.
    Spectral,
    /// Neighborhood embedding (FastRP) + k-means.
    Embedding,
}

impl StrategyKind {
    /// All strategies, in execution order.
    pub const ALL: [StrategyKind; 3] = [
        StrategyKind::Modularity,
        StrategyKind::Spectral,
        StrategyKind::Embedding,
    ];

    /// Stable lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::Modularity => "modularity",
            StrategyKind::Spectral => "spectral",
            StrategyKind::Embedding => "embedding",
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for StrategyKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "modularity" | "leiden" => Ok(StrategyKind::Modularity),
            "spectral" => Ok(StrategyKind::Spectral),
            "embedding" | "fastrp" => Ok(StrategyKind::Embedding),
            _ => Err(Error::InvalidParameter {
                name: "ensemble_strategies",
                message: format!("unknown strategy '{s}'"),
            }),
        }
    }
}

/// How co-contribution on one repository turns into edge weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoContributionStrength {
    /// +1 per shared repository.
    #[default]
    SharedRepositories,
    /// +min(count_a, count_b) per shared repository.
    MinContributions,
}

impl CoContributionStrength {
    /// Weight contributed by one shared repository.
    pub fn weight(&self, count_a: u64, count_b: u64) -> f64 {
        match self {
            CoContributionStrength::SharedRepositories => 1.0,
            CoContributionStrength::MinContributions => count_a.min(count_b) as f64,
        }
    }
}

/// Graph construction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// Edge strength function.
    pub strength: CoContributionStrength,
    /// Records with fewer contributions are ignored.
    pub min_contribution_count: u64,
    /// Repositories with fewer distinct developers produce no edges.
    pub min_repository_developers: usize,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            strength: CoContributionStrength::SharedRepositories,
            min_contribution_count: 1,
            min_repository_developers: 2,
        }
    }
}

/// Community engine settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommunityConfig {
    /// Modularity resolution (gamma). Higher = smaller communities.
    pub resolution: f64,
    /// Maximum aggregation levels for the modularity strategy.
    pub max_levels: usize,
    /// Maximum local-moving sweeps per level.
    pub max_iterations: usize,
    /// Minimum modularity gain to accept a move or another level.
    pub min_modularity_gain: f64,
    /// Run local refinement on each candidate before voting.
    pub refine_candidates: bool,
    /// Maximum refinement sweeps per candidate.
    pub refinement_passes: usize,
    /// Cluster count for spectral / embedding strategies when the
    /// modularity strategy did not run.
    pub fallback_k: usize,
    /// Seeded k-means restarts; the lowest-inertia run wins.
    pub kmeans_restarts: usize,
    /// Lloyd iterations per k-means run.
    pub kmeans_max_iterations: usize,
    /// FastRP embedding dimension.
    pub embedding_dimension: usize,
    /// FastRP weights for propagation orders 1, 2, ...
    pub embedding_iteration_weights: Vec<f64>,
}

impl Default for CommunityConfig {
    fn default() -> Self {
        Self {
            resolution: 1.0,
            max_levels: 10,
            max_iterations: 100,
            min_modularity_gain: 1e-7,
            refine_candidates: true,
            refinement_passes: 10,
            fallback_k: 8,
            kmeans_restarts: 4,
            kmeans_max_iterations: 100,
            embedding_dimension: 64,
            embedding_iteration_weights: vec![0.0, 1.0, 1.0],
        }
    }
}

/// Full analysis configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Size of the reduced subgraph.
    pub top_k: usize,
    /// Weights for (degree, pagerank, betweenness); must sum to 1.
    pub centrality_weights: [f64; 3],
    /// PageRank damping factor in (0, 1).
    pub pagerank_damping: f64,
    /// PageRank L1 convergence tolerance.
    pub pagerank_tolerance: f64,
    /// PageRank iteration cap.
    pub pagerank_max_iterations: usize,
    /// Fraction of source nodes used for betweenness on large graphs.
    pub betweenness_sampling_fraction: f64,
    /// Graphs with more nodes than this use sampled betweenness.
    pub betweenness_sampling_threshold: usize,
    /// Use 1/weight path lengths instead of hop counts.
    pub betweenness_weighted: bool,
    /// Strategies that vote in the ensemble.
    pub ensemble_strategies: Vec<StrategyKind>,
    /// Seed for every randomized step.
    pub random_seed: u64,
    /// Graph construction.
    pub builder: BuilderConfig,
    /// Community detection.
    pub community: CommunityConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            top_k: 2500,
            centrality_weights: [1.0 / 3.0; 3],
            pagerank_damping: 0.85,
            pagerank_tolerance: 1e-6,
            pagerank_max_iterations: 100,
            betweenness_sampling_fraction: 1.0,
            betweenness_sampling_threshold: 5000,
            betweenness_weighted: false,
            ensemble_strategies: StrategyKind::ALL.to_vec(),
            random_seed: 42,
            builder: BuilderConfig::default(),
            community: CommunityConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: AnalysisConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Io(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Set subgraph size.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    /// Restrict the ensemble to the given strategies.
    pub fn with_strategies(mut self, strategies: &[StrategyKind]) -> Self {
        self.ensemble_strategies = strategies.to_vec();
        self
    }

    /// Set centrality weights (degree, pagerank, betweenness).
    pub fn with_centrality_weights(mut self, weights: [f64; 3]) -> Self {
        self.centrality_weights = weights;
        self
    }

    /// Enabled strategies, deduplicated, in execution order.
    pub fn strategies(&self) -> Vec<StrategyKind> {
        let mut kinds = self.ensemble_strategies.clone();
        kinds.sort();
        kinds.dedup();
        kinds
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        fn invalid(name: &'static str, message: impl Into<String>) -> Result<()> {
            Err(Error::InvalidParameter {
                name,
                message: message.into(),
            })
        }

        if self.top_k == 0 {
            return invalid("top_k", "must be at least 1");
        }
        if self.centrality_weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return invalid("centrality_weights", "weights must be finite and non-negative");
        }
        let sum: f64 = self.centrality_weights.iter().sum();
        if (sum - 1.0).abs() > 1e-6 {
            return invalid("centrality_weights", format!("weights sum to {sum}, expected 1.0"));
        }
        if !(self.pagerank_damping > 0.0 && self.pagerank_damping < 1.0) {
            return invalid("pagerank_damping", "must lie in (0, 1)");
        }
        if !(self.pagerank_tolerance > 0.0) {
            return invalid("pagerank_tolerance", "must be positive");
        }
        if self.pagerank_max_iterations == 0 {
            return invalid("pagerank_max_iterations", "must be at least 1");
        }
        if !(self.betweenness_sampling_fraction > 0.0 && self.betweenness_sampling_fraction <= 1.0) {
            return invalid("betweenness_sampling_fraction", "must lie in (0, 1]");
        }
        if self.ensemble_strategies.is_empty() {
            return invalid("ensemble_strategies", "at least one strategy is required");
        }

        let c = &self.community;
        if !(c.resolution > 0.0) {
            return invalid("community.resolution", "must be positive");
        }
        if c.fallback_k == 0 {
            return invalid("community.fallback_k", "must be at least 1");
        }
        if c.kmeans_restarts == 0 {
            return invalid("community.kmeans_restarts", "must be at least 1");
        }
        if c.embedding_dimension == 0 {
            return invalid("community.embedding_dimension", "must be at least 1");
        }
        if c.embedding_iteration_weights.is_empty()
            || c.embedding_iteration_weights.iter().all(|w| *w == 0.0)
        {
            return invalid(
                "community.embedding_iteration_weights",
                "at least one propagation order needs a non-zero weight",
            );
        }
        Ok(())
    }
}
