//! The community engine: run strategies, refine, vote.

use tracing::{info, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::fusion::fuse;
use super::strategy::{EmbeddingPartitioner, ModularityPartitioner, PartitionRequest, Partitioner};
use super::{CandidatePartition, EnsembleResult, Partition};
use crate::community::{modularity, Leiden, LocalRefiner};
use crate::config::{AnalysisConfig, CommunityConfig, StrategyKind};
use crate::error::{Error, Result, Stage, Warning};
use crate::graph::CollabGraph;

/// Hybrid community detection over a reduced graph.
///
/// The modularity strategy runs first because its community count is the
/// `k` handed to the spectral and embedding strategies (or `fallback_k`
/// when it is disabled or fails). Those two then run concurrently.
pub struct CommunityEngine {
    config: CommunityConfig,
    seed: u64,
    modularity: Option<Box<dyn Partitioner>>,
    clustered: Vec<Box<dyn Partitioner>>,
}

impl CommunityEngine {
    /// Engine running the strategies enabled in `config`.
    pub fn from_config(config: &AnalysisConfig) -> Self {
        let community = &config.community;
        let mut engine = Self {
            config: community.clone(),
            seed: config.random_seed,
            modularity: None,
            clustered: Vec::new(),
        };
        for kind in config.strategies() {
            engine = match kind {
                StrategyKind::Modularity => {
                    engine.with_partitioner(Box::new(ModularityPartitioner::from_config(community)))
                }
                StrategyKind::Spectral => {
                    engine.with_partitioner(Box::new(EmbeddingPartitioner::spectral(community)))
                }
                StrategyKind::Embedding => {
                    engine.with_partitioner(Box::new(EmbeddingPartitioner::fastrp(community)))
                }
            };
        }
        engine
    }

    /// Engine with no strategies; add them with [`Self::with_partitioner`].
    pub fn empty(config: CommunityConfig, seed: u64) -> Self {
        Self {
            config,
            seed,
            modularity: None,
            clustered: Vec::new(),
        }
    }

    /// Add a strategy. A modularity partitioner replaces any previous one.
    pub fn with_partitioner(mut self, partitioner: Box<dyn Partitioner>) -> Self {
        if partitioner.strategy() == StrategyKind::Modularity {
            self.modularity = Some(partitioner);
        } else {
            self.clustered.push(partitioner);
        }
        self
    }

    /// Number of strategies that will run.
    pub fn strategy_count(&self) -> usize {
        usize::from(self.modularity.is_some()) + self.clustered.len()
    }

    /// Partition `graph` by ensemble vote.
    pub fn detect(&self, graph: &CollabGraph) -> Result<EnsembleResult> {
        let n = graph.node_count();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        let attempted = self.strategy_count();
        if attempted == 0 {
            return Err(Error::InvalidParameter {
                name: "ensemble_strategies",
                message: "no strategies configured".into(),
            });
        }

        let mut outcomes: Vec<(StrategyKind, Result<Vec<usize>>)> = Vec::with_capacity(attempted);
        let mut clusters = self.config.fallback_k;
        if let Some(modularity) = &self.modularity {
            let request = PartitionRequest {
                clusters,
                seed: self.seed,
            };
            let result = modularity.partition(graph, &request);
            if let Ok(labels) = &result {
                clusters = Partition::new(labels).n_communities();
            }
            outcomes.push((StrategyKind::Modularity, result));
        }
        let request = PartitionRequest {
            clusters: clusters.clamp(1, n),
            seed: self.seed,
        };

        let run = |p: &Box<dyn Partitioner>| (p.strategy(), p.partition(graph, &request));

        #[cfg(feature = "parallel")]
        let clustered: Vec<(StrategyKind, Result<Vec<usize>>)> = self.clustered.par_iter().map(run).collect();

        #[cfg(not(feature = "parallel"))]
        let clustered: Vec<(StrategyKind, Result<Vec<usize>>)> = self.clustered.iter().map(run).collect();

        outcomes.extend(clustered);

        let refiner = LocalRefiner::from_config(&self.config);
        let mut candidates = Vec::new();
        let mut warnings = Vec::new();
        let mut failures = Vec::new();
        for (strategy, outcome) in outcomes {
            match outcome {
                Ok(labels) => candidates.push(self.candidate(graph, &refiner, strategy, &labels)),
                Err(err) => {
                    warn!(%strategy, %err, "strategy excluded from vote");
                    failures.push(format!("{strategy}: {err}"));
                    warnings.push(Warning::new(Stage::Community, err));
                }
            }
        }
        if candidates.is_empty() {
            return Err(Error::NoCandidatePartition { attempted, failures });
        }

        let detector = Leiden::from_config(&self.config);
        let (partition, agreement) = fuse(graph, &candidates, &detector)?;
        // reported Q is the plain objective; resolution only steers the search
        let modularity = modularity(graph, partition.labels());

        info!(
            nodes = n,
            k = request.clusters,
            candidates = candidates.len(),
            excluded = warnings.len(),
            communities = partition.n_communities(),
            modularity,
            "ensemble partition"
        );
        Ok(EnsembleResult {
            partition,
            agreement,
            modularity,
            candidates,
            warnings,
        })
    }

    fn candidate(
        &self,
        graph: &CollabGraph,
        refiner: &LocalRefiner,
        strategy: StrategyKind,
        labels: &[usize],
    ) -> CandidatePartition {
        let (partition, refinement_moves) = if self.config.refine_candidates {
            let refined = refiner.refine(graph, labels);
            (Partition::new(&refined.labels), refined.moves)
        } else {
            (Partition::new(labels), 0)
        };
        CandidatePartition {
            strategy,
            modularity: modularity(graph, partition.labels()),
            partition,
            refinement_moves,
        }
    }
}
