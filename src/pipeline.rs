//! End-to-end analysis: records in, partition and metrics out.
//!
//! ```text
//! records ─▶ GraphBuilder ─▶ CentralityRanker ─▶ SubgraphExtractor ─▶ CommunityEngine ─▶ MetricsReporter
//! ```
//!
//! Cancellation is checked before each stage starts. Recoverable conditions
//! from every stage are collected into [`PipelineOutput::warnings`]; a fatal
//! error aborts the run with the failing stage and its input size attached.

use std::collections::BTreeMap;

use tracing::info;

use crate::cancel::CancellationToken;
use crate::centrality::{CentralityRanker, RankedNode};
use crate::config::AnalysisConfig;
use crate::ensemble::{CommunityEngine, EnsembleResult};
use crate::error::{Error, Result, Stage, Warning};
use crate::graph::{CollabGraph, ContributionRecord, GraphBuilder};
use crate::metrics::{MetricsReporter, MetricsSummary};
use crate::subgraph::SubgraphExtractor;

/// Everything a completed run produces.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Nodes in the full collaboration graph.
    pub full_nodes: usize,
    /// Edges in the full collaboration graph.
    pub full_edges: usize,
    /// The reduced (top-K) graph the communities were found on.
    pub graph: CollabGraph,
    /// Ranked nodes by reduced-graph index.
    pub ranked: Vec<RankedNode>,
    /// Fused partition, agreement, and voted candidates.
    pub ensemble: EnsembleResult,
    /// Partition statistics.
    pub metrics: MetricsSummary,
    /// Recoverable conditions from every stage, in stage order.
    pub warnings: Vec<Warning>,
}

impl PipelineOutput {
    /// Developer id → community id.
    pub fn partition(&self) -> BTreeMap<String, usize> {
        self.ensemble.partition.to_id_map(&self.graph)
    }

    /// Developer id → agreement score.
    pub fn agreement(&self) -> BTreeMap<String, f64> {
        self.ensemble
            .agreement
            .iter()
            .enumerate()
            .map(|(i, &a)| (self.graph.id(i).to_string(), a))
            .collect()
    }
}

/// Runs the stages in order under one configuration.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: AnalysisConfig,
    cancel: CancellationToken,
}

impl Pipeline {
    /// Pipeline over a validated configuration.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            cancel: CancellationToken::new(),
        })
    }

    /// Use `token` to cancel the run from elsewhere.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Handle that cancels this pipeline's runs.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// The configuration in use.
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Run every stage over `records`.
    pub fn run(&self, records: &[ContributionRecord]) -> Result<PipelineOutput> {
        let mut warnings = Vec::new();

        self.cancel.check(Stage::Build)?;
        let graph = GraphBuilder::from_config(&self.config.builder)
            .build(records)
            .map_err(|e| e.at(Stage::Build, records.len()))?;
        if graph.is_empty() {
            return Err(Error::EmptyInput.at(Stage::Build, records.len()));
        }

        self.cancel.check(Stage::Centrality)?;
        let ranking = CentralityRanker::from_config(&self.config).rank(&graph);
        warnings.extend(ranking.warnings.iter().cloned());

        self.cancel.check(Stage::Extraction)?;
        let reduced = SubgraphExtractor::new(self.config.top_k)
            .extract(&graph, &ranking)
            .map_err(|e| e.at(Stage::Extraction, graph.node_count()))?;
        warnings.extend(reduced.warnings);

        self.cancel.check(Stage::Community)?;
        let n = reduced.graph.node_count();
        let ensemble = CommunityEngine::from_config(&self.config)
            .detect(&reduced.graph)
            .map_err(|e| e.at(Stage::Community, n))?;
        warnings.extend(ensemble.warnings.iter().cloned());

        self.cancel.check(Stage::Metrics)?;
        let metrics = MetricsReporter::new()
            .report(&reduced.graph, &reduced.ranked, &ensemble)
            .map_err(|e| e.at(Stage::Metrics, n))?;

        info!(
            records = records.len(),
            nodes = graph.node_count(),
            reduced_nodes = n,
            communities = metrics.communities,
            modularity = metrics.modularity,
            warnings = warnings.len(),
            "analysis complete"
        );
        Ok(PipelineOutput {
            full_nodes: graph.node_count(),
            full_edges: graph.edge_count(),
            graph: reduced.graph,
            ranked: reduced.ranked,
            ensemble,
            metrics,
            warnings,
        })
    }
}
