//! # guild
//!
//! Developer collaboration graphs: build a weighted co-contribution graph,
//! rank developers by combined centrality, reduce to the top K, and find
//! communities with an ensemble of modularity, spectral, and embedding
//! strategies fused by co-association voting.
//!
//! ```text
//! records ─▶ graph ─▶ centrality ─▶ subgraph ─▶ ensemble ─▶ metrics
//! ```
//!
//! [`Pipeline`] runs the whole chain; every stage is also usable alone.
//!
//! ```rust
//! use guild::{AnalysisConfig, ContributionRecord, Pipeline};
//!
//! let records = vec![
//!     ContributionRecord::new("alice", "core", 12),
//!     ContributionRecord::new("bob", "core", 3),
//!     ContributionRecord::new("bob", "docs", 5),
//!     ContributionRecord::new("carol", "docs", 1),
//! ];
//! let output = Pipeline::new(AnalysisConfig::default())?.run(&records)?;
//! assert_eq!(output.partition().len(), 3);
//! # Ok::<(), guild::Error>(())
//! ```
//!
//! **Default build** enables `parallel` (rayon) and the `cli` binary.
//! Results are identical with and without `parallel`.

pub mod cancel;
pub mod centrality;
pub mod cluster;
pub mod community;
pub mod config;
pub mod embedding;
pub mod ensemble;
/// Error types used across `guild`.
pub mod error;
pub mod graph;
pub mod io;
pub mod metrics;
pub mod pipeline;
pub mod subgraph;


pub use cancel::CancellationToken;
pub use centrality::{CentralityRanker, RankedNode, Ranking};
pub use config::{AnalysisConfig, BuilderConfig, CoContributionStrength, CommunityConfig, StrategyKind};
pub use ensemble::{CandidatePartition, CommunityEngine, EnsembleResult, Partition, Partitioner};
pub use error::{Error, Result, Stage, Warning};
pub use graph::{CollabGraph, ContributionRecord, Developer, GraphBuilder};
pub use io::Report;
pub use metrics::{ari, nmi, MetricsReporter, MetricsSummary};
pub use pipeline::{Pipeline, PipelineOutput};
pub use subgraph::{Subgraph, SubgraphExtractor};
