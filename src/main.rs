//! guild CLI: community structure of a developer collaboration graph.
//!
//! Reads contribution records, runs the full pipeline, and writes a JSON
//! report `{partition, agreement, metrics, warnings}` to a file or stdout.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use guild::io::{read_records_path, write_report};
use guild::{AnalysisConfig, Pipeline, Report, StrategyKind};

/// Find developer communities in contribution records.
///
/// Examples:
///   guild --records commits.jsonl
///   guild --records commits.json --top-k 500 --strategies modularity,spectral
///   guild --records commits.jsonl --config guild.toml --output report.json
#[derive(Parser, Debug)]
#[command(name = "guild")]
#[command(version)]
#[command(about, long_about = None)]
pub struct Cli {
    /// Contribution records (JSON array or JSON lines)
    ///
    /// Each record has `developer_id`, `repository_id`, and
    /// `contribution_count` (at least 1).
    #[arg(short, long, value_name = "PATH")]
    pub records: PathBuf,

    /// TOML configuration file
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Subgraph size (overrides the configuration)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,

    /// Random seed (overrides the configuration)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Comma-separated strategies: modularity, spectral, embedding
    #[arg(long, value_delimiter = ',')]
    pub strategies: Vec<StrategyKind>,

    /// Write the report here instead of stdout
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Debug-level logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    pub verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "guild=debug" } else { "guild=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let config = load_config(&cli)?;
    let records = read_records_path(&cli.records)
        .with_context(|| format!("failed to read records from '{}'", cli.records.display()))?;
    info!(records = records.len(), path = %cli.records.display(), "loaded records");

    let output = Pipeline::new(config)
        .context("invalid configuration")?
        .run(&records)
        .context("analysis failed")?;
    for warning in &output.warnings {
        warn!(%warning, "recoverable condition");
    }

    let report = Report::from(&output);
    match &cli.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create '{}'", path.display()))?;
            write_report(BufWriter::new(file), &report)
                .with_context(|| format!("failed to write '{}'", path.display()))?;
            info!(path = %path.display(), "wrote report");
        }
        None => write_report(io::stdout().lock(), &report).context("failed to write report")?,
    }
    Ok(())
}

/// Configuration file (or defaults) with command-line overrides applied.
fn load_config(cli: &Cli) -> Result<AnalysisConfig> {
    let mut config = match &cli.config {
        Some(path) => AnalysisConfig::from_path(path)
            .with_context(|| format!("failed to load config '{}'", path.display()))?,
        None => AnalysisConfig::default(),
    };
    if let Some(top_k) = cli.top_k {
        config = config.with_top_k(top_k);
    }
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }
    if !cli.strategies.is_empty() {
        config = config.with_strategies(&cli.strategies);
    }
    Ok(config)
}
