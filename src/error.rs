use thiserror::Error;

/// Result alias for `guild`.
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline stage, used to attribute errors and warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Graph construction from contribution records.
    Build,
    /// Degree / PageRank / betweenness ranking.
    Centrality,
    /// Top-K subgraph extraction.
    Extraction,
    /// Strategy execution and ensemble fusion.
    Community,
    /// Partition statistics.
    Metrics,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Build => write!(f, "build"),
            Stage::Centrality => write!(f, "centrality"),
            Stage::Extraction => write!(f, "extraction"),
            Stage::Community => write!(f, "community"),
            Stage::Metrics => write!(f, "metrics"),
        }
    }
}

/// Errors returned by graph construction, ranking, and community detection.
///
/// Some variants are recoverable (`Convergence`, `InsufficientNodes`,
/// `DegenerateEmbedding`): components absorb them and surface them as
/// [`Warning`]s rather than failing the run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A contribution record is missing a field or has an invalid value.
    #[error("malformed record #{index}: field '{field}' {reason}")]
    MalformedRecord {
        /// Position of the record in the input sequence.
        index: usize,
        /// Offending field name.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// An iterative computation hit its iteration cap.
    #[error("{stage} did not converge after {iterations} iterations (residual {residual:.3e})")]
    Convergence {
        /// Which computation (e.g. "pagerank", "spectral").
        stage: &'static str,
        /// Iterations attempted.
        iterations: usize,
        /// Last observed change.
        residual: f64,
    },

    /// Fewer nodes available than the requested subgraph size.
    #[error("requested top {requested} nodes but graph has only {available}")]
    InsufficientNodes {
        /// Requested K.
        requested: usize,
        /// Nodes actually available.
        available: usize,
    },

    /// Every enabled strategy failed; no partition can be produced.
    #[error("no candidate partition: all {attempted} strategies failed ({})", .failures.join("; "))]
    NoCandidatePartition {
        /// Number of strategies that were run.
        attempted: usize,
        /// One message per failed strategy.
        failures: Vec<String>,
    },

    /// Embedding produced (near-)identical vectors for every node.
    #[error("{strategy} embedding is degenerate (all node vectors coincide)")]
    DegenerateEmbedding {
        /// Embedding technique name.
        strategy: &'static str,
    },

    /// Input was empty.
    #[error("empty input provided")]
    EmptyInput,

    /// Matrix dimension mismatch.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Found dimension.
        found: usize,
    },

    /// Invalid number of clusters requested.
    #[error("cannot create {requested} clusters from {n_items} items")]
    InvalidClusterCount {
        /// Requested count.
        requested: usize,
        /// Number of items.
        n_items: usize,
    },

    /// Invalid parameter value.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: String,
    },

    /// The run was cancelled before the named stage started.
    #[error("cancelled before {stage}")]
    Cancelled {
        /// Stage that did not start.
        stage: Stage,
    },

    /// A fatal error annotated with the stage and input size it occurred at.
    #[error("{stage} stage failed on {input_size} items: {source}")]
    Stage {
        /// Failing stage.
        stage: Stage,
        /// Size of the stage input (records or nodes).
        input_size: usize,
        /// Underlying error.
        source: Box<Error>,
    },

    /// Configuration or record parsing failure.
    #[error("parse error: {0}")]
    Parse(String),

    /// Reading records or writing a report failed.
    #[error("io error: {0}")]
    Io(String),
}

impl Error {
    /// Wrap this error with stage context.
    pub fn at(self, stage: Stage, input_size: usize) -> Self {
        match self {
            already @ Error::Stage { .. } => already,
            cancelled @ Error::Cancelled { .. } => cancelled,
            other => Error::Stage {
                stage,
                input_size,
                source: Box::new(other),
            },
        }
    }

    /// Whether components absorb this error as a warning.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Convergence { .. }
                | Error::InsufficientNodes { .. }
                | Error::DegenerateEmbedding { .. }
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Parse(e.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Parse(e.to_string())
    }
}

/// A recoverable condition absorbed at a component boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Warning {
    /// Where it happened.
    pub stage: Stage,
    /// What happened.
    pub error: Error,
}

impl Warning {
    /// Create a warning.
    pub fn new(stage: Stage, error: Error) -> Self {
        Self { stage, error }
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.stage, self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_context_wraps_once() {
        let err = Error::EmptyInput.at(Stage::Build, 0).at(Stage::Community, 5);
        match err {
            Error::Stage { stage, input_size, .. } => {
                assert_eq!(stage, Stage::Build);
                assert_eq!(input_size, 0);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(Error::InsufficientNodes { requested: 5, available: 3 }.is_recoverable());
        assert!(!Error::EmptyInput.is_recoverable());
        assert!(!Error::NoCandidatePartition { attempted: 3, failures: vec![] }.is_recoverable());
    }

    #[test]
    fn test_display_mentions_field() {
        let err = Error::MalformedRecord {
            index: 3,
            field: "developer_id",
            reason: "is empty".into(),
        };
        assert_eq!(err.to_string(), "malformed record #3: field 'developer_id' is empty");
    }
}
