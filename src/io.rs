//! Record input and report output.
//!
//! Records arrive either as one JSON array or as JSON lines (one object per
//! line, blank lines ignored). Missing fields deserialize as empty so the
//! builder can report them as malformed with the record's position.

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::Path;

use serde::Serialize;

use crate::error::{Error, Result, Stage};
use crate::graph::ContributionRecord;
use crate::metrics::MetricsSummary;
use crate::pipeline::PipelineOutput;

/// Parse records from JSON array or JSON-lines text.
pub fn parse_records(text: &str) -> Result<Vec<ContributionRecord>> {
    let trimmed = text.trim_start();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    if trimmed.starts_with('[') {
        return Ok(serde_json::from_str(trimmed)?);
    }
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str(line).map_err(|e| Error::Parse(format!("line {}: {e}", i + 1)))
        })
        .collect()
}

/// Read and parse records from `reader`.
pub fn read_records<R: Read>(mut reader: R) -> Result<Vec<ContributionRecord>> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    parse_records(&text)
}

/// Read and parse records from a file.
pub fn read_records_path(path: impl AsRef<Path>) -> Result<Vec<ContributionRecord>> {
    let path = path.as_ref();
    let text =
        std::fs::read_to_string(path).map_err(|e| Error::Io(format!("{}: {e}", path.display())))?;
    parse_records(&text)
}

/// A warning as it appears in a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportWarning {
    /// Stage that absorbed the condition.
    pub stage: Stage,
    /// Human-readable description.
    pub message: String,
}

/// The serialized result of a run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Developer id → community id.
    pub partition: BTreeMap<String, usize>,
    /// Developer id → per-node agreement.
    pub agreement: BTreeMap<String, f64>,
    /// Partition statistics.
    pub metrics: MetricsSummary,
    /// Recoverable conditions.
    pub warnings: Vec<ReportWarning>,
}

impl From<&PipelineOutput> for Report {
    fn from(output: &PipelineOutput) -> Self {
        Self {
            partition: output.partition(),
            agreement: output.agreement(),
            metrics: output.metrics.clone(),
            warnings: output
                .warnings
                .iter()
                .map(|w| ReportWarning {
                    stage: w.stage,
                    message: w.error.to_string(),
                })
                .collect(),
        }
    }
}

/// Write `report` as pretty-printed JSON.
pub fn write_report<W: Write>(mut writer: W, report: &Report) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, report)?;
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_array() {
        let records = parse_records(
            r#"[{"developer_id": "a", "repository_id": "r", "contribution_count": 2},
                {"developer_id": "b", "repository_id": "r", "contribution_count": 1}]"#,
        )
        .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], ContributionRecord::new("a", "r", 2));
    }

    #[test]
    fn test_json_lines_skip_blank() {
        let text = "{\"developer_id\": \"a\", \"repository_id\": \"r\", \"contribution_count\": 1}\n\n\
                    {\"developer_id\": \"b\", \"repository_id\": \"r\", \"contribution_count\": 3}\n";
        let records = read_records(text.as_bytes()).unwrap();
        assert_eq!(records[1], ContributionRecord::new("b", "r", 3));
    }

    #[test]
    fn test_bad_line_reports_line_number() {
        let text = "{\"developer_id\": \"a\", \"repository_id\": \"r\", \"contribution_count\": 1}\nnot json\n";
        match parse_records(text) {
            Err(Error::Parse(message)) => assert!(message.starts_with("line 2:")),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_field_defaults_to_empty() {
        let records = parse_records(r#"[{"repository_id": "r", "contribution_count": 1}]"#).unwrap();
        assert!(records[0].developer_id.is_empty());
    }

    #[test]
    fn test_empty_text_has_no_records() {
        assert!(parse_records("  \n").unwrap().is_empty());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            read_records_path("/nonexistent/guild/records.json"),
            Err(Error::Io(_))
        ));
    }
}
