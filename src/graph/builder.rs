//! Collaboration graph construction from contribution records.
//!
//! Records are grouped by repository; every pair of distinct developers on
//! the same repository gains edge weight according to the configured
//! [`CoContributionStrength`]. Repeated records for the same
//! `(developer, repository)` are summed before pairing.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{CollabGraph, Developer};
use crate::config::{BuilderConfig, CoContributionStrength};
use crate::error::{Error, Result};

/// One `(developer, repository, count)` contribution record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributionRecord {
    /// Developer identifier.
    #[serde(default)]
    pub developer_id: String,
    /// Repository identifier.
    #[serde(default)]
    pub repository_id: String,
    /// Number of contributions (commits); must be at least 1.
    #[serde(default)]
    pub contribution_count: u64,
}

impl ContributionRecord {
    /// Create a record.
    pub fn new(developer_id: impl Into<String>, repository_id: impl Into<String>, count: u64) -> Self {
        Self {
            developer_id: developer_id.into(),
            repository_id: repository_id.into(),
            contribution_count: count,
        }
    }

    fn validate(&self, index: usize) -> Result<()> {
        let malformed = |field, reason: &str| Error::MalformedRecord {
            index,
            field,
            reason: reason.to_string(),
        };
        if self.developer_id.trim().is_empty() {
            return Err(malformed("developer_id", "is missing or empty"));
        }
        if self.repository_id.trim().is_empty() {
            return Err(malformed("repository_id", "is missing or empty"));
        }
        if self.contribution_count == 0 {
            return Err(malformed("contribution_count", "must be at least 1"));
        }
        Ok(())
    }
}

/// Builds a [`CollabGraph`] from contribution records.
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    strength: CoContributionStrength,
    min_contribution_count: u64,
    min_repository_developers: usize,
}

impl GraphBuilder {
    /// Builder with default settings.
    pub fn new() -> Self {
        Self::from_config(&BuilderConfig::default())
    }

    /// Builder from configuration.
    pub fn from_config(config: &BuilderConfig) -> Self {
        Self {
            strength: config.strength,
            min_contribution_count: config.min_contribution_count,
            min_repository_developers: config.min_repository_developers,
        }
    }

    /// Set the co-contribution strength function.
    pub fn with_strength(mut self, strength: CoContributionStrength) -> Self {
        self.strength = strength;
        self
    }

    /// Ignore records with fewer contributions than `min`.
    pub fn with_min_contribution_count(mut self, min: u64) -> Self {
        self.min_contribution_count = min;
        self
    }

    /// Build the graph.
    ///
    /// Every record is validated first; a single malformed record aborts the
    /// build and no graph is returned. Developers whose records fall below
    /// the contribution threshold still appear as nodes.
    pub fn build(&self, records: &[ContributionRecord]) -> Result<CollabGraph> {
        for (index, record) in records.iter().enumerate() {
            record.validate(index)?;
        }

        // developer -> total contributions; ordered so positions equal final indices
        let mut totals: BTreeMap<&str, u64> = BTreeMap::new();
        // repository -> developer -> contributions
        let mut repos: BTreeMap<&str, BTreeMap<&str, u64>> = BTreeMap::new();
        let mut skipped = 0usize;

        for record in records {
            let dev = record.developer_id.as_str();
            *totals.entry(dev).or_insert(0) += record.contribution_count;
            if record.contribution_count < self.min_contribution_count {
                skipped += 1;
                continue;
            }
            *repos
                .entry(record.repository_id.as_str())
                .or_default()
                .entry(dev)
                .or_insert(0) += record.contribution_count;
        }

        let position: HashMap<&str, usize> =
            totals.keys().enumerate().map(|(i, &id)| (id, i)).collect();

        let mut weights: HashMap<(usize, usize), f64> = HashMap::new();
        let mut active_repos = 0usize;
        for (repo, devs) in &repos {
            if devs.len() < self.min_repository_developers.max(2) {
                continue;
            }
            active_repos += 1;
            let members: Vec<(usize, u64)> =
                devs.iter().map(|(dev, &count)| (position[dev], count)).collect();
            debug!(repository = %repo, developers = members.len(), "pairing co-contributors");
            for (a, &(i, count_i)) in members.iter().enumerate() {
                for &(j, count_j) in &members[a + 1..] {
                    *weights.entry((i, j)).or_insert(0.0) += self.strength.weight(count_i, count_j);
                }
            }
        }

        let developers: Vec<Developer> = totals
            .iter()
            .map(|(&id, &total)| Developer {
                id: id.to_string(),
                total_contributions: total,
            })
            .collect();
        let mut edges: Vec<(usize, usize, f64)> =
            weights.into_iter().map(|((i, j), w)| (i, j, w)).collect();
        edges.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        let graph = CollabGraph::from_parts(developers, &edges)?;
        info!(
            records = records.len(),
            skipped,
            repositories = repos.len(),
            active_repositories = active_repos,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "built collaboration graph"
        );
        Ok(graph)
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rec(dev: &str, repo: &str, count: u64) -> ContributionRecord {
        ContributionRecord::new(dev, repo, count)
    }

    #[test]
    fn test_shared_repositories_accumulate() -> Result<()> {
        let records = vec![
            rec("alice", "r1", 3),
            rec("bob", "r1", 1),
            rec("alice", "r2", 2),
            rec("bob", "r2", 5),
            rec("carol", "r2", 1),
        ];
        let graph = GraphBuilder::new().build(&records)?;
        let (a, b, c) = (
            graph.index_of("alice").unwrap(),
            graph.index_of("bob").unwrap(),
            graph.index_of("carol").unwrap(),
        );
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.weight(a, b), Some(2.0));
        assert_eq!(graph.weight(a, c), Some(1.0));
        assert_eq!(graph.weight(b, c), Some(1.0));
        assert_eq!(graph.developer(a).total_contributions, 5);
        Ok(())
    }

    #[test]
    fn test_min_contributions_strength() -> Result<()> {
        let records = vec![rec("alice", "r1", 3), rec("bob", "r1", 7), rec("bob", "r1", 1)];
        let graph = GraphBuilder::new()
            .with_strength(CoContributionStrength::MinContributions)
            .build(&records)?;
        // bob's duplicate records merge to 8; min(3, 8) = 3
        assert_eq!(graph.weight(0, 1), Some(3.0));
        Ok(())
    }

    #[test]
    fn test_empty_developer_id_is_malformed() {
        let records = vec![rec("alice", "r1", 1), rec("", "r1", 1)];
        let err = GraphBuilder::new().build(&records).unwrap_err();
        assert_eq!(
            err,
            Error::MalformedRecord {
                index: 1,
                field: "developer_id",
                reason: "is missing or empty".into()
            }
        );
    }

    #[test]
    fn test_zero_count_and_blank_repository_are_malformed() {
        assert!(GraphBuilder::new().build(&[rec("a", "r", 0)]).is_err());
        assert!(GraphBuilder::new().build(&[rec("a", "  ", 1)]).is_err());
    }

    #[test]
    fn test_below_threshold_records_keep_node_but_no_edges() -> Result<()> {
        let records = vec![rec("alice", "r1", 1), rec("bob", "r1", 5), rec("carol", "r1", 5)];
        let graph = GraphBuilder::new().with_min_contribution_count(2).build(&records)?;
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.neighbors(graph.index_of("alice").unwrap()).is_empty());
        Ok(())
    }

    #[test]
    fn test_ids_are_taken_verbatim() -> Result<()> {
        let records = vec![rec("alice", "r1", 1), rec(" alice", "r1", 1), rec("bob", "r1 ", 1)];
        let graph = GraphBuilder::new().build(&records)?;
        assert_eq!(graph.node_count(), 3);
        assert!(graph.index_of(" alice").is_some());
        // "r1" and "r1 " are different repositories
        let bob = graph.index_of("bob").unwrap();
        assert!(graph.neighbors(bob).is_empty());
        assert_eq!(graph.edge_count(), 1);
        Ok(())
    }

    #[test]
    fn test_solo_repository_produces_no_edges() -> Result<()> {
        let graph = GraphBuilder::new().build(&[rec("alice", "r1", 4)])?;
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.edge_count(), 0);
        Ok(())
    }

    proptest! {
        #[test]
        fn built_graph_has_no_self_loops_and_unique_pairs(
            raw in proptest::collection::vec((0u8..12, any::<bool>(), 0u8..6, 1u64..5), 1..80),
        ) {
            // a leading space makes a distinct developer
            let records: Vec<ContributionRecord> = raw
                .iter()
                .map(|&(d, padded, r, c)| {
                    let dev = if padded { format!(" dev{d}") } else { format!("dev{d}") };
                    rec(&dev, &format!("repo{r}"), c)
                })
                .collect();
            let graph = GraphBuilder::new().build(&records).unwrap();

            let mut seen = std::collections::HashSet::new();
            for (i, j, w) in graph.edges() {
                prop_assert!(i != j);
                prop_assert!(seen.insert((i, j)));
                // weight = number of shared repositories
                let repos_of = |dev: &str| -> std::collections::HashSet<String> {
                    records.iter().filter(|r| r.developer_id == dev).map(|r| r.repository_id.clone()).collect()
                };
                let shared = repos_of(graph.id(i)).intersection(&repos_of(graph.id(j))).count();
                prop_assert_eq!(w, shared as f64);
            }

            let distinct: std::collections::BTreeSet<&str> =
                records.iter().map(|r| r.developer_id.as_str()).collect();
            prop_assert_eq!(graph.node_count(), distinct.len());
        }
    }
}
