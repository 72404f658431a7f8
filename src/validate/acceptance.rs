//! Acceptance policy over validation evidence.

use std::collections::HashSet;

use crate::keys::{AcceptedRelationship, ValidatedCandidate};

pub const DEFAULT_THRESHOLD: f64 = 0.1;

/// Rejected acceptance threshold.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
#[error("acceptance threshold must lie in [0, 1], got {0}")]
pub struct ThresholdError(pub f64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcceptanceConfig {
    /// Match ratio a relationship must strictly exceed.
    pub threshold: f64,
    /// Also require the referenced column to be a plausible primary key.
    pub require_unique_parent: bool,
}

impl Default for AcceptanceConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            require_unique_parent: false,
        }
    }
}

/// `unique_records == records` on a primary candidate, with both present.
pub fn is_plausible_primary_key(row: &ValidatedCandidate) -> bool {
    row.candidate.is_primary() && row.evidence.is_unique()
}

/// Decides which foreign candidates become diagram relationships.
///
/// A foreign candidate is accepted when its referenced column exists
/// (`exists == 1`), both reference counts are present with a non-zero total,
/// and `valid / (valid + invalid) > threshold`. Anything short of that is
/// excluded, never an error.
#[derive(Debug, Clone, Default)]
pub struct AcceptanceFilter {
    config: AcceptanceConfig,
}

impl AcceptanceFilter {
    pub fn new(config: AcceptanceConfig) -> Result<Self, ThresholdError> {
        if !(0.0..=1.0).contains(&config.threshold) {
            return Err(ThresholdError(config.threshold));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &AcceptanceConfig {
        &self.config
    }

    pub fn accept(&self, rows: &[ValidatedCandidate]) -> Vec<AcceptedRelationship> {
        let unique_parents: HashSet<(&str, &str)> = if self.config.require_unique_parent {
            self.plausible_primary_keys(rows)
                .into_iter()
                .map(|row| (row.candidate.table.as_str(), row.candidate.column.as_str()))
                .collect()
        } else {
            HashSet::new()
        };

        let accepted: Vec<_> = rows
            .iter()
            .filter_map(|row| {
                let (parent_table, parent_column) = row.candidate.reference()?;
                if row.evidence.exists != Some(1) {
                    return None;
                }
                let ratio = row.evidence.match_ratio()?;
                if ratio <= self.config.threshold {
                    return None;
                }
                if self.config.require_unique_parent
                    && !unique_parents.contains(&(parent_table, parent_column))
                {
                    tracing::debug!(candidate = %row.candidate, "parent is not a plausible primary key");
                    return None;
                }
                Some(AcceptedRelationship {
                    table: row.candidate.table.clone(),
                    column: row.candidate.column.clone(),
                    referenced_table: parent_table.to_string(),
                    referenced_column: parent_column.to_string(),
                    evidence: row.evidence,
                    match_ratio: ratio,
                })
            })
            .collect();

        tracing::info!(
            candidates = rows.len(),
            accepted = accepted.len(),
            threshold = self.config.threshold,
            "acceptance filter applied"
        );
        accepted
    }

    /// Primary candidates whose column turned out to be unique.
    pub fn plausible_primary_keys<'a>(&self, rows: &'a [ValidatedCandidate]) -> Vec<&'a ValidatedCandidate> {
        rows.iter().filter(|row| is_plausible_primary_key(row)).collect()
    }
}
