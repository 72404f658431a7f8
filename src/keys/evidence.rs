//! Empirical evidence attached to candidates.

use serde::{Deserialize, Serialize};

use super::KeyCandidate;

/// Results of the validation sub-checks for one candidate.
///
/// Every field stays `None` until the sub-check that produces it succeeds.
/// Paired fields (`records`/`unique_records`, `valid_references`/
/// `invalid_references`) are only ever written together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationEvidence {
    /// Total rows in the candidate's table (primary candidates).
    pub records: Option<u64>,
    /// Distinct values of the candidate column (primary candidates).
    pub unique_records: Option<u64>,
    /// Catalog rows confirming the tested column exists (0 or 1).
    pub exists: Option<u64>,
    /// Child rows whose value matched a parent row (foreign candidates).
    pub valid_references: Option<u64>,
    /// Child rows with no parent match, NULL keys included (foreign candidates).
    pub invalid_references: Option<u64>,
}

impl ValidationEvidence {
    pub fn set_uniqueness(&mut self, records: u64, unique_records: u64) {
        self.records = Some(records);
        self.unique_records = Some(unique_records);
    }

    pub fn set_exists(&mut self, exists: u64) {
        self.exists = Some(exists);
    }

    pub fn set_references(&mut self, valid: u64, invalid: u64) {
        self.valid_references = Some(valid);
        self.invalid_references = Some(invalid);
    }

    /// Whether any sub-check produced a value.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Matched fraction of child rows, or `None` when either count is
    /// missing or there are no child rows at all.
    pub fn match_ratio(&self) -> Option<f64> {
        let valid = self.valid_references?;
        let invalid = self.invalid_references?;
        let total = valid.checked_add(invalid)?;
        if total == 0 {
            return None;
        }
        Some(valid as f64 / total as f64)
    }

    /// `unique_records == records`, with both present.
    pub fn is_unique(&self) -> bool {
        matches!((self.records, self.unique_records), (Some(r), Some(u)) if r == u)
    }
}

/// A candidate paired with the evidence gathered for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedCandidate {
    pub candidate: KeyCandidate,
    pub evidence: ValidationEvidence,
}

impl ValidatedCandidate {
    pub fn new(candidate: KeyCandidate, evidence: ValidationEvidence) -> Self {
        Self {
            candidate,
            evidence,
        }
    }

    /// Whether every sub-check that applies to the candidate produced a value.
    ///
    /// Uniqueness applies to primary candidates, existence to anything with
    /// an existence target, and reference counts to foreign candidates with
    /// a full reference.
    pub fn is_complete(&self) -> bool {
        let c = &self.candidate;
        let e = &self.evidence;
        let uniqueness = !c.is_primary() || (e.records.is_some() && e.unique_records.is_some());
        let existence = c.existence_target().is_none() || e.exists.is_some();
        let references = c.reference().is_none()
            || (e.valid_references.is_some() && e.invalid_references.is_some());
        uniqueness && existence && references
    }
}

/// A foreign key candidate that passed the acceptance filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AcceptedRelationship {
    /// Child table.
    pub table: String,
    /// Child column.
    pub column: String,
    /// Parent table.
    pub referenced_table: String,
    /// Parent column.
    pub referenced_column: String,
    pub evidence: ValidationEvidence,
    /// `valid / (valid + invalid)`.
    pub match_ratio: f64,
}
