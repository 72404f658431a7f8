//! Oracle that replays a fixed candidate list.

use async_trait::async_trait;

use super::{CandidateOracle, OracleResult};
use crate::keys::{ColumnRef, KeyCandidate};

/// Returns canned candidates: every primary candidate for the schema, and
/// the foreign candidates whose table matches the one asked about.
#[derive(Debug, Clone, Default)]
pub struct FixedOracle {
    candidates: Vec<KeyCandidate>,
}

impl FixedOracle {
    pub fn new(candidates: Vec<KeyCandidate>) -> Self {
        Self { candidates }
    }
}

#[async_trait]
impl CandidateOracle for FixedOracle {
    async fn propose_primary_keys(&self, _columns: &[ColumnRef]) -> OracleResult<Vec<KeyCandidate>> {
        Ok(self
            .candidates
            .iter()
            .filter(|c| c.is_primary())
            .cloned()
            .collect())
    }

    async fn propose_foreign_keys(
        &self,
        table: &str,
        _columns: &[String],
        _known_primary_keys: &[KeyCandidate],
    ) -> OracleResult<Vec<KeyCandidate>> {
        Ok(self
            .candidates
            .iter()
            .filter(|c| c.is_foreign() && c.table == table)
            .cloned()
            .collect())
    }
}
