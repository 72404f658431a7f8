//! The key validator.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};

use crate::keys::{CandidateKey, KeyCandidate, ValidatedCandidate, ValidationEvidence};
use crate::warehouse::{KeyChecks, WarehouseError, WarehouseResult};

pub const DEFAULT_MAX_IN_FLIGHT: usize = 8;
pub const MAX_IN_FLIGHT_LIMIT: usize = 64;
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(60);

/// Errors that abort a validation batch.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("lost connection to the warehouse: {0}")]
    Connectivity(#[source] WarehouseError),
}

/// Validator tuning.
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    /// Candidates checked concurrently. Clamped to `1..=64`.
    pub max_in_flight: usize,
    /// Deadline for each individual query.
    pub query_timeout: Duration,
    /// Child column names whose foreign candidates are dropped up front
    /// (case-insensitive).
    pub exclude_foreign_columns: Vec<String>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            exclude_foreign_columns: Vec::new(),
        }
    }
}

impl From<&crate::config::ValidationSettings> for ValidatorConfig {
    fn from(settings: &crate::config::ValidationSettings) -> Self {
        Self {
            max_in_flight: settings.max_in_flight,
            query_timeout: Duration::from_secs(settings.query_timeout_secs),
            exclude_foreign_columns: settings.exclude_foreign_columns.clone(),
        }
    }
}

/// Receives each candidate as soon as its checks finish.
///
/// Rows arrive in completion order, not input order. Rows reused from a
/// previous run are not reported again.
pub trait ValidationObserver: Send {
    fn on_validated(&mut self, row: &ValidatedCandidate);
}

/// Attaches empirical evidence to key candidates.
pub struct KeyValidator {
    checks: Arc<dyn KeyChecks>,
    config: ValidatorConfig,
}

impl KeyValidator {
    pub fn new(checks: Arc<dyn KeyChecks>, config: ValidatorConfig) -> Self {
        Self { checks, config }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Validate every candidate, returning rows in input order.
    pub async fn validate(
        &self,
        candidates: Vec<KeyCandidate>,
    ) -> Result<Vec<ValidatedCandidate>, ValidationError> {
        self.validate_resuming(candidates, &[], None).await
    }

    /// Validate, reusing evidence from `previous` where the candidate
    /// identity matches and reporting fresh rows to `observer`.
    ///
    /// A previous row is only reused when it is complete; a row with a gap
    /// left by a failed sub-check is validated again from scratch.
    ///
    /// Only connectivity failures stop the batch; any rows already handed
    /// to the observer stay reported.
    pub async fn validate_resuming(
        &self,
        candidates: Vec<KeyCandidate>,
        previous: &[ValidatedCandidate],
        mut observer: Option<&mut dyn ValidationObserver>,
    ) -> Result<Vec<ValidatedCandidate>, ValidationError> {
        let candidates = self.apply_exclusions(candidates);

        let known: HashMap<CandidateKey, ValidationEvidence> = previous
            .iter()
            .filter(|row| row.is_complete())
            .map(|row| (row.candidate.key(), row.evidence))
            .collect();

        let mut slots: Vec<Option<ValidationEvidence>> = candidates
            .iter()
            .map(|c| known.get(&c.key()).copied())
            .collect();

        let pending: Vec<usize> = slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_none())
            .map(|(i, _)| i)
            .collect();

        let reused = candidates.len() - pending.len();
        tracing::info!(
            total = candidates.len(),
            reused,
            pending = pending.len(),
            "validating candidates"
        );

        let in_flight = self.config.max_in_flight.clamp(1, MAX_IN_FLIGHT_LIMIT);
        let candidates_ref = &candidates;
        let mut results = stream::iter(pending)
            .map(|index| async move { (index, self.check(&candidates_ref[index]).await) })
            .buffer_unordered(in_flight);

        while let Some((index, outcome)) = results.next().await {
            let evidence = outcome.map_err(ValidationError::Connectivity)?;
            let row = ValidatedCandidate::new(candidates[index].clone(), evidence);
            tracing::info!(candidate = %row.candidate, evidence = ?row.evidence, "validated");
            if let Some(observer) = observer.as_deref_mut() {
                observer.on_validated(&row);
            }
            slots[index] = Some(evidence);
        }
        drop(results);

        Ok(candidates
            .into_iter()
            .zip(slots)
            .map(|(candidate, evidence)| ValidatedCandidate::new(candidate, evidence.unwrap_or_default()))
            .collect())
    }

    fn apply_exclusions(&self, candidates: Vec<KeyCandidate>) -> Vec<KeyCandidate> {
        if self.config.exclude_foreign_columns.is_empty() {
            return candidates;
        }
        candidates
            .into_iter()
            .filter(|c| {
                let excluded = c.is_foreign()
                    && self
                        .config
                        .exclude_foreign_columns
                        .iter()
                        .any(|name| name.eq_ignore_ascii_case(&c.column));
                if excluded {
                    tracing::info!(candidate = %c, "excluded by column name");
                }
                !excluded
            })
            .collect()
    }

    /// Run the sub-checks for one candidate. Only fatal errors escape.
    async fn check(&self, candidate: &KeyCandidate) -> WarehouseResult<ValidationEvidence> {
        let mut evidence = ValidationEvidence::default();

        if candidate.is_primary() {
            let outcome = self
                .timed(self.checks.uniqueness(&candidate.table, &candidate.column))
                .await;
            if let Some((records, unique)) = recover(outcome, candidate, "uniqueness")? {
                evidence.set_uniqueness(records, unique);
            }
        }

        if let Some((table, column)) = candidate.existence_target() {
            let outcome = self.timed(self.checks.column_exists(table, column)).await;
            if let Some(exists) = recover(outcome, candidate, "existence")? {
                evidence.set_exists(exists);
            }
        }

        if let Some((parent_table, parent_column)) = candidate.reference() {
            let outcome = self
                .timed(self.checks.reference_counts(
                    &candidate.table,
                    &candidate.column,
                    parent_table,
                    parent_column,
                ))
                .await;
            if let Some((valid, invalid)) = recover(outcome, candidate, "references")? {
                evidence.set_references(valid, invalid);
            }
        } else if candidate.is_foreign() {
            tracing::debug!(candidate = %candidate, "no referenced column; skipping reference check");
        }

        Ok(evidence)
    }

    async fn timed<T>(&self, check: impl Future<Output = WarehouseResult<T>>) -> WarehouseResult<T> {
        let limit = self.config.query_timeout;
        tokio::time::timeout(limit, check)
            .await
            .unwrap_or(Err(WarehouseError::Timeout(limit)))
    }
}

/// Turn a non-fatal failure into missing evidence.
fn recover<T>(
    outcome: WarehouseResult<T>,
    candidate: &KeyCandidate,
    check: &'static str,
) -> WarehouseResult<Option<T>> {
    match outcome {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            tracing::warn!(candidate = %candidate, check, error = %e, "check failed");
            Ok(None)
        }
    }
}
