//! Candidate oracles.
//!
//! An oracle looks at column names only and guesses which columns are
//! primary and foreign keys. Its output is never trusted: the validator
//! checks every guess against the data.
//!
//! - [`LlmOracle`] - hosted language model via function calling
//! - [`NamingOracle`] - offline naming-convention heuristics
//! - [`FixedOracle`] - canned candidates for tests and replays

mod decode;
mod fixed;
pub mod inflection;
mod llm;
mod naming;

pub use decode::{columns_csv, decode_candidates};
pub use fixed::FixedOracle;
pub use llm::LlmOracle;
pub use naming::NamingOracle;

use async_trait::async_trait;

use crate::keys::{ColumnRef, KeyCandidate};

/// Result type for oracle calls.
pub type OracleResult<T> = Result<T, OracleError>;

/// Errors raised by an oracle.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    /// The oracle service cannot be reached.
    #[error("oracle unreachable: {0}")]
    Unreachable(String),

    #[error("oracle returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The service answered with an error payload.
    #[error("oracle API error: {0}")]
    Api(String),

    #[error("API key variable {0} is not set")]
    MissingApiKey(String),
}

impl OracleError {
    /// Whether no further oracle call can succeed.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Unreachable(_) | Self::MissingApiKey(_) => true,
            Self::Http { status, .. } => matches!(status, 401 | 403),
            Self::Api(_) => false,
        }
    }
}

/// Proposes key candidates from schema metadata.
#[async_trait]
pub trait CandidateOracle: Send + Sync {
    /// Guess primary keys across the whole schema.
    async fn propose_primary_keys(&self, columns: &[ColumnRef]) -> OracleResult<Vec<KeyCandidate>>;

    /// Guess foreign keys held by one table, given the primary keys found so far.
    async fn propose_foreign_keys(
        &self,
        table: &str,
        columns: &[String],
        known_primary_keys: &[KeyCandidate],
    ) -> OracleResult<Vec<KeyCandidate>>;
}
