//! Warehouse error types.

use std::time::Duration;

use crate::sql::ProbeError;
use crate::worker::WorkerError;

/// Result type for warehouse operations.
pub type WarehouseResult<T> = Result<T, WarehouseError>;

/// Errors raised while talking to a warehouse.
#[derive(Debug, thiserror::Error)]
pub enum WarehouseError {
    /// The warehouse cannot be reached at all.
    #[error("warehouse unreachable: {0}")]
    Unreachable(String),

    /// A single query was rejected.
    #[error("query failed: {0}")]
    Query(String),

    /// The query could not be built (unknown identifier, bad dataset name).
    #[error(transparent)]
    Probe(#[from] ProbeError),

    /// A single query exceeded its deadline.
    #[error("query timed out after {0:?}")]
    Timeout(Duration),

    /// The result set did not have the expected shape.
    #[error("unexpected result: {0}")]
    UnexpectedResult(String),

    #[error(transparent)]
    Worker(#[from] WorkerError),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl WarehouseError {
    /// Whether this failure means no further query can succeed.
    ///
    /// Fatal errors abort a validation batch; everything else is recorded as
    /// missing evidence for the candidate that triggered it.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Unreachable(_) => true,
            Self::Worker(e) => e.is_connectivity(),
            Self::Sqlite(rusqlite::Error::SqliteFailure(e, _)) => matches!(
                e.code,
                rusqlite::ErrorCode::CannotOpen
                    | rusqlite::ErrorCode::NotADatabase
                    | rusqlite::ErrorCode::DatabaseCorrupt
            ),
            _ => false,
        }
    }
}
