use std::io;
use std::time::Duration;

use super::protocol::{codes, RemoteError};

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("failed to start connector: {0}")]
    Spawn(#[source] io::Error),

    #[error("failed to write to connector: {0}")]
    Write(#[source] io::Error),

    #[error("failed to encode request: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode connector result: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("connector did not answer within {0:?}")]
    Timeout(Duration),

    /// The connector closed its stdout; every outstanding request fails.
    #[error("connector exited")]
    Exited,

    #[error("connector driver not found: {0}")]
    DriverNotFound(String),

    #[error("warehouse connection failed: {0}")]
    ConnectionFailed(String),

    /// The warehouse rejected one query (unknown table, permission, ...).
    #[error("query failed: {0}")]
    QueryFailed(String),

    #[error("connector rejected request: {0}")]
    InvalidRequest(String),

    #[error("connector does not support method: {0}")]
    MethodNotFound(String),

    #[error("connector error {code}: {message}")]
    Remote { code: String, message: String },
}

impl WorkerError {
    /// Whether the warehouse is unreachable, as opposed to one query failing.
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            Self::Spawn(_)
                | Self::Write(_)
                | Self::Exited
                | Self::DriverNotFound(_)
                | Self::ConnectionFailed(_)
                | Self::MethodNotFound(_)
        )
    }
}

impl From<RemoteError> for WorkerError {
    fn from(e: RemoteError) -> Self {
        let RemoteError { code, message } = e;
        match code.as_str() {
            codes::DRIVER_NOT_FOUND => Self::DriverNotFound(message),
            codes::CONNECTION_FAILED | codes::AUTH_FAILED => Self::ConnectionFailed(message),
            codes::QUERY_FAILED => Self::QueryFailed(message),
            codes::INVALID_REQUEST => Self::InvalidRequest(message),
            codes::METHOD_NOT_FOUND => Self::MethodNotFound(message),
            _ => Self::Remote { code, message },
        }
    }
}
