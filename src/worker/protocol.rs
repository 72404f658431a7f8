//! Wire types for the connector protocol.
//!
//! One JSON object per line in each direction. A request names a method and
//! carries its parameters; the reply echoes the request id.
//!
//! ```text
//! → {"id":"…","method":"query.execute","params":{"driver":"bigquery","connection_string":"…","sql":"…","args":["orders"]}}
//! ← {"id":"…","success":true,"result":{"columns":[{"name":"n"}],"rows":[["4"]],"row_count":1}}
//! ← {"id":"…","success":false,"error":{"code":"QUERY_FAILED","message":"…"}}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::sql::BoundQuery;

/// Method names understood by connectors.
pub mod methods {
    pub const EXECUTE_QUERY: &str = "query.execute";
}

/// Error codes a connector may report. Unknown codes are kept verbatim.
pub mod codes {
    pub const DRIVER_NOT_FOUND: &str = "DRIVER_NOT_FOUND";
    pub const CONNECTION_FAILED: &str = "CONNECTION_FAILED";
    pub const AUTH_FAILED: &str = "AUTH_FAILED";
    pub const QUERY_FAILED: &str = "QUERY_FAILED";
    pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
    pub const METHOD_NOT_FOUND: &str = "METHOD_NOT_FOUND";
}

#[derive(Debug, Clone, Serialize)]
pub struct Request<'a> {
    pub id: &'a str,
    pub method: &'a str,
    pub params: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Reply {
    pub id: String,
    pub success: bool,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RemoteError>,
}

impl Reply {
    /// The result payload, or the connector's error.
    ///
    /// A failed reply without an error body is reported with code `UNKNOWN`.
    pub fn into_result(self) -> Result<Value, RemoteError> {
        if self.success {
            Ok(self.result.unwrap_or(Value::Null))
        } else {
            Err(self.error.unwrap_or_else(|| RemoteError {
                code: "UNKNOWN".to_string(),
                message: "connector reported failure without details".to_string(),
            }))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteError {
    pub code: String,
    pub message: String,
}

/// Which warehouse a query runs against. Sent with every request; the
/// connector owns pooling and authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionParams {
    pub driver: String,
    pub connection_string: String,
}

/// Parameters for `query.execute`.
#[derive(Debug, Clone, Serialize)]
pub struct QueryParams<'a> {
    #[serde(flatten)]
    pub connection: &'a ConnectionParams,
    pub sql: &'a str,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    pub args: &'a [String],
}

impl<'a> QueryParams<'a> {
    pub fn new(connection: &'a ConnectionParams, query: &'a BoundQuery) -> Self {
        Self {
            connection,
            sql: &query.sql,
            args: &query.args,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResultColumn {
    pub name: String,
    #[serde(default)]
    pub data_type: Option<String>,
}

/// Result of `query.execute`. Cells are left as JSON; counts arrive as
/// numbers or numeric strings depending on the driver.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryResult {
    #[serde(default)]
    pub columns: Vec<ResultColumn>,
    pub rows: Vec<Vec<Value>>,
    #[serde(default)]
    pub row_count: Option<u64>,
}
