//! Query engine backed by an external warehouse connector.

use std::sync::Arc;

use async_trait::async_trait;

use super::engine::{QueryEngine, Row};
use super::error::WarehouseResult;
use crate::sql::{BoundQuery, Dialect};
use crate::worker::protocol::ConnectionParams;
use crate::worker::WorkerClient;

/// QueryEngine that forwards SQL to a connector process.
///
/// # Example
///
/// ```ignore
/// let client = WorkerClient::spawn("./bq-connector").await?;
/// let engine = WorkerEngine::new(Arc::new(client), "bigquery", "project=acme", Dialect::BigQuery);
/// ```
pub struct WorkerEngine {
    client: Arc<WorkerClient>,
    connection: ConnectionParams,
    dialect: Dialect,
}

impl WorkerEngine {
    pub fn new(
        client: Arc<WorkerClient>,
        driver: impl Into<String>,
        connection_string: impl Into<String>,
        dialect: Dialect,
    ) -> Self {
        Self {
            client,
            connection: ConnectionParams {
                driver: driver.into(),
                connection_string: connection_string.into(),
            },
            dialect,
        }
    }

    pub fn driver(&self) -> &str {
        &self.connection.driver
    }
}

#[async_trait]
impl QueryEngine for WorkerEngine {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    async fn fetch(&self, query: &BoundQuery) -> WarehouseResult<Vec<Row>> {
        let result = self.client.execute_query(&self.connection, query).await?;
        if let Some(reported) = result.row_count {
            if reported != result.rows.len() as u64 {
                tracing::debug!(reported, received = result.rows.len(), "connector row count mismatch");
            }
        }
        Ok(result.rows)
    }
}
