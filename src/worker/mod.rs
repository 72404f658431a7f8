//! Client for external warehouse connectors.
//!
//! Cloud warehouses (BigQuery, Snowflake, ...) are reached through a
//! connector process that owns the vendor SDK and credentials. fkscout
//! starts it as a child and speaks NDJSON over its stdin/stdout:
//!
//! ```text
//!  fkscout                                   connector
//! ┌──────────────────────┐   request line   ┌──────────────────────┐
//! │ WorkerClient         │ ───────────────▶ │ query.execute        │
//! │  waiters[id] ◀─ rx   │ ◀─────────────── │                      │
//! └──────────────────────┘    reply line    └──────────────────────┘
//! ```
//!
//! Replies may arrive in any order; each is matched to its caller by id.
//!
//! ```ignore
//! let client = WorkerClient::spawn("./bq-connector").await?;
//! let result = client.execute_query(&connection, &query).await?;
//! ```

mod client;
mod error;
pub mod protocol;

pub use client::WorkerClient;
pub use error::{WorkerError, WorkerResult};
