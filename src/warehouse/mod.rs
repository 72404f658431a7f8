//! Warehouse access: metadata listing and key probes.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          Warehouse                              │
//! │  MetadataProvider            │  KeyChecks                       │
//! │  - list_columns()            │  - uniqueness()                  │
//! │                              │  - column_exists()               │
//! │                              │  - reference_counts()            │
//! │        (queries built by ProbeBuilder, allow-listed by Catalog) │
//! └─────────────────────────────────────────────────────────────────┘
//!                           │
//!                           ▼ QueryEngine
//! ┌──────────────────────────────┐  ┌──────────────────────────────┐
//! │ SqliteEngine (rusqlite)      │  │ WorkerEngine (NDJSON child)  │
//! └──────────────────────────────┘  └──────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use fkscout::warehouse::{MetadataProvider, SqliteEngine, Warehouse};
//!
//! let engine = SqliteEngine::open("./shop.db")?;
//! let mut warehouse = Warehouse::new(Arc::new(engine), "main")?;
//! let columns = warehouse.load_catalog().await?;
//! let (records, unique) = warehouse.uniqueness("customers", "id").await?;
//! ```

mod engine;
mod error;
mod provider;
mod sqlite;
mod worker_engine;

pub use engine::{QueryEngine, Row};
pub use error::{WarehouseError, WarehouseResult};
pub use provider::{KeyChecks, MetadataProvider, Warehouse};
pub use sqlite::SqliteEngine;
pub use worker_engine::WorkerEngine;
