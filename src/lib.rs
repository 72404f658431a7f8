//! # fkscout
//!
//! Infers and validates primary/foreign key relationships in schemas that
//! declare none.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │          Metadata Provider (warehouse catalog)          │
//! │                (table, column) pairs                    │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [oracle]
//! ┌─────────────────────────────────────────────────────────┐
//! │     Key candidates (LLM / naming rules / fixed list)    │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [validate]
//! ┌─────────────────────────────────────────────────────────┐
//! │   Evidence: uniqueness, existence, reference counts     │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [acceptance]
//! ┌─────────────────────────────────────────────────────────┐
//! │              Mermaid erDiagram (+ HTML page)            │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Every stage checkpoints to CSV so runs can resume; see [`pipeline`].

pub mod checkpoint;
pub mod config;
pub mod diagram;
pub mod keys;
pub mod oracle;
pub mod pipeline;
pub mod sql;
pub mod validate;
pub mod warehouse;
pub mod worker;

pub use sql::Dialect;

/// Common imports.
pub mod prelude {
    pub use crate::checkpoint::CheckpointStore;
    pub use crate::config::Settings;
    pub use crate::diagram::{render_html, render_mermaid};
    pub use crate::keys::{
        AcceptedRelationship, CandidateKey, Catalog, ColumnRef, KeyCandidate, KeyType,
        ValidatedCandidate, ValidationEvidence,
    };
    pub use crate::oracle::{CandidateOracle, FixedOracle, LlmOracle, NamingOracle};
    pub use crate::pipeline::{Pipeline, PipelineError, PipelineOptions};
    pub use crate::sql::Dialect;
    pub use crate::validate::{AcceptanceConfig, AcceptanceFilter, KeyValidator, ValidatorConfig};
    pub use crate::warehouse::{KeyChecks, MetadataProvider, SqliteEngine, Warehouse};
}
