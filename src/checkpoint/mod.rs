//! Stage checkpoints.
//!
//! Each pipeline stage writes its output as a CSV file in the checkpoint
//! directory so a later run can pick up where it stopped:
//!
//! ```text
//! schema.csv       table_name,column_name
//! candidates.csv   table_name,column_name,key_type,referenced_table,referenced_column
//! validation.csv   candidate fields + records,unique_records,exists,
//!                  valid_references,invalid_references
//! diagram.mmd      Mermaid source
//! diagram.html     Mermaid page
//! ```
//!
//! Absent values are written as empty cells and read back as absent.

mod error;
mod row;
mod store;

pub use error::{CheckpointError, CheckpointResult};
pub use row::ValidationRow;
pub use store::{CheckpointStore, ValidationWriter};

pub const SCHEMA_FILE: &str = "schema.csv";
pub const CANDIDATES_FILE: &str = "candidates.csv";
pub const VALIDATION_FILE: &str = "validation.csv";
pub const DIAGRAM_FILE: &str = "diagram.mmd";
pub const HTML_FILE: &str = "diagram.html";
