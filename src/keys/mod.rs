//! Key inference data model.
//!
//! Types shared by every stage of the pipeline:
//!
//! ```text
//! ColumnRef ──[oracle]──▶ KeyCandidate ──[validator]──▶ ValidatedCandidate
//!                                                             │
//!                                                   [acceptance filter]
//!                                                             ▼
//!                                                   AcceptedRelationship
//! ```

mod candidate;
mod column;
mod evidence;

pub use candidate::{CandidateKey, KeyCandidate, KeyType};
pub use column::{Catalog, ColumnRef};
pub use evidence::{AcceptedRelationship, ValidatedCandidate, ValidationEvidence};
