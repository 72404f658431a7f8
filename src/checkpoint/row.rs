//! Flat CSV form of a validated candidate.

use serde::{Deserialize, Serialize};

use crate::keys::{KeyCandidate, KeyType, ValidatedCandidate, ValidationEvidence};

/// One line of `validation.csv`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRow {
    pub table_name: String,
    pub column_name: String,
    pub key_type: KeyType,
    pub referenced_table: Option<String>,
    pub referenced_column: Option<String>,
    pub records: Option<u64>,
    pub unique_records: Option<u64>,
    pub exists: Option<u64>,
    pub valid_references: Option<u64>,
    pub invalid_references: Option<u64>,
}

impl From<&ValidatedCandidate> for ValidationRow {
    fn from(row: &ValidatedCandidate) -> Self {
        let c = &row.candidate;
        let e = &row.evidence;
        Self {
            table_name: c.table.clone(),
            column_name: c.column.clone(),
            key_type: c.key_type,
            referenced_table: c.referenced_table.clone(),
            referenced_column: c.referenced_column.clone(),
            records: e.records,
            unique_records: e.unique_records,
            exists: e.exists,
            valid_references: e.valid_references,
            invalid_references: e.invalid_references,
        }
    }
}

impl From<ValidationRow> for ValidatedCandidate {
    fn from(row: ValidationRow) -> Self {
        let candidate = KeyCandidate {
            table: row.table_name,
            column: row.column_name,
            key_type: row.key_type,
            referenced_table: row.referenced_table,
            referenced_column: row.referenced_column,
        };
        let evidence = ValidationEvidence {
            records: row.records,
            unique_records: row.unique_records,
            exists: row.exists,
            valid_references: row.valid_references,
            invalid_references: row.invalid_references,
        };
        ValidatedCandidate::new(candidate, evidence)
    }
}
