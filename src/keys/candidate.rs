//! Key candidates proposed by an oracle.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of key a candidate claims to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    Primary,
    Foreign,
}

impl KeyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::Primary => "primary",
            KeyType::Foreign => "foreign",
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "primary" | "pk" | "primary_key" => Ok(KeyType::Primary),
            "foreign" | "fk" | "foreign_key" => Ok(KeyType::Foreign),
            other => Err(format!("unknown key type: {other}")),
        }
    }
}

/// An unverified key guess.
///
/// Nothing about a candidate is trusted: the referenced table may not exist,
/// the reference may point back at the candidate itself, and the same guess
/// may appear more than once in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyCandidate {
    /// Table holding the column under test.
    #[serde(rename = "table_name")]
    pub table: String,
    /// Column under test.
    #[serde(rename = "column_name")]
    pub column: String,
    /// Claimed key kind.
    pub key_type: KeyType,
    /// Parent table (foreign candidates only).
    #[serde(default)]
    pub referenced_table: Option<String>,
    /// Parent column (foreign candidates only).
    #[serde(default)]
    pub referenced_column: Option<String>,
}

impl KeyCandidate {
    /// Create a primary key candidate.
    pub fn primary(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            key_type: KeyType::Primary,
            referenced_table: None,
            referenced_column: None,
        }
    }

    /// Create a foreign key candidate.
    pub fn foreign(
        table: impl Into<String>,
        column: impl Into<String>,
        referenced_table: impl Into<String>,
        referenced_column: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
            key_type: KeyType::Foreign,
            referenced_table: Some(referenced_table.into()),
            referenced_column: Some(referenced_column.into()),
        }
    }

    pub fn is_primary(&self) -> bool {
        self.key_type == KeyType::Primary
    }

    pub fn is_foreign(&self) -> bool {
        self.key_type == KeyType::Foreign
    }

    /// The referenced `(table, column)` pair, when this is a foreign candidate
    /// with both sides present and non-blank.
    pub fn reference(&self) -> Option<(&str, &str)> {
        if !self.is_foreign() {
            return None;
        }
        let table = non_blank(self.referenced_table.as_deref())?;
        let column = non_blank(self.referenced_column.as_deref())?;
        Some((table, column))
    }

    /// The `(table, column)` pair whose existence should be confirmed.
    ///
    /// Primary candidates test themselves. Foreign candidates test the
    /// referenced side, since the child side came from the metadata provider.
    pub fn existence_target(&self) -> Option<(&str, &str)> {
        match self.key_type {
            KeyType::Primary => Some((self.table.as_str(), self.column.as_str())),
            KeyType::Foreign => self.reference(),
        }
    }

    /// Identity used to key evidence and to resume partial runs.
    pub fn key(&self) -> CandidateKey {
        CandidateKey {
            table: self.table.clone(),
            column: self.column.clone(),
            key_type: self.key_type,
            referenced_table: non_blank(self.referenced_table.as_deref()).map(str::to_string),
            referenced_column: non_blank(self.referenced_column.as_deref()).map(str::to_string),
        }
    }
}

impl fmt::Display for KeyCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}.{}", self.key_type, self.table, self.column)?;
        if self.is_foreign() {
            write!(
                f,
                " -> {}.{}",
                self.referenced_table.as_deref().unwrap_or("?"),
                self.referenced_column.as_deref().unwrap_or("?")
            )?;
        }
        Ok(())
    }
}

/// Normalised candidate identity; blank references compare equal to absent ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CandidateKey {
    pub table: String,
    pub column: String,
    pub key_type: KeyType,
    pub referenced_table: Option<String>,
    pub referenced_column: Option<String>,
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.filter(|v| !v.trim().is_empty())
}
