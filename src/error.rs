// ⚠️ Error Taxonomy
// Malformed rows are recovered locally; load and config failures are terminal.

use crate::schema::Field;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// MALFORMED RECORDS (recovered, counted)
// ============================================================================

/// Why a single row was skipped during load
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum MalformedReason {
    /// Name cell is empty (or missing on a short row)
    MissingName,
    /// Start-year cell is empty
    MissingStartYear,
    /// Start-year cell has no four-digit year in it
    UnparseableStartYear(String),
    /// End-year cell is non-empty but has no four-digit year in it
    UnparseableEndYear(String),
    /// End year does not come after the start year
    EmptyInterval { start_year: i32, end_year: i32 },
    /// Kind cell is not a recognised membership kind
    UnknownKind(String),
    /// Row could not be decoded (e.g. invalid UTF-8)
    Unreadable(String),
}

impl std::fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingName => write!(f, "missing entity name"),
            Self::MissingStartYear => write!(f, "missing start year"),
            Self::UnparseableStartYear(raw) => write!(f, "no year found in start year {raw:?}"),
            Self::UnparseableEndYear(raw) => write!(f, "no year found in end year {raw:?}"),
            Self::EmptyInterval {
                start_year,
                end_year,
            } => write!(f, "end year {end_year} is not after start year {start_year}"),
            Self::UnknownKind(raw) => write!(f, "unknown membership kind {raw:?}"),
            Self::Unreadable(msg) => write!(f, "unreadable row: {msg}"),
        }
    }
}

/// A row that was skipped during load. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("line {line}: {reason}")]
pub struct MalformedRecordError {
    /// 1-indexed source line (header is line 1)
    pub line: usize,
    pub reason: MalformedReason,
}

// ============================================================================
// LOAD FAILURES (terminal)
// ============================================================================

/// A required field the table headers did not provide
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingColumn {
    pub field: Field,
    pub accepted: Vec<String>,
}

impl std::fmt::Display for MissingColumn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (expected one of: {})", self.field.name(), self.accepted.join(", "))
    }
}

/// The membership table could not be loaded at all
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open membership table {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to read membership table: {0}")]
    Read(#[from] csv::Error),

    #[error("membership table has no header row; expected headers like {expected}")]
    MissingHeaders { expected: String },

    #[error("membership table is missing required column(s): {}", format_missing(.missing))]
    MissingColumns { missing: Vec<MissingColumn> },
}

fn format_missing(missing: &[MissingColumn]) -> String {
    missing
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// ============================================================================
// CONFIGURATION ERRORS
// ============================================================================

/// Invalid alias / succession / column declarations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("alias key {key:?} is claimed by both {first:?} and {second:?}")]
    AliasConflict {
        key: String,
        first: String,
        second: String,
    },

    #[error("alias declaration for {canonical:?} normalizes to an empty key")]
    EmptyAlias { canonical: String },

    #[error("succession rule for {predecessor:?} has no successors")]
    EmptySuccession { predecessor: String },

    #[error("succession rule for {predecessor:?} is declared more than once")]
    DuplicateSuccession { predecessor: String },

    #[error(
        "{predecessor:?} and {successor:?} are declared both as aliases and as a succession"
    )]
    RelationshipConflict {
        predecessor: String,
        successor: String,
    },

    #[error("abbreviation {abbreviation:?} expands to {expansion:?}, which contains another abbreviation")]
    AbbreviationChain {
        abbreviation: String,
        expansion: String,
    },

    #[error("header alias {alias:?} is assigned to both {first} and {second}")]
    DuplicateHeaderAlias {
        alias: String,
        first: &'static str,
        second: &'static str,
    },

    #[error("required field {field} has no accepted header aliases")]
    NoHeaderAliases { field: &'static str },
}
