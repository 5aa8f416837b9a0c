// 🗂️ Membership Interval Store
// Immutable membership records, loaded once, queried by year.
//
// Each record is a half-open interval [start_year, end_year).
// An open end (None) means the membership never ended.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Human date formats seen in the joined-date column
const JOINED_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d %B %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d.%m.%Y",
    "%m/%d/%Y",
];

// ============================================================================
// MEMBERSHIP KIND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MembershipKind {
    /// Full member (voting)
    #[default]
    Full,

    /// Associate member (territories, non-sovereign entities)
    Associate,
}

impl MembershipKind {
    /// Parse a kind cell. Empty cells are not handled here.
    pub fn parse(raw: &str) -> Option<Self> {
        let cleaned = raw
            .trim()
            .to_lowercase()
            .replace('.', "")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        match cleaned.as_str() {
            "full" | "member" | "full member" | "m" => Some(MembershipKind::Full),
            "associate" | "assoc" | "associate member" | "assoc member" | "a" => {
                Some(MembershipKind::Associate)
            }
            _ => None,
        }
    }

    /// Suffix appended to roster labels
    pub fn label_suffix(&self) -> &'static str {
        match self {
            MembershipKind::Full => "",
            MembershipKind::Associate => " (Assoc. member)",
        }
    }
}

// ============================================================================
// MEMBERSHIP RECORD
// ============================================================================

/// One row of a membership table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipRecord {
    /// Raw entity name, as given in the source table
    pub entity_name: String,

    /// First year of membership (inclusive)
    pub start_year: i32,

    /// Year membership ended (exclusive); None = open-ended
    pub end_year: Option<i32>,

    /// Human-readable join date ("28 March 1947")
    pub joined_date: Option<String>,

    /// Free-text note
    pub note: Option<String>,

    pub kind: MembershipKind,

    /// Source line (1-indexed, header = line 1); 0 when built in code
    #[serde(default)]
    pub line: usize,
}

impl MembershipRecord {
    /// Open-ended full membership
    pub fn new(entity_name: impl Into<String>, start_year: i32) -> Self {
        MembershipRecord {
            entity_name: entity_name.into(),
            start_year,
            end_year: None,
            joined_date: None,
            note: None,
            kind: MembershipKind::Full,
            line: 0,
        }
    }

    /// Builder: close the interval
    pub fn ending(mut self, end_year: i32) -> Self {
        self.end_year = Some(end_year);
        self
    }

    /// Builder: add join date
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.joined_date = Some(date.into());
        self
    }

    /// Builder: add note
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Builder: set membership kind
    pub fn with_kind(mut self, kind: MembershipKind) -> Self {
        self.kind = kind;
        self
    }

    /// Does [start_year, end_year) contain `year`?
    pub fn contains(&self, year: i32) -> bool {
        self.start_year <= year && self.end_year.map_or(true, |end| year < end)
    }

    /// Length of the interval in years; None when open-ended
    pub fn span(&self) -> Option<i32> {
        self.end_year.map(|end| end.saturating_sub(self.start_year))
    }

    /// Join date parsed, when it is in a recognised format
    pub fn joined_on(&self) -> Option<NaiveDate> {
        let raw = self.joined_date.as_deref()?.trim();
        JOINED_DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
    }
}

// ============================================================================
// INTERVAL STORE
// ============================================================================

/// Ordered, read-only collection of membership records
///
/// Records are sorted by start year; rows sharing a start year keep their
/// load order. Queries are linear scans: tables are tens to low hundreds of
/// rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntervalStore {
    records: Vec<MembershipRecord>,
}

impl IntervalStore {
    pub fn new() -> Self {
        IntervalStore {
            records: Vec::new(),
        }
    }

    /// Build from already-validated records
    pub fn from_records(mut records: Vec<MembershipRecord>) -> Self {
        records.sort_by_key(|r| r.start_year);
        IntervalStore { records }
    }

    /// Merge another table (e.g. associate members) into this one
    pub fn extend(&mut self, other: IntervalStore) {
        self.records.extend(other.records);
        self.records.sort_by_key(|r| r.start_year);
    }

    /// All records whose interval contains `year`
    pub fn query(&self, year: i32) -> Vec<&MembershipRecord> {
        self.records.iter().filter(|r| r.contains(year)).collect()
    }

    /// All records starting exactly in `year`
    pub fn starting_in(&self, year: i32) -> Vec<&MembershipRecord> {
        self.records
            .iter()
            .filter(|r| r.start_year == year)
            .collect()
    }

    pub fn records(&self) -> &[MembershipRecord] {
        &self.records
    }

    pub fn first_start_year(&self) -> Option<i32> {
        self.records.first().map(|r| r.start_year)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================
