// 📐 Shape Layer - Declared column mapping
// Each logical field lists the header spellings it accepts. No per-file guessing.

use crate::error::{ConfigError, LoadError, MissingColumn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// FIELD
// ============================================================================

/// Logical field of a membership table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// Entity (country / territory) name - required
    Name,
    /// Year membership began - required
    StartYear,
    /// Year membership ended (exclusive)
    EndYear,
    /// Human-readable join date
    JoinedDate,
    /// Free-text note
    Note,
    /// Full / associate membership
    Kind,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::Name,
        Field::StartYear,
        Field::EndYear,
        Field::JoinedDate,
        Field::Note,
        Field::Kind,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::StartYear => "start_year",
            Field::EndYear => "end_year",
            Field::JoinedDate => "joined_date",
            Field::Note => "note",
            Field::Kind => "kind",
        }
    }

    pub fn is_required(&self) -> bool {
        matches!(self, Field::Name | Field::StartYear)
    }
}

// ============================================================================
// COLUMN MAPPING
// ============================================================================

/// Field → accepted header aliases, in priority order
///
/// Header comparison ignores case, surrounding whitespace, a leading BOM, and
/// treats `_`, `-` and spaces alike ("Start_Year" == "start year").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnMapping {
    aliases: BTreeMap<Field, Vec<String>>,
}

impl ColumnMapping {
    /// Empty mapping (nothing accepted)
    pub fn empty() -> Self {
        ColumnMapping {
            aliases: BTreeMap::new(),
        }
    }

    /// Builder: accept another header spelling for a field
    pub fn with_alias(mut self, field: Field, alias: impl Into<String>) -> Self {
        self.aliases.entry(field).or_default().push(alias.into());
        self
    }

    /// Accepted aliases for a field (as declared)
    pub fn aliases(&self, field: Field) -> &[String] {
        self.aliases.get(&field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Check the mapping is usable: required fields have aliases and no
    /// header spelling is claimed by two fields
    pub fn validate(&self) -> Result<(), ConfigError> {
        for field in Field::ALL {
            if field.is_required() && self.aliases(field).is_empty() {
                return Err(ConfigError::NoHeaderAliases { field: field.name() });
            }
        }

        let mut owners: BTreeMap<String, Field> = BTreeMap::new();
        for (field, aliases) in &self.aliases {
            for alias in aliases {
                let key = header_key(alias);
                if let Some(owner) = owners.get(&key).copied() {
                    if owner != *field {
                        return Err(ConfigError::DuplicateHeaderAlias {
                            alias: alias.clone(),
                            first: owner.name(),
                            second: field.name(),
                        });
                    }
                }
                owners.insert(key, *field);
            }
        }

        Ok(())
    }

    /// Match table headers against the mapping
    ///
    /// For each field the first declared alias present in the headers wins.
    /// Fails with every missing required field listed.
    pub fn resolve<'h, I>(&self, headers: I) -> Result<ColumnIndex, LoadError>
    where
        I: IntoIterator<Item = &'h str>,
    {
        let header_keys: Vec<String> = headers.into_iter().map(header_key).collect();

        let find = |field: Field| -> Option<usize> {
            self.aliases(field).iter().find_map(|alias| {
                let key = header_key(alias);
                header_keys.iter().position(|h| *h == key)
            })
        };

        let mut missing = Vec::new();
        let mut required = |field: Field| match find(field) {
            Some(idx) => idx,
            None => {
                missing.push(MissingColumn {
                    field,
                    accepted: self.aliases(field).to_vec(),
                });
                0
            }
        };

        let name = required(Field::Name);
        let start_year = required(Field::StartYear);

        if !missing.is_empty() {
            return Err(LoadError::MissingColumns { missing });
        }

        Ok(ColumnIndex {
            name,
            start_year,
            end_year: find(Field::EndYear),
            joined_date: find(Field::JoinedDate),
            note: find(Field::Note),
            kind: find(Field::Kind),
        })
    }

    /// Human-readable example header row, for load-failure messages
    pub fn example_headers(&self) -> String {
        Field::ALL
            .iter()
            .filter_map(|field| self.aliases(*field).first().cloned())
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl Default for ColumnMapping {
    /// Header spellings seen across the exhibits' tables
    fn default() -> Self {
        let mut mapping = ColumnMapping::empty();
        let defaults: [(Field, &[&str]); 6] = [
            (Field::Name, &["country", "land", "state", "name", "entity", "member"]),
            (Field::StartYear, &["year", "jahr", "start year", "start", "since", "from"]),
            (Field::EndYear, &["end year", "end", "until", "to"]),
            (Field::JoinedDate, &["date", "datum", "joined date", "joined on", "joined"]),
            (Field::Note, &["note", "notes", "remark", "remarks", "comment"]),
            (Field::Kind, &["kind", "status", "membership", "type"]),
        ];
        for (field, aliases) in defaults {
            for alias in aliases {
                mapping = mapping.with_alias(field, *alias);
            }
        }
        mapping
    }
}

/// Column positions resolved for one table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnIndex {
    pub name: usize,
    pub start_year: usize,
    pub end_year: Option<usize>,
    pub joined_date: Option<usize>,
    pub note: Option<usize>,
    pub kind: Option<usize>,
}

/// Comparable form of a header cell
fn header_key(header: &str) -> String {
    header
        .trim_start_matches('\u{FEFF}')
        .to_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// TESTS
// ============================================================================
