// 🔀 Succession Table - Year-conditional replacement of one entity by others
//
// Before the dissolution year the predecessor is one entity.
// From the dissolution year on it is replaced by its successors.
//
//   Czechoslovakia ──1993──▶ Czech Republic, Slovakia
//   Soviet Union   ──1991──▶ Russia, Ukraine, Belarus, ... (15)

use crate::entities::aliases::AliasTable;
use crate::error::ConfigError;
use crate::normalize::NameNormalizer;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

// ============================================================================
// DECLARATION (configuration input)
// ============================================================================

/// Declared succession, as written in configuration (raw names)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessionDecl {
    pub predecessor: String,
    pub successors: Vec<String>,
    pub dissolution_year: i32,
}

impl SuccessionDecl {
    pub fn new<I, S>(predecessor: impl Into<String>, successors: I, dissolution_year: i32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SuccessionDecl {
            predecessor: predecessor.into(),
            successors: successors.into_iter().map(Into::into).collect(),
            dissolution_year,
        }
    }
}

// ============================================================================
// SUCCESSION RULE
// ============================================================================

/// A successor entity: canonical key plus the name it was declared with
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Successor {
    pub key: String,
    pub name: String,
}

/// Normalized succession rule (all keys canonical)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SuccessionRule {
    pub predecessor: String,

    /// Declaration order, duplicates removed
    pub successors: Vec<Successor>,

    pub dissolution_year: i32,
}

impl SuccessionRule {
    /// Has the predecessor been replaced by `year`?
    pub fn is_dissolved_at(&self, year: i32) -> bool {
        year >= self.dissolution_year
    }

    pub fn successor_keys(&self) -> impl Iterator<Item = &str> {
        self.successors.iter().map(|s| s.key.as_str())
    }

    pub fn has_successor(&self, key: &str) -> bool {
        self.successors.iter().any(|s| s.key == key)
    }
}

// ============================================================================
// SUCCESSION TABLE
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct SuccessionTable {
    rules: Vec<SuccessionRule>,
    by_predecessor: HashMap<String, usize>,
}

impl SuccessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize declarations against the alias table
    ///
    /// Each pair of entities must be either a rename (alias) or a split
    /// (succession), never both; a predecessor may have only one rule.
    pub fn build(
        decls: &[SuccessionDecl],
        normalizer: &NameNormalizer,
        aliases: &AliasTable,
    ) -> Result<Self, ConfigError> {
        let mut table = SuccessionTable::new();

        for decl in decls {
            let predecessor_key = normalizer.normalize(&decl.predecessor);
            let predecessor = aliases.canonical_of(&predecessor_key).to_string();

            let mut successors: Vec<Successor> = Vec::new();
            for name in &decl.successors {
                let key = normalizer.normalize(name);
                if key.is_empty() {
                    continue;
                }
                let key = aliases.canonical_of(&key).to_string();

                if key == predecessor {
                    return Err(ConfigError::RelationshipConflict {
                        predecessor: decl.predecessor.clone(),
                        successor: name.clone(),
                    });
                }
                if !successors.iter().any(|s| s.key == key) {
                    successors.push(Successor {
                        key,
                        name: name.trim().to_string(),
                    });
                }
            }

            if successors.is_empty() {
                return Err(ConfigError::EmptySuccession {
                    predecessor: decl.predecessor.clone(),
                });
            }

            if table.by_predecessor.contains_key(&predecessor) {
                return Err(ConfigError::DuplicateSuccession {
                    predecessor: decl.predecessor.clone(),
                });
            }

            table
                .by_predecessor
                .insert(predecessor.clone(), table.rules.len());
            table.rules.push(SuccessionRule {
                predecessor,
                successors,
                dissolution_year: decl.dissolution_year,
            });
        }

        debug!(rules = table.rules.len(), "succession table built");
        Ok(table)
    }

    /// Rule whose predecessor is `canonical_key`
    pub fn rule_for(&self, canonical_key: &str) -> Option<&SuccessionRule> {
        self.by_predecessor
            .get(canonical_key)
            .map(|&idx| &self.rules[idx])
    }

    /// Rules that list `canonical_key` among their successors
    pub fn rules_succeeded_by<'a>(
        &'a self,
        canonical_key: &'a str,
    ) -> impl Iterator<Item = &'a SuccessionRule> + 'a {
        self.rules
            .iter()
            .filter(move |rule| rule.has_successor(canonical_key))
    }

    pub fn rules(&self) -> &[SuccessionRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================
