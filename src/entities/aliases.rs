// 🏷️ Alias Table - Year-independent spellings of the same entity
//
// "Viet Nam", "Vietnam" → one entity
// "Burma", "Myanmar"    → one entity
//
// Aliases are pure renames. Unions and splits are NOT aliases; those live in
// the succession table because they depend on the year.

use crate::error::ConfigError;
use crate::normalize::NameNormalizer;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

// ============================================================================
// DECLARATION (configuration input)
// ============================================================================

/// Declared alias group, as written in configuration (raw names)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasDecl {
    /// Preferred name of the entity
    pub canonical: String,

    /// Other spellings / abbreviations
    #[serde(default)]
    pub variants: Vec<String>,
}

impl AliasDecl {
    pub fn new<I, S>(canonical: impl Into<String>, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AliasDecl {
            canonical: canonical.into(),
            variants: variants.into_iter().map(Into::into).collect(),
        }
    }
}

// ============================================================================
// ALIAS GROUP
// ============================================================================

/// Normalized alias group
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AliasGroup {
    pub canonical_key: String,

    /// Every other key in the group (canonical key excluded)
    pub variant_keys: BTreeSet<String>,
}

impl AliasGroup {
    /// Canonical key plus every variant
    pub fn all_keys(&self) -> BTreeSet<String> {
        let mut keys = self.variant_keys.clone();
        keys.insert(self.canonical_key.clone());
        keys
    }
}

// ============================================================================
// ALIAS TABLE
// ============================================================================

/// Lookup from any key to its group
///
/// Invariant: every key belongs to at most one group.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    groups: Vec<AliasGroup>,
    index: HashMap<String, usize>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize and index the declared groups
    ///
    /// Fails when two groups claim the same key after normalization
    /// (e.g. "Congo (Kinshasa)" and "Congo (Brazzaville)" both become "congo").
    pub fn build(decls: &[AliasDecl], normalizer: &NameNormalizer) -> Result<Self, ConfigError> {
        let mut table = AliasTable::new();

        for decl in decls {
            let canonical_key = normalizer.normalize(&decl.canonical);
            if canonical_key.is_empty() {
                return Err(ConfigError::EmptyAlias {
                    canonical: decl.canonical.clone(),
                });
            }

            let variant_keys: BTreeSet<String> = decl
                .variants
                .iter()
                .map(|v| normalizer.normalize(v))
                .filter(|k| !k.is_empty() && *k != canonical_key)
                .collect();

            let group_idx = table.groups.len();
            for key in std::iter::once(&canonical_key).chain(variant_keys.iter()) {
                if let Some(&existing) = table.index.get(key) {
                    return Err(ConfigError::AliasConflict {
                        key: key.clone(),
                        first: table.groups[existing].canonical_key.clone(),
                        second: canonical_key.clone(),
                    });
                }
                table.index.insert(key.clone(), group_idx);
            }

            table.groups.push(AliasGroup {
                canonical_key,
                variant_keys,
            });
        }

        debug!(groups = table.groups.len(), keys = table.index.len(), "alias table built");
        Ok(table)
    }

    /// Canonical key for any key; unknown keys map to themselves
    pub fn canonical_of<'a>(&'a self, key: &'a str) -> &'a str {
        match self.index.get(key) {
            Some(&idx) => &self.groups[idx].canonical_key,
            None => key,
        }
    }

    /// Every key naming the same entity, including `key` itself
    pub fn variants_of(&self, key: &str) -> BTreeSet<String> {
        match self.index.get(key) {
            Some(&idx) => self.groups[idx].all_keys(),
            None => BTreeSet::from([key.to_string()]),
        }
    }

    /// Are both keys the same entity?
    pub fn same_entity(&self, a: &str, b: &str) -> bool {
        self.canonical_of(a) == self.canonical_of(b)
    }

    pub fn group(&self, key: &str) -> Option<&AliasGroup> {
        self.index.get(key).map(|&idx| &self.groups[idx])
    }

    pub fn groups(&self) -> &[AliasGroup] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> AliasTable {
        AliasTable::build(
            &[
                AliasDecl::new("Viet Nam", ["Vietnam"]),
                AliasDecl::new("Russian Federation", ["Russia"]),
                AliasDecl::new("Iran (Islamic Republic of)", ["Iran"]),
                AliasDecl::new("Republic of Korea", ["South Korea", "Korea, Rep."]),
            ],
            &NameNormalizer::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_canonical_of() {
        let table = table();

        assert_eq!(table.canonical_of("vietnam"), "viet nam");
        assert_eq!(table.canonical_of("viet nam"), "viet nam");
        assert_eq!(table.canonical_of("russia"), "russian federation");
        assert_eq!(table.canonical_of("korea republic"), "republic of korea");
        assert_eq!(table.canonical_of("atlantis"), "atlantis");
    }

    #[test]
    fn test_variants_of() {
        let table = table();

        let expected: BTreeSet<String> = ["russia", "russian federation"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(table.variants_of("russia"), expected);
        assert_eq!(table.variants_of("russian federation"), expected);
    }

    #[test]
    fn test_unknown_key_is_singleton() {
        let table = table();
        assert_eq!(
            table.variants_of("atlantis"),
            BTreeSet::from(["atlantis".to_string()])
        );
        assert!(table.group("atlantis").is_none());
    }

    #[test]
    fn test_variant_equal_to_canonical_is_dropped() {
        let table = table();
        // "Iran (Islamic Republic of)" and "Iran" normalize to the same key
        let group = table.group("iran").unwrap();
        assert_eq!(group.canonical_key, "iran");
        assert!(group.variant_keys.is_empty());
    }

    #[test]
    fn test_same_entity() {
        let table = table();
        assert!(table.same_entity("vietnam", "viet nam"));
        assert!(!table.same_entity("vietnam", "russia"));
    }

    #[test]
    fn test_overlapping_groups_rejected() {
        let result = AliasTable::build(
            &[
                AliasDecl::new("Russian Federation", ["Russia"]),
                AliasDecl::new("Soviet Union", ["USSR", "Russia"]),
            ],
            &NameNormalizer::new(),
        );

        assert_eq!(
            result.unwrap_err(),
            ConfigError::AliasConflict {
                key: "russia".to_string(),
                first: "russian federation".to_string(),
                second: "soviet union".to_string(),
            }
        );
    }

    #[test]
    fn test_collision_after_normalization_rejected() {
        let result = AliasTable::build(
            &[
                AliasDecl::new("Democratic Republic of the Congo", ["Congo (Kinshasa)"]),
                AliasDecl::new("Republic of the Congo", ["Congo (Brazzaville)"]),
            ],
            &NameNormalizer::new(),
        );

        assert!(matches!(result, Err(ConfigError::AliasConflict { .. })));
    }

    #[test]
    fn test_empty_canonical_rejected() {
        let result = AliasTable::build(
            &[AliasDecl::new("(none)", ["Nothing"])],
            &NameNormalizer::new(),
        );
        assert!(matches!(result, Err(ConfigError::EmptyAlias { .. })));
    }
}
