// 🪧 Display Labels - What an entity is called in a given year
//
// Russia before 1991      → "Soviet Union"
// Hong Kong from 1997 on  → "Hong Kong, China"

use crate::entities::aliases::AliasTable;
use crate::normalize::NameNormalizer;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Year-conditional label for one entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayRule {
    /// Any spelling of the entity (resolved through the alias table)
    pub entity: String,

    pub label: String,

    /// First year the label applies (inclusive); None = always
    #[serde(default)]
    pub from_year: Option<i32>,

    /// Year the label stops applying (exclusive); None = forever
    #[serde(default)]
    pub until_year: Option<i32>,
}

impl DisplayRule {
    pub fn new(entity: impl Into<String>, label: impl Into<String>) -> Self {
        DisplayRule {
            entity: entity.into(),
            label: label.into(),
            from_year: None,
            until_year: None,
        }
    }

    pub fn since(mut self, year: i32) -> Self {
        self.from_year = Some(year);
        self
    }

    pub fn before(mut self, year: i32) -> Self {
        self.until_year = Some(year);
        self
    }

    pub fn applies_in(&self, year: i32) -> bool {
        self.from_year.map_or(true, |from| year >= from)
            && self.until_year.map_or(true, |until| year < until)
    }
}

/// Display rules indexed by canonical key
#[derive(Debug, Clone, Default)]
pub struct DisplayNames {
    rules: HashMap<String, Vec<DisplayRule>>,
}

impl DisplayNames {
    pub fn build(rules: &[DisplayRule], normalizer: &NameNormalizer, aliases: &AliasTable) -> Self {
        let mut indexed: HashMap<String, Vec<DisplayRule>> = HashMap::new();
        for rule in rules {
            let key = normalizer.normalize(&rule.entity);
            let key = aliases.canonical_of(&key).to_string();
            indexed.entry(key).or_default().push(rule.clone());
        }
        DisplayNames { rules: indexed }
    }

    /// Label for a canonical key in `year`, if a rule applies
    pub fn label_for_key(&self, canonical_key: &str, year: i32) -> Option<&str> {
        self.rules
            .get(canonical_key)?
            .iter()
            .find(|rule| rule.applies_in(year))
            .map(|rule| rule.label.as_str())
    }

    pub fn len(&self) -> usize {
        self.rules.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
