// 🔤 Name Normalizer - Free-text entity name → comparable key
//
// "Côte d'Ivoire", "COTE D'IVOIRE", "Cote d’Ivoire (Assoc. member)" → "cote d'ivoire"
// "Korea, Rep." → "korea republic"
//
// Steps run in a fixed order and every step is total:
// 1. Strip parenthetical segments
// 2. Unicode NFKD + drop combining marks
// 3. Lower-case
// 4. Strip periods and commas
// 5. Collapse whitespace
// 6. Fold abbreviation tokens

use crate::error::ConfigError;
use std::collections::BTreeMap;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Abbreviations folded by default (token → expansion)
pub const DEFAULT_ABBREVIATIONS: &[(&str, &str)] = &[
    ("rep", "republic"),
    ("dem", "democratic"),
    ("fed", "federal"),
    ("st", "saint"),
    ("utd", "united"),
    ("&", "and"),
];

// ============================================================================
// NAME NORMALIZER
// ============================================================================

/// Normalizer with an injected abbreviation table
///
/// Folding abbreviations keeps the alias tables small, at the cost of
/// occasional collisions ("St." is always "saint", never "state").
#[derive(Debug, Clone)]
pub struct NameNormalizer {
    abbreviations: BTreeMap<String, String>,
}

impl NameNormalizer {
    /// Normalizer with [`DEFAULT_ABBREVIATIONS`]
    pub fn new() -> Self {
        NameNormalizer {
            abbreviations: DEFAULT_ABBREVIATIONS
                .iter()
                .map(|(abbr, full)| (abbr.to_string(), full.to_string()))
                .collect(),
        }
    }

    /// Normalizer with a custom abbreviation table
    ///
    /// Keys and expansions are cleaned the same way names are (lower-cased,
    /// periods stripped). An expansion may not contain any abbreviation
    /// token, otherwise `normalize` would stop being idempotent.
    pub fn with_abbreviations<I, K, V>(abbreviations: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut table = BTreeMap::new();
        for (abbr, full) in abbreviations {
            let abbr = clean_tokens(abbr.as_ref()).join(" ");
            let full = clean_tokens(full.as_ref()).join(" ");
            if abbr.is_empty() || abbr.contains(' ') || full.is_empty() {
                continue;
            }
            table.insert(abbr, full);
        }

        for (abbr, full) in &table {
            if full.split(' ').any(|token| table.contains_key(token)) {
                return Err(ConfigError::AbbreviationChain {
                    abbreviation: abbr.clone(),
                    expansion: full.clone(),
                });
            }
        }

        Ok(NameNormalizer {
            abbreviations: table,
        })
    }

    /// Canonicalize a raw name into a comparable key
    pub fn normalize(&self, raw: &str) -> String {
        clean_tokens(raw)
            .into_iter()
            .map(|token| match self.abbreviations.get(&token) {
                Some(full) => full.clone(),
                None => token,
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Number of abbreviation tokens folded by this normalizer
    pub fn abbreviation_count(&self) -> usize {
        self.abbreviations.len()
    }
}

impl Default for NameNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize with the default abbreviation table
pub fn normalize(raw: &str) -> String {
    NameNormalizer::new().normalize(raw)
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Steps 1-5: everything except abbreviation folding, split into tokens
///
/// Compatibility forms are folded before parentheticals are stripped, so
/// full-width "（…）" and "⑴" go with the ASCII ones.
fn clean_tokens(raw: &str) -> Vec<String> {
    let folded = fold_diacritics(raw);
    let stripped = strip_parentheticals(&folded);
    let lowered = fold_diacritics(&stripped.to_lowercase());

    lowered
        .chars()
        .filter(|c| *c != '.' && *c != ',')
        .collect::<String>()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Remove "(...)" segments, including nested ones
///
/// A stray ')' is dropped; an unclosed '(' drops the rest of the string.
fn strip_parentheticals(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut depth = 0usize;

    for c in s.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }

    out
}

/// NFKD, drop combining marks, unify typographic apostrophes
fn fold_diacritics(s: &str) -> String {
    s.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' | '\u{02BC}' | '`' => '\'',
            _ => c,
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
