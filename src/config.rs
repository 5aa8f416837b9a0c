// ⚙️ Resolver Configuration
//
// Everything exhibit-specific is data, not code: header spellings,
// abbreviations, alias groups, successions, display labels.
// `ResolverConfig::ece()` carries the UN regional-commission tables; other
// exhibits load their own from JSON.

use crate::entities::{
    AliasDecl, AliasTable, DisplayNames, DisplayRule, SuccessionDecl, SuccessionTable,
};
use crate::error::ConfigError;
use crate::normalize::{NameNormalizer, DEFAULT_ABBREVIATIONS};
use crate::parser::TableLoader;
use crate::schema::ColumnMapping;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

const SOVIET_SUCCESSORS: [&str; 15] = [
    "Russia",
    "Ukraine",
    "Belarus",
    "Kazakhstan",
    "Uzbekistan",
    "Kyrgyzstan",
    "Tajikistan",
    "Turkmenistan",
    "Georgia",
    "Armenia",
    "Azerbaijan",
    "Moldova",
    "Lithuania",
    "Latvia",
    "Estonia",
];

const YUGOSLAV_SUCCESSORS: [&str; 7] = [
    "Serbia",
    "Croatia",
    "Bosnia and Herzegovina",
    "Slovenia",
    "Montenegro",
    "Macedonia",
    "Kosovo",
];

// ============================================================================
// RESOLVER CONFIG
// ============================================================================

/// Declared tables for one exhibit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Accepted header spellings per field
    pub columns: ColumnMapping,

    /// Abbreviation token → expansion
    pub abbreviations: BTreeMap<String, String>,

    /// Pure renames
    pub aliases: Vec<AliasDecl>,

    /// Unions / splits
    pub successions: Vec<SuccessionDecl>,

    /// Year-conditional labels
    pub display: Vec<DisplayRule>,
}

impl Default for ResolverConfig {
    /// Default columns and abbreviations, no entity tables
    fn default() -> Self {
        ResolverConfig {
            columns: ColumnMapping::default(),
            abbreviations: DEFAULT_ABBREVIATIONS
                .iter()
                .map(|(abbr, full)| (abbr.to_string(), full.to_string()))
                .collect(),
            aliases: Vec::new(),
            successions: Vec::new(),
            display: Vec::new(),
        }
    }
}

impl ResolverConfig {
    /// Tables for the UN regional-commission exhibits (ECE, ECAFE/ESCAP)
    pub fn ece() -> Self {
        let aliases = vec![
            AliasDecl::new("United States of America", ["United States", "USA", "US"]),
            AliasDecl::new("Russian Federation", ["Russia"]),
            AliasDecl::new("Soviet Union", ["USSR", "Union of Soviet Socialist Republics"]),
            AliasDecl::new("Myanmar", ["Burma"]),
            AliasDecl::new(
                "Democratic Republic of the Congo",
                ["Congo", "DRC", "Zaire", "Congo-Kinshasa"],
            ),
            AliasDecl::new("Republic of the Congo", ["Congo-Brazzaville"]),
            AliasDecl::new(
                "Republic of Korea",
                ["South Korea", "Korea, Republic of", "Korea, Rep."],
            ),
            AliasDecl::new(
                "Democratic People's Republic of Korea",
                [
                    "North Korea",
                    "Korea, Democratic People's Republic of",
                    "Korea, Dem. People's Rep.",
                ],
            ),
            AliasDecl::new("Iran (Islamic Republic of)", ["Iran"]),
            AliasDecl::new("Viet Nam", ["Vietnam"]),
            AliasDecl::new("Lao People's Democratic Republic", ["Laos"]),
            AliasDecl::new(
                "United Kingdom of Great Britain and Northern Ireland",
                ["United Kingdom", "UK", "Britain"],
            ),
            AliasDecl::new("Türkiye", ["Turkey"]),
            AliasDecl::new("Côte d'Ivoire", ["Ivory Coast"]),
            AliasDecl::new("Timor-Leste", ["East Timor"]),
            AliasDecl::new(
                "Germany",
                [
                    "Federal Republic of Germany",
                    "German Federal Republic",
                    "West Germany",
                    "FRG",
                ],
            ),
            AliasDecl::new("German Democratic Republic", ["East Germany", "GDR"]),
            AliasDecl::new("Yemen Arab Republic", ["North Yemen"]),
            AliasDecl::new("People's Democratic Republic of Yemen", ["South Yemen"]),
            AliasDecl::new(
                "North Macedonia",
                ["Macedonia", "The former Yugoslav Republic of Macedonia"],
            ),
            AliasDecl::new("Moldova", ["Republic of Moldova"]),
            AliasDecl::new("Kyrgyzstan", ["Kyrgyz Republic"]),
            AliasDecl::new("Macao", ["Macau"]),
        ];

        let successions = vec![
            SuccessionDecl::new("Soviet Union", SOVIET_SUCCESSORS, 1991),
            SuccessionDecl::new("Yugoslavia", YUGOSLAV_SUCCESSORS, 1991),
            SuccessionDecl::new("Czechoslovakia", ["Czech Republic", "Slovakia"], 1993),
            SuccessionDecl::new("German Democratic Republic", ["Germany"], 1990),
            SuccessionDecl::new("Yemen Arab Republic", ["Yemen"], 1990),
            SuccessionDecl::new("People's Democratic Republic of Yemen", ["Yemen"], 1990),
        ];

        let display = vec![
            DisplayRule::new("Russia", "Soviet Union").before(1991),
            DisplayRule::new("Hong Kong", "Hong Kong, China").since(1997),
            DisplayRule::new("Macao", "Macao, China").since(1999),
        ];

        ResolverConfig {
            aliases,
            successions,
            display,
            ..ResolverConfig::default()
        }
    }

    /// Parse a JSON configuration; missing sections fall back to defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse resolver configuration")
    }

    /// Read and parse a JSON configuration file
    pub fn from_json_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read resolver configuration: {}", path.display()))?;
        let config = Self::from_json_str(&raw)
            .with_context(|| format!("Invalid resolver configuration: {}", path.display()))?;

        info!(
            path = %path.display(),
            aliases = config.aliases.len(),
            successions = config.successions.len(),
            "resolver configuration loaded"
        );
        Ok(config)
    }

    /// Table loader using this configuration's column mapping
    pub fn loader(&self) -> TableLoader {
        TableLoader::new(self.columns.clone())
    }

    /// Validate every declaration and build the lookup tables
    pub fn compile(&self) -> Result<EntityTables, ConfigError> {
        self.columns.validate()?;

        let normalizer = NameNormalizer::with_abbreviations(&self.abbreviations)?;
        let aliases = AliasTable::build(&self.aliases, &normalizer)?;
        let successions = SuccessionTable::build(&self.successions, &normalizer, &aliases)?;
        let display = DisplayNames::build(&self.display, &normalizer, &aliases);

        Ok(EntityTables {
            normalizer,
            aliases,
            successions,
            display,
        })
    }
}

// ============================================================================
// ENTITY TABLES
// ============================================================================

/// Validated, normalized tables ready for resolution
#[derive(Debug, Clone)]
pub struct EntityTables {
    pub normalizer: NameNormalizer,
    pub aliases: AliasTable,
    pub successions: SuccessionTable,
    pub display: DisplayNames,
}

impl EntityTables {
    /// Canonical key for a raw name
    pub fn canonical_key(&self, raw: &str) -> String {
        let key = self.normalizer.normalize(raw);
        self.aliases.canonical_of(&key).to_string()
    }

    /// What `raw` is called in `year`: a display rule's label, else the
    /// trimmed name
    pub fn label_for(&self, raw: &str, year: i32) -> String {
        let key = self.canonical_key(raw);
        self.display
            .label_for_key(&key, year)
            .map(str::to_string)
            .unwrap_or_else(|| raw.trim().to_string())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_ece_config_compiles() {
        let tables = ResolverConfig::ece().compile().unwrap();

        assert_eq!(tables.successions.len(), 6);
        assert_eq!(
            tables
                .successions
                .rule_for("soviet union")
                .unwrap()
                .successors
                .len(),
            15
        );
        assert_eq!(tables.canonical_key("USSR"), "soviet union");
        assert_eq!(tables.canonical_key("West Germany"), "germany");
        assert_eq!(tables.canonical_key("Korea, Rep."), "republic of korea");
        assert_eq!(tables.canonical_key("Macau"), "macao");
    }

    #[test]
    fn test_label_for() {
        let tables = ResolverConfig::ece().compile().unwrap();

        assert_eq!(tables.label_for("Russia", 1990), "Soviet Union");
        assert_eq!(tables.label_for("Russia", 1991), "Russia");
        assert_eq!(tables.label_for("  Hong Kong ", 1990), "Hong Kong");
    }

    #[test]
    fn test_ece_keeps_russia_and_ussr_apart() {
        let tables = ResolverConfig::ece().compile().unwrap();
        assert!(!tables.aliases.same_entity("russia", "ussr"));
        assert_eq!(tables.canonical_key("Russia"), "russian federation");
    }

    #[test]
    fn test_default_config_has_no_entity_tables() {
        let tables = ResolverConfig::default().compile().unwrap();
        assert!(tables.aliases.is_empty());
        assert!(tables.successions.is_empty());
        assert!(tables.display.is_empty());
        assert_eq!(tables.canonical_key("Korea, Rep."), "korea republic");
    }

    #[test]
    fn test_from_json_partial() {
        let json = r#"{
            "aliases": [{"canonical": "Viet Nam", "variants": ["Vietnam"]}],
            "successions": [
                {"predecessor": "Czechoslovakia", "successors": ["Czech Republic", "Slovakia"], "dissolution_year": 1993}
            ],
            "display": [{"entity": "Hong Kong", "label": "Hong Kong, China", "from_year": 1997}]
        }"#;

        let config = ResolverConfig::from_json_str(json).unwrap();
        assert_eq!(config.columns, ColumnMapping::default());
        assert_eq!(config.aliases.len(), 1);
        assert_eq!(config.successions[0].dissolution_year, 1993);
        assert_eq!(config.display[0].until_year, None);

        let tables = config.compile().unwrap();
        assert_eq!(tables.canonical_key("Vietnam"), "viet nam");
    }

    #[test]
    fn test_from_json_invalid() {
        let err = ResolverConfig::from_json_str("{\"aliases\": 3}").unwrap_err();
        assert!(err.to_string().contains("Failed to parse resolver configuration"));
    }

    #[test]
    fn test_from_json_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let json = serde_json::to_string(&ResolverConfig::ece()).unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let config = ResolverConfig::from_json_path(file.path()).unwrap();
        assert_eq!(config, ResolverConfig::ece());
    }

    #[test]
    fn test_conflicting_declarations_rejected() {
        let mut config = ResolverConfig::ece();
        config
            .aliases
            .push(AliasDecl::new("Union of Soviet Socialist Republics", ["Russia"]));

        assert!(matches!(
            config.compile(),
            Err(ConfigError::AliasConflict { .. })
        ));
    }

    #[test]
    fn test_loader_uses_config_columns() {
        let mut config = ResolverConfig::default();
        config.columns = ColumnMapping::empty()
            .with_alias(crate::schema::Field::Name, "Staat")
            .with_alias(crate::schema::Field::StartYear, "Jahr");

        let table = config
            .loader()
            .load_reader("Staat,Jahr\nFrankreich,1947\n".as_bytes())
            .unwrap();
        assert_eq!(table.store.len(), 1);
    }
}
