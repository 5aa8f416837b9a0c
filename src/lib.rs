// Membership Timeline - Core Library
// Historical membership of an organization, resolved per year:
// load a table of intervals, reconcile name variants and successions,
// answer "who was a member in year Y?"

pub mod error;
pub mod normalize;   // Name keys: case, diacritics, abbreviations
pub mod schema;      // Column mapping for loose table headers
pub mod store;       // Membership records + interval queries
pub mod parser;      // CSV → IntervalStore, malformed rows reported
pub mod entities;    // Aliases, successions, display labels
pub mod config;      // Declared tables per exhibit (JSON or built-in)
pub mod resolver;    // Year queries
pub mod temporal;    // Year snapshot + cursor for the view layer

// Re-export commonly used types
pub use error::{ConfigError, LoadError, MalformedReason, MalformedRecordError, MissingColumn};
pub use normalize::{normalize, NameNormalizer};
pub use schema::{ColumnIndex, ColumnMapping, Field};
pub use store::{IntervalStore, MembershipKind, MembershipRecord};
pub use parser::{extract_year, load_csv, LoadReport, LoadedTable, TableLoader};
pub use entities::{
    AliasDecl, AliasGroup, AliasTable,
    DisplayNames, DisplayRule,
    Successor, SuccessionDecl, SuccessionRule, SuccessionTable,
};
pub use config::{EntityTables, ResolverConfig};
pub use resolver::{
    ActiveMembership, ActiveSet, MembershipInfo, MembershipResolver, RosterGroup,
};
pub use temporal::{YearCursor, YearSnapshot};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
