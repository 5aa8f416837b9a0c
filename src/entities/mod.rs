// Entity Tables
// Declared relationships between entity names:
// - aliases: same entity, different spelling (year-independent)
// - succession: one entity replaced by others from a given year
// - display: what an entity is called in a given year

pub mod aliases;
pub mod display;
pub mod succession;

pub use aliases::{AliasDecl, AliasGroup, AliasTable};
pub use display::{DisplayNames, DisplayRule};
pub use succession::{Successor, SuccessionDecl, SuccessionRule, SuccessionTable};
