// 🧭 Membership Resolver - "Was X a member in year Y?"
//
// Pure queries over a loaded table and compiled entity tables:
// - active_entities(year)      → every member in that year
// - new_entities_in_year(year) → members that just joined
// - is_active(name, year)      → membership test for any spelling
// - membership_info(name)      → first join year + date/note
//
// Succession is applied per record: a predecessor that reached its
// dissolution year is replaced by its successors from that year on, and the
// successors stay members (open-ended).

use crate::config::{EntityTables, ResolverConfig};
use crate::entities::SuccessionRule;
use crate::error::ConfigError;
use crate::store::{IntervalStore, MembershipKind, MembershipRecord};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

// ============================================================================
// ACTIVE SET
// ============================================================================

/// Canonical keys active in one year, plus every alias variant of them
///
/// `len()` counts entities (canonical keys); `contains()` accepts any variant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActiveSet {
    keys: BTreeSet<String>,
    variants: BTreeSet<String>,
}

impl ActiveSet {
    /// Is this key (canonical or variant) active?
    pub fn contains(&self, key: &str) -> bool {
        self.variants.contains(key)
    }

    /// Canonical keys
    pub fn keys(&self) -> &BTreeSet<String> {
        &self.keys
    }

    /// Canonical keys plus every alias variant
    pub fn variant_keys(&self) -> &BTreeSet<String> {
        &self.variants
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

// ============================================================================
// QUERY RESULTS
// ============================================================================

/// One active entity and the record that makes it active
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveMembership {
    /// Canonical key
    pub key: String,

    /// Name as written in the table, or as declared for a successor
    pub name: String,

    /// Year this entity became a member (dissolution year for successors)
    pub since: i32,

    /// Predecessor key when membership was inherited through succession
    pub inherited_from: Option<String>,

    pub kind: MembershipKind,

    /// Winning source record
    pub record: MembershipRecord,
}

/// First-membership lookup result
///
/// `year: None` means the name matched nothing; that is not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MembershipInfo {
    pub year: Option<i32>,
    pub date: Option<String>,
    pub note: Option<String>,

    /// Predecessor key when the info comes from the predecessor's record
    pub inherited_from: Option<String>,
}

impl MembershipInfo {
    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn is_known(&self) -> bool {
        self.year.is_some()
    }
}

/// Active members that joined in one year
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterGroup {
    pub year: i32,

    /// Display labels, deduplicated, sorted case-insensitively
    pub names: Vec<String>,
}

/// One record's contribution to a year, before de-duplication
struct Contribution<'a> {
    key: &'a str,
    name: &'a str,
    since: i32,
    inherited_from: Option<&'a str>,
    record_idx: usize,
}

// ============================================================================
// MEMBERSHIP RESOLVER
// ============================================================================

pub struct MembershipResolver {
    store: IntervalStore,
    tables: EntityTables,

    /// Canonical key of each store record (same order)
    record_keys: Vec<String>,
}

impl MembershipResolver {
    pub fn new(store: IntervalStore, tables: EntityTables) -> Self {
        let record_keys: Vec<String> = store
            .records()
            .iter()
            .map(|r| tables.canonical_key(&r.entity_name))
            .collect();

        info!(
            records = store.len(),
            alias_groups = tables.aliases.len(),
            successions = tables.successions.len(),
            "membership resolver ready"
        );

        MembershipResolver {
            store,
            tables,
            record_keys,
        }
    }

    /// Compile the configuration and build a resolver over `store`
    pub fn from_config(store: IntervalStore, config: &ResolverConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(store, config.compile()?))
    }

    pub fn store(&self) -> &IntervalStore {
        &self.store
    }

    pub fn tables(&self) -> &EntityTables {
        &self.tables
    }

    /// Canonical key for any spelling
    pub fn canonical_key(&self, name: &str) -> String {
        self.tables.canonical_key(name)
    }

    /// Every key naming the same entity as `name` (succession excluded)
    pub fn variants_of(&self, name: &str) -> BTreeSet<String> {
        let key = self.tables.normalizer.normalize(name);
        self.tables.aliases.variants_of(&key)
    }

    // ------------------------------------------------------------------------
    // Active set
    // ------------------------------------------------------------------------

    /// Every entity active in `year`, one entry per canonical key
    ///
    /// When several records resolve to the same key, the most specific wins:
    /// a direct record over an inherited one, then the narrowest interval
    /// (bounded before open-ended), then the longest name in characters
    /// (not the longest interval), then load order.
    pub fn active_memberships(&self, year: i32) -> Vec<ActiveMembership> {
        let mut best: BTreeMap<&str, Contribution> = BTreeMap::new();

        for contribution in self.contributions(year) {
            let replace = best
                .get(contribution.key)
                .map_or(true, |current| self.more_specific(&contribution, current));
            if replace {
                best.insert(contribution.key, contribution);
            }
        }

        best.into_values()
            .map(|c| {
                let record = &self.store.records()[c.record_idx];
                ActiveMembership {
                    key: c.key.to_string(),
                    name: c.name.to_string(),
                    since: c.since,
                    inherited_from: c.inherited_from.map(str::to_string),
                    kind: record.kind,
                    record: record.clone(),
                }
            })
            .collect()
    }

    /// Canonical keys active in `year`
    pub fn active_entities(&self, year: i32) -> ActiveSet {
        let keys: BTreeSet<String> = self
            .contributions(year)
            .into_iter()
            .map(|c| c.key.to_string())
            .collect();

        let variants = keys
            .iter()
            .flat_map(|key| self.tables.aliases.variants_of(key))
            .collect();

        debug!(year, active = keys.len(), "active entities resolved");
        ActiveSet { keys, variants }
    }

    /// Keys that became active in exactly `year`
    ///
    /// Records starting in `year`, plus successors of a dissolution in
    /// `year`, minus anything already active the year before.
    pub fn new_entities_in_year(&self, year: i32) -> BTreeSet<String> {
        let previous = match year.checked_sub(1) {
            Some(prev) => self.active_entities(prev),
            None => ActiveSet::default(),
        };

        self.contributions(year)
            .into_iter()
            .filter(|c| c.since == year)
            .filter(|c| !previous.keys().contains(c.key))
            .map(|c| c.key.to_string())
            .collect()
    }

    /// Is `name` (any spelling) a member in `year`?
    pub fn is_active(&self, name: &str, year: i32) -> bool {
        let key = self.canonical_key(name);
        self.active_entities(year).contains(&key)
    }

    /// Active key a map feature stands for in `year`
    ///
    /// The feature itself when it is active, otherwise an active predecessor
    /// it was later split from ("Ukraine" in 1980 → "soviet union").
    pub fn represented_by(&self, name: &str, year: i32) -> Option<String> {
        let key = self.canonical_key(name);
        let active = self.active_entities(year);

        if active.contains(&key) {
            return Some(key);
        }

        let predecessor = self
            .tables
            .successions
            .rules_succeeded_by(&key)
            .filter(|rule| !rule.is_dissolved_at(year))
            .find(|rule| active.keys().contains(&rule.predecessor))
            .map(|rule| rule.predecessor.clone());
        predecessor
    }

    // ------------------------------------------------------------------------
    // Metadata
    // ------------------------------------------------------------------------

    /// Earliest membership across every spelling of `name`
    ///
    /// Same-year records are ordered by parsed join date, then load order;
    /// a missing date or note is filled from the next same-year record.
    /// With no record of its own, an entity reports its predecessor's.
    pub fn membership_info(&self, name: &str) -> MembershipInfo {
        let key = self.canonical_key(name);

        let mut candidates: Vec<(usize, Option<&str>)> = self
            .record_indices(&key)
            .map(|idx| (idx, None))
            .collect();

        if candidates.is_empty() {
            for rule in self.tables.successions.rules_succeeded_by(&key) {
                candidates.extend(
                    self.record_indices(&rule.predecessor)
                        .map(|idx| (idx, Some(rule.predecessor.as_str()))),
                );
            }
        }

        let records = self.store.records();
        candidates.sort_by_key(|(idx, _)| {
            let record = &records[*idx];
            let joined = record.joined_on();
            (record.start_year, joined.is_none(), joined, *idx)
        });

        let Some(&(first_idx, inherited_from)) = candidates.first() else {
            return MembershipInfo::unknown();
        };

        let first = &records[first_idx];
        let mut info = MembershipInfo {
            year: Some(first.start_year),
            date: first.joined_date.clone(),
            note: first.note.clone(),
            inherited_from: inherited_from.map(str::to_string),
        };

        for (idx, _) in &candidates[1..] {
            let record = &records[*idx];
            if record.start_year != first.start_year {
                break;
            }
            if info.date.is_none() {
                info.date = record.joined_date.clone();
            }
            if info.note.is_none() {
                info.note = record.note.clone();
            }
        }

        info
    }

    /// What `name` is called in `year`
    pub fn display_name(&self, name: &str, year: i32) -> String {
        self.tables.label_for(name, year)
    }

    /// Active members grouped by the year they joined
    pub fn roster(&self, year: i32) -> Vec<RosterGroup> {
        let mut groups: BTreeMap<i32, BTreeSet<String>> = BTreeMap::new();

        for membership in self.active_memberships(year) {
            let base = self
                .tables
                .display
                .label_for_key(&membership.key, year)
                .unwrap_or(&membership.name);
            let label = format!("{}{}", base, membership.kind.label_suffix());
            groups.entry(membership.since).or_default().insert(label);
        }

        groups
            .into_iter()
            .map(|(year, names)| {
                let mut names: Vec<String> = names.into_iter().collect();
                names.sort_by_key(|n| n.to_lowercase());
                RosterGroup { year, names }
            })
            .collect()
    }

    /// Years at which the active set can change, ascending
    pub fn change_years(&self) -> Vec<i32> {
        let mut years = BTreeSet::new();

        for (record, key) in self.store.records().iter().zip(&self.record_keys) {
            years.insert(record.start_year);
            if let Some(end) = record.end_year {
                years.insert(end);
            }
            if let Some(rule) = self.tables.successions.rule_for(key) {
                if record.start_year < rule.dissolution_year && reaches_dissolution(record, rule) {
                    years.insert(rule.dissolution_year);
                }
            }
        }

        years.into_iter().collect()
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    /// What every record contributes to `year`
    fn contributions(&self, year: i32) -> Vec<Contribution<'_>> {
        let mut out = Vec::new();

        for (idx, (record, key)) in self
            .store
            .records()
            .iter()
            .zip(&self.record_keys)
            .enumerate()
        {
            match self.tables.successions.rule_for(key) {
                Some(rule) if rule.is_dissolved_at(year) => {
                    let inherits = if record.start_year >= rule.dissolution_year {
                        record.contains(year)
                    } else {
                        reaches_dissolution(record, rule)
                    };
                    if !inherits {
                        continue;
                    }

                    let since = record.start_year.max(rule.dissolution_year);
                    for successor in &rule.successors {
                        out.push(Contribution {
                            key: &successor.key,
                            name: &successor.name,
                            since,
                            inherited_from: Some(rule.predecessor.as_str()),
                            record_idx: idx,
                        });
                    }
                }
                _ if record.contains(year) => out.push(Contribution {
                    key,
                    name: &record.entity_name,
                    since: record.start_year,
                    inherited_from: None,
                    record_idx: idx,
                }),
                _ => {}
            }
        }

        out
    }

    fn more_specific(&self, candidate: &Contribution, current: &Contribution) -> bool {
        let rank = |c: &Contribution| {
            let record = &self.store.records()[c.record_idx];
            (
                c.inherited_from.is_some(),
                record.span().unwrap_or(i32::MAX),
                std::cmp::Reverse(c.name.chars().count()),
                c.record_idx,
            )
        };
        rank(candidate) < rank(current)
    }

    fn record_indices<'a>(&'a self, key: &'a str) -> impl Iterator<Item = usize> + 'a {
        self.record_keys
            .iter()
            .enumerate()
            .filter(move |(_, k)| k.as_str() == key)
            .map(|(idx, _)| idx)
    }
}

/// Was the record still open when the predecessor dissolved?
fn reaches_dissolution(record: &MembershipRecord, rule: &SuccessionRule) -> bool {
    record.end_year.map_or(true, |end| end >= rule.dissolution_year)
}

// ============================================================================
// TESTS
// ============================================================================
