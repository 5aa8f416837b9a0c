// ⏰ Temporal View State - One year of the timeline, made explicit
//
// YearSnapshot: everything a view needs to draw one year (immutable value)
// YearCursor:   the selected year, stepping through the years where the
//               member set can change

use crate::resolver::{MembershipResolver, RosterGroup};
use serde::Serialize;
use std::collections::BTreeSet;

// ============================================================================
// YEAR SNAPSHOT
// ============================================================================

/// Resolved state of one year
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearSnapshot {
    pub year: i32,

    /// Canonical keys active in `year`
    pub active: BTreeSet<String>,

    /// Keys that became active in exactly `year`
    pub new: BTreeSet<String>,

    /// Active members grouped by join year
    pub roster: Vec<RosterGroup>,
}

impl YearSnapshot {
    pub fn capture(resolver: &MembershipResolver, year: i32) -> Self {
        YearSnapshot {
            year,
            active: resolver.active_entities(year).keys().clone(),
            new: resolver.new_entities_in_year(year),
            roster: resolver.roster(year),
        }
    }

    pub fn member_count(&self) -> usize {
        self.active.len()
    }

    pub fn is_new(&self, key: &str) -> bool {
        self.new.contains(key)
    }
}

impl MembershipResolver {
    /// Snapshot of `year`
    pub fn snapshot(&self, year: i32) -> YearSnapshot {
        YearSnapshot::capture(self, year)
    }
}

// ============================================================================
// YEAR CURSOR
// ============================================================================

/// Selected position among a resolver's change years
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearCursor {
    years: Vec<i32>,
    index: usize,
}

impl YearCursor {
    /// Cursor over `years` (sorted, deduplicated), starting at the first
    pub fn new(years: impl IntoIterator<Item = i32>) -> Self {
        let years: Vec<i32> = years
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        YearCursor { years, index: 0 }
    }

    /// Cursor over every year at which the active set can change
    pub fn for_resolver(resolver: &MembershipResolver) -> Self {
        Self::new(resolver.change_years())
    }

    /// Selected year; None when there are no years
    pub fn current(&self) -> Option<i32> {
        self.years.get(self.index).copied()
    }

    /// Select the latest year at or before `year` (the first if none)
    pub fn select(&mut self, year: i32) -> Option<i32> {
        self.index = self
            .years
            .partition_point(|&y| y <= year)
            .saturating_sub(1);
        self.current()
    }

    /// Step to the next year, wrapping to the first after the last
    pub fn advance(&mut self) -> Option<i32> {
        if !self.years.is_empty() {
            self.index = (self.index + 1) % self.years.len();
        }
        self.current()
    }

    pub fn reset(&mut self) -> Option<i32> {
        self.index = 0;
        self.current()
    }

    pub fn years(&self) -> &[i32] {
        &self.years
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResolverConfig;
    use crate::store::{IntervalStore, MembershipRecord};

    fn resolver() -> MembershipResolver {
        let store = IntervalStore::from_records(vec![
            MembershipRecord::new("France", 1947),
            MembershipRecord::new("Czechoslovakia", 1947).ending(1993),
            MembershipRecord::new("Switzerland", 1972),
        ]);
        MembershipResolver::from_config(store, &ResolverConfig::ece()).unwrap()
    }

    #[test]
    fn test_snapshot_of_dissolution_year() {
        let snapshot = resolver().snapshot(1993);

        assert_eq!(snapshot.year, 1993);
        assert_eq!(snapshot.member_count(), 4);
        assert!(snapshot.is_new("slovakia"));
        assert!(snapshot.is_new("czech republic"));
        assert!(!snapshot.is_new("france"));
        assert!(!snapshot.active.contains("czechoslovakia"));

        let years: Vec<i32> = snapshot.roster.iter().map(|g| g.year).collect();
        assert_eq!(years, vec![1947, 1972, 1993]);
    }

    #[test]
    fn test_snapshot_serializes() {
        let json = serde_json::to_value(resolver().snapshot(1950)).unwrap();

        assert_eq!(json["year"], 1950);
        assert_eq!(json["active"], serde_json::json!(["czechoslovakia", "france"]));
        assert_eq!(json["roster"][0]["names"], serde_json::json!(["Czechoslovakia", "France"]));
    }

    #[test]
    fn test_cursor_over_change_years() {
        let mut cursor = YearCursor::for_resolver(&resolver());

        assert_eq!(cursor.years(), &[1947, 1972, 1993]);
        assert_eq!(cursor.current(), Some(1947));
        assert_eq!(cursor.advance(), Some(1972));
        assert_eq!(cursor.advance(), Some(1993));
        assert_eq!(cursor.advance(), Some(1947));
    }

    #[test]
    fn test_cursor_select() {
        let mut cursor = YearCursor::new([1993, 1947, 1972, 1972]);

        assert_eq!(cursor.select(1980), Some(1972));
        assert_eq!(cursor.select(1993), Some(1993));
        assert_eq!(cursor.select(2020), Some(1993));
        assert_eq!(cursor.select(1900), Some(1947));
        cursor.select(1993);
        assert_eq!(cursor.reset(), Some(1947));
    }

    #[test]
    fn test_empty_cursor() {
        let mut cursor = YearCursor::new(Vec::new());

        assert_eq!(cursor.current(), None);
        assert_eq!(cursor.advance(), None);
        assert_eq!(cursor.select(1990), None);
    }
}
