//! Ranking engine
//!
//! All rankings share one routine: flatten every report of every person,
//! group by a key, sum the hours per group, sort by total descending (key
//! ascending on ties) and optionally truncate.
//!
//! The grouping key is supplied by a [`KeyStrategy`]:
//!
//! | Strategy   | Key          | Default limit |
//! |------------|--------------|---------------|
//! | [`ByDay`]    | `NaiveDate`  | 10            |
//! | [`ByMonth`]  | `YearMonth`  | none          |
//! | [`ByPerson`] | `PersonName` | none          |
//!
//! Keys stay typed until the entries are sorted, so ties break
//! chronologically for dates and months and by name for people.

use std::collections::BTreeMap;
use std::fmt::{self, Write as _};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Person, PersonName, Report, YearMonth};

/// Default cap on the busiest-days ranking
pub const DEFAULT_DAY_LIMIT: usize = 10;

// ============================================================================
// Ranking Kind
// ============================================================================

/// The three supported ranking views
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankingKind {
    /// Busiest individual days
    Day,
    /// Busiest calendar months
    Month,
    /// Most active people
    Employee,
}

impl RankingKind {
    /// All kinds, in output order
    pub const ALL: [RankingKind; 3] = [RankingKind::Day, RankingKind::Month, RankingKind::Employee];

    /// Heading used for console output
    pub fn title(self) -> &'static str {
        match self {
            RankingKind::Day => "Ranking of the busiest days",
            RankingKind::Month => "Ranking of the busiest months",
            RankingKind::Employee => "Ranking of employees by working hours",
        }
    }

    /// Worksheet name used for export
    pub fn sheet_name(self) -> &'static str {
        match self {
            RankingKind::Day => "Busiest days",
            RankingKind::Month => "Busiest months",
            RankingKind::Employee => "Most active employees",
        }
    }

    /// Header of the key column
    pub fn key_header(self) -> &'static str {
        match self {
            RankingKind::Day => "Date",
            RankingKind::Month => "Month",
            RankingKind::Employee => "Employee",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RankingKind::Day => "day",
            RankingKind::Month => "month",
            RankingKind::Employee => "employee",
        }
    }
}

impl fmt::Display for RankingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Per-kind entry limits. `None` means unbounded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RankingConfig {
    pub day_limit: Option<usize>,
    pub month_limit: Option<usize>,
    pub employee_limit: Option<usize>,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            day_limit: Some(DEFAULT_DAY_LIMIT),
            month_limit: None,
            employee_limit: None,
        }
    }
}

impl RankingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the busiest-days limit
    pub fn day_limit(mut self, limit: Option<usize>) -> Self {
        self.day_limit = limit;
        self
    }

    /// Set the busiest-months limit
    pub fn month_limit(mut self, limit: Option<usize>) -> Self {
        self.month_limit = limit;
        self
    }

    /// Set the most-active-employees limit
    pub fn employee_limit(mut self, limit: Option<usize>) -> Self {
        self.employee_limit = limit;
        self
    }

    pub fn limit_for(&self, kind: RankingKind) -> Option<usize> {
        match kind {
            RankingKind::Day => self.day_limit,
            RankingKind::Month => self.month_limit,
            RankingKind::Employee => self.employee_limit,
        }
    }

    /// Compute one ranking per requested kind, in the order given
    pub fn compute_all<'a, I>(&self, kinds: &[RankingKind], persons: I) -> Vec<Ranking>
    where
        I: IntoIterator<Item = &'a Person> + Clone,
    {
        kinds
            .iter()
            .map(|&kind| Ranking::compute(kind, persons.clone(), self.limit_for(kind)))
            .collect()
    }
}

// ============================================================================
// Key Strategies
// ============================================================================

/// Extracts the grouping key of a report for one ranking kind
pub trait KeyStrategy {
    type Key: Ord + fmt::Display;

    const KIND: RankingKind;

    fn key(person: &Person, report: &Report) -> Self::Key;
}

/// Groups by exact date
pub struct ByDay;

/// Groups by calendar month
pub struct ByMonth;

/// Groups by person
pub struct ByPerson;

impl KeyStrategy for ByDay {
    type Key = NaiveDate;

    const KIND: RankingKind = RankingKind::Day;

    fn key(_person: &Person, report: &Report) -> NaiveDate {
        report.date
    }
}

impl KeyStrategy for ByMonth {
    type Key = YearMonth;

    const KIND: RankingKind = RankingKind::Month;

    fn key(_person: &Person, report: &Report) -> YearMonth {
        report.month()
    }
}

impl KeyStrategy for ByPerson {
    type Key = PersonName;

    const KIND: RankingKind = RankingKind::Employee;

    fn key(person: &Person, _report: &Report) -> PersonName {
        person.name().clone()
    }
}

/// Group, sum, sort and truncate using strategy `S`.
pub fn rank_by<'a, S, I>(persons: I, limit: Option<usize>) -> Ranking
where
    S: KeyStrategy,
    I: IntoIterator<Item = &'a Person>,
{
    let mut totals: BTreeMap<S::Key, f64> = BTreeMap::new();
    for person in persons {
        for report in person.reports() {
            *totals.entry(S::key(person, report)).or_insert(0.0) += report.hours;
        }
    }

    let mut grouped: Vec<(S::Key, f64)> = totals.into_iter().collect();
    grouped.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    if let Some(limit) = limit {
        grouped.truncate(limit);
    }

    let entries = grouped
        .into_iter()
        .map(|(key, total_hours)| RankingEntry {
            key: key.to_string(),
            total_hours,
        })
        .collect();

    Ranking {
        kind: S::KIND,
        entries,
    }
}

// ============================================================================
// Ranking
// ============================================================================

/// One ranked key and its summed hours
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub key: String,
    pub total_hours: f64,
}

/// A row handed to export backends
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExportRow {
    /// 1-based rank
    pub position: usize,
    pub key: String,
    pub total_hours: f64,
}

/// A computed, frozen ranking
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Ranking {
    kind: RankingKind,
    entries: Vec<RankingEntry>,
}

impl Ranking {
    /// Compute the ranking of `kind` over `persons`
    pub fn compute<'a, I>(kind: RankingKind, persons: I, limit: Option<usize>) -> Self
    where
        I: IntoIterator<Item = &'a Person>,
    {
        match kind {
            RankingKind::Day => rank_by::<ByDay, _>(persons, limit),
            RankingKind::Month => rank_by::<ByMonth, _>(persons, limit),
            RankingKind::Employee => rank_by::<ByPerson, _>(persons, limit),
        }
    }

    pub fn kind(&self) -> RankingKind {
        self.kind
    }

    pub fn title(&self) -> &'static str {
        self.kind.title()
    }

    pub fn entries(&self) -> &[RankingEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Rows for export: rank position, key text and total hours
    pub fn export_rows(&self) -> Vec<ExportRow> {
        self.entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| ExportRow {
                position: idx + 1,
                key: entry.key.clone(),
                total_hours: entry.total_hours,
            })
            .collect()
    }

    /// Formatted console listing
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str(self.title());
        out.push('\n');

        if self.entries.is_empty() {
            out.push_str("  (no data)\n");
            return out;
        }

        let key_width = self.entries.iter().map(|e| e.key.chars().count()).max().unwrap_or(0);
        let rank_width = self.entries.len().to_string().len();
        for (idx, entry) in self.entries.iter().enumerate() {
            let _ = writeln!(
                out,
                "  {:>rank_width$}. {:<key_width$}  {:>8.2}",
                idx + 1,
                entry.key,
                entry.total_hours,
            );
        }
        out
    }
}

impl fmt::Display for Ranking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn person(name: &str, rows: &[(NaiveDate, f64)]) -> Person {
        let mut p = Person::new(PersonName::new(name));
        p.add_reports(
            rows.iter()
                .enumerate()
                .map(|(i, (d, h))| Report::new("Apollo", *d, format!("task {i}"), *h)),
        );
        p
    }

    fn keys(ranking: &Ranking) -> Vec<&str> {
        ranking.entries().iter().map(|e| e.key.as_str()).collect()
    }

    #[test]
    fn day_ranking_sums_across_people() {
        let alice = person("alice", &[(date(2024, 1, 2), 3.0), (date(2024, 1, 3), 8.0)]);
        let bob = person("bob", &[(date(2024, 1, 2), 6.0)]);

        let ranking = Ranking::compute(RankingKind::Day, [&alice, &bob], None);
        assert_eq!(
            ranking.entries(),
            &[
                RankingEntry { key: "2024-01-02".into(), total_hours: 9.0 },
                RankingEntry { key: "2024-01-03".into(), total_hours: 8.0 },
            ]
        );
    }

    #[test]
    fn day_ranking_default_cap_is_ten() {
        let rows: Vec<_> = (1..=15).map(|d| (date(2024, 5, d), f64::from(d))).collect();
        let alice = person("alice", &rows);

        let ranking = RankingConfig::default()
            .compute_all(&[RankingKind::Day], [&alice])
            .remove(0);
        assert_eq!(ranking.len(), 10);
        assert_eq!(ranking.entries()[0].key, "2024-05-15");
        assert_eq!(ranking.entries()[9].key, "2024-05-06");
    }

    #[test]
    fn month_ranking_is_unbounded_by_default() {
        let rows: Vec<_> = (1..=12).map(|m| (date(2023, m, 1), 1.0)).collect();
        let alice = person("alice", &rows);

        let config = RankingConfig::default();
        let ranking = Ranking::compute(RankingKind::Month, [&alice], config.limit_for(RankingKind::Month));
        assert_eq!(ranking.len(), 12);
    }

    #[test]
    fn ties_break_by_ascending_key() {
        let alice = person("alice", &[(date(2024, 2, 1), 4.0), (date(2024, 1, 1), 4.0)]);
        let carol = person("carol", &[(date(2024, 3, 1), 8.0)]);
        let bob = person("bob", &[(date(2024, 3, 2), 8.0)]);

        let days = Ranking::compute(RankingKind::Day, [&alice, &bob, &carol], None);
        assert_eq!(keys(&days), vec!["2024-03-01", "2024-03-02", "2024-01-01", "2024-02-01"]);

        let people = Ranking::compute(RankingKind::Employee, [&carol, &bob, &alice], None);
        assert_eq!(keys(&people), vec!["alice", "bob", "carol"]);
    }

    #[test]
    fn month_keys_tie_chronologically() {
        let alice = person("alice", &[(date(2024, 10, 1), 5.0), (date(2024, 9, 30), 5.0)]);
        let ranking = Ranking::compute(RankingKind::Month, [&alice], None);
        assert_eq!(keys(&ranking), vec!["2024-09", "2024-10"]);
    }

    #[test]
    fn month_ranking_groups_by_year_and_month() {
        let alice = person(
            "alice",
            &[
                (date(2024, 1, 5), 2.0),
                (date(2024, 1, 20), 3.0),
                (date(2023, 1, 5), 4.0),
            ],
        );
        let ranking = Ranking::compute(RankingKind::Month, [&alice], None);
        assert_eq!(
            ranking.entries(),
            &[
                RankingEntry { key: "2024-01".into(), total_hours: 5.0 },
                RankingEntry { key: "2023-01".into(), total_hours: 4.0 },
            ]
        );
    }

    #[test]
    fn totals_match_sum_of_report_hours() {
        let alice = person("alice", &[(date(2024, 1, 1), 1.25), (date(2024, 1, 2), 2.5)]);
        let bob = person("bob", &[(date(2024, 1, 1), 0.75)]);
        let persons = [&alice, &bob];

        let people = Ranking::compute(RankingKind::Employee, persons, None);
        for entry in people.entries() {
            let owner = persons.iter().find(|p| p.name().as_str() == entry.key).unwrap();
            assert_eq!(entry.total_hours, owner.total_hours());
        }

        let days = Ranking::compute(RankingKind::Day, persons, None);
        let first = &days.entries()[0];
        assert_eq!(first.key, "2024-01-02");
        assert_eq!(first.total_hours, 2.5);
        assert_eq!(days.entries()[1].total_hours, 2.0);
    }

    #[test]
    fn explicit_limits_apply_per_kind() {
        let alice = person("alice", &[(date(2024, 1, 1), 1.0), (date(2024, 2, 1), 2.0)]);
        let bob = person("bob", &[(date(2024, 3, 1), 3.0)]);

        let config = RankingConfig::new()
            .day_limit(None)
            .month_limit(Some(1))
            .employee_limit(Some(0));
        let rankings = config.compute_all(&RankingKind::ALL, [&alice, &bob]);

        assert_eq!(rankings.len(), 3);
        assert_eq!(rankings[0].len(), 3);
        assert_eq!(keys(&rankings[1]), vec!["2024-03"]);
        assert!(rankings[2].is_empty());
    }

    #[test]
    fn person_without_reports_is_not_ranked() {
        let empty = Person::new(PersonName::new("ghost"));
        let ranking = Ranking::compute(RankingKind::Employee, [&empty], None);
        assert!(ranking.is_empty());
    }

    #[test]
    fn export_rows_follow_entry_order() {
        let alice = person("alice", &[(date(2024, 1, 1), 1.0)]);
        let bob = person("bob", &[(date(2024, 1, 1), 7.5)]);
        let ranking = Ranking::compute(RankingKind::Employee, [&alice, &bob], None);

        assert_eq!(
            ranking.export_rows(),
            vec![
                ExportRow { position: 1, key: "bob".into(), total_hours: 7.5 },
                ExportRow { position: 2, key: "alice".into(), total_hours: 1.0 },
            ]
        );
    }

    #[test]
    fn text_listing_is_aligned() {
        let alice = person("alice", &[(date(2024, 1, 1), 1.0)]);
        let barbara = person("barbara", &[(date(2024, 1, 1), 12.5)]);
        let ranking = Ranking::compute(RankingKind::Employee, [&alice, &barbara], None);

        let expected = "Ranking of employees by working hours\n  1. barbara     12.50\n  2. alice        1.00\n";
        assert_eq!(ranking.to_text(), expected);
        assert_eq!(ranking.to_string(), expected);
    }

    #[test]
    fn empty_ranking_text() {
        let ranking = Ranking::compute(RankingKind::Month, std::iter::empty(), None);
        assert_eq!(ranking.to_text(), "Ranking of the busiest months\n  (no data)\n");
    }

    #[test]
    fn kind_metadata() {
        assert_eq!(RankingKind::Day.sheet_name(), "Busiest days");
        assert_eq!(RankingKind::Employee.key_header(), "Employee");
        assert_eq!(RankingKind::Month.to_string(), "month");
    }
}
