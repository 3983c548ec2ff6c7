//! # projstat-core
//!
//! Core domain model and ranking engine for projstat.
//!
//! This crate provides:
//! - Domain types: `Report`, `PersonName`, `Person`, `YearMonth`
//! - Ranking engine: `Ranking`, `RankingKind`, `RankingConfig` and key strategies
//! - The `Renderer` trait and error types shared by the output backends
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use projstat_core::{Person, PersonName, Ranking, RankingKind, Report};
//!
//! let day = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
//! let mut alice = Person::new(PersonName::new("alice"));
//! alice.add_reports([
//!     Report::new("Apollo", day, "Design review", 3.5),
//!     Report::new("Apollo", day, "Design review", 3.5),
//! ]);
//! assert_eq!(alice.reports().len(), 1);
//!
//! let ranking = Ranking::compute(RankingKind::Employee, [&alice], None);
//! assert_eq!(ranking.entries()[0].key, "alice");
//! ```

pub mod ranking;

pub use ranking::{
    rank_by, ByDay, ByMonth, ByPerson, ExportRow, KeyStrategy, Ranking, RankingConfig,
    RankingEntry, RankingKind, DEFAULT_DAY_LIMIT,
};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use thiserror::Error;

// ============================================================================
// Report
// ============================================================================

/// A single timesheet row: hours spent on a task of a project on a given day.
///
/// Equality, ordering and hashing are structural over all four fields, so two
/// rows with identical values are the same report. Hours are compared by bit
/// pattern with `-0.0` folded into `0.0`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Report {
    /// Project name (the sheet the row came from)
    pub project: String,
    /// Day the work was done
    pub date: NaiveDate,
    /// Free-text task description
    pub task: String,
    /// Hours worked, never negative
    pub hours: f64,
}

impl Report {
    pub fn new(
        project: impl Into<String>,
        date: NaiveDate,
        task: impl Into<String>,
        hours: f64,
    ) -> Self {
        Self {
            project: project.into(),
            date,
            task: task.into(),
            hours,
        }
    }

    /// Calendar month this report falls into
    pub fn month(&self) -> YearMonth {
        YearMonth::from_date(self.date)
    }

    fn normalized_hours(&self) -> f64 {
        if self.hours == 0.0 {
            0.0
        } else {
            self.hours
        }
    }
}

impl PartialEq for Report {
    fn eq(&self, other: &Self) -> bool {
        self.date == other.date
            && self.project == other.project
            && self.task == other.task
            && self.normalized_hours().to_bits() == other.normalized_hours().to_bits()
    }
}

impl Eq for Report {}

impl Hash for Report {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.project.hash(state);
        self.date.hash(state);
        self.task.hash(state);
        self.normalized_hours().to_bits().hash(state);
    }
}

impl PartialOrd for Report {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Report {
    fn cmp(&self, other: &Self) -> Ordering {
        self.date
            .cmp(&other.date)
            .then_with(|| self.project.cmp(&other.project))
            .then_with(|| self.task.cmp(&other.task))
            .then_with(|| self.normalized_hours().total_cmp(&other.normalized_hours()))
    }
}

// ============================================================================
// Year/Month
// ============================================================================

/// A calendar month, ordered chronologically and rendered as `YYYY-MM`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

// ============================================================================
// Person
// ============================================================================

/// Identity of a person, derived from the base name of a timesheet file.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonName(String);

impl PersonName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Derive a person name from a file path by stripping the final extension.
    ///
    /// `team/alice.xls` becomes `alice` and `alice.v2.xlsx` becomes `alice.v2`.
    /// Returns `None` when the path has no UTF-8 file stem.
    pub fn from_path(path: &Path) -> Option<Self> {
        let stem = path.file_stem()?.to_str()?;
        if stem.is_empty() {
            return None;
        }
        Some(Self(stem.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for PersonName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PersonName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A person and the deduplicated set of reports loaded for them
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    name: PersonName,
    reports: BTreeSet<Report>,
}

impl Person {
    pub fn new(name: PersonName) -> Self {
        Self {
            name,
            reports: BTreeSet::new(),
        }
    }

    pub fn name(&self) -> &PersonName {
        &self.name
    }

    pub fn reports(&self) -> &BTreeSet<Report> {
        &self.reports
    }

    /// Add reports, collapsing structural duplicates.
    ///
    /// Returns the number of reports that were not already present.
    pub fn add_reports(&mut self, reports: impl IntoIterator<Item = Report>) -> usize {
        let before = self.reports.len();
        self.reports.extend(reports);
        self.reports.len() - before
    }

    /// Sum of hours over all reports
    pub fn total_hours(&self) -> f64 {
        self.reports.iter().map(|r| r.hours).sum()
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// Output rendering
pub trait Renderer {
    type Output;

    /// Render computed rankings to the output format
    fn render(&self, rankings: &[Ranking]) -> Result<Self::Output, RenderError>;
}

// ============================================================================
// Errors
// ============================================================================

/// Rendering error
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// Errors raised while preparing or writing the export workbook
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Invalid export path: {0}")]
    InvalidPath(String),

    #[error("Export directory is not writable: {}", .0.display())]
    NotWritable(PathBuf),

    #[error(transparent)]
    Render(#[from] RenderError),
}

// ============================================================================
// Tests
// ============================================================================
