//! Report extraction from timesheet workbooks.
//!
//! Every sheet of a workbook is one project. Row 0 of each sheet is a header.
//! Data rows carry the date in column 0, the task in column 1 and the hours
//! in column 2. Rows with a blank or unparseable date or hours cell are
//! skipped; scanning continues with the next row.
//!
//! ## Accepted cell values
//!
//! | Column | Accepted |
//! |--------|----------|
//! | date   | date/time cell, 1900-system serial number, ISO-8601 text, `dd.mm.yyyy` text |
//! | task   | any cell, rendered as text; missing or empty gives `""` |
//! | hours  | numeric cell or decimal text (`.` separator), finite and not negative |

use std::collections::BTreeSet;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use projstat_core::Report;
use tracing::{debug, trace, warn};

use crate::LoadError;

pub const DATE_COLUMN: u32 = 0;
pub const TASK_COLUMN: u32 = 1;
pub const HOURS_COLUMN: u32 = 2;

/// Text date layout (e.g. `24.12.2023`)
pub const TEXT_DATE_FORMAT: &str = "%d.%m.%Y";

/// Largest serial the 1900 date system can express (9999-12-31)
const MAX_SERIAL: f64 = 2_958_465.0;

/// Reports and statistics read from one workbook
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtractedFile {
    pub reports: BTreeSet<Report>,
    pub sheets_read: usize,
    /// Rows that produced a report (before deduplication)
    pub rows_accepted: usize,
    /// Non-empty rows rejected as invalid
    pub rows_skipped: usize,
}

/// Read every sheet of the workbook at `path`.
///
/// The workbook handle is dropped when this function returns, on success or
/// failure.
pub fn extract_file(path: &Path) -> Result<ExtractedFile, LoadError> {
    let mut workbook: Sheets<_> = open_workbook_auto(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let mut extracted = ExtractedFile::default();
    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();

    for sheet_name in &sheet_names {
        let range = workbook
            .worksheet_range(sheet_name)
            .map_err(|source| LoadError::Sheet {
                path: path.to_path_buf(),
                sheet: sheet_name.clone(),
                source,
            })?;

        extract_sheet(sheet_name, &range, &mut extracted);
        extracted.sheets_read += 1;
    }

    debug!(
        path = %path.display(),
        sheets = extracted.sheets_read,
        reports = extracted.reports.len(),
        skipped = extracted.rows_skipped,
        "extracted workbook"
    );
    Ok(extracted)
}

/// Like [`extract_file`], but an unreadable workbook yields an empty set.
pub fn extract_or_empty(path: &Path) -> BTreeSet<Report> {
    match extract_file(path) {
        Ok(extracted) => extracted.reports,
        Err(err) => {
            warn!(error = %err, "skipping unreadable workbook");
            BTreeSet::new()
        }
    }
}

/// Scan one sheet's data rows into `out`
pub fn extract_sheet(project: &str, range: &Range<Data>, out: &mut ExtractedFile) {
    let (Some(start), Some(end)) = (range.start(), range.end()) else {
        return;
    };

    // Row 0 is the header, wherever the used range begins.
    for row in start.0.max(1)..=end.0 {
        let date = range.get_value((row, DATE_COLUMN));
        let task = range.get_value((row, TASK_COLUMN));
        let hours = range.get_value((row, HOURS_COLUMN));

        if [date, task, hours].iter().all(|cell| cell.map_or(true, is_blank)) {
            continue;
        }

        match parse_row(project, date, task, hours) {
            Some(report) => {
                out.rows_accepted += 1;
                out.reports.insert(report);
            }
            None => {
                trace!(project, row, "skipping invalid row");
                out.rows_skipped += 1;
            }
        }
    }
}

/// Build a report from the three data cells of a row, or `None` if the row is invalid
pub fn parse_row(
    project: &str,
    date: Option<&Data>,
    task: Option<&Data>,
    hours: Option<&Data>,
) -> Option<Report> {
    let date_cell = date.filter(|cell| !is_blank(cell))?;
    let hours_cell = hours.filter(|cell| !is_blank(cell))?;

    let date = parse_date(date_cell)?;
    let task = task.map(cell_text).unwrap_or_default();
    let hours = parse_hours(hours_cell)?;

    Some(Report::new(project, date, task, hours))
}

/// Empty cells and whitespace-only text are blank
pub fn is_blank(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Parse a date cell, discarding any time of day
pub fn parse_date(cell: &Data) -> Option<NaiveDate> {
    match cell {
        Data::DateTime(dt) => serial_to_date(dt.as_f64()),
        Data::Float(serial) => serial_to_date(*serial),
        Data::Int(serial) => serial_to_date(*serial as f64),
        Data::DateTimeIso(s) | Data::String(s) => parse_date_text(s.trim()),
        _ => None,
    }
}

/// Parse an hours cell
pub fn parse_hours(cell: &Data) -> Option<f64> {
    let value = match cell {
        Data::Float(f) => *f,
        Data::Int(i) => *i as f64,
        Data::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    (value.is_finite() && value >= 0.0).then_some(value)
}

/// Render a task cell as text
pub fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string(),
    }
}

/// Convert a 1900-system spreadsheet serial to a date.
///
/// Serials below 61 account for the phantom 1900-02-29.
fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(1.0..=MAX_SERIAL).contains(&serial) {
        return None;
    }

    let days = serial.floor() as i64;
    let offset = if days < 61 { days + 1 } else { days };
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_signed(Duration::days(offset))
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, TEXT_DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(text, "%Y-%m-%d"))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
                .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f"))
                .ok()
                .map(|dt| dt.date())
        })
}
