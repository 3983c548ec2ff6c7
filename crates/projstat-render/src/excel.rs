//! Excel ranking export
//!
//! Writes one worksheet per ranking into a single XLSX workbook:
//!
//! ```text
//! Sheet: Busiest days
//! | Rank | Date       | Hours |
//! |------|------------|-------|
//! | 1    | 2024-03-12 | 21.50 |
//! | 2    | 2024-03-07 | 19.00 |
//! ```
//!
//! Sheet names come from the ranking kind. A kind that appears twice gets a
//! numbered suffix so the workbook stays valid.
//!
//! The document creation date is pinned, so identical rankings always
//! produce identical bytes.

use std::fs;
use std::path::{Path, MAIN_SEPARATOR};

use projstat_core::{ExportError, Ranking, RenderError, Renderer};
use rust_xlsxwriter::{DocProperties, ExcelDateTime, Format, FormatAlign, FormatBorder, Workbook};
use tempfile::NamedTempFile;
use tracing::debug;

/// Excel ranking exporter
#[derive(Clone, Debug)]
pub struct ExcelExporter {
    /// Number format for the hours column
    pub hours_format: String,
    /// Whether to freeze the header row
    pub freeze_header: bool,
}

impl Default for ExcelExporter {
    fn default() -> Self {
        Self {
            hours_format: "0.00".into(),
            freeze_header: true,
        }
    }
}

struct ExcelFormats {
    header: Format,
    rank: Format,
    text: Format,
    hours: Format,
}

impl ExcelExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number format used for hours
    pub fn hours_format(mut self, format: impl Into<String>) -> Self {
        self.hours_format = format.into();
        self
    }

    /// Leave the header row scrollable
    pub fn no_freeze(mut self) -> Self {
        self.freeze_header = false;
        self
    }

    /// Generate Excel workbook bytes
    pub fn render_to_bytes(&self, rankings: &[Ranking]) -> Result<Vec<u8>, RenderError> {
        if rankings.is_empty() {
            return Err(RenderError::InvalidData("No rankings to export".into()));
        }

        let mut workbook = Workbook::new();
        let created = ExcelDateTime::from_ymd(2000, 1, 1)
            .map_err(|e| RenderError::Format(format!("Invalid creation date: {e}")))?;
        workbook.set_properties(&DocProperties::new().set_creation_datetime(&created));

        let formats = self.create_formats();
        let mut used_names: Vec<String> = Vec::new();

        for ranking in rankings {
            let name = unique_sheet_name(ranking.kind().sheet_name(), &used_names);
            self.add_ranking_sheet(&mut workbook, &name, ranking, &formats)?;
            used_names.push(name);
        }

        workbook
            .save_to_buffer()
            .map_err(|e| RenderError::Format(format!("Failed to create Excel: {e}")))
    }

    /// Render and write the workbook to `path`
    pub fn save(&self, rankings: &[Ranking], path: &Path) -> Result<(), RenderError> {
        let bytes = self.render_to_bytes(rankings)?;
        fs::write(path, bytes)?;
        debug!(path = %path.display(), sheets = rankings.len(), "wrote ranking workbook");
        Ok(())
    }

    fn create_formats(&self) -> ExcelFormats {
        let header = Format::new()
            .set_bold()
            .set_align(FormatAlign::Center)
            .set_background_color(0x4472C4)
            .set_font_color(0xFFFFFF)
            .set_border(FormatBorder::Thin);

        let rank = Format::new()
            .set_num_format("0")
            .set_align(FormatAlign::Center)
            .set_border(FormatBorder::Thin);

        let text = Format::new().set_border(FormatBorder::Thin);

        let hours = Format::new()
            .set_num_format(&self.hours_format)
            .set_border(FormatBorder::Thin);

        ExcelFormats {
            header,
            rank,
            text,
            hours,
        }
    }

    fn add_ranking_sheet(
        &self,
        workbook: &mut Workbook,
        name: &str,
        ranking: &Ranking,
        formats: &ExcelFormats,
    ) -> Result<(), RenderError> {
        let sheet = workbook.add_worksheet();
        sheet
            .set_name(name)
            .map_err(|e| RenderError::Format(e.to_string()))?;

        let key_header = ranking.kind().key_header();
        for (col, header) in ["Rank", key_header, "Hours"].iter().enumerate() {
            sheet
                .write_with_format(0, col as u16, *header, &formats.header)
                .map_err(|e| RenderError::Format(e.to_string()))?;
        }

        let rows = ranking.export_rows();
        let key_width = rows
            .iter()
            .map(|r| r.key.chars().count())
            .chain(std::iter::once(key_header.len()))
            .max()
            .unwrap_or(0);

        sheet.set_column_width(0, 8).ok();
        sheet.set_column_width(1, (key_width + 2) as f64).ok();
        sheet.set_column_width(2, 12).ok();

        for (idx, row) in rows.iter().enumerate() {
            let line = idx as u32 + 1;
            sheet
                .write_number_with_format(line, 0, row.position as f64, &formats.rank)
                .map_err(|e| RenderError::Format(e.to_string()))?;
            sheet
                .write_string_with_format(line, 1, &row.key, &formats.text)
                .map_err(|e| RenderError::Format(e.to_string()))?;
            sheet
                .write_number_with_format(line, 2, row.total_hours, &formats.hours)
                .map_err(|e| RenderError::Format(e.to_string()))?;
        }

        if self.freeze_header {
            sheet
                .set_freeze_panes(1, 0)
                .map_err(|e| RenderError::Format(e.to_string()))?;
        }

        Ok(())
    }
}

impl Renderer for ExcelExporter {
    type Output = Vec<u8>;

    fn render(&self, rankings: &[Ranking]) -> Result<Vec<u8>, RenderError> {
        self.render_to_bytes(rankings)
    }
}

fn unique_sheet_name(base: &str, used: &[String]) -> String {
    if !used.iter().any(|n| n == base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{base} ({n})"))
        .find(|candidate| !used.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

/// Check that `path` names a file inside an existing, writable directory.
///
/// A path without a directory component refers to the working directory.
/// Writability is tested by creating (and dropping) a scratch file there.
pub fn validate_export_target(path: &Path) -> Result<(), ExportError> {
    let raw = path.to_string_lossy();
    if raw.trim().is_empty() {
        return Err(ExportError::InvalidPath("path is empty".into()));
    }
    if raw.ends_with('/') || raw.ends_with(MAIN_SEPARATOR) || path.file_name().is_none() {
        return Err(ExportError::InvalidPath(format!("'{raw}' does not name a file")));
    }
    if path.is_dir() {
        return Err(ExportError::InvalidPath(format!("'{raw}' is a directory")));
    }

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let writable = fs::metadata(parent)
        .is_ok_and(|meta| meta.is_dir() && !meta.permissions().readonly())
        && NamedTempFile::new_in(parent).is_ok();
    if !writable {
        return Err(ExportError::NotWritable(parent.to_path_buf()));
    }

    Ok(())
}
