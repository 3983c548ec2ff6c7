//! # projstat-render
//!
//! Output backends for computed rankings.
//!
//! This crate provides:
//! - Plain-text console listing (`TextRenderer`)
//! - JSON console output (`JsonRenderer`)
//! - Excel workbook export with one sheet per ranking (`ExcelExporter`)
//! - Export destination validation (`validate_export_target`)
//!
//! ## Example
//!
//! ```rust,ignore
//! use projstat_core::Renderer;
//! use projstat_render::{ExcelExporter, TextRenderer};
//!
//! print!("{}", TextRenderer::new().render(&rankings)?);
//!
//! let xlsx_bytes = ExcelExporter::new().render(&rankings)?;
//! std::fs::write("rankings.xlsx", xlsx_bytes)?;
//! ```

pub mod excel;

pub use excel::{validate_export_target, ExcelExporter};

use projstat_core::{Ranking, RankingKind, RenderError, Renderer};
use serde::Serialize;

/// Console text renderer
#[derive(Clone, Debug, Default)]
pub struct TextRenderer;

impl TextRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for TextRenderer {
    type Output = String;

    /// Each ranking's listing, separated by a blank line
    fn render(&self, rankings: &[Ranking]) -> Result<String, RenderError> {
        Ok(rankings
            .iter()
            .map(Ranking::to_text)
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

/// JSON renderer
#[derive(Clone, Debug)]
pub struct JsonRenderer {
    /// Pretty-print with indentation
    pub pretty: bool,
}

impl Default for JsonRenderer {
    fn default() -> Self {
        Self { pretty: true }
    }
}

impl JsonRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit compact single-line JSON
    pub fn compact(mut self) -> Self {
        self.pretty = false;
        self
    }
}

#[derive(Serialize)]
struct JsonRanking<'a> {
    kind: RankingKind,
    title: &'a str,
    entries: Vec<JsonEntry<'a>>,
}

#[derive(Serialize)]
struct JsonEntry<'a> {
    rank: usize,
    key: &'a str,
    hours: f64,
}

impl Renderer for JsonRenderer {
    type Output = String;

    fn render(&self, rankings: &[Ranking]) -> Result<String, RenderError> {
        let payload: Vec<JsonRanking<'_>> = rankings
            .iter()
            .map(|ranking| JsonRanking {
                kind: ranking.kind(),
                title: ranking.title(),
                entries: ranking
                    .entries()
                    .iter()
                    .enumerate()
                    .map(|(idx, entry)| JsonEntry {
                        rank: idx + 1,
                        key: &entry.key,
                        hours: entry.total_hours,
                    })
                    .collect(),
            })
            .collect();

        let json = if self.pretty {
            serde_json::to_string_pretty(&payload)
        } else {
            serde_json::to_string(&payload)
        };
        json.map_err(|e| RenderError::Format(e.to_string()))
    }
}
