//! # projstat-loader
//!
//! Loads per-person timesheet workbooks into a [`PersonRepository`].
//!
//! This crate provides:
//! - File discovery (`discovery`): recursive, case-insensitive extension match
//! - Report extraction (`extract`): one project per sheet, invalid rows skipped
//! - Per-person merging (`repository`): deduplicated union keyed by file stem
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use projstat_loader::{load_directory, FileLocator};
//!
//! let loaded = load_directory(Path::new("timesheets"), &FileLocator::new());
//! println!("{} people, {} files skipped", loaded.repository.len(), loaded.summary.files_skipped);
//! ```

pub mod discovery;
pub mod extract;
pub mod repository;

pub use discovery::{FileLocator, DEFAULT_EXTENSIONS};
pub use extract::{extract_file, extract_or_empty, ExtractedFile};
pub use repository::PersonRepository;

use std::fs;
use std::path::{Path, PathBuf};

use projstat_core::PersonName;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Workbook loading error
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to open workbook {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("Failed to read sheet '{sheet}' in {}: {source}", path.display())]
    Sheet {
        path: PathBuf,
        sheet: String,
        #[source]
        source: calamine::Error,
    },
}

/// Counters collected while loading a directory
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Files matched by the locator
    pub files_found: usize,
    /// Files successfully read
    pub files_loaded: usize,
    /// Files that were empty, unnamed or unreadable
    pub files_skipped: usize,
    /// Invalid rows skipped across all loaded files
    pub rows_skipped: usize,
    /// Distinct persons after merging
    pub persons: usize,
}

/// Repository plus load statistics
#[derive(Clone, Debug, Default)]
pub struct Loaded {
    pub repository: PersonRepository,
    pub summary: LoadSummary,
}

/// Locate, extract and merge every timesheet under `root`.
///
/// Unreadable workbooks still register their person, with no reports.
/// Zero-length files are ignored entirely.
pub fn load_directory(root: &Path, locator: &FileLocator) -> Loaded {
    let files = locator.locate(root);
    load_files(&files)
}

/// Extract and merge an explicit list of files, in order
pub fn load_files<P: AsRef<Path>>(files: &[P]) -> Loaded {
    let mut repository = PersonRepository::new();
    let mut summary = LoadSummary {
        files_found: files.len(),
        ..LoadSummary::default()
    };

    for file in files {
        let file = file.as_ref();

        let Some(name) = PersonName::from_path(file) else {
            warn!(path = %file.display(), "cannot derive a person name, skipping");
            summary.files_skipped += 1;
            continue;
        };

        if is_empty_file(file) {
            debug!(path = %file.display(), "skipping empty file");
            summary.files_skipped += 1;
            continue;
        }

        match extract_file(file) {
            Ok(extracted) => {
                summary.files_loaded += 1;
                summary.rows_skipped += extracted.rows_skipped;
                repository.merge(name, extracted.reports);
            }
            Err(err) => {
                warn!(error = %err, "skipping unreadable workbook");
                summary.files_skipped += 1;
                repository.merge(name, []);
            }
        }
    }

    summary.persons = repository.len();
    info!(
        found = summary.files_found,
        loaded = summary.files_loaded,
        skipped = summary.files_skipped,
        persons = summary.persons,
        "timesheets loaded"
    );

    Loaded { repository, summary }
}

fn is_empty_file(path: &Path) -> bool {
    fs::metadata(path).is_ok_and(|meta| meta.len() == 0)
}
