//! Timesheet file discovery.
//!
//! Walks a directory tree and returns every regular file whose extension is
//! one of the accepted spreadsheet extensions (case-insensitive). Entries that
//! cannot be read are skipped. Results are sorted by path.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

/// Extensions accepted when no others are configured
pub const DEFAULT_EXTENSIONS: &[&str] = &["xls", "xlsx"];

/// Recursive finder for timesheet workbooks
#[derive(Clone, Debug)]
pub struct FileLocator {
    extensions: Vec<String>,
}

impl Default for FileLocator {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| (*e).to_string()).collect(),
        }
    }
}

impl FileLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the accepted extensions (without the leading dot)
    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|e| e.into().trim_start_matches('.').to_ascii_lowercase())
            .collect();
        self
    }

    pub fn accepted_extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Whether the path carries one of the accepted extensions
    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|accepted| accepted.eq_ignore_ascii_case(ext)))
    }

    /// Find all matching files under `root`.
    ///
    /// A missing root yields an empty list. A root that is itself a matching
    /// file yields just that file.
    pub fn locate(&self, root: &Path) -> Vec<PathBuf> {
        if root.is_file() {
            return if self.matches(root) {
                vec![root.to_path_buf()]
            } else {
                Vec::new()
            };
        }

        if !root.is_dir() {
            debug!(root = %root.display(), "input root is not a directory");
            return Vec::new();
        }

        let mut files: Vec<PathBuf> = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    debug!(error = %err, "skipping unreadable directory entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file() && self.matches(entry.path()))
            .map(walkdir::DirEntry::into_path)
            .collect();

        files.sort();
        debug!(root = %root.display(), count = files.len(), "located timesheet files");
        files
    }
}
