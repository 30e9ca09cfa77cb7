//! Drift verification
//!
//! Two checks, reported separately:
//! - no placeholder markers remain in non-test source files
//! - the error catalog has exactly one message per error kind

use crudkit::error::{CatalogDrift, CatalogError, ErrorCatalog};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

static MARKER: Lazy<Regex> = Lazy::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"(?:TODO|FIXME|XXX):").expect("valid marker pattern")
});

/// Verification failures that prevent a report
#[derive(Debug, Error)]
pub enum VerifyError {
    /// Scan root does not exist
    #[error("Source root not found: {0}")]
    MissingRoot(PathBuf),

    /// Directory walk failed
    #[error("Failed to scan source tree: {0}")]
    Walk(#[from] walkdir::Error),

    /// File could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },

    /// Catalog could not be loaded
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// A placeholder marker left in source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    /// File containing the marker
    pub path: PathBuf,
    /// 1-based line number
    pub line: usize,
    /// Trimmed line text
    pub text: String,
}

/// Result of both checks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriftReport {
    /// Markers found, in path then line order
    pub markers: Vec<Marker>,
    /// Catalog key differences
    pub catalog: CatalogDrift,
}

impl DriftReport {
    /// No markers and a complete catalog
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.markers.is_empty() && self.catalog.is_clean()
    }

    /// Distinct files containing markers
    #[must_use]
    pub fn marker_files(&self) -> Vec<&Path> {
        let mut files: Vec<&Path> = self.markers.iter().map(|m| m.path.as_path()).collect();
        files.dedup();
        files
    }
}

/// Whether a path is test code and exempt from marker checks
///
/// Test files are `*_test.rs`, `tests.rs`, and anything under a `tests` directory.
#[must_use]
pub fn is_test_path(path: &Path) -> bool {
    if path.components().any(|c| c.as_os_str() == "tests") {
        return true;
    }
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name == "tests.rs" || name.ends_with("_test.rs"))
}

/// Whether a path is Rust source
#[must_use]
pub fn is_source_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "rs")
}

fn is_test_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_type().is_dir() && entry.file_name() == "tests"
}

/// Find placeholder markers in the `.rs` files under `root`
///
/// Files that are not UTF-8 text are skipped.
///
/// # Errors
///
/// Returns an error if the root is missing or a file cannot be read
pub fn scan_markers(root: &Path) -> Result<Vec<Marker>, VerifyError> {
    if !root.exists() {
        return Err(VerifyError::MissingRoot(root.to_path_buf()));
    }

    let mut markers = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_test_dir(entry));

    for entry in walker {
        let entry = entry?;
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        if !entry.file_type().is_file() || !is_source_file(relative) || is_test_path(relative)
        {
            continue;
        }

        scan_file(entry.path(), &mut markers)?;
    }

    Ok(markers)
}

/// Find placeholder markers in specific files under `root`, skipping test and
/// non-Rust files
///
/// # Errors
///
/// Returns an error if a file cannot be read
pub fn scan_files(root: &Path, paths: &[PathBuf]) -> Result<Vec<Marker>, VerifyError> {
    let mut markers = Vec::new();
    for path in paths
        .iter()
        .filter(|path| is_source_file(path) && !is_test_path(path))
    {
        scan_file(&root.join(path), &mut markers)?;
    }
    Ok(markers)
}

fn scan_file(path: &Path, markers: &mut Vec<Marker>) -> Result<(), VerifyError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::InvalidData => {
            debug!(path = %path.display(), "skipping non-text file");
            return Ok(());
        }
        Err(source) => {
            return Err(VerifyError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    for (index, line) in content.lines().enumerate() {
        if MARKER.is_match(line) {
            markers.push(Marker {
                path: path.to_path_buf(),
                line: index + 1,
                text: line.trim().to_string(),
            });
        }
    }
    Ok(())
}

/// Verifier over one source tree and one catalog
#[derive(Debug, Clone)]
pub struct DriftVerifier {
    source_root: PathBuf,
    catalog: Option<PathBuf>,
}

impl DriftVerifier {
    /// Scan `source_root`; check the built-in catalog unless one is set
    #[must_use]
    pub fn new(source_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            catalog: None,
        }
    }

    /// Check this catalog file instead of the built-in one
    #[must_use]
    pub fn with_catalog(mut self, path: Option<PathBuf>) -> Self {
        self.catalog = path;
        self
    }

    /// Scanned directory
    #[must_use]
    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// Run both checks
    ///
    /// # Errors
    ///
    /// Returns an error if the tree cannot be scanned or the catalog cannot be loaded
    pub fn run(&self) -> Result<DriftReport, VerifyError> {
        let markers = scan_markers(&self.source_root)?;
        let catalog = match &self.catalog {
            Some(path) => ErrorCatalog::load(path)?,
            None => ErrorCatalog::default(),
        };

        Ok(DriftReport {
            markers,
            catalog: catalog.drift(),
        })
    }
}
