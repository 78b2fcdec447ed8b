//! Check report types.

use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use serde::Serialize;

use crate::document::Document;
use crate::error::ScanError;
use crate::scanner::{HeaderCallback, ScanSummary};
use crate::template::HeaderTemplate;

/// Result of a check run.
///
/// CI pipelines must check both `missing` and `discovery_errors`.
/// A non-empty `discovery_errors` means part of the tree was never checked.
#[derive(Debug, Clone, Serialize)]
#[non_exhaustive]
pub struct CheckReport {
    /// Number of files handed to the scanner.
    pub files_scanned: usize,
    /// Files recognized as the canonical header template itself.
    pub header_files: usize,
    /// Files whose type has no known comment style.
    pub unsupported_files: usize,
    /// Files carrying the canonical or an accepted alternate header.
    pub existing: Vec<PathBuf>,
    /// Files with no accepted header.
    pub missing: Vec<PathBuf>,
    /// Paths that could not be walked or exclude patterns that did not parse.
    pub discovery_errors: Vec<ScanError>,
    /// Whether no header is missing AND discovery completed cleanly.
    pub ok: bool,
}

impl CheckReport {
    /// Assemble a report from a finished scan.
    #[must_use]
    pub fn new(
        summary: ScanSummary,
        collector: ReportCollector,
        discovery_errors: Vec<ScanError>,
    ) -> Self {
        let (existing, missing) = collector.into_sorted();
        let ok = missing.is_empty() && discovery_errors.is_empty();
        Self {
            files_scanned: summary.submitted,
            header_files: summary.header_files,
            unsupported_files: summary.unsupported,
            existing,
            missing,
            discovery_errors,
            ok,
        }
    }

    /// Number of files missing a header.
    #[must_use]
    pub fn missing_count(&self) -> usize {
        self.missing.len()
    }
}

/// A [`HeaderCallback`] that records every reported path.
#[derive(Debug, Default)]
pub struct ReportCollector {
    existing: Mutex<Vec<PathBuf>>,
    missing: Mutex<Vec<PathBuf>>,
}

impl ReportCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Both path lists, sorted so reports do not depend on completion order.
    #[must_use]
    pub fn into_sorted(self) -> (Vec<PathBuf>, Vec<PathBuf>) {
        let mut existing = self
            .existing
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        let mut missing = self
            .missing
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        existing.sort();
        missing.sort();
        (existing, missing)
    }
}

impl HeaderCallback for ReportCollector {
    fn on_existing_header(&self, document: &Document, _header: &HeaderTemplate) {
        self.existing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(document.path().to_path_buf());
    }

    fn on_header_not_found(&self, document: &Document, _header: &HeaderTemplate) {
        self.missing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(document.path().to_path_buf());
    }
}
