//! # license-check
//!
//! License header compliance checker for heterogeneous source trees.
//!
//! Every file is paired with a comment style through its extension, then
//! classified against a canonical header template and any accepted
//! alternates. Classification runs on a bounded worker pool; results reach a
//! [`HeaderCallback`] in completion order.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use license_check::{CheckConfig, FsSourceConfig, check_paths};
//!
//! let mut fs_config = FsSourceConfig::default();
//! fs_config.paths = vec![PathBuf::from("src")];
//! fs_config.exclude = vec!["*.generated.rs".to_owned()];
//!
//! let mut config = CheckConfig::default();
//! config.header = PathBuf::from("HEADER.txt");
//! config.header_sections.insert("year".to_owned(), "2024".to_owned());
//!
//! let report = check_paths(&fs_config, &config).unwrap();
//! println!("Files scanned: {}", report.files_scanned);
//! println!("Missing headers: {}", report.missing_count());
//! println!("OK: {}", report.ok);
//! ```

mod catalog;
mod config;
mod descriptor;
mod document;
mod error;
pub mod output;
mod report;
mod scanner;
mod source;
mod style;
mod template;

pub use catalog::{HeaderStyleCatalog, UNKNOWN_EXTENSION};
pub use config::{CheckConfig, DEFAULT_MAX_FILE_SIZE, FsSourceConfig, validate_encoding};
pub use descriptor::StyleDescriptor;
pub use document::{ClassificationOutcome, Document, DocumentClassifier, HeaderMatch, header_region};
pub use error::{ConfigError, Error, ResourceError, ScanError, ScanErrorKind};
pub use report::{CheckReport, ReportCollector};
pub use scanner::{CancelFlag, ConcurrentScanner, HeaderCallback, ScanSummary, pool_size};
pub use source::ContentFormat;
pub use source::fs::find_files;
pub use style::{HeaderStyle, StyleSpec, UNKNOWN_STYLE, builtin_names};
pub use template::{HeaderLine, HeaderTemplate, MatchMode, Segment, match_lines};

use std::path::PathBuf;

use tracing::debug;

/// A configured header check, ready to run over any number of file sets.
///
/// Header resources, descriptors and the style catalog are resolved once in
/// [`LicenseCheck::new`]; every failure there happens before a file is read.
#[derive(Debug)]
pub struct LicenseCheck {
    classifier: DocumentClassifier,
    scanner: ConcurrentScanner,
}

impl LicenseCheck {
    /// Resolve header resources and build the catalog, classifier and pool.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for invalid settings, unknown styles or
    /// malformed descriptors, and [`Error::Resource`] if a header template
    /// cannot be read.
    pub fn new(config: &CheckConfig) -> Result<Self, Error> {
        config.validate()?;

        let canonical = HeaderTemplate::load(&config.header, &config.header_sections)?;
        let alternates = config
            .valid_headers
            .iter()
            .map(|path| HeaderTemplate::load(path, &config.header_sections))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(
            "Header template '{}' loaded with {} alternate(s)",
            config.header.display(),
            alternates.len()
        );

        let descriptors = config
            .header_definitions
            .iter()
            .map(|path| StyleDescriptor::from_path(path))
            .collect::<Result<Vec<_>, _>>()?;
        let catalog =
            HeaderStyleCatalog::build(config.use_default_mappings, &config.mapping, &descriptors)?;

        let classifier = DocumentClassifier::new(catalog, canonical, alternates, config.strict_check)
            .with_max_file_size(config.max_file_size);
        let scanner =
            ConcurrentScanner::new(config.concurrency_factor)?.with_root_dir(&config.root_dir);

        Ok(Self {
            classifier,
            scanner,
        })
    }

    /// Replace the worker pool size computed from the concurrency factor.
    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.scanner = self.scanner.with_pool_size(threads);
        self
    }

    #[must_use]
    pub fn classifier(&self) -> &DocumentClassifier {
        &self.classifier
    }

    /// Raise this flag from another thread to abort a running check. It
    /// stays raised, aborting later runs too, until it is reset.
    #[must_use]
    pub fn cancel_flag(&self) -> CancelFlag {
        self.scanner.cancel_flag()
    }

    /// Classify `files` and report each outcome to `callback`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Scan`] with the first file that could not be
    /// classified, [`Error::Aborted`] if the cancel flag was raised, or
    /// [`Error::WorkerSpawn`] if a scan thread could not be started.
    pub fn run<C>(&self, files: &[PathBuf], callback: &C) -> Result<ScanSummary, Error>
    where
        C: HeaderCallback + ?Sized,
    {
        self.scanner.scan(files, &self.classifier, callback)
    }
}

/// Check the license headers of `files`.
///
/// This is the primary public API.
///
/// # Errors
///
/// Configuration and header resource failures are returned before any file
/// is read. During the scan, the first file that cannot be classified ends
/// the check with [`Error::Scan`]; callbacks already delivered stand.
pub fn check<C>(config: &CheckConfig, files: &[PathBuf], callback: &C) -> Result<ScanSummary, Error>
where
    C: HeaderCallback + ?Sized,
{
    LicenseCheck::new(config)?.run(files, callback)
}

/// Discover files on disk, check them, and collect a [`CheckReport`].
///
/// # Errors
///
/// Same as [`check`]. Traversal failures do not abort the check; they are
/// reported in `report.discovery_errors`.
pub fn check_paths(fs_config: &FsSourceConfig, config: &CheckConfig) -> Result<CheckReport, Error> {
    let license_check = LicenseCheck::new(config)?;
    let (files, discovery_errors) = find_files(fs_config);
    debug!("{} file(s) selected for header check", files.len());

    let collector = ReportCollector::new();
    let summary = license_check.run(&files, &collector)?;
    Ok(CheckReport::new(summary, collector, discovery_errors))
}
