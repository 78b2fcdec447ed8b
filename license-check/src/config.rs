//! Configuration types for header checks.
//!
//! Split into the check configuration (what a compliant header looks like and
//! how files map to comment styles) and source-specific config (how files are
//! discovered). The check itself never walks the filesystem.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::ConfigError;

/// Largest file the classifier will read, in bytes (10 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10_485_760;

const UTF8_ALIASES: &[&str] = &["utf-8", "utf8", "unicode-1-1-utf-8"];

/// Everything a header check needs apart from the file set.
///
/// Every field has a default, so a YAML config only needs the keys it
/// changes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
#[non_exhaustive]
pub struct CheckConfig {
    /// Base directory used to shorten paths in log lines.
    pub root_dir: PathBuf,
    /// Canonical header template location. Required.
    pub header: PathBuf,
    /// Alternate header templates that are also accepted, tried in order.
    pub valid_headers: Vec<PathBuf>,
    /// Placeholder values substituted into `${name}` sections of templates.
    pub header_sections: BTreeMap<String, String>,
    /// Extension (or file name) to header style overrides.
    pub mapping: BTreeMap<String, String>,
    /// Start from the built-in extension mapping.
    pub use_default_mappings: bool,
    /// YAML or JSON files declaring additional header styles.
    pub header_definitions: Vec<PathBuf>,
    /// Words that identify an existing license header. Only used when
    /// rewriting headers, which this crate does not do.
    pub keywords: Vec<String>,
    /// Require the leading comment block to match the template exactly.
    pub strict_check: bool,
    /// Workers per available CPU.
    pub concurrency_factor: f32,
    /// Source file encoding. Only UTF-8 is supported.
    pub encoding: String,
    /// Maximum file size in bytes (default: 10 MiB).
    pub max_file_size: u64,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from("."),
            header: PathBuf::new(),
            valid_headers: Vec::new(),
            header_sections: BTreeMap::new(),
            mapping: BTreeMap::new(),
            use_default_mappings: true,
            header_definitions: Vec::new(),
            keywords: vec!["copyright".to_owned()],
            strict_check: false,
            concurrency_factor: 1.5,
            encoding: "UTF-8".to_owned(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl CheckConfig {
    /// Reject settings that can be checked without touching the filesystem.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for a missing header location, an
    /// unsupported encoding or a non-positive concurrency factor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.header.as_os_str().is_empty() {
            return Err(ConfigError::MissingHeader);
        }
        validate_encoding(&self.encoding)?;
        if !self.concurrency_factor.is_finite() || self.concurrency_factor <= 0.0 {
            return Err(ConfigError::InvalidConcurrency(self.concurrency_factor));
        }
        Ok(())
    }
}

/// Accept UTF-8 under any of its registered labels, case-insensitively.
///
/// # Errors
///
/// Returns [`ConfigError::UnsupportedEncoding`] for anything else.
pub fn validate_encoding(encoding: &str) -> Result<(), ConfigError> {
    let label = encoding.trim().to_ascii_lowercase();
    if UTF8_ALIASES.contains(&label.as_str()) {
        Ok(())
    } else {
        Err(ConfigError::UnsupportedEncoding(encoding.to_owned()))
    }
}

/// Filesystem-specific source options.
///
/// NOTE: default roots are a CLI concern; the library scans exactly the
/// `paths` it is given.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct FsSourceConfig {
    /// Paths to scan (files or directories).
    pub paths: Vec<PathBuf>,
    /// Exclude patterns (glob format).
    pub exclude: Vec<String>,
    /// Whether to follow symbolic links.
    ///
    /// **Defaults to `false`**: following symlinks can leave the scanned tree.
    pub follow_links: bool,
    /// Maximum directory traversal depth (default: 64).
    pub max_depth: usize,
}

impl Default for FsSourceConfig {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            exclude: Vec::new(),
            follow_links: false,
            max_depth: 64,
        }
    }
}
