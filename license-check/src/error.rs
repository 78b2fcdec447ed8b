//! Error types for license header checks.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Configuration failures. All of them are raised before any file is scanned.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// A user mapping points an extension at a style nobody declared.
    #[error("The provided header type ({header_type}) for {extension} is invalid")]
    InvalidHeaderType {
        /// Normalized extension (lowercase, no dot).
        extension: String,
        /// Normalized style name (uppercase).
        header_type: String,
    },

    /// A style descriptor resource could not be read.
    #[error("Failed to read header definitions from {}: {source}", resource.display())]
    DescriptorRead {
        resource: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A style descriptor resource could not be parsed.
    #[error("Invalid header definitions in {resource}: {cause}")]
    DescriptorParse {
        /// Display name of the resource (path or caller-supplied label).
        resource: String,
        cause: String,
    },

    /// A style declares a regular expression that does not compile.
    #[error("Invalid {field} pattern for header style {style}: {cause}")]
    InvalidPattern {
        style: String,
        field: &'static str,
        cause: String,
    },

    /// A style lacks a detection pattern and its delimiters give nothing to
    /// derive one from.
    #[error("Header style {style} needs a {field} pattern")]
    MissingPattern { style: String, field: &'static str },

    /// Only UTF-8 sources can be classified.
    #[error("Unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    /// No canonical header location was configured.
    #[error("A header location must be configured")]
    MissingHeader,

    /// The concurrency factor must be finite and strictly positive.
    #[error("Concurrency factor must be a positive number, got {0}")]
    InvalidConcurrency(f32),
}

/// A header template location could not be read.
#[derive(Debug, Error)]
#[error("Failed to read header {}: {source}", location.display())]
pub struct ResourceError {
    pub location: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// The kind of failure that stopped a file from being classified.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScanErrorKind {
    /// An I/O error occurred while reading the file.
    IoError,
    /// The file exceeded the configured maximum size limit.
    FileTooLarge,
    /// The file content is not valid UTF-8.
    InvalidEncoding,
    /// A directory traversal error (permission denied, loop detected, etc.).
    WalkError,
    /// An exclude glob pattern could not be parsed.
    InvalidExcludePattern,
}

/// A file that could not be classified at all.
///
/// Raised by a scan worker, this terminates the whole scan: only the first
/// one observed is returned to the caller.
#[derive(Debug, Clone, Error, Serialize, PartialEq, Eq)]
#[error("{}: {message}", file.display())]
#[non_exhaustive]
pub struct ScanError {
    /// The file path that could not be scanned.
    pub file: PathBuf,
    /// The kind of failure.
    pub kind: ScanErrorKind,
    /// Human-readable description of the failure.
    pub message: String,
}

impl ScanError {
    #[must_use]
    pub fn new(file: impl Into<PathBuf>, kind: ScanErrorKind, message: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            kind,
            message: message.into(),
        }
    }

    /// Format the error for human-readable output.
    #[must_use]
    pub fn format_human_readable(&self) -> String {
        format!("{}: [scan error] {}", self.file.display(), self.message)
    }
}

/// Any failure of a header check run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// The first worker failure of the scan.
    #[error("Header check failed on {0}")]
    Scan(#[from] ScanError),

    /// The caller raised the cancel flag before every file was classified.
    #[error("Header check aborted")]
    Aborted,

    /// The operating system refused to start a scan thread.
    #[error("Failed to start scan worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),
}
