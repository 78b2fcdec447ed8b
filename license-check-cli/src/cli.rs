//! Argument parsing and the top-level check command.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use license_check::output::{write_human, write_json};
use license_check::{CheckConfig, CheckReport, FsSourceConfig, check_paths};
use tracing::debug;

use crate::logging;

/// Exit status when at least one file is missing its header.
pub const EXIT_MISSING: i32 = 1;
/// Exit status for configuration, resource, discovery and scan failures.
pub const EXIT_ERROR: i32 = 2;

/// Verdict of a finished check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStatus {
    Passed,
    MissingHeaders,
    /// Part of the tree could not be walked, so the check is incomplete
    /// whatever the header results.
    DiscoveryFailed,
}

impl CheckStatus {
    #[must_use]
    pub fn of(report: &CheckReport) -> Self {
        if !report.discovery_errors.is_empty() {
            Self::DiscoveryFailed
        } else if report.missing_count() > 0 {
            Self::MissingHeaders
        } else {
            Self::Passed
        }
    }

    #[must_use]
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Passed => 0,
            Self::MissingHeaders => EXIT_MISSING,
            Self::DiscoveryFailed => EXIT_ERROR,
        }
    }
}

/// Report rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

/// Check that source files carry the expected license header.
#[derive(Debug, Parser)]
#[command(name = "license-check", version, about, long_about = None)]
pub struct Cli {
    /// YAML configuration file. Command-line options override its values.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Canonical license header template
    #[arg(long)]
    pub header: Option<PathBuf>,

    /// Additional accepted header template (repeatable)
    #[arg(long = "valid-header")]
    pub valid_headers: Vec<PathBuf>,

    /// Placeholder value, e.g. `--section year=2024` (repeatable)
    #[arg(long = "section", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub sections: Vec<(String, String)>,

    /// Map an extension to a header style, e.g. `--mapping tpl=SCRIPT_STYLE` (repeatable)
    #[arg(long = "mapping", value_name = "EXT=STYLE", value_parser = parse_key_value)]
    pub mappings: Vec<(String, String)>,

    /// Start from an empty extension mapping
    #[arg(long)]
    pub no_default_mappings: bool,

    /// YAML or JSON file declaring extra header styles (repeatable)
    #[arg(long = "header-definition")]
    pub header_definitions: Vec<PathBuf>,

    /// Require the leading comment block to match the header exactly
    #[arg(long)]
    pub strict: bool,

    /// Worker threads per available CPU
    #[arg(long)]
    pub concurrency: Option<f32>,

    /// Glob of paths to skip (repeatable)
    #[arg(long)]
    pub exclude: Vec<String>,

    /// Base directory for reported paths, and the default scan root
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub format: OutputFormat,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Files or directories to check. Defaults to the root directory.
    pub paths: Vec<PathBuf>,
}

impl Cli {
    /// Merge the config file (if any) with command-line overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed, or if
    /// no header location is given anywhere.
    pub fn check_config(&self) -> Result<CheckConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => CheckConfig::default(),
        };

        if let Some(header) = &self.header {
            config.header.clone_from(header);
        }
        if config.header.as_os_str().is_empty() {
            bail!("No license header given: pass --header or set `header` in the config file");
        }
        config.valid_headers.extend(self.valid_headers.iter().cloned());
        config.header_sections.extend(self.sections.iter().cloned());
        config.mapping.extend(self.mappings.iter().cloned());
        if self.no_default_mappings {
            config.use_default_mappings = false;
        }
        config
            .header_definitions
            .extend(self.header_definitions.iter().cloned());
        if self.strict {
            config.strict_check = true;
        }
        if let Some(factor) = self.concurrency {
            config.concurrency_factor = factor;
        }
        if let Some(root) = &self.root {
            config.root_dir.clone_from(root);
        }
        Ok(config)
    }

    /// Discovery options: the positional paths, or the root directory.
    #[must_use]
    pub fn fs_config(&self, config: &CheckConfig) -> FsSourceConfig {
        let mut fs_config = FsSourceConfig::default();
        fs_config.paths = if self.paths.is_empty() {
            vec![config.root_dir.clone()]
        } else {
            self.paths.clone()
        };
        fs_config.exclude.clone_from(&self.exclude);
        fs_config
    }
}

/// Parse `key=value`. The key is trimmed and must not be empty; the value
/// may be.
///
/// # Errors
///
/// Returns a message suitable for clap when there is no `=` or the key is
/// empty.
pub fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let Some((key, value)) = raw.split_once('=') else {
        return Err(format!("expected KEY=VALUE, got '{raw}'"));
    };
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{raw}'"));
    }
    Ok((key.to_owned(), value.to_owned()))
}

/// Read a YAML [`CheckConfig`]; missing keys take their defaults.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a valid config.
pub fn load_config(path: &Path) -> Result<CheckConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: CheckConfig = serde_saphyr::from_str(&content)
        .with_context(|| format!("Invalid config file {}", path.display()))?;
    debug!("Configuration loaded from '{}'", path.display());
    Ok(config)
}

/// Render the report in the requested format.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn render(report: &CheckReport, format: OutputFormat, writer: &mut dyn Write) -> Result<()> {
    match format {
        OutputFormat::Json => write_json(report, writer),
        OutputFormat::Human => write_human(report, writer),
    }
}

/// Parse arguments, run the check and print the report.
///
/// # Errors
///
/// Returns an error for invalid configuration, unreadable header resources
/// and files that cannot be classified.
pub fn run() -> Result<CheckStatus> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = cli.check_config()?;
    let fs_config = cli.fs_config(&config);
    let report = check_paths(&fs_config, &config).context("License header check failed")?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    render(&report, cli.format, &mut out)?;

    let status = CheckStatus::of(&report);
    if cli.format == OutputFormat::Human {
        let verdict = match status {
            CheckStatus::Passed => "PASSED".green().bold(),
            CheckStatus::MissingHeaders => "FAILED".red().bold(),
            CheckStatus::DiscoveryFailed => "INCOMPLETE".red().bold(),
        };
        writeln!(
            out,
            "{verdict} ({} missing, {} checked, {} discovery errors)",
            report.missing_count(),
            report.files_scanned,
            report.discovery_errors.len()
        )?;
    }
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("year=2024"),
            Ok(("year".to_owned(), "2024".to_owned()))
        );
        assert_eq!(
            parse_key_value("owner=A=B"),
            Ok(("owner".to_owned(), "A=B".to_owned()))
        );
        assert_eq!(parse_key_value("empty="), Ok(("empty".to_owned(), String::new())));
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
