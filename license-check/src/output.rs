//! Shared output formatting for check reports.
//!
//! Provides JSON and plain-text formatters for `CheckReport`.
//! Color/terminal formatting belongs to the CLI layer.

use std::io::Write;

use crate::report::CheckReport;

/// Format a `CheckReport` as JSON to a writer.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_json(report: &CheckReport, writer: &mut dyn Write) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    writeln!(writer, "{json}")?;
    Ok(())
}

/// Format a `CheckReport` as human-readable plain text to a writer.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_human(report: &CheckReport, writer: &mut dyn Write) -> anyhow::Result<()> {
    writeln!(writer)?;
    writeln!(writer, "{}", "=".repeat(80))?;
    writeln!(writer, "  LICENSE HEADER CHECK")?;
    writeln!(writer, "{}", "=".repeat(80))?;
    writeln!(writer)?;
    writeln!(writer, "  Files scanned:      {}", report.files_scanned)?;
    writeln!(writer, "  Headers found:      {}", report.existing.len())?;
    writeln!(writer, "  Headers missing:    {}", report.missing_count())?;
    writeln!(writer, "  Unsupported files:  {}", report.unsupported_files)?;
    if report.header_files > 0 {
        writeln!(writer, "  Header templates:   {}", report.header_files)?;
    }
    writeln!(writer)?;

    if !report.discovery_errors.is_empty() {
        writeln!(writer, "{}", "-".repeat(80))?;
        writeln!(writer, "  DISCOVERY ERRORS (paths that were not checked)")?;
        writeln!(writer, "{}", "-".repeat(80))?;
        for err in &report.discovery_errors {
            writeln!(writer, "{}", err.format_human_readable())?;
        }
        writeln!(writer)?;
    }

    if !report.missing.is_empty() {
        writeln!(writer, "{}", "-".repeat(80))?;
        writeln!(writer, "  MISSING HEADERS")?;
        writeln!(writer, "{}", "-".repeat(80))?;
        for path in &report.missing {
            writeln!(writer, "{}", path.display())?;
        }
        writeln!(writer)?;
    }

    writeln!(writer, "{}", "=".repeat(80))?;
    if report.ok {
        writeln!(
            writer,
            "\u{2713} All {} supported files carry a valid header",
            report.existing.len() + report.header_files
        )?;
    } else {
        if !report.discovery_errors.is_empty() {
            writeln!(
                writer,
                "\u{2717} {} path(s) could not be scanned, treat this as a failure",
                report.discovery_errors.len()
            )?;
        }
        if !report.missing.is_empty() {
            writeln!(
                writer,
                "\u{2717} {} file(s) are missing a license header",
                report.missing_count()
            )?;
        }
    }
    writeln!(writer, "{}", "=".repeat(80))?;

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::report::ReportCollector;
    use crate::scanner::ScanSummary;

    #[test]
    fn test_write_human_clean_report() {
        let report = CheckReport::new(ScanSummary::default(), ReportCollector::new(), vec![]);
        let mut out = Vec::new();
        write_human(&report, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("LICENSE HEADER CHECK"));
        assert!(text.contains("carry a valid header"));
        assert!(!text.contains("MISSING HEADERS"));
    }

    #[test]
    fn test_write_json_fields() {
        let report = CheckReport::new(ScanSummary::default(), ReportCollector::new(), vec![]);
        let mut out = Vec::new();
        write_json(&report, &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["ok"], serde_json::Value::Bool(true));
        assert_eq!(value["files_scanned"], 0);
        assert!(value["missing"].as_array().unwrap().is_empty());
    }
}
