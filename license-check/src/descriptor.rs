//! User-supplied header style declarations.
//!
//! A descriptor is a YAML or JSON document whose top-level keys are style
//! names and whose values are [`StyleSpec`] tables:
//!
//! ```yaml
//! CUSTOM_STYLE:
//!   first_line: "(*"
//!   before_each_line: " * "
//!   end_line: " *)"
//!   first_line_detection: '^\s*\(\*.*$'
//!   last_line_detection: '.*\*\)\s*$'
//!   multiline: true
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use crate::error::ConfigError;
use crate::source::ContentFormat;
use crate::source::fs::content_format_for;
use crate::style::{HeaderStyle, StyleSpec};

/// A style descriptor resource whose content has already been resolved.
#[derive(Debug, Clone)]
pub struct StyleDescriptor {
    label: String,
    format: ContentFormat,
    content: String,
}

impl StyleDescriptor {
    #[must_use]
    pub fn new(label: impl Into<String>, format: ContentFormat, content: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            format,
            content: content.into(),
        }
    }

    /// Read a descriptor from disk; the format follows the file extension.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DescriptorParse`] for an unrecognized extension
    /// and [`ConfigError::DescriptorRead`] if the file cannot be read.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let format = content_format_for(path).ok_or_else(|| ConfigError::DescriptorParse {
            resource: path.display().to_string(),
            cause: "expected a .yaml, .yml or .json file".to_owned(),
        })?;
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::DescriptorRead {
            resource: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(path.display().to_string(), format, content))
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Parse the declared styles, keyed by uppercased name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DescriptorParse`] if the content is malformed
    /// and [`ConfigError::InvalidPattern`] if a pattern does not compile.
    pub fn parse(&self) -> Result<BTreeMap<String, HeaderStyle>, ConfigError> {
        let specs: BTreeMap<String, StyleSpec> = match self.format {
            ContentFormat::Json => serde_json::from_str(&self.content).map_err(|e| e.to_string()),
            ContentFormat::Yaml => serde_saphyr::from_str(&self.content).map_err(|e| e.to_string()),
        }
        .map_err(|cause| ConfigError::DescriptorParse {
            resource: self.label.clone(),
            cause,
        })?;

        let styles = specs
            .iter()
            .map(|(name, spec)| {
                HeaderStyle::from_spec(name, spec).map(|style| (style.name().to_owned(), style))
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;
        debug!(
            "{} header definitions loaded from '{}'",
            styles.len(),
            self.label
        );
        Ok(styles)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::document::header_region;

    const YAML: &str = r#"
ocaml_style:
  first_line: "(*"
  before_each_line: " * "
  end_line: " *)"
  first_line_detection: '^\s*\(\*.*$'
  last_line_detection: '.*\*\)\s*$'
  multiline: true
"#;

    #[test]
    fn test_parse_yaml_descriptor() {
        let descriptor = StyleDescriptor::new("inline.yaml", ContentFormat::Yaml, YAML);
        let styles = descriptor.parse().unwrap();
        let style = &styles["OCAML_STYLE"];
        assert_eq!(style.first_line(), "(*");
        assert!(style.is_multiline());
        assert!(style.is_first_header_line("(* header"));
        assert!(style.is_last_header_line(" *)"));
    }

    #[test]
    fn test_parse_json_descriptor() {
        let json = r###"{"DOUBLEHASH": {"first_line": "##", "before_each_line": "## ", "end_line": "##"}}"###;
        let styles = StyleDescriptor::new("inline.json", ContentFormat::Json, json)
            .parse()
            .unwrap();
        assert_eq!(styles["DOUBLEHASH"].before_each_line(), "## ");
        assert!(!styles["DOUBLEHASH"].is_multiline());
    }

    #[test]
    fn test_detection_derived_from_delimiters() {
        let json = r###"{"DOUBLEHASH": {"first_line": "##", "before_each_line": "## ", "end_line": "##"},
                         "PASCAL": {"first_line": "(*", "before_each_line": " * ", "end_line": " *)", "multiline": true}}"###;
        let styles = StyleDescriptor::new("inline.json", ContentFormat::Json, json)
            .parse()
            .unwrap();

        let doublehash = &styles["DOUBLEHASH"];
        assert!(doublehash.is_first_header_line("##"));
        assert!(doublehash.is_first_header_line("## Copyright Acme"));
        assert!(!doublehash.is_first_header_line("code"));
        assert_eq!(
            header_region("##\n## Copyright Acme\n##\ncode\n", doublehash),
            Some(vec!["##", "## Copyright Acme", "##"])
        );

        let pascal = &styles["PASCAL"];
        assert!(pascal.is_first_header_line("(* Copyright"));
        assert!(pascal.is_last_header_line(" *)"));
        assert!(!pascal.is_last_header_line(" * Copyright"));
        assert_eq!(
            header_region("(*\n * Copyright Acme\n *)\nbegin\n", pascal),
            Some(vec!["(*", " * Copyright Acme", " *)"])
        );
    }

    #[test]
    fn test_multiline_without_closer_is_config_error() {
        let yaml = "OPEN_ENDED:\n  first_line: \"(*\"\n  before_each_line: \" * \"\n  multiline: true\n";
        let err = StyleDescriptor::new("open.yaml", ContentFormat::Yaml, yaml)
            .parse()
            .unwrap_err();
        assert!(
            matches!(err, ConfigError::MissingPattern { ref style, field: "last_line_detection" } if style == "OPEN_ENDED"),
            "got: {err:?}"
        );
    }

    #[test]
    fn test_style_without_delimiters_is_config_error() {
        let json = r#"{"BLANK": {"after_each_line": "!"}}"#;
        let err = StyleDescriptor::new("blank.json", ContentFormat::Json, json)
            .parse()
            .unwrap_err();
        assert!(
            matches!(err, ConfigError::MissingPattern { ref style, field: "first_line_detection" } if style == "BLANK"),
            "got: {err:?}"
        );
    }

    #[test]
    fn test_malformed_descriptor_is_config_error() {
        let err = StyleDescriptor::new("bad.json", ContentFormat::Json, "{ not json")
            .parse()
            .unwrap_err();
        assert!(
            matches!(err, ConfigError::DescriptorParse { ref resource, .. } if resource == "bad.json"),
            "got: {err:?}"
        );
    }

    #[test]
    fn test_unknown_field_is_config_error() {
        let json = r###"{"X": {"first_lines": "##"}}"###;
        let err = StyleDescriptor::new("typo.json", ContentFormat::Json, json)
            .parse()
            .unwrap_err();
        assert!(matches!(err, ConfigError::DescriptorParse { .. }), "got: {err:?}");
    }

    #[test]
    fn test_from_path_rejects_unknown_extension() {
        let err = StyleDescriptor::from_path(Path::new("styles.xml")).unwrap_err();
        assert!(matches!(err, ConfigError::DescriptorParse { .. }), "got: {err:?}");
    }
}
