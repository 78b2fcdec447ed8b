//! Per-file header classification.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use crate::catalog::HeaderStyleCatalog;
use crate::config::DEFAULT_MAX_FILE_SIZE;
use crate::error::ScanError;
use crate::source::fs::read_file_bounded;
use crate::style::HeaderStyle;
use crate::template::{HeaderTemplate, MatchMode, match_lines, normalize};

/// Lines read beyond the template length when looking for a header.
const HEADER_SLACK_LINES: usize = 10;

/// A file paired with the comment style it resolved to.
#[derive(Debug, Clone)]
pub struct Document {
    path: PathBuf,
    style: Arc<HeaderStyle>,
}

impl Document {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, style: Arc<HeaderStyle>) -> Self {
        Self {
            path: path.into(),
            style,
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn style(&self) -> &HeaderStyle {
        &self.style
    }

    #[must_use]
    pub fn is_supported(&self) -> bool {
        !self.style.is_unknown()
    }

    /// Path relative to `root`, for display. Falls back to the full path.
    #[must_use]
    pub fn relative_to(&self, root: &Path) -> &Path {
        self.path.strip_prefix(root).unwrap_or(&self.path)
    }
}

/// Which accepted template a document carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderMatch {
    Canonical,
    /// Index into the alternate headers, in declaration order.
    Alternate(usize),
}

/// Result of classifying one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationOutcome {
    /// No comment style is known for the file type.
    Unsupported,
    /// The document is the canonical header file.
    IsHeaderItself,
    HasHeader(HeaderMatch),
    Missing,
}

impl fmt::Display for ClassificationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported => write!(f, "unsupported"),
            Self::IsHeaderItself => write!(f, "header file"),
            Self::HasHeader(HeaderMatch::Canonical) => write!(f, "header found"),
            Self::HasHeader(HeaderMatch::Alternate(i)) => write!(f, "alternate header #{i} found"),
            Self::Missing => write!(f, "header missing"),
        }
    }
}

/// Decides the header status of documents against a canonical header and
/// its accepted alternates.
#[derive(Debug, Clone)]
pub struct DocumentClassifier {
    catalog: HeaderStyleCatalog,
    canonical: HeaderTemplate,
    alternates: Vec<HeaderTemplate>,
    strict: bool,
    max_file_size: u64,
    canonical_location: Option<PathBuf>,
}

impl DocumentClassifier {
    #[must_use]
    pub fn new(
        catalog: HeaderStyleCatalog,
        canonical: HeaderTemplate,
        alternates: Vec<HeaderTemplate>,
        strict: bool,
    ) -> Self {
        let canonical_location = canonical
            .location()
            .map(|l| l.canonicalize().unwrap_or_else(|_| l.to_path_buf()));
        Self {
            catalog,
            canonical,
            alternates,
            strict,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            canonical_location,
        }
    }

    /// Limit on the size of files read for classification.
    #[must_use]
    pub fn with_max_file_size(mut self, max_file_size: u64) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    #[must_use]
    pub fn canonical(&self) -> &HeaderTemplate {
        &self.canonical
    }

    #[must_use]
    pub fn alternates(&self) -> &[HeaderTemplate] {
        &self.alternates
    }

    #[must_use]
    pub fn catalog(&self) -> &HeaderStyleCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn document_for(&self, path: &Path) -> Document {
        Document::new(path, self.catalog.style_for(path))
    }

    /// Classify a document, reading it from disk when its type is supported.
    ///
    /// # Errors
    ///
    /// Returns a [`ScanError`] if the file cannot be read, is too large or
    /// is not valid UTF-8.
    pub fn classify(&self, document: &Document) -> Result<ClassificationOutcome, ScanError> {
        if !document.is_supported() {
            return Ok(ClassificationOutcome::Unsupported);
        }
        if self.is_canonical_location(document.path()) {
            return Ok(ClassificationOutcome::IsHeaderItself);
        }
        let content = read_file_bounded(document.path(), self.max_file_size)?;
        Ok(self.classify_content(document, &content))
    }

    /// Classify already-loaded content. The rules apply in order and the
    /// first one that holds decides.
    #[must_use]
    pub fn classify_content(&self, document: &Document, content: &str) -> ClassificationOutcome {
        let style = document.style();
        if style.is_unknown() {
            return ClassificationOutcome::Unsupported;
        }

        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let leading: Vec<&str> = content
            .lines()
            .take(self.canonical.line_count() + HEADER_SLACK_LINES)
            .collect();

        // A template with no text once decoration is stripped matches nothing.
        let canonical_source = self.canonical.normalized_source(style);
        if !canonical_source.is_empty()
            && normalize(leading.iter().copied(), style) == canonical_source
        {
            return ClassificationOutcome::IsHeaderItself;
        }

        if self.has_header(&self.canonical, content, style) {
            return ClassificationOutcome::HasHeader(HeaderMatch::Canonical);
        }

        self.alternates
            .iter()
            .position(|alternate| self.has_header(alternate, content, style))
            .map_or(ClassificationOutcome::Missing, |i| {
                ClassificationOutcome::HasHeader(HeaderMatch::Alternate(i))
            })
    }

    fn has_header(&self, template: &HeaderTemplate, content: &str, style: &HeaderStyle) -> bool {
        if template.normalized_source(style).is_empty() {
            return false;
        }
        if self.strict {
            let Some(region) = header_region(content, style) else {
                return false;
            };
            match_lines(&template.render(style), &region, MatchMode::Exact)
        } else {
            let leading = content
                .lines()
                .take(template.line_count() + HEADER_SLACK_LINES);
            match_lines(
                &template.normalized_lines(style),
                &normalize(leading, style),
                MatchMode::Contained,
            )
        }
    }

    fn is_canonical_location(&self, path: &Path) -> bool {
        let Some(location) = &self.canonical_location else {
            return false;
        };
        path.canonicalize()
            .map_or_else(|_| path == location.as_path(), |p| p == *location)
    }
}

/// Locate the comment block a file starts with, trailing whitespace removed.
///
/// A BOM, skip lines (shebang, XML prolog) and blank lines before the block
/// are ignored. Multiline styles run from the first-line match to the
/// last-line match; per-line styles run while lines keep matching.
#[must_use]
pub fn header_region<'a>(content: &'a str, style: &HeaderStyle) -> Option<Vec<&'a str>> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut lines = content
        .lines()
        .map(str::trim_end)
        .skip_while(|l| l.is_empty() || style.is_skip_line(l))
        .peekable();

    let first = lines.next_if(|l| style.is_first_header_line(l))?;
    let mut region = vec![first];

    if style.is_multiline() {
        if style.is_last_header_line(first) && region_closes_on_first(first, style) {
            return Some(region);
        }
        for line in lines {
            region.push(line);
            if style.is_last_header_line(line) {
                return Some(region);
            }
        }
        // Unterminated block comment.
        return None;
    }

    for line in lines {
        if style.is_first_header_line(line) {
            region.push(line);
        } else if line.is_empty() && style.allow_blank_lines() {
            region.push(line);
        } else {
            break;
        }
    }
    while region.last().is_some_and(|l| l.is_empty()) {
        region.pop();
    }
    Some(region)
}

/// Whether a single line both opens and closes the block, like
/// `/* Copyright */`, as opposed to an opener such as `/*` that the
/// last-line pattern happens to accept.
fn region_closes_on_first(line: &str, style: &HeaderStyle) -> bool {
    let opener = style.first_line().trim();
    let closer = style.end_line().trim();
    let trimmed = line.trim();
    closer.is_empty() || (trimmed.len() >= opener.len() + closer.len() && trimmed.ends_with(closer))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn classifier(header: &str, alternates: &[&str], strict: bool) -> DocumentClassifier {
        let values = BTreeMap::new();
        DocumentClassifier::new(
            HeaderStyleCatalog::with_defaults().unwrap(),
            HeaderTemplate::parse(header, &values),
            alternates
                .iter()
                .map(|a| HeaderTemplate::parse(a, &values))
                .collect(),
            strict,
        )
    }

    fn classify(c: &DocumentClassifier, name: &str, content: &str) -> ClassificationOutcome {
        let document = c.document_for(Path::new(name));
        c.classify_content(&document, content)
    }

    #[test]
    fn test_wildcard_year_header_found() {
        let c = classifier("/* Copyright ${year} */", &[], false);
        assert_eq!(
            classify(&c, "Foo.java", "/* Copyright 2021 */\npackage foo;\n"),
            ClassificationOutcome::HasHeader(HeaderMatch::Canonical)
        );
    }

    #[test]
    fn test_no_header_is_missing() {
        let c = classifier("/* Copyright ${year} */", &[], false);
        assert_eq!(
            classify(&c, "Foo.java", "package foo;\n"),
            ClassificationOutcome::Missing
        );
    }

    #[test]
    fn test_unmapped_extension_is_unsupported() {
        let c = classifier("/* Copyright ${year} */", &[], false);
        assert_eq!(
            classify(&c, "data.xyz", "/* Copyright 2021 */\n"),
            ClassificationOutcome::Unsupported
        );
    }

    #[test]
    fn test_header_file_itself_wins_over_header_found() {
        // The header text matches itself through the wildcard too; the
        // identity rule has to be checked first.
        let c = classifier("Copyright ${year} Acme\nAll rights reserved.", &[], false);
        let content = "Copyright ${year} Acme\nAll rights reserved.\n";
        assert_eq!(
            classify(&c, "HEADER.txt", content),
            ClassificationOutcome::IsHeaderItself
        );
    }

    #[test]
    fn test_header_file_itself_in_strict_mode() {
        let c = classifier("Copyright ${year} Acme", &[], true);
        assert_eq!(
            classify(&c, "NOTICE.txt", "Copyright ${year} Acme\n"),
            ClassificationOutcome::IsHeaderItself
        );
    }

    #[test]
    fn test_plain_template_found_in_commented_block() {
        let c = classifier("Copyright ${year} Acme\n\nLicensed under MIT", &[], false);
        let content = "/*\n * Copyright 2020 Acme\n *\n * Licensed under MIT\n */\npackage a;\n";
        assert_eq!(
            classify(&c, "A.java", content),
            ClassificationOutcome::HasHeader(HeaderMatch::Canonical)
        );

        let script = "#!/bin/sh\n#\n# Copyright 2020 Acme\n#\n# Licensed under MIT\n#\necho hi\n";
        assert_eq!(
            classify(&c, "run.sh", script),
            ClassificationOutcome::HasHeader(HeaderMatch::Canonical)
        );
    }

    #[test]
    fn test_alternate_header_matches_in_declaration_order() {
        let c = classifier(
            "Copyright ${year} Acme",
            &["Copyright Globex", "Copyright ${year} Globex"],
            false,
        );
        assert_eq!(
            classify(&c, "A.java", "/* Copyright 1999 Globex */\nclass A {}\n"),
            ClassificationOutcome::HasHeader(HeaderMatch::Alternate(1))
        );
        assert_eq!(
            classify(&c, "B.java", "/* Copyright Globex */\nclass B {}\n"),
            ClassificationOutcome::HasHeader(HeaderMatch::Alternate(0))
        );
    }

    #[test]
    fn test_strict_requires_exact_region() {
        let strict = classifier("Copyright ${year} Acme", &[], true);
        let exact = "/*\n * Copyright 2024 Acme\n */\npackage a;\n";
        assert_eq!(
            classify(&strict, "A.java", exact),
            ClassificationOutcome::HasHeader(HeaderMatch::Canonical)
        );

        let extra = "/*\n * Copyright 2024 Acme\n * Some extra text\n */\npackage a;\n";
        assert_eq!(classify(&strict, "A.java", extra), ClassificationOutcome::Missing);

        let lenient = classifier("Copyright ${year} Acme", &[], false);
        assert_eq!(
            classify(&lenient, "A.java", extra),
            ClassificationOutcome::HasHeader(HeaderMatch::Canonical)
        );
    }

    #[test]
    fn test_strict_single_line_block() {
        let c = classifier("/* Copyright ${year} */", &[], true);
        assert_eq!(
            classify(&c, "Foo.java", "/* Copyright 2021 */\npackage foo;\n"),
            ClassificationOutcome::HasHeader(HeaderMatch::Canonical)
        );
    }

    #[test]
    fn test_blank_template_never_matches() {
        for strict in [false, true] {
            for header in ["", "  \n\n", "/*\n */"] {
                let c = classifier(header, &[], strict);
                assert_eq!(classify(&c, "Empty.java", ""), ClassificationOutcome::Missing);
                assert_eq!(
                    classify(&c, "Block.java", "/*\n */\nclass A {}\n"),
                    ClassificationOutcome::Missing,
                    "{header:?} strict={strict}"
                );
            }
        }
    }

    #[test]
    fn test_header_beyond_leading_lines_is_missing() {
        let c = classifier("Copyright Acme", &[], false);
        let mut content = "line\n".repeat(20);
        content.push_str("// Copyright Acme\n");
        assert_eq!(classify(&c, "a.java", &content), ClassificationOutcome::Missing);
    }

    #[test]
    fn test_header_region_per_line_style() {
        let catalog = HeaderStyleCatalog::with_defaults().unwrap();
        let style = catalog.style("SCRIPT_STYLE").unwrap();
        let region = header_region("#!/usr/bin/env python\n# a\n# b\n\nimport os\n", style);
        assert_eq!(region, Some(vec!["# a", "# b"]));
    }

    #[test]
    fn test_header_region_unterminated_block() {
        let catalog = HeaderStyleCatalog::with_defaults().unwrap();
        let style = catalog.style("SLASHSTAR_STYLE").unwrap();
        assert_eq!(header_region("/*\n * open\n", style), None);
        assert_eq!(header_region("package a;\n", style), None);
    }

    #[test]
    fn test_document_relative_path() {
        let catalog = HeaderStyleCatalog::with_defaults().unwrap();
        let doc = Document::new("/repo/src/A.java", catalog.style_for(Path::new("A.java")));
        assert_eq!(doc.relative_to(Path::new("/repo")), Path::new("src/A.java"));
        assert_eq!(doc.relative_to(Path::new("/other")), Path::new("/repo/src/A.java"));
    }
}
