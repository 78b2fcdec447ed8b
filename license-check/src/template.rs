//! License header templates.
//!
//! A template is the header text with optional `${name}` placeholders.
//! Placeholders with a supplied value are substituted; the others become
//! wildcards matching any text at their position. Templates are kept as raw
//! source lines and turned into [`HeaderLine`] sequences per comment style,
//! because decoration stripping (non-strict) and rendering (strict) both
//! depend on the style of the document being compared.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ResourceError;
use crate::style::HeaderStyle;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    match Regex::new(r"\$\{([A-Za-z0-9_.\-]+)\}") {
        Ok(regex) => regex,
        Err(err) => panic!("Invalid placeholder regex: {err}"),
    }
});

/// A piece of a templated line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    /// An unresolved placeholder; matches any text.
    Wildcard(String),
}

/// One comparable template line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderLine {
    Literal(String),
    Pattern(Vec<Segment>),
}

impl HeaderLine {
    /// Parse a line, substituting known placeholders.
    #[must_use]
    pub fn parse(text: &str, values: &BTreeMap<String, String>) -> Self {
        let mut segments: Vec<Segment> = Vec::new();
        let mut cursor = 0;
        for caps in PLACEHOLDER.captures_iter(text) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            push_text(&mut segments, &text[cursor..whole.start()]);
            match values.get(name.as_str()) {
                Some(value) => push_text(&mut segments, value),
                None => segments.push(Segment::Wildcard(name.as_str().to_owned())),
            }
            cursor = whole.end();
        }
        push_text(&mut segments, &text[cursor..]);

        if segments.iter().any(|s| matches!(s, Segment::Wildcard(_))) {
            Self::Pattern(segments)
        } else {
            match segments.pop() {
                Some(Segment::Text(t)) => Self::Literal(t),
                _ => Self::Literal(String::new()),
            }
        }
    }

    /// Whether `candidate` is an instance of this line.
    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        match self {
            Self::Literal(text) => text == candidate,
            Self::Pattern(segments) => matches_segments(segments, candidate),
        }
    }
}

fn push_text(segments: &mut Vec<Segment>, piece: &str) {
    if piece.is_empty() {
        return;
    }
    if let Some(Segment::Text(last)) = segments.last_mut() {
        last.push_str(piece);
    } else {
        segments.push(Segment::Text(piece.to_owned()));
    }
}

/// Glob-style match where wildcards stand for any (possibly empty) text.
fn matches_segments(segments: &[Segment], candidate: &str) -> bool {
    let mut rest = candidate;
    let mut anchored = true;
    for (idx, segment) in segments.iter().enumerate() {
        match segment {
            Segment::Wildcard(_) => anchored = false,
            Segment::Text(text) => {
                if anchored {
                    let Some(r) = rest.strip_prefix(text.as_str()) else {
                        return false;
                    };
                    rest = r;
                } else if idx + 1 == segments.len() {
                    return rest.ends_with(text.as_str());
                } else {
                    let Some(pos) = rest.find(text.as_str()) else {
                        return false;
                    };
                    rest = &rest[pos + text.len()..];
                }
                anchored = true;
            }
        }
    }
    !anchored || rest.is_empty()
}

/// How a template line sequence is compared with candidate lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Same number of lines, each matching.
    Exact,
    /// The template appears as a contiguous run somewhere in the candidate.
    Contained,
}

/// Compare template lines with candidate lines, stopping at the first mismatch.
#[must_use]
pub fn match_lines(template: &[HeaderLine], candidate: &[&str], mode: MatchMode) -> bool {
    let same = |window: &[&str]| template.iter().zip(window).all(|(t, c)| t.matches(c));
    match mode {
        MatchMode::Exact => template.len() == candidate.len() && same(candidate),
        MatchMode::Contained => {
            !template.is_empty() && candidate.windows(template.len()).any(same)
        }
    }
}

/// A parsed header template.
#[derive(Debug, Clone)]
pub struct HeaderTemplate {
    location: Option<PathBuf>,
    source_lines: Vec<String>,
    values: BTreeMap<String, String>,
}

impl HeaderTemplate {
    /// Parse template text. Leading and trailing blank lines are dropped.
    #[must_use]
    pub fn parse(content: &str, values: &BTreeMap<String, String>) -> Self {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let lines: Vec<String> = content.lines().map(|l| l.trim_end().to_owned()).collect();
        let start = lines.iter().position(|l| !l.is_empty()).unwrap_or(lines.len());
        let end = lines.iter().rposition(|l| !l.is_empty()).map_or(start, |i| i + 1);

        Self {
            location: None,
            source_lines: lines[start..end].to_vec(),
            values: values.clone(),
        }
    }

    /// Read and parse a template file.
    ///
    /// # Errors
    ///
    /// Returns a [`ResourceError`] if the file cannot be read as UTF-8 text.
    pub fn load(path: &Path, values: &BTreeMap<String, String>) -> Result<Self, ResourceError> {
        let content = std::fs::read_to_string(path).map_err(|source| ResourceError {
            location: path.to_path_buf(),
            source,
        })?;
        let mut template = Self::parse(&content, values);
        template.location = Some(path.to_path_buf());
        Ok(template)
    }

    /// Where the template was read from, if it came from a file.
    #[must_use]
    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.source_lines.len()
    }

    #[must_use]
    pub fn source_lines(&self) -> &[String] {
        &self.source_lines
    }

    /// Template lines as written, placeholders resolved.
    #[must_use]
    pub fn lines(&self) -> Vec<HeaderLine> {
        self.source_lines
            .iter()
            .map(|l| HeaderLine::parse(l, &self.values))
            .collect()
    }

    /// Raw source text with `style` decoration and blank lines removed.
    /// Placeholders are left unexpanded.
    #[must_use]
    pub fn normalized_source(&self, style: &HeaderStyle) -> Vec<&str> {
        normalize(self.source_lines.iter().map(String::as_str), style)
    }

    /// Lines for non-strict comparison against a document in `style`.
    #[must_use]
    pub fn normalized_lines(&self, style: &HeaderStyle) -> Vec<HeaderLine> {
        self.normalized_source(style)
            .into_iter()
            .map(|l| HeaderLine::parse(l, &self.values))
            .collect()
    }

    /// Lines for strict comparison: the header as it must appear in `style`.
    ///
    /// A template that already opens like a header of that style is taken
    /// verbatim; otherwise it is wrapped in the style's delimiters.
    #[must_use]
    pub fn render(&self, style: &HeaderStyle) -> Vec<HeaderLine> {
        if self
            .source_lines
            .first()
            .is_some_and(|l| style.is_first_header_line(l))
        {
            return self.lines();
        }

        let width = if style.pad_lines() {
            self.source_lines
                .iter()
                .map(|l| l.chars().count())
                .max()
                .unwrap_or(0)
        } else {
            0
        };

        let mut rendered = Vec::with_capacity(self.source_lines.len() + 2);
        if !style.first_line().is_empty() {
            rendered.push(style.first_line().trim_end().to_owned());
        }
        for line in &self.source_lines {
            let text = format!(
                "{}{line:<width$}{}",
                style.before_each_line(),
                style.after_each_line()
            );
            rendered.push(text.trim_end().to_owned());
        }
        if !style.end_line().is_empty() {
            rendered.push(style.end_line().trim_end().to_owned());
        }

        rendered
            .iter()
            .map(|l| HeaderLine::parse(l, &self.values))
            .collect()
    }
}

/// Two templates are equal when their non-blank source lines are.
impl PartialEq for HeaderTemplate {
    fn eq(&self, other: &Self) -> bool {
        let significant = |t: &Self| {
            t.source_lines
                .iter()
                .map(|l| l.trim().to_owned())
                .filter(|l| !l.is_empty())
                .collect::<Vec<_>>()
        };
        significant(self) == significant(other)
    }
}

impl Eq for HeaderTemplate {}

/// Strip `style` decoration from each line and drop the blank ones.
#[must_use]
pub fn normalize<'a>(lines: impl IntoIterator<Item = &'a str>, style: &HeaderStyle) -> Vec<&'a str> {
    lines
        .into_iter()
        .map(|l| style.strip_decoration(l))
        .filter(|l| !l.is_empty())
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::catalog::HeaderStyleCatalog;

    fn values(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    fn style(name: &str) -> HeaderStyle {
        let catalog = HeaderStyleCatalog::with_defaults().unwrap();
        HeaderStyle::clone(catalog.style(name).unwrap())
    }

    #[test]
    fn test_parse_literal_line() {
        let line = HeaderLine::parse("Copyright Acme", &BTreeMap::new());
        assert_eq!(line, HeaderLine::Literal("Copyright Acme".to_owned()));
        assert!(line.matches("Copyright Acme"));
        assert!(!line.matches("Copyright Acme Inc."));
    }

    #[test]
    fn test_known_placeholder_is_substituted() {
        let line = HeaderLine::parse("Copyright ${year} Acme", &values(&[("year", "2024")]));
        assert_eq!(line, HeaderLine::Literal("Copyright 2024 Acme".to_owned()));
    }

    #[test]
    fn test_unknown_placeholder_is_wildcard() {
        let line = HeaderLine::parse("Copyright ${year} ${owner}.", &BTreeMap::new());
        assert!(matches!(line, HeaderLine::Pattern(_)));
        assert!(line.matches("Copyright 2021 Acme Corp."));
        assert!(line.matches("Copyright 2019-2024 Globex."));
        assert!(!line.matches("Copyright 2021 Acme Corp"));
        assert!(!line.matches("Licensed 2021 Acme."));
    }

    #[test]
    fn test_whole_line_placeholder_matches_any_line() {
        let line = HeaderLine::parse("${notice}", &BTreeMap::new());
        assert!(line.matches("anything at all"));
        assert!(line.matches(""));
    }

    #[test]
    fn test_match_lines_exact_and_contained() {
        let template = vec![
            HeaderLine::Literal("a".to_owned()),
            HeaderLine::Literal("b".to_owned()),
        ];
        assert!(match_lines(&template, &["a", "b"], MatchMode::Exact));
        assert!(!match_lines(&template, &["a", "b", "c"], MatchMode::Exact));
        assert!(match_lines(&template, &["x", "a", "b", "c"], MatchMode::Contained));
        assert!(!match_lines(&template, &["a", "x", "b"], MatchMode::Contained));
        assert!(!match_lines(&[], &["a"], MatchMode::Contained));
    }

    #[test]
    fn test_parse_trims_surrounding_blank_lines() {
        let template = HeaderTemplate::parse("\n\nCopyright\n\nMIT\n\n", &BTreeMap::new());
        assert_eq!(template.source_lines(), ["Copyright", "", "MIT"]);
        assert_eq!(template.line_count(), 3);
        assert!(template.location().is_none());
    }

    #[test]
    fn test_normalized_lines_strip_decoration() {
        let template = HeaderTemplate::parse("/* Copyright ${year} */", &BTreeMap::new());
        let lines = template.normalized_lines(&style("SLASHSTAR_STYLE"));
        assert_eq!(lines.len(), 1);
        assert!(lines[0].matches("Copyright 2021"));
    }

    #[test]
    fn test_render_wraps_plain_template() {
        let template = HeaderTemplate::parse("Copyright ${year}\n\nMIT", &values(&[("year", "2024")]));
        let rendered = template.render(&style("SLASHSTAR_STYLE"));
        let expected: Vec<HeaderLine> = ["/*", " * Copyright 2024", " *", " * MIT", " */"]
            .iter()
            .map(|l| HeaderLine::Literal((*l).to_owned()))
            .collect();
        assert_eq!(rendered, expected);
    }

    #[test]
    fn test_render_keeps_pre_commented_template() {
        let template = HeaderTemplate::parse("/* Copyright ${year} */", &BTreeMap::new());
        let rendered = template.render(&style("SLASHSTAR_STYLE"));
        assert_eq!(rendered.len(), 1);
        assert!(rendered[0].matches("/* Copyright 2021 */"));
    }

    #[test]
    fn test_render_script_style() {
        let template = HeaderTemplate::parse("Copyright", &BTreeMap::new());
        let rendered = template.render(&style("SCRIPT_STYLE"));
        let expected: Vec<HeaderLine> = ["#", "# Copyright", "#"]
            .iter()
            .map(|l| HeaderLine::Literal((*l).to_owned()))
            .collect();
        assert_eq!(rendered, expected);
    }

    #[test]
    fn test_template_equality_ignores_blank_lines_and_indentation() {
        let a = HeaderTemplate::parse("Copyright ${year}\n\nMIT", &BTreeMap::new());
        let b = HeaderTemplate::parse("  Copyright ${year}\nMIT\n", &values(&[("year", "2024")]));
        let c = HeaderTemplate::parse("Copyright ${year}\nApache", &BTreeMap::new());
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_load_missing_template_is_resource_error() {
        let err = HeaderTemplate::load(Path::new("/nonexistent/HEADER.txt"), &BTreeMap::new())
            .unwrap_err();
        assert_eq!(err.location, Path::new("/nonexistent/HEADER.txt"));
    }
}
