//! Comment conventions used to embed a license header in a file.
//!
//! A [`HeaderStyle`] is immutable once built and shared by every
//! classification through an `Arc`.

use regex::Regex;
use serde::Deserialize;

use crate::error::ConfigError;

/// Name of the sentinel style for files nobody knows how to comment.
pub const UNKNOWN_STYLE: &str = "UNKNOWN";

/// Declarative form of a style, as written in descriptor resources.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct StyleSpec {
    pub first_line: String,
    pub before_each_line: String,
    pub end_line: String,
    pub after_each_line: String,
    /// Lines at the top of a file that precede any header (shebang, XML prolog).
    pub skip_line: Option<String>,
    pub first_line_detection: Option<String>,
    pub last_line_detection: Option<String>,
    pub allow_blank_lines: bool,
    pub multiline: bool,
    pub pad_lines: bool,
}

/// A resolved comment style.
#[derive(Debug, Clone)]
pub struct HeaderStyle {
    name: String,
    first_line: String,
    before_each_line: String,
    end_line: String,
    after_each_line: String,
    skip_line: Option<Regex>,
    first_line_detection: Option<Regex>,
    last_line_detection: Option<Regex>,
    allow_blank_lines: bool,
    multiline: bool,
    pad_lines: bool,
}

impl HeaderStyle {
    /// Build a style from its declaration. The name is uppercased.
    ///
    /// A missing `first_line_detection` is derived from the opening
    /// delimiter (for per-line styles, any of the line markers). A
    /// multiline style without `last_line_detection` gets one derived from
    /// `end_line`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidPattern`] if one of the detection
    /// patterns is not a valid regular expression, and
    /// [`ConfigError::MissingPattern`] if a required pattern is absent and
    /// the delimiters give nothing to derive it from.
    pub fn from_spec(name: &str, spec: &StyleSpec) -> Result<Self, ConfigError> {
        let name = name.to_uppercase();
        let skip_line = compile(&name, "skip_line", spec.skip_line.as_deref())?;
        let mut first_line_detection = compile(
            &name,
            "first_line_detection",
            spec.first_line_detection.as_deref(),
        )?;
        let mut last_line_detection = compile(
            &name,
            "last_line_detection",
            spec.last_line_detection.as_deref(),
        )?;

        if name != UNKNOWN_STYLE {
            if first_line_detection.is_none() {
                let pattern = derive_first_line_detection(spec).ok_or_else(|| {
                    ConfigError::MissingPattern {
                        style: name.clone(),
                        field: "first_line_detection",
                    }
                })?;
                first_line_detection =
                    compile(&name, "first_line_detection", Some(pattern.as_str()))?;
            }
            if last_line_detection.is_none() {
                match derive_last_line_detection(spec) {
                    Some(pattern) => {
                        last_line_detection =
                            compile(&name, "last_line_detection", Some(pattern.as_str()))?;
                    }
                    None if spec.multiline => {
                        return Err(ConfigError::MissingPattern {
                            style: name,
                            field: "last_line_detection",
                        });
                    }
                    None => {}
                }
            }
        }

        Ok(Self {
            name,
            first_line: spec.first_line.clone(),
            before_each_line: spec.before_each_line.clone(),
            end_line: spec.end_line.clone(),
            after_each_line: spec.after_each_line.clone(),
            skip_line,
            first_line_detection,
            last_line_detection,
            allow_blank_lines: spec.allow_blank_lines,
            multiline: spec.multiline,
            pad_lines: spec.pad_lines,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn is_unknown(&self) -> bool {
        self.name == UNKNOWN_STYLE
    }

    #[must_use]
    pub fn first_line(&self) -> &str {
        &self.first_line
    }

    #[must_use]
    pub fn before_each_line(&self) -> &str {
        &self.before_each_line
    }

    #[must_use]
    pub fn end_line(&self) -> &str {
        &self.end_line
    }

    #[must_use]
    pub fn after_each_line(&self) -> &str {
        &self.after_each_line
    }

    #[must_use]
    pub fn allow_blank_lines(&self) -> bool {
        self.allow_blank_lines
    }

    #[must_use]
    pub fn is_multiline(&self) -> bool {
        self.multiline
    }

    #[must_use]
    pub fn pad_lines(&self) -> bool {
        self.pad_lines
    }

    /// Whether `line` is a preamble line that may sit above the header.
    #[must_use]
    pub fn is_skip_line(&self, line: &str) -> bool {
        self.skip_line.as_ref().is_some_and(|re| re.is_match(line))
    }

    /// Whether `line` can open a header block in this style.
    #[must_use]
    pub fn is_first_header_line(&self, line: &str) -> bool {
        self.first_line_detection
            .as_ref()
            .is_some_and(|re| re.is_match(line))
    }

    /// Whether `line` closes a multiline header block in this style.
    #[must_use]
    pub fn is_last_header_line(&self, line: &str) -> bool {
        self.last_line_detection
            .as_ref()
            .is_some_and(|re| re.is_match(line))
    }

    /// Remove this style's comment decoration from a single line.
    ///
    /// Suffixes go first so that a closing ` */` is not mistaken for a
    /// ` * ` continuation prefix.
    #[must_use]
    pub fn strip_decoration<'a>(&self, line: &'a str) -> &'a str {
        let mut text = line.trim();
        for suffix in [self.end_line.trim(), self.after_each_line.trim()] {
            if !suffix.is_empty()
                && let Some(rest) = text.strip_suffix(suffix)
            {
                text = rest.trim_end();
            }
        }
        for prefix in [self.first_line.trim(), self.before_each_line.trim()] {
            if !prefix.is_empty()
                && let Some(rest) = text.strip_prefix(prefix)
            {
                text = rest.trim_start();
            }
        }
        text.trim()
    }
}

/// `^\s*` followed by the opening delimiter, or for per-line styles by
/// any of the distinct line markers.
fn derive_first_line_detection(spec: &StyleSpec) -> Option<String> {
    let mut markers: Vec<&str> = if spec.multiline {
        [spec.first_line.trim(), spec.before_each_line.trim()]
            .into_iter()
            .filter(|m| !m.is_empty())
            .take(1)
            .collect()
    } else {
        [
            spec.first_line.trim(),
            spec.before_each_line.trim(),
            spec.end_line.trim(),
        ]
        .into_iter()
        .filter(|m| !m.is_empty())
        .collect()
    };
    markers.sort_unstable();
    markers.dedup();
    if markers.is_empty() {
        return None;
    }
    let alternatives: Vec<String> = markers.into_iter().map(regex::escape).collect();
    Some(format!(r"^\s*(?:{})", alternatives.join("|")))
}

/// The closing delimiter at the end of a line.
fn derive_last_line_detection(spec: &StyleSpec) -> Option<String> {
    let closer = spec.end_line.trim();
    (!closer.is_empty()).then(|| format!(r"{}\s*$", regex::escape(closer)))
}

fn compile(
    style: &str,
    field: &'static str,
    pattern: Option<&str>,
) -> Result<Option<Regex>, ConfigError> {
    pattern
        .filter(|p| !p.is_empty())
        .map(|p| {
            Regex::new(p).map_err(|e| ConfigError::InvalidPattern {
                style: style.to_owned(),
                field,
                cause: e.to_string(),
            })
        })
        .transpose()
}

struct Builtin {
    name: &'static str,
    first_line: &'static str,
    before_each_line: &'static str,
    end_line: &'static str,
    after_each_line: &'static str,
    skip_line: Option<&'static str>,
    first_line_detection: &'static str,
    last_line_detection: &'static str,
    allow_blank_lines: bool,
    multiline: bool,
    pad_lines: bool,
}

impl Builtin {
    const fn block(
        name: &'static str,
        delimiters: (&'static str, &'static str, &'static str),
        detection: (&'static str, &'static str),
        skip_line: Option<&'static str>,
    ) -> Self {
        Self {
            name,
            first_line: delimiters.0,
            before_each_line: delimiters.1,
            end_line: delimiters.2,
            after_each_line: "",
            skip_line,
            first_line_detection: detection.0,
            last_line_detection: detection.1,
            allow_blank_lines: false,
            multiline: true,
            pad_lines: false,
        }
    }

    /// Styles where every header line carries the same marker.
    const fn per_line(
        name: &'static str,
        marker: &'static str,
        before_each_line: &'static str,
        detection: &'static str,
        skip_line: Option<&'static str>,
    ) -> Self {
        Self {
            name,
            first_line: marker,
            before_each_line,
            end_line: marker,
            after_each_line: "",
            skip_line,
            first_line_detection: detection,
            last_line_detection: detection,
            allow_blank_lines: false,
            multiline: false,
            pad_lines: false,
        }
    }

    fn spec(&self) -> StyleSpec {
        let pattern = |p: &str| (!p.is_empty()).then(|| p.to_owned());
        StyleSpec {
            first_line: self.first_line.to_owned(),
            before_each_line: self.before_each_line.to_owned(),
            end_line: self.end_line.to_owned(),
            after_each_line: self.after_each_line.to_owned(),
            skip_line: self.skip_line.map(str::to_owned),
            first_line_detection: pattern(self.first_line_detection),
            last_line_detection: pattern(self.last_line_detection),
            allow_blank_lines: self.allow_blank_lines,
            multiline: self.multiline,
            pad_lines: self.pad_lines,
        }
    }
}

const SLASHSTAR_DETECTION: (&str, &str) = (r"^\s*/\*.*$", r".*\*/\s*$");
const XML_PROLOG: Option<&str> = Some(r"^<\?xml.*>$");

const BUILTINS: &[Builtin] = &[
    Builtin::block("SLASHSTAR_STYLE", ("/*", " * ", " */"), SLASHSTAR_DETECTION, None),
    Builtin::block(
        "JAVADOC_STYLE",
        ("/**", " * ", " */"),
        (r"^\s*/\*\*.*$", r".*\*/\s*$"),
        None,
    ),
    Builtin::block(
        "PHP",
        ("/*", " * ", " */"),
        SLASHSTAR_DETECTION,
        Some(r"^<\?php.*$"),
    ),
    Builtin::block(
        "BRACESSTAR_STYLE",
        ("{*", " * ", " *}"),
        (r"^\s*\{\*.*$", r".*\*\}\s*$"),
        None,
    ),
    Builtin::block(
        "SHARPSTAR_STYLE",
        ("#*", " * ", " *#"),
        (r"^\s*#\*.*$", r".*\*#\s*$"),
        None,
    ),
    Builtin::block("TEXT", ("====", "    ", "===="), (r"^====.*$", r"^====.*$"), None),
    Builtin {
        allow_blank_lines: true,
        ..Builtin::block(
            "XML_STYLE",
            ("<!--", "    ", "-->"),
            (r"^\s*<!--.*$", r".*-->\s*$"),
            XML_PROLOG,
        )
    },
    Builtin {
        name: "XML_PER_LINE",
        first_line: "",
        before_each_line: "<!-- ",
        end_line: "",
        after_each_line: " -->",
        skip_line: XML_PROLOG,
        first_line_detection: r"^\s*<!--.*-->\s*$",
        last_line_detection: r"^\s*<!--.*-->\s*$",
        allow_blank_lines: true,
        multiline: false,
        pad_lines: true,
    },
    Builtin::per_line("SCRIPT_STYLE", "#", "# ", r"^#.*$", Some(r"^#!.*$")),
    Builtin::per_line("HAML_STYLE", "-#", "-# ", r"^-#.*$", Some(r"^-#!.*$")),
    Builtin::per_line("SEMICOLON_STYLE", ";", "; ", r"^;.*$", None),
    Builtin::per_line("APOSTROPHE_STYLE", "'", "' ", r"^'.*$", None),
    Builtin::per_line("EXCLAMATION_STYLE", "!", "! ", r"^!.*$", None),
    Builtin::per_line("DOUBLEDASHES_STYLE", "--", "-- ", r"^--.*$", None),
    Builtin::per_line("DOUBLESLASH_STYLE", "//", "// ", r"^//.*$", None),
    Builtin::per_line("DOUBLETILDE_STYLE", "~~", "~~ ", r"^~~.*$", None),
    Builtin::per_line("PERCENT_STYLE", "%", "% ", r"^%.*$", None),
    Builtin::per_line("BATCH", "@REM", "@REM ", r"(?i)^@REM.*$", None),
    Builtin {
        name: UNKNOWN_STYLE,
        first_line: "",
        before_each_line: "",
        end_line: "",
        after_each_line: "",
        skip_line: None,
        first_line_detection: "",
        last_line_detection: "",
        allow_blank_lines: false,
        multiline: false,
        pad_lines: false,
    },
];

/// Names of all built-in styles, `UNKNOWN` included.
pub fn builtin_names() -> impl Iterator<Item = &'static str> {
    BUILTINS.iter().map(|b| b.name)
}

/// Declarations of all built-in styles, keyed by name.
pub fn builtin_specs() -> impl Iterator<Item = (&'static str, StyleSpec)> {
    BUILTINS.iter().map(|b| (b.name, b.spec()))
}

/// The sentinel style assigned to files with no known comment syntax.
#[must_use]
pub fn unknown_style() -> HeaderStyle {
    HeaderStyle {
        name: UNKNOWN_STYLE.to_owned(),
        first_line: String::new(),
        before_each_line: String::new(),
        end_line: String::new(),
        after_each_line: String::new(),
        skip_line: None,
        first_line_detection: None,
        last_line_detection: None,
        allow_blank_lines: false,
        multiline: false,
        pad_lines: false,
    }
}
