//! Extension to header style resolution.
//!
//! The catalog is built once, before any scanning, from the built-in tables,
//! the user mapping and any style descriptors. It is read-only afterwards and
//! shared by reference across scan workers.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::descriptor::StyleDescriptor;
use crate::error::ConfigError;
use crate::style::{self, HeaderStyle, UNKNOWN_STYLE};

/// Mapping key that every otherwise-unmapped file falls back to.
pub const UNKNOWN_EXTENSION: &str = "unknown";

/// Built-in whole file name mapping. Keys are lowercase.
const DEFAULT_FILE_NAMES: &[(&str, &str)] = &[
    ("dockerfile", "SCRIPT_STYLE"),
    ("makefile", "SCRIPT_STYLE"),
    ("cmakelists.txt", "SCRIPT_STYLE"),
];

/// Built-in extension mapping. Keys are lowercase, without the dot.
const DEFAULT_EXTENSIONS: &[(&str, &str)] = &[
    // C family
    ("java", "SLASHSTAR_STYLE"),
    ("groovy", "SLASHSTAR_STYLE"),
    ("gradle", "SLASHSTAR_STYLE"),
    ("kt", "SLASHSTAR_STYLE"),
    ("kts", "SLASHSTAR_STYLE"),
    ("scala", "SLASHSTAR_STYLE"),
    ("c", "SLASHSTAR_STYLE"),
    ("h", "SLASHSTAR_STYLE"),
    ("cc", "SLASHSTAR_STYLE"),
    ("cpp", "SLASHSTAR_STYLE"),
    ("hpp", "SLASHSTAR_STYLE"),
    ("cs", "SLASHSTAR_STYLE"),
    ("go", "SLASHSTAR_STYLE"),
    ("rs", "SLASHSTAR_STYLE"),
    ("swift", "SLASHSTAR_STYLE"),
    ("js", "SLASHSTAR_STYLE"),
    ("jsx", "SLASHSTAR_STYLE"),
    ("ts", "SLASHSTAR_STYLE"),
    ("tsx", "SLASHSTAR_STYLE"),
    ("css", "SLASHSTAR_STYLE"),
    ("scss", "SLASHSTAR_STYLE"),
    ("less", "SLASHSTAR_STYLE"),
    ("proto", "SLASHSTAR_STYLE"),
    ("php", "PHP"),
    // Markup
    ("xml", "XML_STYLE"),
    ("xsd", "XML_STYLE"),
    ("xsl", "XML_STYLE"),
    ("html", "XML_STYLE"),
    ("htm", "XML_STYLE"),
    ("xhtml", "XML_STYLE"),
    ("svg", "XML_STYLE"),
    ("pom", "XML_STYLE"),
    ("fml", "XML_STYLE"),
    ("jsp", "XML_STYLE"),
    ("haml", "HAML_STYLE"),
    ("tpl", "BRACESSTAR_STYLE"),
    ("vm", "SHARPSTAR_STYLE"),
    // Scripts and config
    ("sh", "SCRIPT_STYLE"),
    ("bash", "SCRIPT_STYLE"),
    ("py", "SCRIPT_STYLE"),
    ("rb", "SCRIPT_STYLE"),
    ("pl", "SCRIPT_STYLE"),
    ("pm", "SCRIPT_STYLE"),
    ("r", "SCRIPT_STYLE"),
    ("tcl", "SCRIPT_STYLE"),
    ("properties", "SCRIPT_STYLE"),
    ("toml", "SCRIPT_STYLE"),
    ("yaml", "SCRIPT_STYLE"),
    ("yml", "SCRIPT_STYLE"),
    ("cfg", "SCRIPT_STYLE"),
    ("conf", "SCRIPT_STYLE"),
    ("ini", "SEMICOLON_STYLE"),
    ("el", "SEMICOLON_STYLE"),
    ("clj", "SEMICOLON_STYLE"),
    ("vb", "APOSTROPHE_STYLE"),
    ("vbs", "APOSTROPHE_STYLE"),
    ("bas", "APOSTROPHE_STYLE"),
    ("f", "EXCLAMATION_STYLE"),
    ("f90", "EXCLAMATION_STYLE"),
    ("sql", "DOUBLEDASHES_STYLE"),
    ("lua", "DOUBLEDASHES_STYLE"),
    ("hs", "DOUBLEDASHES_STYLE"),
    ("ada", "DOUBLEDASHES_STYLE"),
    ("adb", "DOUBLEDASHES_STYLE"),
    ("ads", "DOUBLEDASHES_STYLE"),
    ("apt", "DOUBLETILDE_STYLE"),
    ("tex", "PERCENT_STYLE"),
    ("erl", "PERCENT_STYLE"),
    ("m", "PERCENT_STYLE"),
    ("bat", "BATCH"),
    ("cmd", "BATCH"),
    ("txt", "TEXT"),
];

/// Resolved extension mapping and style table.
#[derive(Debug, Clone)]
pub struct HeaderStyleCatalog {
    mapping: BTreeMap<String, String>,
    styles: HashMap<String, Arc<HeaderStyle>>,
}

impl HeaderStyleCatalog {
    /// Build the catalog.
    ///
    /// Styles are merged first (built-ins, then each descriptor in order,
    /// later ones winning), so that user mapping values can reference styles
    /// declared by descriptors. The sentinel `unknown` to `UNKNOWN` entry and
    /// the `UNKNOWN` style itself are always present.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a descriptor is malformed or a mapping
    /// value names a style that is neither built in nor declared.
    pub fn build(
        use_defaults: bool,
        user_mapping: &BTreeMap<String, String>,
        descriptors: &[StyleDescriptor],
    ) -> Result<Self, ConfigError> {
        let styles = build_styles(descriptors)?;
        let mapping = build_mapping(use_defaults, user_mapping, &styles)?;
        debug!(
            "Header style catalog: {} mappings, {} styles",
            mapping.len(),
            styles.len()
        );
        Ok(Self { mapping, styles })
    }

    /// Catalog with the built-in tables only.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] only if a built-in pattern fails to compile.
    pub fn with_defaults() -> Result<Self, ConfigError> {
        Self::build(true, &BTreeMap::new(), &[])
    }

    #[must_use]
    pub fn mapping(&self) -> &BTreeMap<String, String> {
        &self.mapping
    }

    #[must_use]
    pub fn style(&self, name: &str) -> Option<&Arc<HeaderStyle>> {
        self.styles.get(&name.to_uppercase())
    }

    #[must_use]
    pub fn style_names(&self) -> BTreeSet<&str> {
        self.styles.keys().map(String::as_str).collect()
    }

    /// Resolve the style for a file.
    ///
    /// The lowercased file name is looked up first, then the lowercased
    /// extension, then the `unknown` sentinel. Keys that are built-in
    /// extensions never match a whole file name, so a file called `java`
    /// is not a Java source.
    #[must_use]
    pub fn style_for(&self, path: &Path) -> Arc<HeaderStyle> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .filter(|name| is_file_name_key(name));
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase());

        let style_name = file_name
            .iter()
            .chain(extension.iter())
            .find_map(|key| self.mapping.get(key.as_str()))
            .or_else(|| self.mapping.get(UNKNOWN_EXTENSION))
            .map_or(UNKNOWN_STYLE, String::as_str);

        match self.styles.get(style_name).or_else(|| self.styles.get(UNKNOWN_STYLE)) {
            Some(style) => Arc::clone(style),
            None => Arc::new(style::unknown_style()),
        }
    }
}

fn is_file_name_key(key: &str) -> bool {
    key != UNKNOWN_EXTENSION && !DEFAULT_EXTENSIONS.iter().any(|(ext, _)| *ext == key)
}

fn build_styles(
    descriptors: &[StyleDescriptor],
) -> Result<HashMap<String, Arc<HeaderStyle>>, ConfigError> {
    let mut styles = HashMap::new();
    for (name, spec) in style::builtin_specs() {
        styles.insert(name.to_owned(), Arc::new(HeaderStyle::from_spec(name, &spec)?));
    }
    for descriptor in descriptors {
        for (name, style) in descriptor.parse()? {
            styles.insert(name, Arc::new(style));
        }
    }
    styles.insert(UNKNOWN_STYLE.to_owned(), Arc::new(style::unknown_style()));
    Ok(styles)
}

fn build_mapping(
    use_defaults: bool,
    user_mapping: &BTreeMap<String, String>,
    styles: &HashMap<String, Arc<HeaderStyle>>,
) -> Result<BTreeMap<String, String>, ConfigError> {
    let mut mapping: BTreeMap<String, String> = if use_defaults {
        DEFAULT_FILE_NAMES
            .iter()
            .chain(DEFAULT_EXTENSIONS)
            .map(|(ext, style)| ((*ext).to_owned(), (*style).to_owned()))
            .collect()
    } else {
        BTreeMap::new()
    };

    for (extension, header_type) in user_mapping {
        let extension = extension.trim_start_matches('.').to_lowercase();
        let header_type = header_type.to_uppercase();
        if !styles.contains_key(&header_type) {
            return Err(ConfigError::InvalidHeaderType {
                extension,
                header_type,
            });
        }
        mapping.insert(extension, header_type);
    }

    mapping.insert(UNKNOWN_EXTENSION.to_owned(), UNKNOWN_STYLE.to_owned());
    Ok(mapping)
}
