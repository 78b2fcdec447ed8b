//! Inputs read from disk: source files, header templates, style descriptors.

pub mod fs;

/// Structured text format of a descriptor or configuration resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentFormat {
    Json,
    Yaml,
}
