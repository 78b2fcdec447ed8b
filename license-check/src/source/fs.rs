//! Filesystem access for header checks.
//!
//! Reads are bounded: a file larger than the configured limit is rejected
//! without being loaded in full. Discovery walks the given roots without
//! following symlinks by default, skips well-known build directories and
//! never silently drops traversal failures.

use std::io::Read;
use std::path::{Path, PathBuf};

use glob::Pattern;
use walkdir::WalkDir;

use crate::config::FsSourceConfig;
use crate::error::{ScanError, ScanErrorKind};
use crate::source::ContentFormat;

/// Directories to skip
pub const SKIP_DIRS: &[&str] = &["target", "node_modules", ".git", ".hg", ".svn"];

fn matches_exclude(path: &Path, exclude_patterns: &[Pattern]) -> bool {
    let path_str = path.to_string_lossy();
    exclude_patterns.iter().any(|pattern| {
        pattern.matches(&path_str)
            || path
                .file_name()
                .is_some_and(|name| pattern.matches(&name.to_string_lossy()))
    })
}

/// Returns `true` if the entry should be **included** (i.e., is NOT a skip dir).
fn is_not_skip_dir(entry: &walkdir::DirEntry) -> bool {
    if entry.file_type().is_dir()
        && entry.depth() > 0
        && let Some(name) = entry.file_name().to_str()
    {
        return !SKIP_DIRS.contains(&name);
    }
    true
}

/// Resolve the set of files to check under the configured roots.
///
/// Every regular file is a candidate: deciding whether its type is supported
/// is the classifier's job. Returns `(files, errors)` where `errors` holds
/// invalid exclude patterns and traversal failures.
#[must_use]
pub fn find_files(config: &FsSourceConfig) -> (Vec<PathBuf>, Vec<ScanError>) {
    let mut files = Vec::new();
    let mut errors = Vec::new();

    let mut exclude_patterns = Vec::with_capacity(config.exclude.len());
    for pat_str in &config.exclude {
        match Pattern::new(pat_str) {
            Ok(pat) => exclude_patterns.push(pat),
            Err(e) => errors.push(ScanError::new(
                pat_str,
                ScanErrorKind::InvalidExcludePattern,
                format!("Invalid exclude glob pattern '{pat_str}': {e}"),
            )),
        }
    }

    for root in &config.paths {
        if root.is_file() {
            if !matches_exclude(root, &exclude_patterns) {
                files.push(root.clone());
            }
            continue;
        }

        for entry_result in WalkDir::new(root)
            .follow_links(config.follow_links)
            .max_depth(config.max_depth)
            .into_iter()
            .filter_entry(is_not_skip_dir)
        {
            let entry = match entry_result {
                Ok(e) => e,
                Err(walk_err) => {
                    let path = walk_err
                        .path()
                        .map_or_else(|| root.clone(), Path::to_path_buf);
                    errors.push(ScanError::new(
                        path,
                        ScanErrorKind::WalkError,
                        format!("Directory traversal error: {walk_err}"),
                    ));
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let file_path = entry.path();
            if matches_exclude(file_path, &exclude_patterns) {
                continue;
            }
            files.push(file_path.to_path_buf());
        }
    }

    files.sort();
    files.dedup();
    (files, errors)
}

/// Determine the structured text format from a file extension.
#[must_use]
pub fn content_format_for(path: &Path) -> Option<ContentFormat> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => Some(ContentFormat::Json),
        Some("yaml" | "yml") => Some(ContentFormat::Yaml),
        _ => None,
    }
}

/// Read a file using a bounded streaming read, enforcing `max_file_size`.
///
/// # Errors
///
/// Returns a [`ScanError`] if the file cannot be opened or read, is larger
/// than `max_file_size`, or is not valid UTF-8.
pub fn read_file_bounded(path: &Path, max_file_size: u64) -> Result<String, ScanError> {
    let file = std::fs::File::open(path).map_err(|e| {
        ScanError::new(path, ScanErrorKind::IoError, format!("Failed to open file: {e}"))
    })?;

    // One byte over the limit is enough to detect an oversized file.
    let mut buffer = Vec::new();
    file.take(max_file_size.saturating_add(1))
        .read_to_end(&mut buffer)
        .map_err(|e| {
            ScanError::new(path, ScanErrorKind::IoError, format!("Failed to read file: {e}"))
        })?;

    if buffer.len() as u64 > max_file_size {
        return Err(ScanError::new(
            path,
            ScanErrorKind::FileTooLarge,
            format!("File exceeds maximum size of {max_file_size} bytes"),
        ));
    }

    String::from_utf8(buffer).map_err(|_| {
        ScanError::new(path, ScanErrorKind::InvalidEncoding, "File is not valid UTF-8")
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_read_file_bounded_rejects_oversized() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("big.java");
        fs::write(&path, "x".repeat(64)).unwrap();

        let err = read_file_bounded(&path, 16).unwrap_err();
        assert_eq!(err.kind, ScanErrorKind::FileTooLarge);
        assert_eq!(read_file_bounded(&path, 64).unwrap().len(), 64);
    }

    #[test]
    fn test_read_file_bounded_rejects_invalid_utf8() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("latin1.txt");
        fs::write(&path, [0x43, 0x6f, 0x70, 0xff, 0xfe]).unwrap();

        let err = read_file_bounded(&path, 1024).unwrap_err();
        assert_eq!(err.kind, ScanErrorKind::InvalidEncoding);
    }

    #[test]
    fn test_read_file_bounded_missing_file() {
        let tmp = TempDir::new().unwrap();
        let err = read_file_bounded(&tmp.path().join("nope.rs"), 1024).unwrap_err();
        assert_eq!(err.kind, ScanErrorKind::IoError);
        assert!(err.message.contains("Failed to open file"));
    }

    #[test]
    fn test_find_files_skips_build_dirs_and_excludes() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("src")).unwrap();
        fs::create_dir_all(tmp.path().join("target/debug")).unwrap();
        fs::write(tmp.path().join("src/Main.java"), "class Main {}").unwrap();
        fs::write(tmp.path().join("src/generated.java"), "class G {}").unwrap();
        fs::write(tmp.path().join("target/debug/out.java"), "class O {}").unwrap();

        let mut config = FsSourceConfig::default();
        config.paths = vec![tmp.path().to_path_buf()];
        config.exclude = vec!["generated.*".to_owned()];

        let (files, errors) = find_files(&config);
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(files, vec![tmp.path().join("src/Main.java")]);
    }

    #[test]
    fn test_find_files_reports_invalid_exclude() {
        let mut config = FsSourceConfig::default();
        config.exclude = vec!["[".to_owned()];

        let (_, errors) = find_files(&config);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ScanErrorKind::InvalidExcludePattern);
    }

    #[test]
    fn test_content_format_for() {
        assert_eq!(
            content_format_for(Path::new("styles.yml")),
            Some(ContentFormat::Yaml)
        );
        assert_eq!(
            content_format_for(Path::new("styles.json")),
            Some(ContentFormat::Json)
        );
        assert_eq!(content_format_for(Path::new("styles.xml")), None);
    }
}
