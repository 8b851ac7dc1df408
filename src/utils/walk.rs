//! Recursive directory listing.

use jwalk::WalkDir;
use std::path::{Path, PathBuf};

const IGNORED_FILES: &[&str] = &[".DS_Store", "Thumbs.db"];

/// Collect all files from a directory recursively, sorted by path.
///
/// A missing directory yields an empty list.
pub fn collect_all_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.is_dir() {
        return Vec::new();
    }
    let mut files: Vec<_> = WalkDir::new(dir)
        .sort(true)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            let name = e.file_name().to_str().unwrap_or_default();
            !IGNORED_FILES.contains(&name)
        })
        .map(|e| e.path())
        .collect();
    files.sort();
    files
}

/// Collect files whose extension (case-insensitive) is one of `exts`.
pub fn collect_files_with_ext(dir: &Path, exts: &[&str]) -> Vec<PathBuf> {
    collect_all_files(dir)
        .into_iter()
        .filter(|p| has_ext(p, exts))
        .collect()
}

/// Check a path's extension against a list (case-insensitive).
pub fn has_ext(path: &Path, exts: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| exts.iter().any(|want| want.eq_ignore_ascii_case(ext)))
}

/// Whether the file name marks a partial (`_name.scss`, `_helpers.js`).
pub fn is_partial(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('_'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_collect_all_files_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("b")).unwrap();
        fs::write(dir.path().join("b/z.css"), "").unwrap();
        fs::write(dir.path().join("a.css"), "").unwrap();
        fs::write(dir.path().join(".DS_Store"), "").unwrap();

        let files = collect_all_files(dir.path());
        assert_eq!(
            files,
            vec![dir.path().join("a.css"), dir.path().join("b/z.css")]
        );
    }

    #[test]
    fn test_collect_missing_dir() {
        assert!(collect_all_files(Path::new("/nonexistent/stamp/dir")).is_empty());
    }

    #[test]
    fn test_has_ext() {
        assert!(has_ext(Path::new("a/B.HTML"), &["html", "htm"]));
        assert!(!has_ext(Path::new("a/b.css"), &["html"]));
        assert!(!has_ext(Path::new("Makefile"), &["html"]));
    }

    #[test]
    fn test_is_partial() {
        assert!(is_partial(Path::new("scss/_vars.scss")));
        assert!(!is_partial(Path::new("scss/main.scss")));
    }
}
