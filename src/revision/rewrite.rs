//! Reference rewriting across the destination tree.
//!
//! Matching is plain substring replacement of manifest keys, not a parse of
//! HTML/CSS/JS. All keys are compiled into one alternation, longest first,
//! and replaced in a single left-to-right pass:
//!
//! ```text
//! <link href="css/main.css">   →  <link href="css/main-1f2e3d4c.css">
//! url(../img/logo.png)         →  url(../img/logo-9a8b7c6d.png)
//! https://cdn.example/lib.js   →  (unchanged, not a manifest key)
//! ```
//!
//! A single pass means replaced text is never rescanned, and revisioned
//! paths are not keys, so a second run changes nothing. Keys without an
//! extension (`img/sprite` → `img/sprite-1a2b3c4d`) are prefixes of their
//! own value; a match already followed by the hash suffix is skipped.

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::prelude::*;
use regex::{Captures, Regex, RegexBuilder};

use super::manifest::Manifest;

/// Compiled-size budget for the key alternation (large sites have many keys).
const PATTERN_SIZE_LIMIT: usize = 256 * (1 << 20);

/// Result of rewriting a tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteStats {
    /// Text files scanned.
    pub scanned: usize,
    /// Files whose content changed and was written back.
    pub rewritten: usize,
}

/// Replaces original asset paths with their revisioned counterparts.
pub struct Rewriter<'m> {
    manifest: &'m Manifest,
    pattern: Option<Regex>,
}

impl<'m> Rewriter<'m> {
    /// Compile the manifest keys. An empty manifest yields a no-op rewriter.
    pub fn new(manifest: &'m Manifest) -> Result<Self> {
        if manifest.is_empty() {
            return Ok(Self {
                manifest,
                pattern: None,
            });
        }

        // Longest first: at a given position `css/main.css` must win over `main.css`.
        let mut keys: Vec<&str> = manifest.iter().map(|(k, _)| k).collect();
        keys.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        let alternation = keys
            .iter()
            .map(|k| regex::escape(k))
            .collect::<Vec<_>>()
            .join("|");

        let pattern = RegexBuilder::new(&alternation)
            .size_limit(PATTERN_SIZE_LIMIT)
            .build()
            .context("failed to compile manifest keys")?;

        Ok(Self {
            manifest,
            pattern: Some(pattern),
        })
    }

    /// Rewrite every manifest key occurring in `text`.
    pub fn rewrite<'t>(&self, text: &'t str) -> Cow<'t, str> {
        let Some(pattern) = &self.pattern else {
            return Cow::Borrowed(text);
        };
        let rewritten = pattern.replace_all(text, |caps: &Captures| {
            let original = &caps[0];
            let Some(revisioned) = self.manifest.get(original) else {
                return original.to_string();
            };
            // Extensionless and dotfile names revision by suffix, so the key
            // is a prefix of its own value. Leave it if the suffix is already there.
            let end = caps.get(0).map_or(text.len(), |m| m.end());
            if let Some(suffix) = revisioned.strip_prefix(original)
                && !suffix.is_empty()
                && text[end..].starts_with(suffix)
            {
                return original.to_string();
            }
            revisioned.to_string()
        });
        match rewritten {
            Cow::Owned(out) if out == text => Cow::Borrowed(text),
            other => other,
        }
    }

    /// Rewrite one file in place. Returns whether it changed.
    ///
    /// Non-UTF-8 files are left alone.
    pub fn rewrite_file(&self, path: &Path) -> Result<bool> {
        let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let Ok(text) = std::str::from_utf8(&bytes) else {
            crate::debug!("rewrite"; "skipping non-UTF-8 file {}", path.display());
            return Ok(false);
        };

        match self.rewrite(text) {
            Cow::Borrowed(_) => Ok(false),
            Cow::Owned(rewritten) => {
                fs::write(path, rewritten)
                    .with_context(|| format!("failed to write {}", path.display()))?;
                Ok(true)
            }
        }
    }

    /// Rewrite the given files in parallel.
    pub fn rewrite_files(&self, files: &[PathBuf]) -> Result<RewriteStats> {
        let changed = files
            .par_iter()
            .map(|path| self.rewrite_file(path))
            .collect::<Result<Vec<bool>>>()?;

        Ok(RewriteStats {
            scanned: files.len(),
            rewritten: changed.into_iter().filter(|c| *c).count(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::walk::collect_files_with_ext;
    use tempfile::TempDir;

    fn manifest(pairs: &[(&str, &str)]) -> Manifest {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_rewrite_link_href() {
        let m = manifest(&[("css/main.css", "css/main-abcd1234.css")]);
        let rewriter = Rewriter::new(&m).unwrap();
        assert_eq!(
            rewriter.rewrite(r#"<link href="css/main.css">"#),
            r#"<link href="css/main-abcd1234.css">"#
        );
    }

    #[test]
    fn test_rewrite_root_relative_and_nested_references() {
        let m = manifest(&[
            ("img/logo.png", "img/logo-11111111.png"),
            ("js/app.js", "js/app-22222222.js"),
        ]);
        let rewriter = Rewriter::new(&m).unwrap();

        let css = "h1{background:url(../img/logo.png)}";
        assert_eq!(
            rewriter.rewrite(css),
            "h1{background:url(../img/logo-11111111.png)}"
        );

        let html = r#"<script src="/js/app.js"></script><img src="/img/logo.png">"#;
        assert_eq!(
            rewriter.rewrite(html),
            r#"<script src="/js/app-22222222.js"></script><img src="/img/logo-11111111.png">"#
        );
    }

    #[test]
    fn test_rewrite_prefers_longest_key() {
        let m = manifest(&[
            ("main.css", "main-aaaaaaaa.css"),
            ("css/main.css", "css/main-bbbbbbbb.css"),
        ]);
        let rewriter = Rewriter::new(&m).unwrap();
        assert_eq!(
            rewriter.rewrite(r#"href="css/main.css" href="main.css""#),
            r#"href="css/main-bbbbbbbb.css" href="main-aaaaaaaa.css""#
        );
    }

    #[test]
    fn test_rewrite_leaves_unknown_references() {
        let m = manifest(&[("css/main.css", "css/main-abcd1234.css")]);
        let rewriter = Rewriter::new(&m).unwrap();
        let html = r#"<script src="https://cdn.example.com/lib.min.js"></script>"#;
        assert!(matches!(rewriter.rewrite(html), Cow::Borrowed(_)));
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let m = manifest(&[
            ("css/main.css", "css/main-abcd1234.css"),
            ("img/a.png", "img/a-99999999.png"),
        ]);
        let rewriter = Rewriter::new(&m).unwrap();
        let text = r#"<link href="css/main.css"><img src="img/a.png"> img/a.png"#;

        let once = rewriter.rewrite(text).into_owned();
        let twice = rewriter.rewrite(&once).into_owned();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_rewrite_extensionless_and_dotfile_is_idempotent() {
        let m = manifest(&[
            ("img/sprite", "img/sprite-abcd1234"),
            (".htaccess", ".htaccess-abcd1234"),
        ]);
        let rewriter = Rewriter::new(&m).unwrap();
        let text = r#"<use href="img/sprite#a"/> <a href="/.htaccess">"#;

        let once = rewriter.rewrite(text).into_owned();
        assert_eq!(
            once,
            r#"<use href="img/sprite-abcd1234#a"/> <a href="/.htaccess-abcd1234">"#
        );
        let twice = rewriter.rewrite(&once);
        assert!(matches!(twice, Cow::Borrowed(_)));
        assert_eq!(twice, once);
    }

    #[test]
    fn test_rewrite_escapes_regex_metacharacters() {
        let m = manifest(&[("img/a+b (1).png", "img/a+b (1)-12345678.png")]);
        let rewriter = Rewriter::new(&m).unwrap();
        assert_eq!(
            rewriter.rewrite("src=\"img/a+b (1).png\" img/aab 1.png"),
            "src=\"img/a+b (1)-12345678.png\" img/aab 1.png"
        );
    }

    #[test]
    fn test_empty_manifest_is_noop() {
        let m = Manifest::new();
        let rewriter = Rewriter::new(&m).unwrap();
        assert!(matches!(rewriter.rewrite("css/main.css"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_rewrite_files_only_touches_listed_extensions() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("css")).unwrap();
        fs::write(root.join("index.html"), r#"<link href="css/main.css">"#).unwrap();
        fs::write(root.join("css/other.css"), "a{}").unwrap();
        fs::write(root.join("notes.txt"), "css/main.css").unwrap();

        let m = manifest(&[("css/main.css", "css/main-abcd1234.css")]);
        let rewriter = Rewriter::new(&m).unwrap();
        let stats = rewriter.rewrite_files(&collect_files_with_ext(root, &["html", "css"])).unwrap();

        assert_eq!(stats, RewriteStats { scanned: 2, rewritten: 1 });
        assert_eq!(
            fs::read_to_string(root.join("index.html")).unwrap(),
            r#"<link href="css/main-abcd1234.css">"#
        );
        assert_eq!(fs::read_to_string(root.join("notes.txt")).unwrap(), "css/main.css");

        // Second pass finds nothing to change
        let again = rewriter.rewrite_files(&collect_files_with_ext(root, &["html", "css"])).unwrap();
        assert_eq!(again.rewritten, 0);
    }

    #[test]
    fn test_rewrite_file_skips_binary() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blob.js");
        fs::write(&path, [0xff, 0xfe, b'c']).unwrap();

        let m = manifest(&[("c", "c-1")]);
        let rewriter = Rewriter::new(&m).unwrap();
        assert!(!rewriter.rewrite_file(&path).unwrap());
    }
}
