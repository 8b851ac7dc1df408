//! `[build]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [build]
//! source = "src"                  # Source tree (relative to project root)
//! dest = "dist"                   # Destination tree, deleted on every run
//! manifest = "rev-manifest.json"  # Manifest file name at the destination root
//! keep_manifest = true            # Keep the manifest after rewriting
//! ```

use crate::config::{ConfigDiagnostics, FieldPath};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Source tree.
    pub source: PathBuf,

    /// Destination tree.
    pub dest: PathBuf,

    /// Manifest file name, written at the destination root.
    pub manifest: String,

    /// Keep the manifest file once the build finished.
    pub keep_manifest: bool,

    /// Print the progress line and per-stage logs (CLI only).
    #[serde(skip)]
    pub quiet: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            source: "src".into(),
            dest: "dist".into(),
            manifest: "rev-manifest.json".into(),
            keep_manifest: true,
            quiet: false,
        }
    }
}

impl BuildConfig {
    /// Validate build configuration.
    ///
    /// Call after path normalization: `source` and `dest` are absolute.
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.manifest.is_empty() || self.manifest.contains(['/', '\\']) {
            diag.error_with_hint(
                FieldPath::new("build.manifest"),
                format!("`{}` is not a bare file name", self.manifest),
                "use a name like `rev-manifest.json`",
            );
        }

        if self.source == self.dest {
            diag.error(
                FieldPath::new("build.dest"),
                "destination must differ from source (it is deleted on every run)",
            );
        } else if self.source.starts_with(&self.dest) {
            diag.error(
                FieldPath::new("build.dest"),
                "destination must not contain the source tree",
            );
        }

        if !self.source.is_dir() {
            diag.hint(
                FieldPath::new("build.source"),
                format!("directory '{}' not found", self.source.display()),
            );
        }
    }
}
