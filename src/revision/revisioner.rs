//! Final write of built assets, under a content-hashed name in production.
//!
//! The revisioner owns the on-disk name of every asset a stage emits:
//!
//! ```text
//! production:   css/main.css ──hash──▶ css/main-1f2e3d4c.css   (+ manifest entry)
//! development:  css/main.css ────────▶ css/main.css
//! ```
//!
//! After [`Revisioner::emit`] returns, exactly one of the two names exists.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::hash::fingerprint;
use super::manifest::Manifest;
use crate::utils::path::from_slash;

/// Insert `-<hash>` between a file name's stem and its last extension.
///
/// ```text
/// css/main.css     → css/main-<hash>.css
/// js/app.min.js    → js/app.min-<hash>.js
/// LICENSE          → LICENSE-<hash>
/// ```
pub fn revisioned_name(original: &str, hash: &str) -> String {
    let (dir, file) = match original.rfind('/') {
        Some(idx) => original.split_at(idx + 1),
        None => ("", original),
    };
    // A leading dot is part of the stem (`.htaccess` has no extension).
    let name = match file.rfind('.') {
        Some(idx) if idx > 0 => format!("{}-{}{}", &file[..idx], hash, &file[idx..]),
        _ => format!("{file}-{hash}"),
    };
    format!("{dir}{name}")
}

/// Writes stage output into the destination tree.
#[derive(Debug, Clone)]
pub struct Revisioner {
    dest: PathBuf,
    enabled: bool,
}

impl Revisioner {
    /// `enabled` comes from [`crate::core::BuildMode::revision`] and the
    /// stage's own `revision` setting.
    pub fn new(dest: &Path, enabled: bool) -> Self {
        Self {
            dest: dest.to_path_buf(),
            enabled,
        }
    }

    /// Write `content` for the logical asset `original` (dest-relative key).
    ///
    /// When revisioning is enabled the content is written under its hashed
    /// name, any file a previous step left at the original name is removed,
    /// and the mapping is recorded in `manifest`. Otherwise the content is
    /// written at `original` and the manifest is untouched.
    ///
    /// Returns the dest-relative key the content ended up under.
    pub fn emit(&self, original: &str, content: &[u8], manifest: &mut Manifest) -> Result<String> {
        let original_path = from_slash(&self.dest, original);

        if !self.enabled {
            write_file(&original_path, content)?;
            return Ok(original.to_string());
        }

        let revisioned = revisioned_name(original, &fingerprint(content));
        write_file(&from_slash(&self.dest, &revisioned), content)?;

        if original_path.exists() {
            fs::remove_file(&original_path).with_context(|| {
                format!("failed to remove unrevisioned {}", original_path.display())
            })?;
        }

        manifest.put(original, revisioned.clone());

        Ok(revisioned)
    }
}

/// Write a file, creating parent directories first.
fn write_file(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("failed to write {}", path.display()))
}
