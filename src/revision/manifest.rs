//! Original path → revisioned path mapping.
//!
//! Keys and values are forward-slash paths relative to the destination root.
//! Stages each build a partial manifest; the merge stage unions them and
//! persists a single flat JSON object:
//!
//! ```json
//! {
//!   "css/main.css": "css/main-1f2e3d4c.css",
//!   "img/logo.png": "img/logo-9a8b7c6d.png"
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Manifest persistence errors.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("cannot access manifest `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("manifest `{}` is not a flat JSON object of strings", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A key written twice while merging or recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    pub original: String,
    pub previous: String,
    pub incoming: String,
}

/// Mapping from original relative path to revisioned relative path.
///
/// Backed by a `BTreeMap` so serialization is sorted and byte-stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: BTreeMap<String, String>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite an entry. Returns the previous value, if any.
    pub fn put(&mut self, original: impl Into<String>, revisioned: impl Into<String>) -> Option<String> {
        self.entries.insert(original.into(), revisioned.into())
    }

    pub fn get(&self, original: &str) -> Option<&str> {
        self.entries.get(original).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Union `other` into `self`, last write wins.
    ///
    /// Every overwritten key whose value differs is returned so the caller
    /// can report it: stages own disjoint subtrees, so a collision means
    /// two stages were configured to produce the same output path.
    pub fn merge(&mut self, other: &Manifest) -> Vec<Collision> {
        let mut collisions = Vec::new();
        for (original, incoming) in &other.entries {
            if let Some(previous) = self.entries.insert(original.clone(), incoming.clone())
                && previous != *incoming
            {
                collisions.push(Collision {
                    original: original.clone(),
                    previous,
                    incoming: incoming.clone(),
                });
            }
        }
        collisions
    }

    /// Serialize to a pretty-printed JSON object.
    pub fn to_json(&self) -> String {
        // A map of strings always serializes.
        serde_json::to_string_pretty(&self.entries).unwrap_or_else(|_| "{}".to_string())
    }

    /// Parse a JSON object of string values.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Write the manifest to `path`.
    pub fn persist(&self, path: &Path) -> Result<(), ManifestError> {
        let mut json = self.to_json();
        json.push('\n');
        fs::write(path, json).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Read a manifest previously written by [`Manifest::persist`].
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content).map_err(|source| ManifestError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl FromIterator<(String, String)> for Manifest {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
