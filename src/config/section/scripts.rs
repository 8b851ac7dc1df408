//! `[scripts]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [scripts]
//! dir = "js"
//! output = "js"
//! revision = true
//! entries = ["main.js"]           # Empty: every .js/.mjs not starting with `_`
//! command = ["esbuild", "$STAMP_INPUT", "--bundle", "--outfile=$STAMP_OUTPUT"]
//! build_args = ["--target=es2018"]
//! source_map_args = ["--sourcemap"]
//! ```
//!
//! Without a command, entries are copied as-is.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::tool::{check_relative, check_tool};
use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptsConfig {
    pub dir: PathBuf,
    pub output: PathBuf,
    pub revision: bool,
    /// Entry points relative to `dir`.
    pub entries: Vec<PathBuf>,
    /// Bundler/transpiler invocation. Empty: copy.
    pub command: Vec<String>,
    pub dev_args: Vec<String>,
    pub build_args: Vec<String>,
    /// Appended when the build mode wants source maps.
    pub source_map_args: Vec<String>,
    /// Appended otherwise.
    pub no_source_map_args: Vec<String>,
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            dir: "js".into(),
            output: "js".into(),
            revision: true,
            entries: vec![],
            command: vec![],
            dev_args: vec![],
            build_args: vec![],
            source_map_args: vec![],
            no_source_map_args: vec![],
        }
    }
}

impl ScriptsConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        check_relative(&self.dir, FieldPath::new("scripts.dir"), diag);
        check_relative(&self.output, FieldPath::new("scripts.output"), diag);
        for entry in &self.entries {
            check_relative(entry, FieldPath::new("scripts.entries"), diag);
        }
        check_tool(&self.command, FieldPath::new("scripts.command"), diag);
    }
}
