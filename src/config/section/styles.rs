//! `[styles]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [styles]
//! dir = "scss"                    # Under build.source
//! output = "css"                  # Under build.dest
//! revision = true
//! command = ["sass", "$STAMP_INPUT", "$STAMP_OUTPUT"]
//! dev_args = []                   # Appended in development builds
//! build_args = []                 # Appended in production builds
//! source_map_args = []            # Appended when the mode wants source maps
//! no_source_map_args = ["--no-source-map"]
//! ```
//!
//! `.scss`/`.sass` files go through `command`; plain `.css` is copied.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::tool::{check_relative, check_tool};
use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StylesConfig {
    pub dir: PathBuf,
    pub output: PathBuf,
    pub revision: bool,
    /// Style compiler invocation. Empty: only plain `.css` is handled.
    pub command: Vec<String>,
    pub dev_args: Vec<String>,
    pub build_args: Vec<String>,
    pub source_map_args: Vec<String>,
    pub no_source_map_args: Vec<String>,
}

impl Default for StylesConfig {
    fn default() -> Self {
        Self {
            dir: "scss".into(),
            output: "css".into(),
            revision: true,
            command: vec!["sass".into(), "$STAMP_INPUT".into(), "$STAMP_OUTPUT".into()],
            dev_args: vec![],
            build_args: vec![],
            source_map_args: vec![],
            no_source_map_args: vec!["--no-source-map".into()],
        }
    }
}

impl StylesConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        check_relative(&self.dir, FieldPath::new("styles.dir"), diag);
        check_relative(&self.output, FieldPath::new("styles.output"), diag);
        check_tool(&self.command, FieldPath::new("styles.command"), diag);
    }
}
