//! `[images]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [images]
//! dir = "img"
//! output = "img"
//! revision = true
//! optimize = true                 # Built-in lossless PNG recompression
//! command = []                    # External optimizer, run per file in production
//! ```
//!
//! An external command receives `$STAMP_INPUT` (the copied file) and must
//! write its result to `$STAMP_OUTPUT`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::tool::{check_relative, check_tool};
use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagesConfig {
    pub dir: PathBuf,
    pub output: PathBuf,
    pub revision: bool,
    pub optimize: bool,
    pub command: Vec<String>,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            dir: "img".into(),
            output: "img".into(),
            revision: true,
            optimize: true,
            command: vec![],
        }
    }
}

impl ImagesConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        check_relative(&self.dir, FieldPath::new("images.dir"), diag);
        check_relative(&self.output, FieldPath::new("images.output"), diag);
        check_tool(&self.command, FieldPath::new("images.command"), diag);
    }
}
