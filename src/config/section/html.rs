//! `[html]` and `[critical]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [html]
//! dir = ""                        # HTML files under build.source (recursive)
//! minify = true                   # Production only
//!
//! [critical]
//! enable = true
//! stylesheet = "css/main.css"     # Manifest key of the stylesheet to inline
//! command = []                    # External inliner; its stdout replaces the page
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::tool::{check_relative, check_tool};
use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HtmlConfig {
    pub dir: PathBuf,
    pub minify: bool,
}

impl Default for HtmlConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::new(),
            minify: true,
        }
    }
}

impl HtmlConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        check_relative(&self.dir, FieldPath::new("html.dir"), diag);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CriticalConfig {
    pub enable: bool,
    pub stylesheet: Option<String>,
    pub command: Vec<String>,
}

impl Default for CriticalConfig {
    fn default() -> Self {
        Self {
            enable: true,
            stylesheet: Some("css/main.css".into()),
            command: vec![],
        }
    }
}

impl CriticalConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if !self.enable {
            return;
        }
        match self.stylesheet.as_deref() {
            None | Some("") => diag.error_with_hint(
                FieldPath::new("critical.stylesheet"),
                "required when critical CSS inlining is enabled",
                "set it to the stylesheet's dest-relative path, e.g. `css/main.css`",
            ),
            Some(s) if s.starts_with('/') => diag.error(
                FieldPath::new("critical.stylesheet"),
                "must be relative to the destination root",
            ),
            Some(_) => {}
        }
        check_tool(&self.command, FieldPath::new("critical.command"), diag);
    }
}
