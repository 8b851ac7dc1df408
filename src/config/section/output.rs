//! `[rewrite]` and `[report]` section configuration.
//!
//! ```toml
//! [rewrite]
//! extensions = ["html", "htm", "css", "js", "mjs"]
//!
//! [report]
//! enable = true
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RewriteConfig {
    /// Extensions of text files scanned for references.
    pub extensions: Vec<String>,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            extensions: ["html", "htm", "css", "js", "mjs"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl RewriteConfig {
    pub fn extension_refs(&self) -> Vec<&str> {
        self.extensions
            .iter()
            .map(|e| e.trim_start_matches('.'))
            .collect()
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.extensions.is_empty() {
            diag.hint(
                FieldPath::new("rewrite.extensions"),
                "no extensions listed, references will not be rewritten",
            );
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub enable: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self { enable: true }
    }
}
