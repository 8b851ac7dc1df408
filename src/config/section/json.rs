//! `[json]` section configuration.
//!
//! ```toml
//! [json]
//! dir = "data"
//! output = "data"
//! revision = false
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::tool::check_relative;
use crate::config::{ConfigDiagnostics, FieldPath};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonConfig {
    pub dir: PathBuf,
    pub output: PathBuf,
    pub revision: bool,
}

impl Default for JsonConfig {
    fn default() -> Self {
        Self {
            dir: "data".into(),
            output: "data".into(),
            revision: false,
        }
    }
}

impl JsonConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        check_relative(&self.dir, FieldPath::new("json.dir"), diag);
        check_relative(&self.output, FieldPath::new("json.output"), diag);
    }
}
