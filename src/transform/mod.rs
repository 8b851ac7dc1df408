//! Opaque file transformations.
//!
//! Everything here is a black box from the pipeline's point of view: a file
//! or buffer goes in, a transformed one comes out. Failures are
//! [`TransformError`]s, which stages report and step over.
//!
//! | Module     | Transformation                                   |
//! |------------|--------------------------------------------------|
//! | `exec`     | External tools (style compiler, bundler, ...)    |
//! | `minify`   | JS (oxc), CSS (lightningcss), JSON, HTML         |
//! | `image`    | Lossless PNG recompression                       |
//! | `critical` | Critical CSS inlining                            |

pub mod critical;
pub mod exec;
pub mod image;
pub mod minify;

use std::path::{Path, PathBuf};
use thiserror::Error;

/// A single asset failed to transform.
///
/// Never fatal: the owning stage logs it and moves on.
#[derive(Debug, Error)]
#[error("{tool} failed on `{}`: {message}", path.display())]
pub struct TransformError {
    pub path: PathBuf,
    pub tool: String,
    pub message: String,
}

impl TransformError {
    pub fn new(path: &Path, tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.to_path_buf(),
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Log as a stage error.
    pub fn report(&self, stage: &str) {
        crate::log!("error"; "[{}] {}", stage, self);
    }
}
