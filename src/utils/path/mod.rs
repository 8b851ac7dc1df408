//! Path utilities.
//!
//! - [`fs`]: Filesystem path normalization (`normalize_path`, `resolve_under`)
//! - [`slash`]: Forward-slash relative keys (`to_slash`, `from_slash`)

pub mod fs;
pub mod slash;

pub use fs::{normalize_path, resolve_under};
pub use slash::{from_slash, to_slash};
