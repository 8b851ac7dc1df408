//! Forward-slash relative paths, the key format of the manifest.

use std::path::{Component, Path, PathBuf};

/// Render a relative path with `/` separators on every platform.
///
/// Only normal components are kept; `.` is dropped.
pub fn to_slash(path: &Path) -> String {
    let mut out = String::new();
    for component in path.components() {
        if let Component::Normal(part) = component {
            if !out.is_empty() {
                out.push('/');
            }
            out.push_str(&part.to_string_lossy());
        }
    }
    out
}

/// Join a manifest key back onto a root directory.
pub fn from_slash(root: &Path, key: &str) -> PathBuf {
    let mut path = root.to_path_buf();
    for part in key.split('/').filter(|p| !p.is_empty()) {
        path.push(part);
    }
    path
}
