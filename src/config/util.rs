//! Configuration utility functions.

use std::path::{Path, PathBuf};

/// Find config file by searching upward from current directory
///
/// Starts from cwd and walks up parent directories until finding `config_name`
/// Returns the absolute path to the config file if found
///
/// # Example
/// ```text
/// /home/user/site/src/scss/  ← cwd
/// /home/user/site/stamp.toml ← found!
/// ```
pub fn find_config_file(config_name: &Path) -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_from(&cwd, config_name)
}

fn find_config_from(start: &Path, config_name: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.exists().then(|| config_name.to_path_buf());
    }

    let mut current = start;
    loop {
        let candidate = current.join(config_name);
        if candidate.exists() {
            return Some(candidate);
        }

        match current.parent() {
            Some(parent) => current = parent,
            None => return None, // Reached filesystem root
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_find_config_walks_up() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("src/scss/partials");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("stamp.toml"), "").unwrap();

        let found = find_config_from(&nested, Path::new("stamp.toml")).unwrap();
        assert_eq!(found, dir.path().join("stamp.toml"));
    }

    #[test]
    fn test_find_config_absolute_missing() {
        assert!(find_config_from(Path::new("/"), Path::new("/nonexistent/stamp.toml")).is_none());
    }
}
