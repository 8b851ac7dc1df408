//! Shared validation for external tool commands and section paths.

use std::path::Path;

use crate::config::{ConfigDiagnostics, FieldPath};

/// Hint when a configured tool is not on `PATH`.
///
/// Not an error: the failure is reported per file at transform time, which
/// keeps a broken tool from blocking the rest of the build.
pub fn check_tool(command: &[String], field: FieldPath, diag: &mut ConfigDiagnostics) {
    let Some(program) = command.first() else {
        return;
    };
    if which::which(program).is_err() {
        diag.hint(field, format!("`{program}` not found on PATH"));
    }
}

/// Section directories are joined onto source/dest, so they must be relative.
pub fn check_relative(path: &Path, field: FieldPath, diag: &mut ConfigDiagnostics) {
    if path.is_absolute() {
        diag.error_with_hint(
            field,
            format!("`{}` must be a relative path", path.display()),
            "paths are resolved against `build.source` / `build.dest`",
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_tool_missing_program_is_hint() {
        let mut diag = ConfigDiagnostics::new();
        check_tool(
            &["stamp-definitely-missing-tool".to_string()],
            FieldPath::new("styles.command"),
            &mut diag,
        );
        assert!(!diag.has_errors());
        assert_eq!(diag.hints().len(), 1);
    }

    #[test]
    fn test_check_tool_empty_command() {
        let mut diag = ConfigDiagnostics::new();
        check_tool(&[], FieldPath::new("scripts.command"), &mut diag);
        assert!(diag.hints().is_empty());
    }

    #[test]
    fn test_check_relative() {
        let mut diag = ConfigDiagnostics::new();
        check_relative(Path::new("css"), FieldPath::new("styles.output"), &mut diag);
        assert!(diag.is_empty());
        check_relative(Path::new("/css"), FieldPath::new("styles.output"), &mut diag);
        assert_eq!(diag.len(), 1);
    }
}
