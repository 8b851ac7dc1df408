//! External tool execution.
//!
//! Tools are configured as argument vectors whose elements may reference
//! `$STAMP_*` variables:
//!
//! ```toml
//! command = ["sass", "$STAMP_INPUT", "$STAMP_OUTPUT"]
//! ```
//!
//! The same variables are exported to the child environment.
//!
//! ```ignore
//! let vars = ToolVars::new(config, mode).with_io(&input, &output);
//! Tool::new("sass", &config.styles.command)
//!     .mode_args(&config.styles.dev_args, &config.styles.build_args, mode)
//!     .source_map_args(&config.styles.source_map_args, &config.styles.no_source_map_args, mode)
//!     .run(&vars, config.get_root(), &input)?;
//! ```

use std::{
    ffi::{OsStr, OsString},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    process::{Command, Output, Stdio},
};

use anyhow::{Context, Result, bail};
use rustc_hash::FxHashMap;

use super::TransformError;
use crate::config::PipelineConfig;
use crate::core::BuildMode;

// ============================================================================
// Variables
// ============================================================================

pub const VAR_INPUT: &str = "STAMP_INPUT";
pub const VAR_OUTPUT: &str = "STAMP_OUTPUT";
pub const VAR_SOURCE_DIR: &str = "STAMP_SOURCE_DIR";
pub const VAR_DEST_DIR: &str = "STAMP_DEST_DIR";
pub const VAR_MODE: &str = "STAMP_MODE";
pub const VAR_STYLESHEET: &str = "STAMP_STYLESHEET";
pub const VAR_SOURCE_MAPS: &str = "STAMP_SOURCE_MAPS";

/// `$STAMP_*` values for one tool invocation.
#[derive(Debug, Clone, Default)]
pub struct ToolVars {
    vars: FxHashMap<&'static str, String>,
}

impl ToolVars {
    /// Build-wide variables: source/dest directories, mode, and whether
    /// the mode wants source maps (`"true"` / `"false"`).
    pub fn new(config: &PipelineConfig, mode: BuildMode) -> Self {
        Self::default()
            .set(VAR_SOURCE_DIR, config.source_dir().display().to_string())
            .set(VAR_DEST_DIR, config.dest_dir().display().to_string())
            .set(VAR_MODE, mode.as_str())
            .set(VAR_SOURCE_MAPS, mode.source_maps.to_string())
    }

    /// Copy with per-file input/output paths.
    pub fn with_io(&self, input: &Path, output: &Path) -> Self {
        self.clone()
            .set(VAR_INPUT, input.display().to_string())
            .set(VAR_OUTPUT, output.display().to_string())
    }

    pub fn set(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.vars.insert(key, value.into());
        self
    }

    /// Substitute `$STAMP_*` occurrences in each argument.
    pub fn resolve(&self, args: &[String]) -> Vec<String> {
        args.iter()
            .map(|arg| {
                let mut result = arg.clone();
                for (key, value) in &self.vars {
                    result = result.replace(&format!("${key}"), value);
                }
                result
            })
            .collect()
    }

    fn envs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

// ============================================================================
// Tool
// ============================================================================

/// A configured external tool.
pub struct Tool<'a> {
    label: &'a str,
    command: &'a [String],
    extra: &'a [String],
    maps: &'a [String],
}

impl<'a> Tool<'a> {
    /// `label` names the tool in error reports when the command is empty.
    pub fn new(label: &'a str, command: &'a [String]) -> Self {
        Self {
            label,
            command,
            extra: &[],
            maps: &[],
        }
    }

    /// Append `dev_args` or `build_args` depending on the build mode.
    pub fn mode_args(mut self, dev: &'a [String], build: &'a [String], mode: BuildMode) -> Self {
        self.extra = if mode.is_dev() { dev } else { build };
        self
    }

    /// Append `on` when the mode asks for source maps, `off` otherwise.
    pub fn source_map_args(mut self, on: &'a [String], off: &'a [String], mode: BuildMode) -> Self {
        self.maps = if mode.source_maps { on } else { off };
        self
    }

    pub fn is_configured(&self) -> bool {
        !self.command.is_empty()
    }

    /// Program name, or the label when no command is configured.
    pub fn name(&self) -> &str {
        self.command.first().map_or(self.label, String::as_str)
    }

    /// Resolved argument vector (program first).
    pub fn argv(&self, vars: &ToolVars) -> Vec<String> {
        let mut argv = vars.resolve(self.command);
        argv.extend(vars.resolve(self.extra));
        argv.extend(vars.resolve(self.maps));
        argv
    }

    /// Run against `path` (the asset being transformed, for reporting).
    pub fn run(&self, vars: &ToolVars, cwd: &Path, path: &Path) -> Result<Output, TransformError> {
        self.run_inner(vars, cwd, path, None)
    }

    /// Run with `stdin` piped to the tool.
    pub fn run_with_stdin(
        &self,
        vars: &ToolVars,
        cwd: &Path,
        path: &Path,
        stdin: &[u8],
    ) -> Result<Output, TransformError> {
        self.run_inner(vars, cwd, path, Some(stdin))
    }

    fn run_inner(
        &self,
        vars: &ToolVars,
        cwd: &Path,
        path: &Path,
        stdin: Option<&[u8]>,
    ) -> Result<Output, TransformError> {
        let argv = self.argv(vars);
        let Some(program) = argv.first() else {
            return Err(TransformError::new(path, self.label, "no command configured"));
        };
        if which::which(program).is_err() {
            return Err(TransformError::new(path, self.name(), "not found on PATH"));
        }

        let mut cmd = Cmd::from_slice(&argv).cwd(cwd).envs(vars.envs());
        if let Some(data) = stdin {
            cmd = cmd.stdin(data);
        }
        crate::debug!("exec"; "{}", argv.join(" "));
        cmd.run()
            .map_err(|e| TransformError::new(path, self.name(), format!("{e:#}")))
    }
}

// ============================================================================
// Builder API
// ============================================================================

/// Command builder for external process execution.
#[derive(Default)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    envs: Vec<(String, String)>,
    stdin_data: Option<Vec<u8>>,
}

impl Cmd {
    /// Create from a command array (e.g., `["sass"]` or `["npx", "esbuild"]`).
    pub fn from_slice<S: AsRef<OsStr>>(cmd: &[S]) -> Self {
        let mut iter = cmd.iter();
        let program = iter
            .next()
            .map(|s| s.as_ref().to_owned())
            .unwrap_or_default();
        let args: Vec<_> = iter.map(|s| s.as_ref().to_owned()).collect();
        Self {
            program,
            args,
            ..Default::default()
        }
    }

    pub fn cwd<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.cwd = Some(dir.as_ref().to_owned());
        self
    }

    /// Set environment variables for the subprocess.
    pub fn envs<K, V, I>(mut self, vars: I) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
        I: IntoIterator<Item = (K, V)>,
    {
        for (k, v) in vars {
            self.envs.push((k.as_ref().to_owned(), v.as_ref().to_owned()));
        }
        self
    }

    /// Set stdin data to pipe to the process.
    pub fn stdin<D: AsRef<[u8]>>(mut self, data: D) -> Self {
        self.stdin_data = Some(data.as_ref().to_vec());
        self
    }

    /// Execute the command and return output. A non-zero exit is an error.
    pub fn run(self) -> Result<Output> {
        let name = self.program.to_string_lossy().to_string();
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .envs(self.envs.iter().cloned())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(if self.stdin_data.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            });

        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }

        let mut child = cmd
            .spawn()
            .with_context(|| format!("Failed to spawn `{name}`"))?;

        // Stdin is written from its own thread while stdout is drained here.
        let stdin = child.stdin.take();
        let output: Output = std::thread::scope(|s| {
            let writer = match (stdin, self.stdin_data.as_deref()) {
                (Some(mut pipe), Some(data)) => Some(s.spawn(move || pipe.write_all(data))),
                _ => None,
            };
            let output = child
                .wait_with_output()
                .with_context(|| format!("Failed to wait for `{name}`"));
            if let Some(writer) = writer {
                match writer.join() {
                    Ok(Err(e)) if e.kind() != ErrorKind::BrokenPipe => {
                        return Err(e).with_context(|| format!("Failed to write stdin to `{name}`"));
                    }
                    Err(_) => bail!("stdin writer for `{name}` panicked"),
                    _ => {}
                }
            }
            output
        })?;

        if !output.status.success() {
            bail!(format_error(&name, &output));
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        if !stderr.is_empty() {
            crate::debug!("exec"; "{}: {}", name, stderr);
        }
        Ok(output)
    }
}

/// Format error message for failed command.
fn format_error(name: &str, output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);

    let mut msg = format!("`{name}` exited with {}", output.status);
    let stderr = stderr.trim();
    if !stderr.is_empty() {
        msg.push('\n');
        msg.push_str(stderr);
    }
    let stdout = stdout.trim();
    if !stdout.is_empty() && stderr.is_empty() {
        msg.push('\n');
        msg.push_str(stdout);
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_resolve_vars() {
        let vars = ToolVars::default()
            .set(VAR_MODE, "production")
            .with_io(Path::new("/src/scss/main.scss"), Path::new("/dist/css/main.css"));
        let resolved = vars.resolve(&strings(&[
            "sass",
            "$STAMP_INPUT",
            "--out=$STAMP_OUTPUT",
            "$STAMP_MODE",
            "$UNKNOWN",
        ]));
        assert_eq!(
            resolved,
            strings(&[
                "sass",
                "/src/scss/main.scss",
                "--out=/dist/css/main.css",
                "production",
                "$UNKNOWN",
            ])
        );
    }

    #[test]
    fn test_mode_args_appended() {
        let command = strings(&["sass", "$STAMP_INPUT"]);
        let dev = strings(&["--quiet"]);
        let build = strings(&["--style=compressed"]);
        let vars = ToolVars::default().with_io(Path::new("a.scss"), Path::new("a.css"));

        let tool = Tool::new("styles", &command).mode_args(&dev, &build, BuildMode::DEVELOPMENT);
        assert_eq!(tool.argv(&vars), strings(&["sass", "a.scss", "--quiet"]));

        let tool = Tool::new("styles", &command).mode_args(&dev, &build, BuildMode::PRODUCTION);
        assert_eq!(tool.argv(&vars), strings(&["sass", "a.scss", "--style=compressed"]));
    }

    #[test]
    fn test_empty_command_is_transform_error() {
        let tool = Tool::new("scripts", &[]);
        assert!(!tool.is_configured());
        let err = tool
            .run(&ToolVars::default(), Path::new("."), Path::new("js/app.js"))
            .unwrap_err();
        assert_eq!(err.tool, "scripts");
    }

    #[test]
    fn test_missing_program_is_transform_error() {
        let command = strings(&["stamp-definitely-missing-tool"]);
        let err = Tool::new("styles", &command)
            .run(&ToolVars::default(), Path::new("."), Path::new("a.scss"))
            .unwrap_err();
        assert_eq!(err.tool, "stamp-definitely-missing-tool");
        assert!(err.message.contains("PATH"));
    }

    #[cfg(unix)]
    #[test]
    fn test_env_exported_and_stdin_piped() {
        let command = strings(&["sh", "-c", "printf %s \"$STAMP_MODE\"; cat"]);
        let vars = ToolVars::default().set(VAR_MODE, "development");
        let output = Tool::new("critical", &command)
            .run_with_stdin(&vars, Path::new("."), Path::new("index.html"), b"-piped")
            .unwrap();
        assert_eq!(output.stdout, b"development-piped");
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_is_transform_error() {
        let command = strings(&["sh", "-c", "echo broken >&2; exit 3"]);
        let err = Tool::new("styles", &command)
            .run(&ToolVars::default(), Path::new("."), Path::new("a.scss"))
            .unwrap_err();
        assert_eq!(err.tool, "sh");
        assert!(err.message.contains("broken"));
    }

    #[cfg(unix)]
    #[test]
    fn test_large_stdin_streams_through_filter() {
        let command = strings(&["cat"]);
        let page = vec![b'x'; 1 << 20];
        let output = Tool::new("critical", &command)
            .run_with_stdin(&ToolVars::default(), Path::new("."), Path::new("index.html"), &page)
            .unwrap();
        assert_eq!(output.stdout.len(), page.len());
    }

    #[cfg(unix)]
    #[test]
    fn test_source_maps_flag_exported() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = crate::config::test_config_at(dir.path(), "");
        let command = strings(&["sh", "-c", "printf %s \"$STAMP_SOURCE_MAPS\""]);

        let vars = ToolVars::new(&config, BuildMode::PRODUCTION);
        let output = Tool::new("styles", &command)
            .run(&vars, dir.path(), Path::new("a.scss"))
            .unwrap();
        assert_eq!(output.stdout, b"true");

        let vars = ToolVars::new(&config, BuildMode::DEVELOPMENT);
        assert_eq!(vars.resolve(&strings(&["$STAMP_SOURCE_MAPS"])), strings(&["false"]));
    }

    #[test]
    fn test_source_map_args_follow_mode() {
        let command = strings(&["sass", "$STAMP_INPUT"]);
        let on = strings(&["--embed-source-map"]);
        let off = strings(&["--no-source-map"]);
        let vars = ToolVars::default().with_io(Path::new("a.scss"), Path::new("a.css"));

        // Empty dev_args still get the mode's source-map choice
        let tool = Tool::new("styles", &command)
            .mode_args(&[], &[], BuildMode::DEVELOPMENT)
            .source_map_args(&on, &off, BuildMode::DEVELOPMENT);
        assert_eq!(tool.argv(&vars), strings(&["sass", "a.scss", "--no-source-map"]));

        let tool = Tool::new("styles", &command).source_map_args(&on, &off, BuildMode::PRODUCTION);
        assert_eq!(tool.argv(&vars), strings(&["sass", "a.scss", "--embed-source-map"]));
    }
}
