//! Pipeline configuration management for `stamp.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── build      # [build]
//! │   ├── styles     # [styles]
//! │   ├── scripts    # [scripts]
//! │   ├── json       # [json]
//! │   ├── images     # [images]
//! │   ├── html       # [html], [critical]
//! │   └── output     # [rewrite], [report]
//! ├── types/         # ConfigError, ConfigDiagnostics, FieldPath
//! ├── util.rs        # Config file lookup
//! └── mod.rs         # PipelineConfig (this file)
//! ```

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{
    BuildConfig, CriticalConfig, HtmlConfig, ImagesConfig, JsonConfig, ReportConfig,
    RewriteConfig, ScriptsConfig, StylesConfig,
};
pub use types::{ConfigDiagnostics, ConfigError, FieldPath};

use crate::cli::{Cli, Commands};
use crate::log;
use crate::utils::path::{normalize_path, resolve_under};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing stamp.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory, parent of the config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    pub build: BuildConfig,
    pub styles: StylesConfig,
    pub scripts: ScriptsConfig,
    pub json: JsonConfig,
    pub images: ImagesConfig,
    pub html: HtmlConfig,
    pub critical: CriticalConfig,
    pub rewrite: RewriteConfig,
    pub report: ReportConfig,
}

impl PipelineConfig {
    /// Load configuration from CLI arguments.
    ///
    /// Searches upward from cwd for the config file. Without one, defaults
    /// apply and cwd is the project root.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let (mut config, config_path) = match find_config_file(&cli.config) {
            Some(path) => (Self::from_path(&path)?, path),
            None => {
                crate::debug!("config"; "{} not found, using defaults", cli.config.display());
                (Self::default(), cwd.join(&cli.config))
            }
        };

        // Relative section paths must be checked before they are joined
        config.validate_paths()?;

        let root = config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or(cwd);
        config.config_path = normalize_path(&config_path);
        config.apply_cli(cli);
        config.normalize_paths(&root);
        config.validate()?;

        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)
            .with_context(|| format!("failed to parse {}", path.display()))?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    // ========================================================================
    // resolved paths
    // ========================================================================

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        &self.root
    }

    /// Absolute source tree.
    pub fn source_dir(&self) -> &Path {
        &self.build.source
    }

    /// Absolute destination tree.
    pub fn dest_dir(&self) -> &Path {
        &self.build.dest
    }

    /// Absolute path of the persisted manifest.
    pub fn manifest_path(&self) -> PathBuf {
        self.build.dest.join(&self.build.manifest)
    }

    /// Get path relative to the project root, for display.
    pub fn root_relative(&self, path: impl AsRef<Path>) -> PathBuf {
        path.as_ref()
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.as_ref().to_path_buf())
    }

    /// Source directories owned by asset stages (skipped by html-copy).
    pub fn asset_source_dirs(&self) -> [PathBuf; 4] {
        [
            self.build.source.join(&self.styles.dir),
            self.build.source.join(&self.scripts.dir),
            self.build.source.join(&self.json.dir),
            self.build.source.join(&self.images.dir),
        ]
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply CLI overrides on top of file values.
    fn apply_cli(&mut self, cli: &Cli) {
        crate::logger::set_verbose(cli.verbose());

        Self::update_option(&mut self.build.source, cli.source.as_ref());
        Self::update_option(&mut self.build.dest, cli.dest.as_ref());

        if let Commands::Build { build_args } = &cli.command {
            Self::update_option(&mut self.build.keep_manifest, build_args.keep_manifest.as_ref());
            self.build.quiet = build_args.quiet;
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // path normalization
    // ========================================================================

    /// Resolve source and dest against the project root.
    fn normalize_paths(&mut self, root: &Path) {
        let root = normalize_path(root);
        self.build.source = resolve_under(&self.build.source, &root);
        self.build.dest = resolve_under(&self.build.dest, &root);
        self.root = root;
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Pre-validate section paths before normalization.
    ///
    /// Once joined onto source/dest an absolute section path can no longer
    /// be told apart from a relative one.
    fn validate_paths(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        self.styles.validate(&mut diag);
        self.scripts.validate(&mut diag);
        self.json.validate(&mut diag);
        self.images.validate(&mut diag);
        self.html.validate(&mut diag);
        self.critical.validate(&mut diag);
        self.rewrite.validate(&mut diag);

        diag.print_hints();
        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }

    /// Validate the normalized configuration.
    pub fn validate(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();
        self.build.validate(&mut diag);

        diag.print_hints();
        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse a config snippet.
/// Panics if there are unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(extra: &str) -> PipelineConfig {
    let (parsed, ignored) = PipelineConfig::parse_with_ignored(extra).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

/// A config rooted at `root` with absolute source/dest, as `load` produces.
#[cfg(test)]
pub fn test_config_at(root: &Path, extra: &str) -> PipelineConfig {
    let mut config = test_parse_config(extra);
    config.config_path = normalize_path(root).join("stamp.toml");
    config.normalize_paths(root);
    config
}

// ============================================================================
// tests
// ============================================================================
