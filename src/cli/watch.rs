//! `stamp watch`: development build, then rebuild on every change.
//!
//! ```text
//! notify ──▶ channel ──▶ Debouncer (300ms quiet) ──▶ reload stamp.toml? ──▶ pipeline::run
//! ```
//!
//! Every rebuild is a full run starting at `clean`.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossbeam::channel::{self, RecvTimeoutError};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use rustc_hash::FxHashSet;

use super::Cli;
use crate::config::PipelineConfig;
use crate::core::{BuildMode, is_shutdown, set_watching};
use crate::log;
use crate::logger::{status_build, status_error};
use crate::pipeline;
use crate::utils::path::normalize_path;
use crate::utils::plural_count;

const DEBOUNCE_MS: u64 = 300;
/// How often the loop wakes to check for Ctrl+C.
const POLL_MS: u64 = 100;

pub fn watch(cli: &Cli, config: PipelineConfig) -> Result<()> {
    let mut config = prepare(config);
    set_watching(true);

    let (tx, rx) = channel::unbounded();
    let mut watcher = notify::recommended_watcher(move |res| {
        let _ = tx.send(res);
    })
    .context("failed to start file watcher")?;
    attach(&mut watcher, &config)?;

    rebuild(&config, "initial build");
    log!("watch"; "watching {} (Ctrl+C to stop)", config.root_relative(config.source_dir()).display());

    let mut debouncer = Debouncer::new();
    while !is_shutdown() {
        match rx.recv_timeout(Duration::from_millis(POLL_MS)) {
            Ok(Ok(event)) => debouncer.add_event(&event, |path| is_relevant(path, &config)),
            Ok(Err(e)) => log!("watch"; "notify error: {}", e),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        let Some(changed) = debouncer.take_if_ready() else {
            continue;
        };

        if changed.contains(&config.config_path) {
            match PipelineConfig::load(cli) {
                Ok(reloaded) => {
                    detach(&mut watcher, &config);
                    config = prepare(reloaded);
                    attach(&mut watcher, &config)?;
                    log!("watch"; "config reloaded");
                }
                Err(e) => {
                    status_error("config reload failed, keeping previous", &format!("{e:#}"));
                    continue;
                }
            }
        }

        rebuild(&config, &format!("rebuilt ({} changed)", plural_count(changed.len(), "file")));
    }

    set_watching(false);
    Ok(())
}

/// Watch builds are quiet: the status line replaces per-stage logs.
fn prepare(mut config: PipelineConfig) -> PipelineConfig {
    config.build.quiet = true;
    config
}

/// Failed stages stay in the summary so the status block can name them.
fn rebuild(config: &PipelineConfig, label: &str) {
    match pipeline::execute(config, BuildMode::DEVELOPMENT) {
        Ok(summary) => status_build(label, &summary),
        Err(e) => status_error(&format!("{label} failed"), &format!("{e:#}")),
    }
}

/// The source tree, plus the config file's directory (non-recursive).
fn watch_roots(config: &PipelineConfig) -> Vec<(PathBuf, RecursiveMode)> {
    let mut roots = vec![(config.source_dir().to_path_buf(), RecursiveMode::Recursive)];
    if let Some(dir) = config.config_path.parent()
        && !dir.starts_with(config.source_dir())
    {
        roots.push((dir.to_path_buf(), RecursiveMode::NonRecursive));
    }
    roots
}

fn attach(watcher: &mut RecommendedWatcher, config: &PipelineConfig) -> Result<()> {
    for (path, mode) in watch_roots(config) {
        watcher
            .watch(&path, mode)
            .with_context(|| format!("failed to watch {}", path.display()))?;
    }
    Ok(())
}

fn detach(watcher: &mut RecommendedWatcher, config: &PipelineConfig) {
    for (path, _) in watch_roots(config) {
        if let Err(e) = watcher.unwatch(&path) {
            crate::debug!("watch"; "unwatch {}: {}", path.display(), e);
        }
    }
}

/// Source files and the config file; never the destination tree.
fn is_relevant(path: &Path, config: &PipelineConfig) -> bool {
    if path == config.config_path {
        return true;
    }
    path.starts_with(config.source_dir()) && !path.starts_with(config.dest_dir())
}

/// Collects changed paths until events stop for [`DEBOUNCE_MS`].
struct Debouncer {
    changes: FxHashSet<PathBuf>,
    last_event: Option<Instant>,
}

impl Debouncer {
    fn new() -> Self {
        Self {
            changes: FxHashSet::default(),
            last_event: None,
        }
    }

    fn add_event(&mut self, event: &notify::Event, relevant: impl Fn(&Path) -> bool) {
        match event.kind {
            EventKind::Create(_) | EventKind::Remove(_) => {}
            // mtime/chmod noise would retrigger builds forever
            EventKind::Modify(notify::event::ModifyKind::Metadata(_)) => return,
            EventKind::Modify(_) => {}
            _ => return,
        }

        for path in &event.paths {
            if is_temp_file(path) {
                continue;
            }
            let path = normalize_path(path);
            if !relevant(&path) {
                continue;
            }
            crate::debug!("watch"; "{:?} {}", event.kind, path.display());
            self.changes.insert(path);
            self.last_event = Some(Instant::now());
        }
    }

    fn is_ready(&self) -> bool {
        self.last_event
            .is_some_and(|t| t.elapsed() >= Duration::from_millis(DEBOUNCE_MS))
            && !self.changes.is_empty()
    }

    /// Changed paths, sorted, once the debounce window has passed.
    fn take_if_ready(&mut self) -> Option<Vec<PathBuf>> {
        if !self.is_ready() {
            return None;
        }
        self.last_event = None;
        let mut changes: Vec<_> = std::mem::take(&mut self.changes).into_iter().collect();
        changes.sort();
        Some(changes)
    }
}

/// Editor swap and backup files.
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with(".#")
        || name == "4913"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config_at;
    use notify::event::{CreateKind, DataChange, MetadataKind, ModifyKind};
    use tempfile::TempDir;

    fn modify(path: &Path) -> notify::Event {
        notify::Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content)))
            .add_path(path.to_path_buf())
    }

    #[test]
    fn test_is_temp_file() {
        assert!(is_temp_file(Path::new("/src/scss/main.scss~")));
        assert!(is_temp_file(Path::new("/src/scss/.main.scss.swp")));
        assert!(is_temp_file(Path::new("/src/.#index.html")));
        assert!(is_temp_file(Path::new("/src/4913")));
        assert!(!is_temp_file(Path::new("/src/scss/main.scss")));
        assert!(!is_temp_file(Path::new("/src/.htaccess")));
    }

    #[test]
    fn test_is_relevant() {
        let dir = TempDir::new().unwrap();
        let config = test_config_at(dir.path(), "[build]\ndest = \"src/dist\"");
        let src = config.source_dir().to_path_buf();

        assert!(is_relevant(&src.join("scss/main.scss"), &config));
        assert!(is_relevant(&config.config_path, &config));
        assert!(!is_relevant(&src.join("dist/css/main.css"), &config));
        assert!(!is_relevant(&dir.path().join("README.md"), &config));
    }

    #[test]
    fn test_debouncer_waits_for_quiet_period() {
        let mut debouncer = Debouncer::new();
        debouncer.add_event(&modify(Path::new("/src/a.css")), |_| true);
        debouncer.add_event(&modify(Path::new("/src/a.css")), |_| true);
        assert!(debouncer.take_if_ready().is_none());

        debouncer.last_event = Instant::now().checked_sub(Duration::from_millis(DEBOUNCE_MS));
        assert_eq!(
            debouncer.take_if_ready(),
            Some(vec![PathBuf::from("/src/a.css")])
        );
        assert!(debouncer.take_if_ready().is_none());
    }

    #[test]
    fn test_debouncer_ignores_noise() {
        let mut debouncer = Debouncer::new();
        let metadata = notify::Event::new(EventKind::Modify(ModifyKind::Metadata(
            MetadataKind::WriteTime,
        )))
        .add_path(PathBuf::from("/src/a.css"));
        debouncer.add_event(&metadata, |_| true);
        debouncer.add_event(&modify(Path::new("/src/a.css~")), |_| true);
        debouncer.add_event(&modify(Path::new("/elsewhere/b.css")), |p| p.starts_with("/src"));
        assert!(debouncer.changes.is_empty());
        assert!(debouncer.last_event.is_none());

        let create = notify::Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/src/new.js"));
        debouncer.add_event(&create, |_| true);
        assert_eq!(debouncer.changes.len(), 1);
    }

    #[test]
    fn test_watch_roots_include_config_dir_once() {
        let dir = TempDir::new().unwrap();
        let config = test_config_at(dir.path(), "");
        let roots = watch_roots(&config);
        assert_eq!(roots.len(), 2);
        assert_eq!(roots[0].0, config.source_dir());

        // Source tree at the project root already covers the config file
        let config = test_config_at(dir.path(), "[build]\nsource = \".\"");
        assert_eq!(watch_roots(&config).len(), 1);
    }
}
