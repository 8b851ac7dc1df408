//! Pipeline stages.
//!
//! One module per stage. Asset stages (`styles`, `scripts`, `json`,
//! `images`) read from their source subtree, write to their dest subtree and
//! hand a partial manifest to the [`StageContext`]. Post-processing stages
//! work on the destination tree in place.
//!
//! ```text
//! clean ─┬─ styles  ─┐
//!        ├─ scripts ─┤
//!        ├─ json    ─┼─ html-copy ─ merge-manifest ─ rewrite-references
//!        └─ images  ─┘                 ─ inline-critical-css ─ minify-html ─ size-report
//! ```

mod clean;
mod critical;
mod html;
mod images;
mod json;
mod manifest;
mod report;
mod rewrite;
mod scripts;
mod styles;

use std::collections::hash_map::Entry;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::prelude::*;
use rustc_hash::FxHashMap;

use crate::config::PipelineConfig;
use crate::logger::ProgressLine;
use crate::pipeline::StageContext;
use crate::revision::Manifest;
use crate::transform::TransformError;
use crate::utils::path::to_slash;
use crate::utils::plural_count;
use crate::utils::walk::{collect_all_files, has_ext};

/// Every stage the pipeline knows, in declaration order.
///
/// The order doubles as the merge order for partial manifests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StageId {
    Clean,
    Styles,
    Scripts,
    Json,
    Images,
    HtmlCopy,
    MergeManifest,
    RewriteReferences,
    InlineCriticalCss,
    MinifyHtml,
    SizeReport,
}

impl StageId {
    pub const ASSETS: [Self; 4] = [Self::Styles, Self::Scripts, Self::Json, Self::Images];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Clean => "clean",
            Self::Styles => "styles",
            Self::Scripts => "scripts",
            Self::Json => "json",
            Self::Images => "images",
            Self::HtmlCopy => "html-copy",
            Self::MergeManifest => "merge-manifest",
            Self::RewriteReferences => "rewrite-references",
            Self::InlineCriticalCss => "inline-critical-css",
            Self::MinifyHtml => "minify-html",
            Self::SizeReport => "size-report",
        }
    }

    pub const fn is_asset(self) -> bool {
        matches!(self, Self::Styles | Self::Scripts | Self::Json | Self::Images)
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a finished stage did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageReport {
    /// Files written or modified.
    pub written: usize,
    /// Files whose transformation failed (reported, not fatal).
    pub failed: usize,
}

impl fmt::Display for StageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", plural_count(self.written, "file"))?;
        if self.failed > 0 {
            write!(f, ", {} failed", self.failed)?;
        }
        Ok(())
    }
}

/// Run one stage.
pub fn run(id: StageId, ctx: &StageContext, progress: Option<&ProgressLine>) -> Result<StageReport> {
    match id {
        StageId::Clean => clean::run(ctx),
        StageId::Styles => styles::run(ctx, progress),
        StageId::Scripts => scripts::run(ctx, progress),
        StageId::Json => json::run(ctx, progress),
        StageId::Images => images::run(ctx, progress),
        StageId::HtmlCopy => html::copy(ctx),
        StageId::MergeManifest => manifest::merge(ctx),
        StageId::RewriteReferences => rewrite::run(ctx),
        StageId::InlineCriticalCss => critical::run(ctx),
        StageId::MinifyHtml => html::minify(ctx),
        StageId::SizeReport => report::run(ctx),
    }
}

/// Number of input files of an asset stage, for the progress line.
pub fn input_count(id: StageId, config: &PipelineConfig) -> usize {
    match id {
        StageId::Styles => styles::inputs(config).len(),
        StageId::Scripts => scripts::inputs(config).len(),
        StageId::Json => json::inputs(config).len(),
        StageId::Images => images::inputs(config).len(),
        _ => 0,
    }
}

// ============================================================================
// Shared helpers
// ============================================================================

/// Result of processing one input file.
enum FileOutcome {
    Written,
    Failed(TransformError),
}

impl From<TransformError> for FileOutcome {
    fn from(err: TransformError) -> Self {
        Self::Failed(err)
    }
}

/// Process input files in parallel and contribute the stage's partial manifest.
///
/// `key_of` maps an input to its manifest key. Keys are claimed in input
/// order before any work starts; a later input mapping to a claimed key is
/// reported as failed and never processed.
///
/// `process` returns `Err` for I/O failures (fatal for the stage) and
/// [`FileOutcome::Failed`] for transformation failures (reported).
fn process_files<K, F>(
    ctx: &StageContext,
    id: StageId,
    files: &[PathBuf],
    progress: Option<&ProgressLine>,
    key_of: K,
    process: F,
) -> Result<StageReport>
where
    K: Fn(&Path) -> Result<String>,
    F: Fn(&Path, &str, &mut Manifest) -> Result<FileOutcome> + Sync,
{
    let (claimed, duplicates) = claim_keys(id, files, key_of)?;

    let outcomes = claimed
        .par_iter()
        .map(|(path, key)| {
            let mut manifest = Manifest::new();
            let outcome = process(path, key, &mut manifest);
            if let Some(progress) = progress {
                progress.inc(id.name());
            }
            outcome.map(|outcome| (outcome, manifest))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut report = StageReport::default();
    for err in duplicates {
        if let Some(progress) = progress {
            progress.inc(id.name());
        }
        err.report(id.name());
        report.failed += 1;
    }

    let mut partial = Manifest::new();
    for (outcome, manifest) in outcomes {
        match outcome {
            FileOutcome::Written => report.written += 1,
            FileOutcome::Failed(err) => {
                err.report(id.name());
                report.failed += 1;
            }
        }
        for collision in partial.merge(&manifest) {
            crate::log!(
                "warning";
                "[{}] `{}` revisioned twice, {} replaces {}",
                id, collision.original, collision.incoming, collision.previous
            );
        }
    }

    ctx.contribute(id, partial);
    Ok(report)
}

/// Assign each input its manifest key, first come first served.
fn claim_keys<'f, K>(
    id: StageId,
    files: &'f [PathBuf],
    key_of: K,
) -> Result<(Vec<(&'f Path, String)>, Vec<TransformError>)>
where
    K: Fn(&Path) -> Result<String>,
{
    let mut owners: FxHashMap<String, &Path> = FxHashMap::default();
    let mut claimed = Vec::with_capacity(files.len());
    let mut duplicates = Vec::new();

    for path in files {
        let key = key_of(path)?;
        match owners.entry(key) {
            Entry::Occupied(owner) => duplicates.push(TransformError::new(
                path,
                id.name(),
                format!("output `{}` is already produced by {}", owner.key(), owner.get().display()),
            )),
            Entry::Vacant(slot) => {
                claimed.push((path.as_path(), slot.key().clone()));
                slot.insert(path);
            }
        }
    }
    Ok((claimed, duplicates))
}

/// Files under `dir` (optionally filtered by extension), excluding the
/// destination tree when it lives inside the source tree.
fn source_files(config: &PipelineConfig, dir: &Path, exts: Option<&[&str]>) -> Vec<PathBuf> {
    let dest = config.dest_dir();
    collect_all_files(dir)
        .into_iter()
        .filter(|p| !p.starts_with(dest))
        .filter(|p| exts.is_none_or(|exts| has_ext(p, exts)))
        .collect()
}

/// Manifest key of an output: `<output>/<rel>` with `/` separators.
fn output_key(output: &Path, rel: &Path) -> String {
    to_slash(&output.join(rel))
}

/// Path of `path` relative to the stage's source directory.
fn relative_to<'p>(path: &'p Path, dir: &Path) -> Result<&'p Path> {
    path.strip_prefix(dir)
        .with_context(|| format!("{} is outside {}", path.display(), dir.display()))
}

/// Remove whatever a failed tool left at `out`.
fn discard_partial_output(out: &Path) -> Result<()> {
    match fs::remove_file(out) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
            Err(e).with_context(|| format!("failed to remove {}", out.display()))
        }
        _ => Ok(()),
    }
}

/// Create the parent directory of `path`.
fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order_and_names() {
        assert!(StageId::Clean < StageId::Styles);
        assert!(StageId::Images < StageId::MergeManifest);
        assert_eq!(StageId::RewriteReferences.to_string(), "rewrite-references");
        assert!(StageId::ASSETS.iter().all(|s| s.is_asset()));
        assert!(!StageId::HtmlCopy.is_asset());
    }

    #[test]
    fn test_output_key() {
        assert_eq!(
            output_key(Path::new("css"), Path::new("pages/home.css")),
            "css/pages/home.css"
        );
        assert_eq!(output_key(Path::new(""), Path::new("app.js")), "app.js");
    }

    #[test]
    fn test_claim_keys_reports_shared_output() {
        let files = vec![
            PathBuf::from("src/scss/main.css"),
            PathBuf::from("src/scss/main.scss"),
            PathBuf::from("src/scss/print.scss"),
        ];
        let key_of = |path: &Path| -> Result<String> {
            let rel = relative_to(path, Path::new("src/scss"))?.with_extension("css");
            Ok(output_key(Path::new("css"), &rel))
        };

        let (claimed, duplicates) = claim_keys(StageId::Styles, &files, key_of).unwrap();
        let keys: Vec<_> = claimed.iter().map(|(_, k)| k.as_str()).collect();
        assert_eq!(keys, vec!["css/main.css", "css/print.css"]);
        assert_eq!(claimed[0].0, Path::new("src/scss/main.css"));

        assert_eq!(duplicates.len(), 1);
        assert_eq!(duplicates[0].path, PathBuf::from("src/scss/main.scss"));
        assert!(duplicates[0].message.contains("css/main.css"));
    }

    #[test]
    fn test_stage_report_display() {
        let report = StageReport {
            written: 3,
            failed: 1,
        };
        assert_eq!(report.to_string(), "3 files, 1 failed");
        assert_eq!(StageReport::default().to_string(), "0 files");
    }
}
