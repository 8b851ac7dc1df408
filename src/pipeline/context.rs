//! State shared by the stages of one run.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::config::PipelineConfig;
use crate::core::BuildMode;
use crate::revision::{Manifest, Revisioner};
use crate::stage::StageId;
use crate::transform::exec::ToolVars;

/// Everything a stage reads, plus the partial manifests it hands back.
///
/// Asset stages run concurrently; each contributes one partial manifest for
/// its own subtree. The merge stage takes them all at the join point.
pub struct StageContext<'a> {
    pub config: &'a PipelineConfig,
    pub mode: BuildMode,
    /// Build-wide `$STAMP_*` tool variables.
    pub vars: ToolVars,
    partials: Mutex<Vec<(StageId, Manifest)>>,
    revisioned: AtomicUsize,
}

impl<'a> StageContext<'a> {
    pub fn new(config: &'a PipelineConfig, mode: BuildMode) -> Self {
        Self {
            config,
            mode,
            vars: ToolVars::new(config, mode),
            partials: Mutex::new(Vec::new()),
            revisioned: AtomicUsize::new(0),
        }
    }

    /// Revisioner for a section; active only in revisioning modes.
    pub fn revisioner(&self, section_revision: bool) -> Revisioner {
        Revisioner::new(self.config.dest_dir(), self.mode.revision && section_revision)
    }

    /// Hand over a stage's partial manifest. Empty manifests are dropped.
    pub fn contribute(&self, stage: StageId, manifest: Manifest) {
        if !manifest.is_empty() {
            self.partials.lock().push((stage, manifest));
        }
    }

    /// Take all partial manifests, in stage order.
    pub fn take_partials(&self) -> Vec<(StageId, Manifest)> {
        let mut partials = std::mem::take(&mut *self.partials.lock());
        partials.sort_by_key(|(stage, _)| *stage);
        partials
    }

    pub fn set_revisioned(&self, count: usize) {
        self.revisioned.store(count, Ordering::Relaxed);
    }

    /// Number of entries in the merged manifest.
    pub fn revisioned(&self) -> usize {
        self.revisioned.load(Ordering::Relaxed)
    }
}
