//! Wave-by-wave execution of the stage graph.

use std::collections::BTreeMap;
use std::fs;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use rayon::prelude::*;

use super::{PipelineError, StageContext, StageGraph};
use crate::config::PipelineConfig;
use crate::core::{BuildMode, is_shutdown};
use crate::logger::ProgressLine;
use crate::stage::{self, StageId, StageReport};
use crate::utils::plural_count;

/// How a planned stage ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    Done(StageReport),
    /// Fatal stage error (I/O), with its context chain.
    Failed(String),
    /// Not run because a dependency did not complete.
    Skipped,
}

/// Result of a whole run.
#[derive(Debug)]
pub struct BuildSummary {
    pub mode: BuildMode,
    pub outcomes: BTreeMap<StageId, StageOutcome>,
    pub elapsed: Duration,
}

impl BuildSummary {
    pub fn outcome(&self, id: StageId) -> Option<&StageOutcome> {
        self.outcomes.get(&id)
    }

    /// Stages that failed, in stage order.
    pub fn failed(&self) -> Vec<&'static str> {
        self.outcomes
            .iter()
            .filter(|(_, o)| matches!(o, StageOutcome::Failed(_)))
            .map(|(id, _)| id.name())
            .collect()
    }

    /// `production build finished in 1.50s, 1 file failed`
    pub fn headline(&self) -> String {
        let mut line = format!("{} build finished in {:.2?}", self.mode.as_str(), self.elapsed);
        let failures = self.transform_failures();
        if failures > 0 {
            line.push_str(&format!(", {} failed", plural_count(failures, "file")));
        }
        line
    }

    /// Non-fatal transformation failures across all stages.
    pub fn transform_failures(&self) -> usize {
        self.outcomes
            .values()
            .map(|o| match o {
                StageOutcome::Done(report) => report.failed,
                _ => 0,
            })
            .sum()
    }
}

/// Run the pipeline once, starting from a clean destination tree.
///
/// Returns [`PipelineError::StagesFailed`] when any stage failed; output of
/// the stages that completed stays on disk.
pub fn run(config: &PipelineConfig, mode: BuildMode) -> Result<BuildSummary> {
    let summary = execute(config, mode)?;
    let failed = summary.failed();
    if !failed.is_empty() {
        return Err(PipelineError::StagesFailed(failed).into());
    }
    Ok(summary)
}

/// Run every wave, recording failed stages in the summary instead of
/// returning them. The watch loop reports from the summary either way.
pub fn execute(config: &PipelineConfig, mode: BuildMode) -> Result<BuildSummary> {
    let start = Instant::now();
    let graph = StageGraph::plan(mode, config);
    let waves = graph.waves()?;
    let ctx = StageContext::new(config, mode);
    let quiet = config.build.quiet;

    let mut outcomes = BTreeMap::new();
    for wave in waves {
        if is_shutdown() {
            bail!("interrupted");
        }

        let counts: Vec<_> = wave
            .iter()
            .filter(|id| id.is_asset())
            .map(|&id| (id.name(), stage::input_count(id, config)))
            .collect();
        let progress = (!quiet && !counts.is_empty()).then(|| ProgressLine::new(&counts));

        let results: Vec<(StageId, StageOutcome)> = wave
            .par_iter()
            .map(|&id| {
                let blocked = graph
                    .dependencies(id)
                    .iter()
                    .any(|dep| !matches!(outcomes.get(dep), Some(StageOutcome::Done(_))));
                if blocked {
                    return (id, StageOutcome::Skipped);
                }
                match stage::run(id, &ctx, progress.as_ref()) {
                    Ok(report) => (id, StageOutcome::Done(report)),
                    Err(e) => (id, StageOutcome::Failed(format!("{e:#}"))),
                }
            })
            .collect();

        if let Some(progress) = progress {
            progress.finish();
        }
        for (id, outcome) in results {
            log_outcome(id, &outcome, quiet);
            outcomes.insert(id, outcome);
        }
    }

    if !config.build.keep_manifest {
        remove_manifest(config)?;
    }

    Ok(BuildSummary {
        mode,
        outcomes,
        elapsed: start.elapsed(),
    })
}

fn log_outcome(id: StageId, outcome: &StageOutcome, quiet: bool) {
    match outcome {
        StageOutcome::Done(report) => {
            if !quiet && (report.written > 0 || report.failed > 0) {
                crate::log!(id.name(); "{}", report);
            }
        }
        StageOutcome::Failed(message) => {
            crate::log!("error"; "[{}] {}", id, message);
        }
        StageOutcome::Skipped => {
            crate::log!("warning"; "{} skipped, a dependency failed", id);
        }
    }
}

fn remove_manifest(config: &PipelineConfig) -> Result<()> {
    let path = config.manifest_path();
    if path.exists() {
        fs::remove_file(&path).with_context(|| format!("failed to remove {}", path.display()))?;
        crate::debug!("manifest"; "removed {}", path.display());
    }
    Ok(())
}
