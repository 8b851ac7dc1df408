//! `merge-manifest`: the join point of the asset stages.
//!
//! Partial manifests are merged in stage order and persisted once. This is
//! the only writer of the manifest file.

use anyhow::Result;

use super::StageReport;
use crate::pipeline::StageContext;
use crate::revision::Manifest;

pub fn merge(ctx: &StageContext) -> Result<StageReport> {
    let mut merged = Manifest::new();
    for (stage, partial) in ctx.take_partials() {
        for collision in merged.merge(&partial) {
            crate::log!(
                "warning";
                "`{}` revisioned by more than one stage, {} replaces {}",
                collision.original, collision.incoming, collision.previous
            );
            crate::debug!("manifest"; "last write from {}", stage);
        }
    }

    let path = ctx.config.manifest_path();
    merged.persist(&path)?;
    ctx.set_revisioned(merged.len());
    crate::debug!("manifest"; "{} entries written to {}", merged.len(), path.display());

    Ok(StageReport {
        written: merged.len(),
        failed: 0,
    })
}
