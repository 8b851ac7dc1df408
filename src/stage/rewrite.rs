//! `rewrite-references`: swap original asset paths for revisioned ones.

use anyhow::Result;

use super::StageReport;
use crate::pipeline::StageContext;
use crate::revision::{Manifest, Rewriter};
use crate::utils::walk::collect_files_with_ext;

pub fn run(ctx: &StageContext) -> Result<StageReport> {
    let manifest_path = ctx.config.manifest_path();
    let manifest = Manifest::load(&manifest_path)?;
    let rewriter = Rewriter::new(&manifest)?;

    // The manifest's own keys must survive even when `json` is listed
    let files: Vec<_> = collect_files_with_ext(
        ctx.config.dest_dir(),
        &ctx.config.rewrite.extension_refs(),
    )
    .into_iter()
    .filter(|p| *p != manifest_path)
    .collect();

    let stats = rewriter.rewrite_files(&files)?;
    crate::debug!("rewrite"; "{} of {} files changed", stats.rewritten, stats.scanned);

    Ok(StageReport {
        written: stats.rewritten,
        failed: 0,
    })
}
