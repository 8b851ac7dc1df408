//! Delete and recreate the destination tree.

use std::fs;

use anyhow::{Context, Result};

use super::StageReport;
use crate::pipeline::StageContext;

pub fn run(ctx: &StageContext) -> Result<StageReport> {
    let dest = ctx.config.dest_dir();
    if dest.exists() {
        fs::remove_dir_all(dest)
            .with_context(|| format!("failed to remove {}", dest.display()))?;
    }
    fs::create_dir_all(dest).with_context(|| format!("failed to create {}", dest.display()))?;
    Ok(StageReport::default())
}
