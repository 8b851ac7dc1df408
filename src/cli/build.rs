//! `stamp build`: run the pipeline once.

use anyhow::Result;

use super::BuildArgs;
use crate::config::PipelineConfig;
use crate::core::BuildMode;
use crate::log;
use crate::pipeline;

/// Build the destination tree. Fails when any stage failed.
pub fn build(config: &PipelineConfig, args: &BuildArgs) -> Result<()> {
    let mode = BuildMode::from_dev_flag(args.dev);
    let summary = pipeline::run(config, mode)?;
    log!("build"; "{}", summary.headline());
    Ok(())
}
