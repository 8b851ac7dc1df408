//! Images: copy, optimize and revision in production.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::{FileOutcome, StageId, StageReport, ensure_parent, output_key, process_files, relative_to, source_files};
use crate::config::PipelineConfig;
use crate::logger::ProgressLine;
use crate::pipeline::StageContext;
use crate::transform::TransformError;
use crate::transform::exec::Tool;
use crate::transform::image::optimize_png;
use crate::utils::path::from_slash;
use crate::utils::walk::has_ext;

fn source_dir(config: &PipelineConfig) -> PathBuf {
    config.source_dir().join(&config.images.dir)
}

pub fn inputs(config: &PipelineConfig) -> Vec<PathBuf> {
    source_files(config, &source_dir(config), None)
}

pub fn run(ctx: &StageContext, progress: Option<&ProgressLine>) -> Result<StageReport> {
    let section = &ctx.config.images;
    let src = source_dir(ctx.config);
    let revisioner = ctx.revisioner(section.revision);
    let tool = Tool::new("images", &section.command);
    let optimize = ctx.mode.optimize_images && section.optimize;

    let key_of =
        |path: &Path| -> Result<String> { Ok(output_key(&section.output, relative_to(path, &src)?)) };

    process_files(ctx, StageId::Images, &inputs(ctx.config), progress, key_of, |path, key, manifest| {
        let out = from_slash(ctx.config.dest_dir(), key);
        let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;

        let mut outcome = FileOutcome::Written;
        let bytes = if !optimize {
            bytes
        } else if tool.is_configured() {
            // The optimizer works on the copy in place or writes $STAMP_OUTPUT
            ensure_parent(&out)?;
            fs::write(&out, &bytes).with_context(|| format!("failed to write {}", out.display()))?;
            match tool.run(&ctx.vars.with_io(path, &out), ctx.config.get_root(), path) {
                Ok(_) => fs::read(&out).with_context(|| format!("failed to read {}", out.display()))?,
                Err(err) => {
                    outcome = err.into();
                    bytes
                }
            }
        } else if has_ext(path, &["png"]) {
            match optimize_png(&bytes) {
                Ok(Some(smaller)) => smaller,
                Ok(None) => bytes,
                Err(e) => {
                    outcome = TransformError::new(path, "png", e.to_string()).into();
                    bytes
                }
            }
        } else {
            bytes
        };

        revisioner.emit(key, &bytes, manifest)?;
        Ok(outcome)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config_at;
    use crate::core::BuildMode;
    use tempfile::TempDir;

    #[test]
    fn test_images_revisioned_exactly_one_name() {
        let dir = TempDir::new().unwrap();
        let img = dir.path().join("src/img/icons");
        fs::create_dir_all(&img).unwrap();
        fs::write(img.join("logo.svg"), "<svg/>").unwrap();
        let config = test_config_at(dir.path(), "");

        let ctx = StageContext::new(&config, BuildMode::PRODUCTION);
        run(&ctx, None).unwrap();

        let partials = ctx.take_partials();
        let revisioned = partials[0].1.get("img/icons/logo.svg").unwrap().to_string();
        assert!(config.dest_dir().join(&revisioned).exists());
        assert!(!config.dest_dir().join("img/icons/logo.svg").exists());
    }

    #[test]
    fn test_corrupt_png_reported_and_copied() {
        let dir = TempDir::new().unwrap();
        let img = dir.path().join("src/img");
        fs::create_dir_all(&img).unwrap();
        fs::write(img.join("bad.png"), "not a png").unwrap();
        let config = test_config_at(dir.path(), "[images]\nrevision = false");

        let ctx = StageContext::new(&config, BuildMode::PRODUCTION);
        let report = run(&ctx, None).unwrap();

        assert_eq!(report, StageReport { written: 0, failed: 1 });
        assert_eq!(
            fs::read(config.dest_dir().join("img/bad.png")).unwrap(),
            b"not a png"
        );
    }
}
