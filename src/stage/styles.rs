//! Styles: compile `.scss`/`.sass`, copy `.css`, minify and revision.
//!
//! ```text
//! src/scss/main.scss ──sass──▶ dist/css/main.css ──minify──▶ dist/css/main-<hash>.css
//! src/scss/_vars.scss          (partial, only reached through imports)
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::{
    FileOutcome, StageId, StageReport, discard_partial_output, ensure_parent, output_key, process_files,
    relative_to, source_files,
};
use crate::config::PipelineConfig;
use crate::logger::ProgressLine;
use crate::pipeline::StageContext;
use crate::transform::TransformError;
use crate::transform::exec::Tool;
use crate::transform::minify::{is_preminified, minify_css};
use crate::utils::path::from_slash;
use crate::utils::walk::{has_ext, is_partial};

const EXTENSIONS: &[&str] = &["scss", "sass", "css"];

fn source_dir(config: &PipelineConfig) -> PathBuf {
    config.source_dir().join(&config.styles.dir)
}

/// Non-partial stylesheets.
pub fn inputs(config: &PipelineConfig) -> Vec<PathBuf> {
    source_files(config, &source_dir(config), Some(EXTENSIONS))
        .into_iter()
        .filter(|p| !is_partial(p))
        .collect()
}

pub fn run(ctx: &StageContext, progress: Option<&ProgressLine>) -> Result<StageReport> {
    let section = &ctx.config.styles;
    let src = source_dir(ctx.config);
    let revisioner = ctx.revisioner(section.revision);
    let tool = Tool::new("styles", &section.command)
        .mode_args(&section.dev_args, &section.build_args, ctx.mode)
        .source_map_args(&section.source_map_args, &section.no_source_map_args, ctx.mode);

    let key_of = |path: &Path| -> Result<String> {
        let rel = relative_to(path, &src)?.with_extension("css");
        Ok(output_key(&section.output, &rel))
    };

    process_files(ctx, StageId::Styles, &inputs(ctx.config), progress, key_of, |path, key, manifest| {
        let out = from_slash(ctx.config.dest_dir(), key);

        let css = if has_ext(path, &["css"]) {
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?
        } else {
            ensure_parent(&out)?;
            let vars = ctx.vars.with_io(path, &out);
            let compiled = match tool.run(&vars, ctx.config.get_root(), path) {
                Ok(_) => fs::read_to_string(&out)
                    .map_err(|_| TransformError::new(path, tool.name(), "produced no output")),
                Err(err) => Err(err),
            };
            match compiled {
                Ok(css) => css,
                Err(err) => {
                    discard_partial_output(&out)?;
                    return Ok(err.into());
                }
            }
        };

        let css = if ctx.mode.minify && !is_preminified(&out) {
            minify(path, css)
        } else {
            css
        };

        revisioner.emit(key, css.as_bytes(), manifest)?;
        Ok(FileOutcome::Written)
    })
}

/// Minify, falling back to the input when lightningcss cannot parse it.
fn minify(path: &Path, css: String) -> String {
    match minify_css(&css) {
        Some(minified) => minified,
        None => {
            crate::log!("warning"; "[styles] cannot minify {}, keeping as-is", path.display());
            css
        }
    }
}
