//! `inline-critical-css`: inline the main stylesheet into every page.

use std::borrow::Cow;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rayon::prelude::*;

use super::StageReport;
use super::html::HTML_EXTENSIONS;
use crate::pipeline::StageContext;
use crate::revision::Manifest;
use crate::transform::TransformError;
use crate::transform::critical::inline_critical;
use crate::transform::exec::{Tool, VAR_STYLESHEET};
use crate::utils::path::from_slash;
use crate::utils::walk::collect_files_with_ext;

pub fn run(ctx: &StageContext) -> Result<StageReport> {
    let section = &ctx.config.critical;
    let Some(key) = section.stylesheet.as_deref() else {
        return Ok(StageReport::default());
    };

    // Development builds have no manifest: the key is the file name
    let manifest_path = ctx.config.manifest_path();
    let manifest = if manifest_path.exists() {
        Manifest::load(&manifest_path)?
    } else {
        Manifest::new()
    };
    let stylesheet = manifest.get(key).unwrap_or(key);
    let css_path = from_slash(ctx.config.dest_dir(), stylesheet);

    let Ok(css) = fs::read_to_string(&css_path) else {
        TransformError::new(&css_path, "critical", "stylesheet not found in output").report("critical");
        return Ok(StageReport {
            written: 0,
            failed: 1,
        });
    };

    let tool = Tool::new("critical", &section.command);
    let pages = collect_files_with_ext(ctx.config.dest_dir(), HTML_EXTENSIONS);

    let outcomes = pages
        .par_iter()
        .map(|page| -> Result<Result<bool, TransformError>> {
            let html = fs::read_to_string(page)
                .with_context(|| format!("failed to read {}", page.display()))?;

            let inlined = if tool.is_configured() {
                match run_tool(ctx, &tool, page, &css_path, &html) {
                    Ok(Some(out)) => Cow::Owned(out),
                    Ok(None) => Cow::Borrowed(html.as_str()),
                    Err(err) => return Ok(Err(err)),
                }
            } else {
                inline_critical(&html, stylesheet, &css)
            };

            if let Cow::Owned(out) = inlined {
                fs::write(page, out).with_context(|| format!("failed to write {}", page.display()))?;
                return Ok(Ok(true));
            }
            Ok(Ok(false))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut report = StageReport::default();
    for outcome in outcomes {
        match outcome {
            Ok(true) => report.written += 1,
            Ok(false) => {}
            Err(err) => {
                err.report("critical");
                report.failed += 1;
            }
        }
    }
    Ok(report)
}

/// Pipe the page through the external inliner. Empty stdout keeps the page.
fn run_tool(
    ctx: &StageContext,
    tool: &Tool,
    page: &Path,
    css_path: &Path,
    html: &str,
) -> Result<Option<String>, TransformError> {
    let vars = ctx
        .vars
        .with_io(page, page)
        .set(VAR_STYLESHEET, css_path.display().to_string());
    let output = tool.run_with_stdin(&vars, ctx.config.get_root(), page, html.as_bytes())?;
    let stdout = String::from_utf8(output.stdout)
        .map_err(|_| TransformError::new(page, tool.name(), "output is not UTF-8"))?;
    Ok((!stdout.trim().is_empty() && stdout != html).then_some(stdout))
}
