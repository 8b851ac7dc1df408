//! Scripts: bundle or copy entry points, minify and revision.

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
use crate::transform::minify::{is_preminified, minify_js};
use crate::utils::path::from_slash;
use crate::utils::walk::{has_ext, is_partial};

const EXTENSIONS: &[&str] = &["js", "mjs"];

fn source_dir(config: &PipelineConfig) -> PathBuf {
    config.source_dir().join(&config.scripts.dir)
}

/// Configured entries, or every non-partial `.js`/`.mjs` file.
pub fn inputs(config: &PipelineConfig) -> Vec<PathBuf> {
    let dir = source_dir(config);
    if config.scripts.entries.is_empty() {
        source_files(config, &dir, Some(EXTENSIONS))
            .into_iter()
            .filter(|p| !is_partial(p))
            .collect()
    } else {
        config.scripts.entries.iter().map(|e| dir.join(e)).collect()
    }
}

pub fn run(ctx: &StageContext, progress: Option<&ProgressLine>) -> Result<StageReport> {
    let section = &ctx.config.scripts;
    let src = source_dir(ctx.config);
    let revisioner = ctx.revisioner(section.revision);
    let tool = Tool::new("scripts", &section.command)
        .mode_args(&section.dev_args, &section.build_args, ctx.mode)
        .source_map_args(&section.source_map_args, &section.no_source_map_args, ctx.mode);

    // Bundlers may take `.ts`/`.jsx` entries; the output is always script
    let key_of = |path: &Path| -> Result<String> {
        let ext = if has_ext(path, &["mjs"]) { "mjs" } else { "js" };
        let rel = relative_to(path, &src)?.with_extension(ext);
        Ok(output_key(&section.output, &rel))
    };

    process_files(ctx, StageId::Scripts, &inputs(ctx.config), progress, key_of, |path, key, manifest| {
        if !path.is_file() {
            return Ok(TransformError::new(path, "scripts", "entry not found").into());
        }
        let out = from_slash(ctx.config.dest_dir(), key);

        let js = if tool.is_configured() {
            ensure_parent(&out)?;
            let bundled = match tool.run(&ctx.vars.with_io(path, &out), ctx.config.get_root(), path) {
                Ok(_) => fs::read_to_string(&out)
                    .map_err(|_| TransformError::new(path, tool.name(), "produced no output")),
                Err(err) => Err(err),
            };
            match bundled {
                Ok(js) => js,
                Err(err) => {
                    discard_partial_output(&out)?;
                    return Ok(err.into());
                }
            }
        } else {
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?
        };

        let js = if ctx.mode.minify && !is_preminified(&out) {
            minify(path, js)
        } else {
            js
        };

        revisioner.emit(key, js.as_bytes(), manifest)?;
        Ok(FileOutcome::Written)
    })
}

/// Minify, falling back to the input when oxc cannot parse it.
fn minify(path: &Path, js: String) -> String {
    match minify_js(&js) {
        Some(minified) => minified,
        None => {
            crate::log!("warning"; "[scripts] cannot minify {}, keeping as-is", path.display());
            js
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config_at;
    use crate::core::BuildMode;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_inputs_default_and_entries() {
        let dir = TempDir::new().unwrap();
        write(&dir.path().join("src/js/app.js"), "");
        write(&dir.path().join("src/js/_util.js"), "");
        write(&dir.path().join("src/js/lib/mod.mjs"), "");

        let config = test_config_at(dir.path(), "");
        assert_eq!(inputs(&config).len(), 2);

        let config = test_config_at(dir.path(), "[scripts]\nentries = [\"app.js\"]");
        assert_eq!(inputs(&config), vec![dir.path().join("src/js/app.js")]);
    }

    #[test]
    fn test_copy_development_keeps_name() {
        let dir = TempDir::new().unwrap();
        write(&dir.path().join("src/js/app.js"), "console.log( 1 );\n");
        let config = test_config_at(dir.path(), "");

        let ctx = StageContext::new(&config, BuildMode::DEVELOPMENT);
        run(&ctx, None).unwrap();

        assert_eq!(
            fs::read_to_string(config.dest_dir().join("js/app.js")).unwrap(),
            "console.log( 1 );\n"
        );
        assert!(ctx.take_partials().is_empty());
    }

    #[test]
    fn test_preminified_left_alone_but_revisioned() {
        let dir = TempDir::new().unwrap();
        let source = "/* vendor */ var  a = 1;";
        write(&dir.path().join("src/js/vendor.min.js"), source);
        let config = test_config_at(dir.path(), "");

        let ctx = StageContext::new(&config, BuildMode::PRODUCTION);
        run(&ctx, None).unwrap();

        let partials = ctx.take_partials();
        let revisioned = partials[0].1.get("js/vendor.min.js").unwrap().to_string();
        assert!(revisioned.starts_with("js/vendor.min-"));
        assert_eq!(
            fs::read_to_string(config.dest_dir().join(revisioned)).unwrap(),
            source
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_bundle_leaves_no_unrevisioned_output() {
        let dir = TempDir::new().unwrap();
        write(&dir.path().join("src/js/app.js"), "console.log(1);");
        let config = test_config_at(
            dir.path(),
            r#"
[scripts]
command = ["sh", "-c", "echo 'var half' > \"$STAMP_OUTPUT\"; exit 2"]
"#,
        );

        let ctx = StageContext::new(&config, BuildMode::PRODUCTION);
        let report = run(&ctx, None).unwrap();
        assert_eq!(report, StageReport { written: 0, failed: 1 });
        assert!(!config.dest_dir().join("js/app.js").exists());
        assert!(ctx.take_partials().is_empty());
    }

    #[test]
    fn test_missing_entry_is_reported() {
        let dir = TempDir::new().unwrap();
        let config = test_config_at(dir.path(), "[scripts]\nentries = [\"missing.js\"]");
        let ctx = StageContext::new(&config, BuildMode::PRODUCTION);
        let report = run(&ctx, None).unwrap();
        assert_eq!(report, StageReport { written: 0, failed: 1 });
    }
}
