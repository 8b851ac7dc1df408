//! JSON data files: copy, minify in production.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::{FileOutcome, StageId, StageReport, output_key, process_files, relative_to, source_files};
use crate::config::PipelineConfig;
use crate::logger::ProgressLine;
use crate::pipeline::StageContext;
use crate::transform::TransformError;
use crate::transform::minify::minify_json;

fn source_dir(config: &PipelineConfig) -> PathBuf {
    config.source_dir().join(&config.json.dir)
}

pub fn inputs(config: &PipelineConfig) -> Vec<PathBuf> {
    source_files(config, &source_dir(config), Some(&["json"]))
}

pub fn run(ctx: &StageContext, progress: Option<&ProgressLine>) -> Result<StageReport> {
    let section = &ctx.config.json;
    let src = source_dir(ctx.config);
    let revisioner = ctx.revisioner(section.revision);

    let key_of =
        |path: &Path| -> Result<String> { Ok(output_key(&section.output, relative_to(path, &src)?)) };

    process_files(ctx, StageId::Json, &inputs(ctx.config), progress, key_of, |path, key, manifest| {
        let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;

        // Invalid JSON is still shipped, unchanged
        let (content, outcome) = if ctx.mode.minify {
            let minified = std::str::from_utf8(&bytes)
                .map_err(|e| e.to_string())
                .and_then(|text| minify_json(text).map_err(|e| e.to_string()));
            match minified {
                Ok(min) => (min.into_bytes(), FileOutcome::Written),
                Err(message) => (bytes, TransformError::new(path, "json", message).into()),
            }
        } else {
            (bytes, FileOutcome::Written)
        };

        revisioner.emit(key, &content, manifest)?;
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
    fn test_json_minified_not_revisioned() {
        let dir = TempDir::new().unwrap();
        let data = dir.path().join("src/data");
        fs::create_dir_all(&data).unwrap();
        fs::write(data.join("site.json"), "{\n  \"name\": \"stamp\"\n}\n").unwrap();
        fs::write(data.join("broken.json"), "{ nope").unwrap();
        let config = test_config_at(dir.path(), "");

        let ctx = StageContext::new(&config, BuildMode::PRODUCTION);
        let report = run(&ctx, None).unwrap();

        assert_eq!(report, StageReport { written: 1, failed: 1 });
        let dest = config.dest_dir().join("data");
        assert_eq!(
            fs::read_to_string(dest.join("site.json")).unwrap(),
            r#"{"name":"stamp"}"#
        );
        assert_eq!(fs::read_to_string(dest.join("broken.json")).unwrap(), "{ nope");
        assert!(ctx.take_partials().is_empty());
    }
}
