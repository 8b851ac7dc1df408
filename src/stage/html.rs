//! HTML pages: copy into the destination tree, minify after rewriting.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use rayon::prelude::*;

use super::{StageReport, ensure_parent, relative_to, source_files};
use crate::config::PipelineConfig;
use crate::pipeline::StageContext;
use crate::transform::minify::minify_html;
use crate::utils::walk::collect_files_with_ext;

pub const HTML_EXTENSIONS: &[&str] = &["html", "htm"];

fn source_dir(config: &PipelineConfig) -> PathBuf {
    config.source_dir().join(&config.html.dir)
}

/// HTML files outside the asset section directories.
pub fn inputs(config: &PipelineConfig) -> Vec<PathBuf> {
    let dir = source_dir(config);
    // A section dir that contains the HTML dir would exclude every page
    let skip: Vec<PathBuf> = config
        .asset_source_dirs()
        .into_iter()
        .filter(|d| !dir.starts_with(d))
        .collect();

    source_files(config, &dir, Some(HTML_EXTENSIONS))
        .into_iter()
        .filter(|p| !skip.iter().any(|d| p.starts_with(d)))
        .collect()
}

/// `html-copy`: mirror pages into dest.
pub fn copy(ctx: &StageContext) -> Result<StageReport> {
    let src = source_dir(ctx.config);
    let files = inputs(ctx.config);

    files.par_iter().try_for_each(|path| -> Result<()> {
        let out = ctx.config.dest_dir().join(relative_to(path, &src)?);
        ensure_parent(&out)?;
        fs::copy(path, &out)
            .map(|_| ())
            .with_context(|| format!("failed to copy {}", path.display()))
    })?;

    Ok(StageReport {
        written: files.len(),
        failed: 0,
    })
}

/// `minify-html`: compact every page in dest.
pub fn minify(ctx: &StageContext) -> Result<StageReport> {
    let files = collect_files_with_ext(ctx.config.dest_dir(), HTML_EXTENSIONS);

    let changed = files
        .par_iter()
        .map(|path| -> Result<bool> {
            let html = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
            let minified = minify_html(&html);
            if minified == html {
                return Ok(false);
            }
            fs::write(path, minified).with_context(|| format!("failed to write {}", path.display()))?;
            Ok(true)
        })
        .collect::<Result<Vec<bool>>>()?;

    Ok(StageReport {
        written: changed.into_iter().filter(|c| *c).count(),
        failed: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config_at;
    use crate::core::BuildMode;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_copy_skips_asset_dirs() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        write(&src.join("index.html"), "<p>home</p>");
        write(&src.join("blog/post.htm"), "<p>post</p>");
        write(&src.join("js/fixture.html"), "<p>test page</p>");
        let config = test_config_at(dir.path(), "");

        let ctx = StageContext::new(&config, BuildMode::DEVELOPMENT);
        let report = copy(&ctx).unwrap();

        assert_eq!(report.written, 2);
        let dest = config.dest_dir();
        assert!(dest.join("index.html").exists());
        assert!(dest.join("blog/post.htm").exists());
        assert!(!dest.join("js/fixture.html").exists());
    }

    #[test]
    fn test_copy_ignores_dest_inside_source() {
        let dir = TempDir::new().unwrap();
        write(&dir.path().join("index.html"), "<p>home</p>");
        write(&dir.path().join("public/old.html"), "<p>stale</p>");
        let config = test_config_at(dir.path(), "[build]\nsource = \".\"\ndest = \"public\"");

        assert_eq!(inputs(&config), vec![config.source_dir().join("index.html")]);
    }

    #[test]
    fn test_minify_rewrites_only_changed_pages() {
        let dir = TempDir::new().unwrap();
        let config = test_config_at(dir.path(), "");
        let dest = config.dest_dir();
        write(&dest.join("index.html"), "<html>\n  <body>\n    <p>hi</p>\n  </body>\n</html>\n");

        let ctx = StageContext::new(&config, BuildMode::PRODUCTION);
        assert_eq!(minify(&ctx).unwrap().written, 1);
        let once = fs::read(dest.join("index.html")).unwrap();
        assert_eq!(minify(&ctx).unwrap().written, 0);
        assert_eq!(fs::read(dest.join("index.html")).unwrap(), once);
    }
}
