//! `size-report`: per-type output sizes.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::StageReport;
use crate::pipeline::StageContext;
use crate::utils::plural_count;
use crate::utils::size::human_size;
use crate::utils::walk::collect_all_files;

/// File count and total bytes per lowercase extension (`other` without one).
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SizeSummary {
    pub by_type: BTreeMap<String, (usize, u64)>,
    pub files: usize,
    pub bytes: u64,
}

/// Sum file sizes by type, skipping `exclude`.
pub fn summarize_sizes(files: &[PathBuf], exclude: &Path) -> Result<SizeSummary> {
    let mut summary = SizeSummary::default();
    for file in files.iter().filter(|f| *f != exclude) {
        let size = fs::metadata(file)
            .with_context(|| format!("failed to stat {}", file.display()))?
            .len();
        let ext = file
            .extension()
            .and_then(|e| e.to_str())
            .map_or_else(|| "other".to_string(), str::to_ascii_lowercase);

        let entry = summary.by_type.entry(ext).or_default();
        entry.0 += 1;
        entry.1 += size;
        summary.files += 1;
        summary.bytes += size;
    }
    Ok(summary)
}

pub fn run(ctx: &StageContext) -> Result<StageReport> {
    let files = collect_all_files(ctx.config.dest_dir());
    let summary = summarize_sizes(&files, &ctx.config.manifest_path())?;

    for (ext, (count, bytes)) in &summary.by_type {
        crate::log!("report"; "{:<6} {:>10}  {}", ext, human_size(*bytes), plural_count(*count, "file"));
    }
    crate::log!(
        "report";
        "total  {:>10}  {}, {} revisioned",
        human_size(summary.bytes),
        plural_count(summary.files, "file"),
        ctx.revisioned()
    );

    Ok(StageReport::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_summarize_sizes() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(root.join("a.css"), "12345").unwrap();
        fs::write(root.join("b.CSS"), "123").unwrap();
        fs::write(root.join("LICENSE"), "1").unwrap();
        fs::write(root.join("rev-manifest.json"), "{}").unwrap();

        let files = collect_all_files(root);
        let summary = summarize_sizes(&files, &root.join("rev-manifest.json")).unwrap();

        assert_eq!(summary.files, 3);
        assert_eq!(summary.bytes, 9);
        assert_eq!(summary.by_type["css"], (2, 8));
        assert_eq!(summary.by_type["other"], (1, 1));
        assert!(!summary.by_type.contains_key("json"));
    }
}
