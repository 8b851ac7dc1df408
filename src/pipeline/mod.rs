//! Stage orchestration.
//!
//! The pipeline is an explicit DAG of [`StageId`]s. [`StageGraph::plan`]
//! declares each stage's dependencies for a build mode; [`run`] executes the
//! graph wave by wave, running every stage of a wave in parallel:
//!
//! ```text
//! wave 0  clean
//! wave 1  styles  scripts  json  images        (parallel)
//! wave 2  html-copy
//! wave 3  merge-manifest                       (production only ...)
//! wave 4  rewrite-references
//! wave 5  inline-critical-css
//! wave 6  minify-html
//! wave 7  size-report                          (... through here)
//! ```
//!
//! A failed stage skips everything that depends on it. Independent stages
//! still run and their output stays on disk.
//!
//! [`StageId`]: crate::stage::StageId

mod context;
mod error;
mod graph;
mod run;

pub use context::StageContext;
pub use error::PipelineError;
pub use graph::StageGraph;
pub use run::{BuildSummary, StageOutcome, execute, run};
