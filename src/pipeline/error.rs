//! Pipeline errors.

use thiserror::Error;

use crate::utils::plural_count;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("stage graph has a cycle through {}", .0.join(" -> "))]
    Cycle(Vec<&'static str>),

    #[error("stage `{stage}` depends on `{dependency}`, which is not planned")]
    UnknownDependency {
        stage: &'static str,
        dependency: &'static str,
    },

    #[error("{} failed: {}", plural_count(.0.len(), "stage"), .0.join(", "))]
    StagesFailed(Vec<&'static str>),
}
