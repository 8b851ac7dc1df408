//! Stage dependency graph and topological scheduling.

use std::collections::BTreeMap;

use super::PipelineError;
use crate::config::PipelineConfig;
use crate::core::BuildMode;
use crate::stage::StageId;

/// Directed acyclic graph of stages, edges pointing at dependencies.
#[derive(Debug, Clone, Default)]
pub struct StageGraph {
    nodes: BTreeMap<StageId, Vec<StageId>>,
}

impl StageGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a stage and the stages it must wait for.
    pub fn add(&mut self, id: StageId, deps: &[StageId]) -> &mut Self {
        self.nodes.insert(id, deps.to_vec());
        self
    }

    pub fn contains(&self, id: StageId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn dependencies(&self, id: StageId) -> &[StageId] {
        self.nodes.get(&id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// The stages of one build.
    ///
    /// Every asset stage feeds the manifest join point, so merging waits
    /// for all of them. Rewriting runs before critical CSS inlining and HTML
    /// minification so they see final asset names.
    pub fn plan(mode: BuildMode, config: &PipelineConfig) -> Self {
        use StageId::*;

        let mut graph = Self::new();
        graph.add(Clean, &[]);
        for asset in StageId::ASSETS {
            graph.add(asset, &[Clean]);
        }
        graph.add(HtmlCopy, &StageId::ASSETS);

        let mut last = HtmlCopy;
        if mode.revision {
            graph.add(MergeManifest, &[Styles, Scripts, Json, Images, HtmlCopy]);
            graph.add(RewriteReferences, &[MergeManifest]);
            last = RewriteReferences;
        }
        if mode.minify && config.critical.enable {
            graph.add(InlineCriticalCss, &[last]);
            last = InlineCriticalCss;
        }
        if mode.minify && config.html.minify {
            graph.add(MinifyHtml, &[last]);
            last = MinifyHtml;
        }
        if mode.report && config.report.enable {
            graph.add(SizeReport, &[last]);
        }
        graph
    }

    /// Group stages into waves: every stage's dependencies sit in earlier
    /// waves, and stages within a wave are independent.
    pub fn waves(&self) -> Result<Vec<Vec<StageId>>, PipelineError> {
        for (&stage, deps) in &self.nodes {
            if let Some(&missing) = deps.iter().find(|d| !self.nodes.contains_key(d)) {
                return Err(PipelineError::UnknownDependency {
                    stage: stage.name(),
                    dependency: missing.name(),
                });
            }
        }

        let mut pending: BTreeMap<StageId, usize> = self
            .nodes
            .iter()
            .map(|(&id, deps)| (id, deps.len()))
            .collect();
        let mut waves = Vec::new();

        while !pending.is_empty() {
            let ready: Vec<StageId> = pending
                .iter()
                .filter(|(_, remaining)| **remaining == 0)
                .map(|(&id, _)| id)
                .collect();

            if ready.is_empty() {
                return Err(PipelineError::Cycle(
                    pending.keys().map(|id| id.name()).collect(),
                ));
            }

            for id in &ready {
                pending.remove(id);
            }
            for (id, remaining) in pending.iter_mut() {
                *remaining -= self.nodes[id].iter().filter(|d| ready.contains(d)).count();
            }
            waves.push(ready);
        }

        Ok(waves)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;
    use StageId::*;

    #[test]
    fn test_development_plan() {
        let config = test_parse_config("");
        let waves = StageGraph::plan(BuildMode::DEVELOPMENT, &config)
            .waves()
            .unwrap();
        assert_eq!(
            waves,
            vec![
                vec![Clean],
                vec![Styles, Scripts, Json, Images],
                vec![HtmlCopy],
            ]
        );
    }

    #[test]
    fn test_production_plan_orders_rewrite_before_minify() {
        let config = test_parse_config("");
        let waves = StageGraph::plan(BuildMode::PRODUCTION, &config)
            .waves()
            .unwrap();
        assert_eq!(
            waves,
            vec![
                vec![Clean],
                vec![Styles, Scripts, Json, Images],
                vec![HtmlCopy],
                vec![MergeManifest],
                vec![RewriteReferences],
                vec![InlineCriticalCss],
                vec![MinifyHtml],
                vec![SizeReport],
            ]
        );
    }

    #[test]
    fn test_plan_respects_disabled_sections() {
        let config = test_parse_config(
            "[critical]\nenable = false\n[html]\nminify = false\n[report]\nenable = false",
        );
        let graph = StageGraph::plan(BuildMode::PRODUCTION, &config);
        assert!(!graph.contains(InlineCriticalCss));
        assert!(!graph.contains(MinifyHtml));
        assert!(!graph.contains(SizeReport));
        assert_eq!(graph.dependencies(RewriteReferences), &[MergeManifest]);
        assert_eq!(graph.len(), 8);
    }

    #[test]
    fn test_merge_waits_for_every_asset_stage() {
        let config = test_parse_config("");
        let graph = StageGraph::plan(BuildMode::PRODUCTION, &config);
        for asset in StageId::ASSETS {
            assert!(graph.dependencies(MergeManifest).contains(&asset));
        }
    }

    #[test]
    fn test_cycle_detected() {
        let mut graph = StageGraph::new();
        graph
            .add(Clean, &[])
            .add(Styles, &[Clean, Scripts])
            .add(Scripts, &[Styles]);
        match graph.waves() {
            Err(PipelineError::Cycle(stages)) => assert_eq!(stages, vec!["styles", "scripts"]),
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_dependency() {
        let mut graph = StageGraph::new();
        graph.add(RewriteReferences, &[MergeManifest]);
        assert!(matches!(
            graph.waves(),
            Err(PipelineError::UnknownDependency {
                stage: "rewrite-references",
                dependency: "merge-manifest"
            })
        ));
    }
}
