//! Explicit assembly of constructor, rules and engine.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use c3_adapters::default_adapters;
use c3_core::construct::{AdapterBox, LocalFileSystem, SkippedArtifact};
use c3_core::{
    CancellationToken, ComplianceReport, Construction, ConstructionError, EvaluationEngine,
    EvaluationError, GraphConstructor, PropertyGraph, RuleProvider, RuleType,
};
use c3_rules::{Config, LoadError, RuleManager};
use miette::Diagnostic;
use tracing::{info, warn};

/// Config file names searched in a project directory, in priority order.
pub const CONFIG_CANDIDATES: &[&str] = &["c3.toml", ".c3.toml"];

/// Returns the first config file in `dir`, if any.
#[must_use]
pub fn find_config(dir: &Path) -> Option<PathBuf> {
    CONFIG_CANDIDATES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.is_file())
}

/// Errors from assembling or running a [`Pipeline`].
#[derive(Debug, thiserror::Error, Diagnostic)]
pub enum PipelineError {
    /// The configuration could not be turned into rules.
    #[error(transparent)]
    #[diagnostic(code(c3::config))]
    Load(#[from] LoadError),

    /// Some configured rules have no evaluator.
    #[error("no evaluator registered for rule type(s): {}", format_types(.0))]
    #[diagnostic(
        code(c3::coverage),
        help("register an evaluator for each rule type used by the configuration")
    )]
    Coverage(Vec<RuleType>),

    /// Graph construction failed.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Construction(#[from] ConstructionError),

    /// Rule evaluation failed.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Evaluation(#[from] EvaluationError),
}

fn format_types(types: &[RuleType]) -> String {
    types
        .iter()
        .copied()
        .map(RuleType::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// The outcome of one run.
#[derive(Debug)]
pub struct Analysis {
    /// The constructed graph.
    pub graph: PropertyGraph,
    /// The compliance report.
    pub report: ComplianceReport,
    /// Number of files parsed.
    pub parsed: usize,
    /// Files that were not parsed, with reasons.
    pub skipped: Vec<SkippedArtifact>,
}

/// A fully wired construction and evaluation pipeline.
///
/// Every component is built explicitly by [`Pipeline::assemble`] or
/// [`Pipeline::from_parts`]; nothing is looked up globally.
pub struct Pipeline {
    constructor: GraphConstructor,
    engine: EvaluationEngine,
    rules: RuleManager,
}

impl Pipeline {
    /// Assembles the default pipeline for a configuration: all built-in
    /// adapters and evaluators plus the resolved rules.
    ///
    /// Relative `extends` paths are taken from `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Load`] for invalid configuration.
    pub fn assemble(config: &Config, base_dir: &Path) -> Result<Self, PipelineError> {
        let rules = RuleManager::from_config(config, base_dir)?;
        Self::from_parts(rules, default_adapters(), EvaluationEngine::with_defaults())
    }

    /// Assembles a pipeline from a config file, or from the recommended
    /// preset when `path` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Load`] if the file cannot be loaded.
    pub fn from_config_file(path: Option<&Path>) -> Result<Self, PipelineError> {
        let rules = match path {
            Some(path) => RuleManager::from_file(path)?,
            None => RuleManager::from_config(&default_config(), Path::new("."))?,
        };
        Self::from_parts(rules, default_adapters(), EvaluationEngine::with_defaults())
    }

    /// Wires the given components, checking that every rule type in use has
    /// an evaluator.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Coverage`] if a configured rule type has no
    /// evaluator.
    pub fn from_parts(
        rules: RuleManager,
        adapters: Vec<AdapterBox>,
        engine: EvaluationEngine,
    ) -> Result<Self, PipelineError> {
        let used: BTreeSet<RuleType> = rules
            .rule_sets()
            .iter()
            .flat_map(|s| s.rules.iter().map(|r| r.rule_type))
            .collect();
        let (missing, unused): (Vec<RuleType>, Vec<RuleType>) = engine
            .check_coverage()
            .into_iter()
            .partition(|t| used.contains(t));
        if !unused.is_empty() {
            warn!("No evaluator for rule type(s): {}", format_types(&unused));
        }
        if !missing.is_empty() {
            return Err(PipelineError::Coverage(missing));
        }

        let analyzer = rules.analyzer();
        let mut builder = GraphConstructor::builder()
            .adapters(adapters)
            .parallel(analyzer.parallel)
            .fail_on_parse_error(analyzer.fail_on_parse_error)
            .filesystem(Box::new(
                LocalFileSystem::new().respect_gitignore(analyzer.respect_gitignore),
            ));
        if let Some(id) = &analyzer.codebase_id {
            builder = builder.codebase_id(id);
        }
        for pattern in rules.excludes() {
            builder = builder.exclude(pattern.clone());
        }
        for layer in rules.layers() {
            builder = builder.layer(layer.clone());
        }
        let constructor = builder.build();

        info!(
            "Pipeline ready: adapters [{}], evaluators [{}], {} rule(s)",
            constructor.adapter_names().join(", "),
            engine.evaluator_names().join(", "),
            rules.rule_count()
        );

        Ok(Self {
            constructor,
            engine,
            rules,
        })
    }

    /// The resolved rules.
    #[must_use]
    pub fn rules(&self) -> &RuleManager {
        &self.rules
    }

    /// Builds the graph only.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Construction`] if construction fails.
    pub fn construct(&self, root: &Path) -> Result<Construction, PipelineError> {
        Ok(self.constructor.construct(root)?)
    }

    /// Builds the graph for `root` and evaluates every rule against it.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if construction or evaluation fails.
    pub fn run(&self, root: &Path) -> Result<Analysis, PipelineError> {
        self.run_with_cancel(root, &CancellationToken::new())
    }

    /// Like [`run`](Self::run), stopping early once `cancel` is set.
    ///
    /// # Errors
    ///
    /// As [`run`](Self::run), including the cancelled variants of both
    /// phases.
    pub fn run_with_cancel(
        &self,
        root: &Path,
        cancel: &CancellationToken,
    ) -> Result<Analysis, PipelineError> {
        let construction = self.constructor.construct_with_cancel(root, cancel)?;
        let report = self.engine.evaluate_with_cancel(
            &construction.graph,
            self.rules.rule_sets(),
            self.rules.whitelist(),
            cancel,
        )?;
        Ok(Analysis {
            graph: construction.graph,
            report,
            parsed: construction.parsed,
            skipped: construction.skipped,
        })
    }
}

/// The configuration used when a project has none: the recommended preset.
#[must_use]
pub fn default_config() -> Config {
    Config {
        extends: vec![c3_rules::Preset::Recommended.name().to_string()],
        ..Config::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use c3_core::evaluate::NamingEvaluator;

    #[test]
    fn default_config_uses_recommended_preset() {
        let pipeline = Pipeline::assemble(&default_config(), Path::new(".")).unwrap();
        assert_eq!(pipeline.rules().rule_count(), 3);
    }

    #[test]
    fn missing_evaluator_for_used_type_is_rejected() {
        let rules = RuleManager::from_config(&default_config(), Path::new(".")).unwrap();
        let engine = EvaluationEngine::builder()
            .evaluator(NamingEvaluator::new())
            .build();
        let err = Pipeline::from_parts(rules, default_adapters(), engine)
            .err()
            .unwrap();
        match err {
            PipelineError::Coverage(missing) => {
                assert_eq!(missing, vec![RuleType::Dependency, RuleType::Layering]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unused_rule_types_need_no_evaluator() {
        let rules = RuleManager::from_config(
            &Config::parse("extends = [\"c3/minimal\"]").unwrap(),
            Path::new("."),
        )
        .unwrap();
        let engine = EvaluationEngine::builder()
            .evaluator(c3_core::evaluate::DependencyEvaluator::new())
            .build();
        assert!(Pipeline::from_parts(rules, default_adapters(), engine).is_ok());
    }
}
