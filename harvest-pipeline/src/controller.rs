//! The per-feature decision between reporting, clearing, caching and
//! generating.

use std::{collections::BTreeSet, sync::Arc};

use harvester_config::{ConfigParseResult, ConfigSource, FeatureConfig, resolve};
use harvester_core::{Artifact, Cancelled};
use harvester_syntax::{NodeContext, Span};

use crate::{
    Action, Diagnostic, Feature, PassInput, PassOutput,
    contain::contain,
    propagate::{ReadError, read_facts, write_annotations},
};

/// Config file name used for locations when the project has no config source.
const DEFAULT_CONFIG_NAME: &str = "codegen.config.json";

/// Choose what a pass does from a resolved config.
///
/// A captured decode error wins over everything else, and a missing section
/// never clears: only a config that decoded with `enabled = false` does.
pub fn decide<C: FeatureConfig>(config: &ConfigParseResult<C>) -> Action {
    match config.config() {
        None if config.error().is_some() => Action::ReportConfigError,
        None => Action::Inert,
        Some(c) if !c.enabled() => Action::ClearFiles,
        Some(c) if c.collect_to_cache() => Action::CacheStore,
        Some(_) => Action::GenerateFiles,
    }
}

/// Resolve a feature's config, treating a project without a config source
/// like one without the feature's section.
pub fn resolve_config<C: FeatureConfig>(source: Option<&ConfigSource>) -> ConfigParseResult<C> {
    match source {
        Some(source) => resolve(source),
        None => ConfigParseResult::not_configured(),
    }
}

/// Runs cold passes: every pass resolves the config and evaluates every
/// declaration from scratch. See [`IncrementalDriver`](crate::IncrementalDriver)
/// for the caching variant.
#[derive(Debug, Clone, Default)]
pub struct Controller<F> {
    feature: F,
}

impl<F: Feature> Controller<F> {
    pub fn new(feature: F) -> Self {
        Self { feature }
    }

    pub fn feature(&self) -> &F {
        &self.feature
    }

    /// Run one build pass.
    ///
    /// # Errors
    ///
    /// Only cancellation escapes. Every failure of feature code is reported
    /// as a diagnostic in the returned output.
    pub fn run_pass(&self, input: &PassInput<'_>) -> Result<PassOutput, Cancelled> {
        input.cancel.check()?;
        let config = resolve_config::<F::Config>(input.config);

        let mut evaluated = 0;
        let mut output = complete_pass(&self.feature, &config, input, || {
            extract_local(&self.feature, input, &mut evaluated)
        })?;

        output.stats.config_reparsed = true;
        output.stats.nodes_evaluated = evaluated;
        Ok(output)
    }
}

/// Evaluate `matches` and `extract` on one declaration.
pub(crate) fn evaluate_node<F: Feature>(
    feature: &F,
    ctx: &NodeContext<'_>,
) -> eyre::Result<Option<F::Fact>> {
    if !contain(|| Ok(feature.matches(ctx.node())))? {
        return Ok(None);
    }
    contain(|| feature.extract(ctx))
}

/// Log a contained extraction fault. The node's fact is dropped.
pub(crate) fn report_extraction_fault<F: Feature>(
    feature: &F,
    ctx: &NodeContext<'_>,
    error: &eyre::Report,
) {
    tracing::warn!(
        feature = feature.name(),
        node = %ctx.qualified_name(),
        location = %ctx.node().span,
        error = %format!("{error:#}"),
        "dropping fact after extraction fault"
    );
}

fn extract_local<F: Feature>(
    feature: &F,
    input: &PassInput<'_>,
    evaluated: &mut usize,
) -> Result<Vec<F::Fact>, Cancelled> {
    let mut facts = Vec::new();
    for ctx in input.module.contexts() {
        input.cancel.check()?;
        *evaluated += 1;
        match evaluate_node(feature, &ctx) {
            Ok(Some(fact)) => facts.push(fact),
            Ok(None) => {}
            Err(error) => report_extraction_fault(feature, &ctx, &error),
        }
    }
    Ok(facts)
}

/// Failure of one step of a pass.
enum StepError {
    Cancelled(Cancelled),
    Feature(eyre::Report),
}

impl From<Cancelled> for StepError {
    fn from(cancelled: Cancelled) -> Self {
        Self::Cancelled(cancelled)
    }
}

impl From<eyre::Report> for StepError {
    fn from(report: eyre::Report) -> Self {
        Self::Feature(report)
    }
}

impl From<ReadError> for StepError {
    fn from(error: ReadError) -> Self {
        match error {
            ReadError::Cancelled(cancelled) => Self::Cancelled(cancelled),
            decode @ ReadError::Decode { .. } => Self::Feature(eyre::Report::new(decode)),
        }
    }
}

/// Apply the decision for an already resolved config.
///
/// `local` produces the facts of the current module. It only runs for the
/// cache and generate actions.
pub(crate) fn complete_pass<F, L>(
    feature: &F,
    config: &ConfigParseResult<F::Config>,
    input: &PassInput<'_>,
    local: L,
) -> Result<PassOutput, Cancelled>
where
    F: Feature,
    L: FnOnce() -> Result<Vec<F::Fact>, Cancelled>,
{
    let name = feature.name();
    let action = decide(config);
    let mut output = PassOutput::new(name, action);
    tracing::debug!(feature = name, %action, "resolved action");

    let Some(settings) = config.config().map(Arc::as_ref) else {
        if let Some(error) = config.error() {
            let location = input
                .config
                .map(|source| Span::file_start(source.path()))
                .unwrap_or_else(|| Span::file_start(DEFAULT_CONFIG_NAME));
            output.diagnostics.push(Diagnostic::config_decode(
                name,
                error.to_string(),
                location,
            ));
            output.config_error = Some(Arc::clone(error));
        }
        return Ok(output);
    };

    match action {
        Action::ClearFiles => match clear_artifacts(feature) {
            Ok(artifacts) => output.artifacts = artifacts,
            Err(error) => output.fail(Diagnostic::clear_exception(
                name,
                format!("failed to clear artifacts: {error:#}"),
            )),
        },
        Action::CacheStore => match cache_store(feature, settings, local, &mut output) {
            Ok(()) => {}
            Err(StepError::Cancelled(cancelled)) => return Err(cancelled),
            Err(StepError::Feature(error)) => output.fail(Diagnostic::generation_exception(
                name,
                format!("failed to cache facts: {error:#}"),
            )),
        },
        Action::GenerateFiles => match generate_files(feature, settings, input, local, &mut output)
        {
            Ok(()) => {}
            Err(StepError::Cancelled(cancelled)) => return Err(cancelled),
            Err(StepError::Feature(error)) => output.fail(Diagnostic::generation_exception(
                name,
                format!("failed to generate artifacts: {error:#}"),
            )),
        },
        Action::Inert | Action::ReportConfigError => {}
    }

    input.cancel.check()?;
    tracing::info!(
        feature = name,
        %action,
        artifacts = output.artifacts.len(),
        annotations = output.annotations.len(),
        errors = output.error_count(),
        "pass complete"
    );
    Ok(output)
}

/// Empty replacements for every artifact the feature may have emitted,
/// including its cache artifact.
fn clear_artifacts<F: Feature>(feature: &F) -> eyre::Result<Vec<Artifact>> {
    let mut names: BTreeSet<String> = contain(|| feature.clear())?.into_iter().collect();
    names.insert(feature.cache_artifact_name());
    Ok(names.into_iter().map(Artifact::empty).collect())
}

/// Local facts, filtered when the config asks for it.
fn filtered_local<F, L>(
    feature: &F,
    config: &F::Config,
    local: L,
) -> Result<Vec<F::Fact>, StepError>
where
    F: Feature,
    L: FnOnce() -> Result<Vec<F::Fact>, Cancelled>,
{
    let mut facts = local()?;
    if contain(|| Ok(feature.needs_filtering(config)))? {
        let mut kept = Vec::with_capacity(facts.len());
        for fact in facts {
            if contain(|| Ok(feature.filter(&fact, config)))? {
                kept.push(fact);
            }
        }
        facts = kept;
    }
    Ok(facts)
}

fn cache_store<F, L>(
    feature: &F,
    config: &F::Config,
    local: L,
    output: &mut PassOutput,
) -> Result<(), StepError>
where
    F: Feature,
    L: FnOnce() -> Result<Vec<F::Fact>, Cancelled>,
{
    let facts: BTreeSet<F::Fact> = filtered_local(feature, config, local)?.into_iter().collect();
    let facts: Vec<F::Fact> = facts.into_iter().collect();
    output.stats.facts_local = facts.len();

    let (annotations, artifact) = write_annotations(feature, &facts)?;
    output.annotations = annotations;
    output.artifacts = vec![artifact];
    Ok(())
}

fn generate_files<F, L>(
    feature: &F,
    config: &F::Config,
    input: &PassInput<'_>,
    local: L,
    output: &mut PassOutput,
) -> Result<(), StepError>
where
    F: Feature,
    L: FnOnce() -> Result<Vec<F::Fact>, Cancelled>,
{
    let recovered = read_facts(feature, input.graph, input.references, input.cancel)?;
    let local = filtered_local(feature, config, local)?;
    output.stats.facts_recovered = recovered.len();
    output.stats.facts_local = local.len();

    let facts: BTreeSet<F::Fact> = recovered.into_iter().chain(local).collect();
    let facts: Vec<F::Fact> = facts.into_iter().collect();

    input.cancel.check()?;
    output.artifacts = contain(|| feature.generate(config, &facts))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use harvester_config::resolve_text;

    use super::*;
    use crate::testing::{Fixture, GraphBuilder, MarkerConfig, MarkerFeature, module_from_source};

    fn decision(text: &str) -> Action {
        decide(&resolve_text::<MarkerConfig>(text))
    }

    #[test]
    fn test_decision_table() {
        assert_eq!(decision("{}"), Action::Inert);
        assert_eq!(
            decision(r#"{"Marker": {"enabled": "nope"}}"#),
            Action::ReportConfigError
        );
        assert_eq!(decision(r#"{"Marker": {"enabled": false}}"#), Action::ClearFiles);
        assert_eq!(
            decision(r#"{"Marker": {"enabled": false, "collect_to_cache": true}}"#),
            Action::ClearFiles
        );
        assert_eq!(
            decision(r#"{"Marker": {"collect_to_cache": true}}"#),
            Action::CacheStore
        );
        assert_eq!(decision(r#"{"Marker": {}}"#), Action::GenerateFiles);
    }

    #[test]
    fn test_malformed_text_reports_error() {
        assert_eq!(decision("{ not json"), Action::ReportConfigError);
    }

    fn fixture(config: &str) -> Fixture {
        let module = module_from_source(
            "shop",
            r#"
            #[marker] pub struct Order;
            #[marker] pub struct Invoice;
            pub struct Plain;
            "#,
        )
        .unwrap();
        Fixture::new(module).with_config(config)
    }

    #[test]
    fn test_generate_files() {
        let fixture = fixture(r#"{"Marker": {}}"#);
        let output = Controller::new(MarkerFeature::new())
            .run_pass(&fixture.input())
            .unwrap();

        assert_eq!(output.action, Action::GenerateFiles);
        assert!(output.annotations.is_empty());
        let artifact = output.artifact("markers.g.rs").unwrap();
        insta::assert_snapshot!(artifact.content(), @r#"
        pub const MARKED: &[&str] = &[
            "shop::Invoice",
            "shop::Order",
        ];
        "#);
        assert_eq!(output.stats.facts_local, 2);
        assert_eq!(output.stats.nodes_evaluated, 3);
    }

    #[test]
    fn test_cache_store_emits_only_cache_artifact() {
        let fixture = fixture(r#"{"Marker": {"collect_to_cache": true}}"#);
        let output = Controller::new(MarkerFeature::new())
            .run_pass(&fixture.input())
            .unwrap();

        assert_eq!(output.action, Action::CacheStore);
        let names: Vec<_> = output.artifacts.iter().map(|a| a.name()).collect();
        assert_eq!(names, vec!["MarkerFeature.cache.g.rs"]);
        let values: Vec<_> = output.annotations.iter().map(|a| a.value.as_str()).collect();
        assert_eq!(values, vec!["shop::Invoice", "shop::Order"]);
    }

    #[test]
    fn test_clear_files_empties_every_artifact() {
        let fixture = fixture(r#"{"Marker": {"enabled": false}}"#);
        let output = Controller::new(MarkerFeature::new())
            .run_pass(&fixture.input())
            .unwrap();

        assert_eq!(output.action, Action::ClearFiles);
        let names: Vec<_> = output.artifacts.iter().map(|a| a.name()).collect();
        assert_eq!(names, vec!["MarkerFeature.cache.g.rs", "markers.g.rs"]);
        assert!(output.artifacts.iter().all(Artifact::is_empty));
        assert_eq!(output.stats.nodes_evaluated, 0);
    }

    #[test]
    fn test_config_error_reported_at_config_start() {
        let fixture = fixture(r#"{"Marker": {"enabled": "not-a-bool"}}"#);
        let output = Controller::new(MarkerFeature::new())
            .run_pass(&fixture.input())
            .unwrap();

        assert_eq!(output.action, Action::ReportConfigError);
        assert!(output.artifacts.is_empty());
        assert_eq!(output.diagnostics.len(), 1);
        let diag = &output.diagnostics[0];
        assert_eq!(diag.code.as_str(), "CPE0001");
        assert_eq!(diag.feature, "MarkerFeature");
        assert_eq!(
            diag.location,
            Some(Span::file_start("codegen.config.json"))
        );
        assert!(output.config_error.is_some());
    }

    #[test]
    fn test_unreadable_config_reported_at_config_start() {
        let module = module_from_source("shop", "#[marker] pub struct Order;").unwrap();
        let mut fixture = Fixture::new(module);
        fixture.config = Some(ConfigSource::unreadable(
            "codegen.config.json",
            "stream did not contain valid UTF-8",
        ));

        let output = Controller::new(MarkerFeature::new())
            .run_pass(&fixture.input())
            .unwrap();

        assert_eq!(output.action, Action::ReportConfigError);
        assert!(output.artifacts.is_empty());
        assert_eq!(output.diagnostics.len(), 1);
        assert_eq!(output.diagnostics[0].code.as_str(), "CPE0001");
        assert_eq!(
            output.diagnostics[0].location,
            Some(Span::file_start("codegen.config.json"))
        );
    }

    #[test]
    fn test_missing_config_is_inert() {
        let module = module_from_source("shop", "#[marker] pub struct Order;").unwrap();
        let fixture = Fixture::new(module);
        let output = Controller::new(MarkerFeature::new())
            .run_pass(&fixture.input())
            .unwrap();

        assert_eq!(output.action, Action::Inert);
        assert!(output.artifacts.is_empty());
        assert!(output.diagnostics.is_empty());
    }

    #[test]
    fn test_generation_failure_is_contained() {
        let fixture = fixture(r#"{"Marker": {}}"#);
        let output = Controller::new(MarkerFeature::new().failing_generate())
            .run_pass(&fixture.input())
            .unwrap();

        assert!(output.artifacts.is_empty());
        assert_eq!(output.error_count(), 1);
        assert_eq!(output.diagnostics[0].code.as_str(), "GGE0001");
        assert!(output.diagnostics[0].message.contains("generation failed on purpose"));
    }

    #[test]
    fn test_clear_failure_is_contained() {
        let fixture = fixture(r#"{"Marker": {"enabled": false}}"#);
        let output = Controller::new(MarkerFeature::new().failing_clear())
            .run_pass(&fixture.input())
            .unwrap();

        assert!(output.artifacts.is_empty());
        assert_eq!(output.diagnostics[0].code.as_str(), "CGE0001");
    }

    #[test]
    fn test_extraction_panic_drops_only_that_fact() {
        let fixture = fixture(r#"{"Marker": {}}"#);
        let output = Controller::new(MarkerFeature::new().panicking_on("Order"))
            .run_pass(&fixture.input())
            .unwrap();

        assert!(output.diagnostics.is_empty());
        let artifact = output.artifact("markers.g.rs").unwrap();
        assert!(artifact.content().contains("shop::Invoice"));
        assert!(!artifact.content().contains("shop::Order"));
    }

    #[test]
    fn test_filtering_applies_to_local_facts() {
        let fixture = fixture(r#"{"Marker": {"only": ["shop::Order"]}}"#);
        let output = Controller::new(MarkerFeature::new())
            .run_pass(&fixture.input())
            .unwrap();

        let artifact = output.artifact("markers.g.rs").unwrap();
        assert!(artifact.content().contains("shop::Order"));
        assert!(!artifact.content().contains("shop::Invoice"));
    }

    #[test]
    fn test_cancelled_pass_emits_nothing() {
        let fixture = fixture(r#"{"Marker": {}}"#);
        fixture.cancel.cancel();

        let result = Controller::new(MarkerFeature::new()).run_pass(&fixture.input());
        assert_eq!(result.unwrap_err(), Cancelled);
    }

    #[test]
    fn test_generate_combines_upstream_and_local_facts() {
        let graph = GraphBuilder::new()
            .module("a", &[], &["a::X", "a::Y"])
            .build();
        let module = module_from_source("b", "#[marker] pub struct Z;").unwrap();
        let fixture = Fixture::new(module)
            .with_config(r#"{"Marker": {}}"#)
            .with_graph(graph, &["a"]);

        let output = Controller::new(MarkerFeature::new())
            .run_pass(&fixture.input())
            .unwrap();

        let content = output.artifact("markers.g.rs").unwrap().content();
        for fact in ["a::X", "a::Y", "b::Z"] {
            assert!(content.contains(fact), "{fact} missing from {content}");
        }
        assert_eq!(output.stats.facts_recovered, 2);
        assert_eq!(output.stats.facts_local, 1);
    }

    #[test]
    fn test_upstream_facts_are_not_filtered() {
        let graph = GraphBuilder::new().module("a", &[], &["a::X"]).build();
        let fixture = fixture(r#"{"Marker": {"only": ["shop::Order"]}}"#).with_graph(graph, &["a"]);

        let output = Controller::new(MarkerFeature::new())
            .run_pass(&fixture.input())
            .unwrap();

        let content = output.artifact("markers.g.rs").unwrap().content();
        assert!(content.contains("a::X"));
        assert!(content.contains("shop::Order"));
        assert!(!content.contains("shop::Invoice"));
    }

    #[test]
    fn test_duplicate_upstream_facts_collapse() {
        let graph = GraphBuilder::new()
            .module("a", &[], &["shop::Order"])
            .module("b", &["a"], &["shop::Order"])
            .build();
        let fixture = fixture(r#"{"Marker": {}}"#).with_graph(graph, &["b"]);

        let output = Controller::new(MarkerFeature::new())
            .run_pass(&fixture.input())
            .unwrap();

        let content = output.artifact("markers.g.rs").unwrap().content();
        assert_eq!(content.matches("shop::Order").count(), 1);
    }

    #[test]
    fn test_corrupt_upstream_annotation_is_generation_exception() {
        let graph = GraphBuilder::new().module("a", &[], &[""]).build();
        let fixture = fixture(r#"{"Marker": {}}"#).with_graph(graph, &["a"]);

        let output = Controller::new(MarkerFeature::new())
            .run_pass(&fixture.input())
            .unwrap();

        assert!(output.artifacts.is_empty());
        assert_eq!(output.diagnostics[0].code.as_str(), "GGE0001");
        assert!(output.diagnostics[0].message.contains("module 'a'"));
    }

    #[test]
    fn test_repeated_passes_are_identical() {
        let fixture = fixture(r#"{"Marker": {}}"#);
        let controller = Controller::new(MarkerFeature::new());

        let first = controller.run_pass(&fixture.input()).unwrap();
        let second = controller.run_pass(&fixture.input()).unwrap();
        assert_eq!(first.artifacts, second.artifacts);
    }

    #[test]
    fn test_disable_then_reenable_restores_output() {
        let module = module_from_source("shop", "#[marker] pub struct Order;").unwrap();
        let controller = Controller::new(MarkerFeature::new());
        let run = |config: &str| {
            let fixture = Fixture::new(module.clone()).with_config(config);
            controller.run_pass(&fixture.input()).unwrap()
        };

        let first = run(r#"{"Marker": {"enabled": true}}"#);
        let second = run(r#"{"Marker": {"enabled": false}}"#);
        let third = run(r#"{"Marker": {"enabled": true}}"#);

        let generated = first.artifact("markers.g.rs").unwrap();
        assert!(!generated.is_empty());
        assert!(second.artifact("markers.g.rs").unwrap().is_empty());
        assert_eq!(third.artifact("markers.g.rs"), Some(generated));
    }

    #[test]
    fn test_cache_and_generate_are_exclusive() {
        let feature = MarkerFeature::new();
        let cache_name = feature.cache_artifact_name();
        let controller = Controller::new(feature);

        for config in [
            r#"{"Marker": {"collect_to_cache": true}}"#,
            r#"{"Marker": {"collect_to_cache": false}}"#,
        ] {
            let output = controller.run_pass(&fixture(config).input()).unwrap();
            let cached = output.artifact(&cache_name).is_some();
            let generated = output.artifact("markers.g.rs").is_some();
            assert!(cached != generated, "{config} emitted both or neither");
        }
    }
}
