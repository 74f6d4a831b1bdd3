//! Pipeline orchestrator.

use std::sync::Arc;

use eyre::Result;
use harvester_config::ConfigSource;
use harvester_core::{Artifact, Cancelled};

use crate::{
    Action, Diagnostic, FactCodec, Feature, IncrementalDriver, ModuleId, ModuleMetadata,
    PassInput, PassOutput, Plugin,
    contain::contain,
    controller::{decide, resolve_config},
};

/// A feature with its concrete types erased, as held by the [`Pipeline`].
pub trait FeaturePass: Send {
    fn name(&self) -> &'static str;

    /// Run one build pass. Only cancellation escapes.
    fn run_pass(&mut self, input: &PassInput<'_>) -> Result<PassOutput, Cancelled>;

    /// The action a pass would take for `config`, with the decode error when
    /// there is one.
    fn plan(&self, config: Option<&ConfigSource>) -> Plan;

    /// Decode one embedded value of this feature into a readable form.
    fn describe(&self, value: &str) -> Result<String>;
}

/// What a feature would do, without running it.
#[derive(Debug, Clone)]
pub struct Plan {
    pub action: Action,
    pub error: Option<Arc<harvester_config::Error>>,
}

impl<F: Feature> FeaturePass for IncrementalDriver<F> {
    fn name(&self) -> &'static str {
        self.feature().name()
    }

    fn run_pass(&mut self, input: &PassInput<'_>) -> Result<PassOutput, Cancelled> {
        IncrementalDriver::run_pass(self, input)
    }

    fn plan(&self, config: Option<&ConfigSource>) -> Plan {
        let resolved = resolve_config::<F::Config>(config);
        Plan {
            action: decide(&resolved),
            error: resolved.error().cloned(),
        }
    }

    fn describe(&self, value: &str) -> Result<String> {
        let codec = self.feature().codec();
        contain(|| codec.decode(value)).map(|fact| format!("{fact:?}"))
    }
}

/// The build pipeline orchestrator.
///
/// Holds any number of features and runs each one's pass in registration
/// order, calling plugin hooks before and after every pass. A feature's
/// failure is part of its own output and never affects the others.
///
/// # Example
///
/// ```ignore
/// let mut pipeline = Pipeline::new()
///     .feature(CollectTypesWithAttributesGenerator::new())
///     .plugin(SnapshotPlugin::new());
///
/// let build = pipeline.run(&input)?;
/// ```
pub struct Pipeline {
    features: Vec<Box<dyn FeaturePass>>,
    plugins: Vec<Box<dyn Plugin>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            features: Vec::new(),
            plugins: Vec::new(),
        }
    }

    /// Add a feature, driven incrementally across runs.
    pub fn feature<F: Feature>(mut self, feature: F) -> Self {
        self.features.push(Box::new(IncrementalDriver::new(feature)));
        self
    }

    /// Add a plugin to receive pass lifecycle hooks.
    pub fn plugin(mut self, plugin: impl Plugin + 'static) -> Self {
        self.plugins.push(Box::new(plugin));
        self
    }

    /// Names of the registered features, in run order.
    pub fn feature_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.features.iter().map(|f| f.name())
    }

    /// Look up a registered feature by name.
    pub fn find(&self, name: &str) -> Option<&dyn FeaturePass> {
        self.features
            .iter()
            .find(|f| f.name() == name)
            .map(|f| f.as_ref())
    }

    /// The action every feature would take for `config`.
    pub fn plan(&self, config: Option<&ConfigSource>) -> Vec<(&'static str, Plan)> {
        self.features
            .iter()
            .map(|f| (f.name(), f.plan(config)))
            .collect()
    }

    /// Run one build pass of every feature.
    ///
    /// # Errors
    ///
    /// Returns an error if the build was cancelled or a plugin failed.
    pub fn run(&mut self, input: &PassInput<'_>) -> Result<BuildOutput> {
        let mut passes = Vec::with_capacity(self.features.len());

        for feature in &mut self.features {
            let name = feature.name();

            for plugin in &self.plugins {
                plugin.on_before_pass(name, input)?;
            }

            let mut output = feature.run_pass(input)?;

            for plugin in &self.plugins {
                plugin.on_after_pass(name, &mut output)?;
            }
            passes.push(output);
        }

        Ok(BuildOutput {
            module: ModuleId::new(input.module.name()),
            references: input.references.to_vec(),
            passes,
        })
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// The combined result of every feature's pass over one module.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub module: ModuleId,
    pub references: Vec<ModuleId>,
    pub passes: Vec<PassOutput>,
}

impl BuildOutput {
    pub fn has_errors(&self) -> bool {
        self.passes.iter().any(PassOutput::has_errors)
    }

    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.passes.iter().flat_map(|p| p.diagnostics.iter())
    }

    pub fn artifacts(&self) -> impl Iterator<Item = &Artifact> {
        self.passes.iter().flat_map(|p| p.artifacts.iter())
    }

    /// The metadata to attach to the built module.
    pub fn metadata(&self) -> ModuleMetadata {
        ModuleMetadata::new(self.module.clone())
            .with_references(self.references.iter().cloned())
            .with_annotations(self.passes.iter().flat_map(|p| p.annotations.iter().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::testing::{Fixture, MarkerFeature, module_from_source};

    struct CountingPlugin {
        before_count: Arc<AtomicUsize>,
        after_count: Arc<AtomicUsize>,
    }

    impl CountingPlugin {
        fn new() -> (Self, Arc<AtomicUsize>, Arc<AtomicUsize>) {
            let before = Arc::new(AtomicUsize::new(0));
            let after = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    before_count: before.clone(),
                    after_count: after.clone(),
                },
                before,
                after,
            )
        }
    }

    impl Plugin for CountingPlugin {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn on_before_pass(&self, _feature: &str, _input: &PassInput<'_>) -> Result<()> {
            self.before_count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn on_after_pass(&self, _feature: &str, _output: &mut PassOutput) -> Result<()> {
            self.after_count.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn fixture(config: &str) -> Fixture {
        Fixture::new(module_from_source("shop", "#[marker] pub struct Order;").unwrap())
            .with_config(config)
    }

    #[test]
    fn test_pipeline_plugin_hooks() {
        let (plugin, before_count, after_count) = CountingPlugin::new();
        let mut pipeline = Pipeline::new()
            .feature(MarkerFeature::new())
            .plugin(plugin);

        pipeline.run(&fixture(r#"{"Marker": {}}"#).input()).unwrap();

        assert_eq!(before_count.load(Ordering::SeqCst), 1);
        assert_eq!(after_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_metadata_collects_annotations() {
        let mut pipeline = Pipeline::new().feature(MarkerFeature::new());
        let fixture = fixture(r#"{"Marker": {"collect_to_cache": true}}"#)
            .with_graph(Default::default(), &["core"]);

        let build = pipeline.run(&fixture.input()).unwrap();
        let metadata = build.metadata();

        assert_eq!(metadata.module.as_str(), "shop");
        assert_eq!(metadata.references, vec![ModuleId::new("core")]);
        assert_eq!(metadata.annotations.len(), 1);
        assert_eq!(metadata.annotations[0].value, "shop::Order");
    }

    #[test]
    fn test_plan_reports_decode_error() {
        let pipeline = Pipeline::new().feature(MarkerFeature::new());
        let fixture = fixture(r#"{"Marker": {"enabled": 3}}"#);

        let plan = pipeline.plan(fixture.config.as_ref());
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].0, "MarkerFeature");
        assert_eq!(plan[0].1.action, Action::ReportConfigError);
        assert!(plan[0].1.error.is_some());
    }

    #[test]
    fn test_describe_decodes_values() {
        let pipeline = Pipeline::new().feature(MarkerFeature::new());
        let feature = pipeline.find("MarkerFeature").unwrap();

        assert_eq!(feature.describe("shop::Order").unwrap(), "\"shop::Order\"");
        assert!(feature.describe("").is_err());
        assert!(pipeline.find("Missing").is_none());
    }

    #[test]
    fn test_cancelled_run_is_an_error() {
        let mut pipeline = Pipeline::new().feature(MarkerFeature::new());
        let fixture = fixture(r#"{"Marker": {}}"#);
        fixture.cancel.cancel();

        let err = pipeline.run(&fixture.input()).unwrap_err();
        assert!(err.downcast_ref::<Cancelled>().is_some());
    }
}
