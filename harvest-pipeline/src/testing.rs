//! Test utilities for features and hosts built on the pipeline.
//!
//! This module is only available when the `testing` feature is enabled
//! or during tests.

use std::fs;

use eyre::{Result, WrapErr, bail};
use harvester_config::{ConfigSource, FeatureConfig, default_enabled};
use harvester_core::{Artifact, CancellationToken};
use harvester_syntax::{NodeContext, SourceModule, SyntaxError, SyntaxNode, parse_source};
use serde::Deserialize;
use tempfile::TempDir;

use crate::{Annotation, FactCodec, Feature, ModuleGraph, ModuleId, ModuleMetadata, PassInput};

/// Config of [`MarkerFeature`], read from the `Marker` section.
#[derive(Debug, Clone, Deserialize)]
pub struct MarkerConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default, alias = "collectToCache")]
    pub collect_to_cache: bool,
    /// Keep only these facts when non-empty.
    #[serde(default)]
    pub only: Vec<String>,
}

impl FeatureConfig for MarkerConfig {
    fn enabled(&self) -> bool {
        self.enabled
    }

    fn collect_to_cache(&self) -> bool {
        self.collect_to_cache
    }
}

/// Stores facts as they are. Empty values are rejected so tests can plant
/// corrupt annotations.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkerCodec;

impl FactCodec for MarkerCodec {
    type Fact = String;

    fn encode(&self, fact: &String) -> String {
        fact.clone()
    }

    fn decode(&self, value: &str) -> Result<String> {
        if value.is_empty() {
            bail!("empty marker fact");
        }
        Ok(value.to_owned())
    }
}

/// A minimal feature: every declaration carrying `#[marker]` yields its
/// qualified name, and generation lists them in `markers.g.rs`.
#[derive(Debug, Clone, Default)]
pub struct MarkerFeature {
    codec: MarkerCodec,
    panic_on: Option<String>,
    fail_generate: bool,
    fail_clear: bool,
}

impl MarkerFeature {
    pub const ARTIFACT: &'static str = "markers.g.rs";

    pub fn new() -> Self {
        Self::default()
    }

    /// Panic while extracting the declaration named `ident`.
    pub fn panicking_on(mut self, ident: impl Into<String>) -> Self {
        self.panic_on = Some(ident.into());
        self
    }

    pub fn failing_generate(mut self) -> Self {
        self.fail_generate = true;
        self
    }

    pub fn failing_clear(mut self) -> Self {
        self.fail_clear = true;
        self
    }
}

impl Feature for MarkerFeature {
    type Config = MarkerConfig;
    type Fact = String;
    type Codec = MarkerCodec;

    fn matches(&self, node: &SyntaxNode) -> bool {
        node.attributes.iter().any(|a| a.path == "marker")
    }

    fn extract(&self, ctx: &NodeContext<'_>) -> Result<Option<String>> {
        if self.panic_on.as_deref() == Some(ctx.node().ident.as_str()) {
            panic!("extraction of {} failed on purpose", ctx.node().ident);
        }
        Ok(Some(ctx.qualified_name()))
    }

    fn needs_filtering(&self, config: &MarkerConfig) -> bool {
        !config.only.is_empty()
    }

    fn filter(&self, fact: &String, config: &MarkerConfig) -> bool {
        config.only.contains(fact)
    }

    fn codec(&self) -> &MarkerCodec {
        &self.codec
    }

    fn generate(&self, _config: &MarkerConfig, facts: &[String]) -> Result<Vec<Artifact>> {
        if self.fail_generate {
            bail!("generation failed on purpose");
        }
        let mut content = String::from("pub const MARKED: &[&str] = &[\n");
        for fact in facts {
            content.push_str(&format!("    {fact:?},\n"));
        }
        content.push_str("];\n");
        Ok(vec![Artifact::new(Self::ARTIFACT, content)])
    }

    fn clear(&self) -> Result<Vec<String>> {
        if self.fail_clear {
            bail!("clearing failed on purpose");
        }
        Ok(vec![Self::ARTIFACT.to_owned()])
    }
}

/// Parse `text` as the crate root of module `name`.
pub fn module_from_source(name: &str, text: &str) -> Result<SourceModule, SyntaxError> {
    let tree = parse_source("src/lib.rs", text, Vec::new(), &CancellationToken::new())?;
    Ok(SourceModule::new(name, vec![tree]))
}

/// Write `files` (paths relative to `src/`) into a temporary directory and
/// load them as module `name`. Keep the returned directory alive while the
/// module is in use.
pub fn module_from_files(name: &str, files: &[(&str, &str)]) -> Result<(TempDir, SourceModule)> {
    let temp = TempDir::new()?;
    let src = temp.path().join("src");
    for (relative, text) in files {
        let path = src.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, text).wrap_err_with(|| format!("failed to write {}", path.display()))?;
    }
    let module = SourceModule::load_dir(name, &src, &CancellationToken::new())?;
    Ok((temp, module))
}

/// Builds an in-memory module graph whose annotations belong to
/// [`MarkerFeature`].
#[derive(Debug, Default)]
pub struct GraphBuilder {
    graph: ModuleGraph,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register module `name`, referencing `references` and caching `facts`.
    pub fn module(mut self, name: &str, references: &[&str], facts: &[&str]) -> Self {
        let feature = MarkerFeature::new();
        self.graph.insert(
            ModuleMetadata::new(name)
                .with_references(references.iter().map(|r| ModuleId::new(*r)))
                .with_annotations(facts.iter().map(|f| Annotation::new(feature.name(), *f))),
        );
        self
    }

    /// Register already built metadata.
    pub fn metadata(mut self, metadata: ModuleMetadata) -> Self {
        self.graph.insert(metadata);
        self
    }

    pub fn build(self) -> ModuleGraph {
        self.graph
    }
}

/// Owns everything a [`PassInput`] borrows.
#[derive(Debug)]
pub struct Fixture {
    pub config: Option<ConfigSource>,
    pub module: SourceModule,
    pub graph: ModuleGraph,
    pub references: Vec<ModuleId>,
    pub cancel: CancellationToken,
}

impl Fixture {
    pub fn new(module: SourceModule) -> Self {
        Self {
            config: None,
            module,
            graph: ModuleGraph::new(),
            references: Vec::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Use `text` as the content of `codegen.config.json`.
    pub fn with_config(mut self, text: &str) -> Self {
        self.config = Some(ConfigSource::new("codegen.config.json", text));
        self
    }

    pub fn with_graph(mut self, graph: ModuleGraph, references: &[&str]) -> Self {
        self.graph = graph;
        self.references = references.iter().map(|r| ModuleId::new(*r)).collect();
        self
    }

    pub fn input(&self) -> PassInput<'_> {
        PassInput {
            config: self.config.as_ref(),
            module: &self.module,
            graph: &self.graph,
            references: &self.references,
            cancel: &self.cancel,
        }
    }
}
