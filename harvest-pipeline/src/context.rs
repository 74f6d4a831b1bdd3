//! Inputs and outputs of one feature's build pass.

use std::{fmt, sync::Arc};

use harvester_config::ConfigSource;
use harvester_core::{Artifact, CancellationToken};
use harvester_syntax::SourceModule;
use serde::Serialize;

use crate::{Annotation, Diagnostic, ModuleGraph, ModuleId, Severity};

/// What a pass does for one feature, decided from its resolved config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Action {
    /// The feature has no config section and stays silent.
    Inert,
    /// The config section failed to decode.
    ReportConfigError,
    /// The feature is disabled; previously emitted artifacts are emptied.
    ClearFiles,
    /// Facts are embedded in the module's metadata instead of generating output.
    CacheStore,
    /// Upstream and local facts are combined into consumable artifacts.
    GenerateFiles,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Action::Inert => "inert",
            Action::ReportConfigError => "report config error",
            Action::ClearFiles => "clear files",
            Action::CacheStore => "cache store",
            Action::GenerateFiles => "generate files",
        };
        f.write_str(label)
    }
}

/// Everything a build pass reads. All of it is borrowed and left untouched.
#[derive(Debug, Clone, Copy)]
pub struct PassInput<'a> {
    /// The project config source, if the project has one.
    pub config: Option<&'a ConfigSource>,
    /// Local sources of the module being built.
    pub module: &'a SourceModule,
    /// Compiled modules visible to this build.
    pub graph: &'a ModuleGraph,
    /// Modules the current one references directly.
    pub references: &'a [ModuleId],
    pub cancel: &'a CancellationToken,
}

/// Work counters for one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PassStats {
    /// The config text changed (or was seen for the first time) and was resolved again.
    pub config_reparsed: bool,
    /// Declarations that `matches`/`extract` ran on.
    pub nodes_evaluated: usize,
    /// Declarations whose earlier result was reused.
    pub nodes_reused: usize,
    pub facts_local: usize,
    pub facts_recovered: usize,
}

/// Result of one feature's build pass.
#[derive(Debug, Clone, Serialize)]
pub struct PassOutput {
    pub feature: String,
    pub action: Action,
    pub artifacts: Vec<Artifact>,
    /// Annotations to embed in the current module's metadata.
    pub annotations: Vec<Annotation>,
    pub diagnostics: Vec<Diagnostic>,
    pub stats: PassStats,
    /// The decode error behind a `ReportConfigError` action, kept for rich
    /// rendering by the host.
    #[serde(skip)]
    pub config_error: Option<Arc<harvester_config::Error>>,
}

impl PassOutput {
    pub fn new(feature: impl Into<String>, action: Action) -> Self {
        Self {
            feature: feature.into(),
            action,
            artifacts: Vec::new(),
            annotations: Vec::new(),
            diagnostics: Vec::new(),
            stats: PassStats::default(),
            config_error: None,
        }
    }

    /// Check if any error diagnostics have been recorded.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.severity.is_error())
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity.is_error())
            .count()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| matches!(d.severity, Severity::Error))
    }

    /// Look up an emitted artifact by name.
    pub fn artifact(&self, name: &str) -> Option<&Artifact> {
        self.artifacts.iter().find(|a| a.name() == name)
    }

    /// Drop everything produced so far and record `diagnostic` instead.
    pub(crate) fn fail(&mut self, diagnostic: Diagnostic) {
        self.artifacts.clear();
        self.annotations.clear();
        self.diagnostics.push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fail_discards_output() {
        let mut output = PassOutput::new("MarkerFeature", Action::GenerateFiles);
        output.artifacts.push(Artifact::new("markers.g.rs", "x"));
        output.annotations.push(Annotation::new("MarkerFeature", "x"));

        output.fail(Diagnostic::generation_exception("MarkerFeature", "boom"));

        assert!(output.artifacts.is_empty());
        assert!(output.annotations.is_empty());
        assert!(output.has_errors());
        assert_eq!(output.error_count(), 1);
        assert_eq!(output.errors().count(), 1);
    }

    #[test]
    fn test_artifact_lookup() {
        let mut output = PassOutput::new("MarkerFeature", Action::ClearFiles);
        output.artifacts.push(Artifact::empty("markers.g.rs"));

        assert!(output.artifact("markers.g.rs").unwrap().is_empty());
        assert!(output.artifact("other.g.rs").is_none());
        assert!(!output.has_errors());
    }

    #[test]
    fn test_action_display() {
        assert_eq!(Action::CacheStore.to_string(), "cache store");
        assert_eq!(Action::ReportConfigError.to_string(), "report config error");
    }
}
