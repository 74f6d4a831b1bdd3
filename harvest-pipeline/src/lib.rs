//! Incremental, cross-module fact harvesting.
//!
//! A [`Feature`] recognises declarations, turns them into facts and renders
//! artifacts from them. For every build pass the pipeline resolves the
//! feature's config and picks one of four actions:
//!
//! - report a config decode error,
//! - clear the feature's previous artifacts when it is disabled,
//! - cache local facts in the module's metadata (library modules),
//! - generate artifacts from upstream cached facts plus local ones
//!   (consumer modules).
//!
//! Failures of feature code never escape a pass; they become
//! [`Diagnostic`]s or dropped facts.
//!
//! # Example
//!
//! ```ignore
//! use harvester_pipeline::{Pipeline, PassInput};
//!
//! let mut pipeline = Pipeline::new().feature(MyFeature::new());
//! let build = pipeline.run(&PassInput {
//!     config: Some(&config),
//!     module: &module,
//!     graph: &graph,
//!     references: &references,
//!     cancel: &cancel,
//! })?;
//!
//! for diag in build.diagnostics() {
//!     eprintln!("{diag}");
//! }
//! ```

mod contain;
mod context;
mod controller;
mod diagnostic;
mod embed;
mod feature;
mod incremental;
mod module;
mod plugin;
mod propagate;
mod runner;
mod snapshot;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use context::{Action, PassInput, PassOutput, PassStats};
pub use controller::{Controller, decide, resolve_config};
pub use diagnostic::{Diagnostic, DiagnosticCode, Severity};
pub use embed::{EmbedError, parse_embedded, render_embedded};
pub use feature::{CACHE_ARTIFACT_SUFFIX, FactCodec, Feature};
pub use incremental::IncrementalDriver;
pub use module::{Annotation, METADATA_FILE_NAME, ModuleGraph, ModuleId, ModuleMetadata};
pub use plugin::Plugin;
pub use propagate::{ReadError, read_facts, write_annotations};
pub use runner::{BuildOutput, FeaturePass, Pipeline, Plan};
pub use snapshot::{PassSnapshot, SnapshotPlugin};
