//! Core utilities and types for the harvester pipeline.
//!
//! This crate provides the pieces shared by every other harvester crate:
//! the generated [`Artifact`] model, a [`CodeBuilder`] for rendering Rust
//! source, the [`CancellationToken`] observed by every node-level unit of
//! work, and small string helpers.

mod artifact;
mod cancel;
mod code_builder;
mod utils;

// Artifacts
pub use artifact::{Artifact, GENERATED_HEADER, WriteResult, write_file};
// Cancellation
pub use cancel::{CancellationToken, Cancelled};
// Rendering
pub use code_builder::CodeBuilder;
// String utilities
pub use utils::{escape_literal, short_type_name, strip_type_suffix, unescape_literal};
