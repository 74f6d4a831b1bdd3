//! Declaration-level syntax model for the harvester pipeline.
//!
//! Rust sources are lowered into flat lists of [`SyntaxNode`]s, one per
//! declaration, together with the `use` scope of every module so features can
//! resolve attribute paths without a full name-resolution pass.

mod error;
mod module;
mod node;
mod parse;
mod scope;

pub use error::SyntaxError;
pub use module::SourceModule;
pub use node::{AttributeKind, AttributeRef, ItemKind, Span, SyntaxNode};
pub use parse::{SyntaxTree, module_path_for, parse_source};
pub use scope::{NodeContext, UseScope};
