//! Syntax node types.

use std::{fmt, path::PathBuf};

use serde::{Deserialize, Serialize};

/// A position in a source file. Line and column are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Span {
    pub file: PathBuf,
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(file: impl Into<PathBuf>, line: usize, column: usize) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }

    /// The start of `file`, used where no syntactic location is meaningful.
    pub fn file_start(file: impl Into<PathBuf>) -> Self {
        Self::new(file, 1, 1)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

/// The kind of declaration a node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ItemKind {
    Struct,
    Enum,
    Union,
    Trait,
    TypeAlias,
    Function,
    Const,
    Static,
    Module,
}

impl ItemKind {
    /// Whether the declaration introduces a type.
    pub fn is_type(self) -> bool {
        matches!(
            self,
            Self::Struct | Self::Enum | Self::Union | Self::Trait | Self::TypeAlias
        )
    }
}

/// How an attribute was attached to a declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AttributeKind {
    /// `#[path]` or `#[path(...)]`
    Outer,
    /// One entry of `#[derive(...)]`
    Derive,
}

/// An attribute path exactly as written at the declaration site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AttributeRef {
    pub path: String,
    pub kind: AttributeKind,
}

impl AttributeRef {
    pub fn outer(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: AttributeKind::Outer,
        }
    }

    pub fn derive(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: AttributeKind::Derive,
        }
    }
}

/// One declaration in a module.
///
/// Nodes are plain values: two nodes compare equal exactly when a feature
/// would see identical input, which lets the incremental driver reuse earlier
/// results for unchanged declarations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SyntaxNode {
    pub kind: ItemKind,
    pub ident: String,
    /// Module path inside the crate, without the crate name.
    pub module_path: Vec<String>,
    pub attributes: Vec<AttributeRef>,
    pub span: Span,
}

impl SyntaxNode {
    /// The declaration's path, qualified by `crate_name` and its module path.
    pub fn qualified_name(&self, crate_name: &str) -> String {
        std::iter::once(crate_name)
            .chain(self.module_path.iter().map(String::as_str))
            .chain(std::iter::once(self.ident.as_str()))
            .collect::<Vec<_>>()
            .join("::")
    }

    pub fn has_attributes(&self) -> bool {
        !self.attributes.is_empty()
    }
}
