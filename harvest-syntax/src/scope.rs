//! Per-module `use` scopes and path resolution.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::SyntaxNode;

/// The names a module brings into scope with `use` declarations.
///
/// Scopes are not inherited: a child module only sees its own imports, as in
/// Rust itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UseScope {
    /// Local name to the path it was imported from, as written.
    aliases: BTreeMap<String, String>,
}

static EMPTY_SCOPE: UseScope = UseScope::new();

impl UseScope {
    pub const fn new() -> Self {
        Self {
            aliases: BTreeMap::new(),
        }
    }

    /// A shared empty scope for modules without imports.
    pub fn empty() -> &'static Self {
        &EMPTY_SCOPE
    }

    /// Bind `local` to `path`. Later bindings shadow earlier ones.
    pub fn insert(&mut self, local: impl Into<String>, path: impl Into<String>) {
        self.aliases.insert(local.into(), path.into());
    }

    /// Look up the path a local name was imported from.
    pub fn get(&self, local: &str) -> Option<&str> {
        self.aliases.get(local).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

/// A matched node together with what is needed to inspect it further.
#[derive(Debug, Clone, Copy)]
pub struct NodeContext<'a> {
    node: &'a SyntaxNode,
    scope: &'a UseScope,
    crate_name: &'a str,
}

impl<'a> NodeContext<'a> {
    pub fn new(node: &'a SyntaxNode, scope: &'a UseScope, crate_name: &'a str) -> Self {
        Self {
            node,
            scope,
            crate_name,
        }
    }

    pub fn node(&self) -> &'a SyntaxNode {
        self.node
    }

    pub fn scope(&self) -> &'a UseScope {
        self.scope
    }

    pub fn crate_name(&self) -> &'a str {
        self.crate_name
    }

    /// The node's fully-qualified path.
    pub fn qualified_name(&self) -> String {
        self.node.qualified_name(self.crate_name)
    }

    /// Resolve a path written in the node's module to a fully-qualified path.
    ///
    /// `crate`, `self` and `super` prefixes are anchored at the current crate
    /// and module, and the first segment is looked up in the module's `use`
    /// scope. Paths that cannot be resolved are returned as written.
    pub fn resolve_path(&self, path: &str) -> String {
        if let Some(absolute) = path.strip_prefix("::") {
            return absolute.to_owned();
        }

        let mut segments = path.split("::");
        let Some(first) = segments.next() else {
            return path.to_owned();
        };
        let rest: Vec<&str> = segments.collect();

        match self.scope.get(first) {
            Some(imported) => {
                let anchored = self.anchor(imported);
                join_path(&anchored, &rest)
            }
            None if matches!(first, "crate" | "self" | "super") => self.anchor(path),
            None => path.to_owned(),
        }
    }

    /// Replace leading `crate`/`self`/`super` segments with concrete modules.
    fn anchor(&self, path: &str) -> String {
        let segments: Vec<&str> = path.split("::").collect();
        let mut base: Vec<&str> = Vec::new();
        let mut index = 0;

        match segments.first().copied() {
            Some("crate") => {
                base.push(self.crate_name);
                index = 1;
            }
            Some("self") | Some("super") => {
                base.push(self.crate_name);
                base.extend(self.node.module_path.iter().map(String::as_str));
                if segments[0] == "self" {
                    index = 1;
                }
                while segments.get(index) == Some(&"super") {
                    if base.len() > 1 {
                        base.pop();
                    }
                    index += 1;
                }
            }
            _ => return path.to_owned(),
        }

        base.extend(&segments[index..]);
        base.join("::")
    }
}

fn join_path(head: &str, rest: &[&str]) -> String {
    if rest.is_empty() {
        head.to_owned()
    } else {
        format!("{}::{}", head, rest.join("::"))
    }
}
