//! Lowering Rust source text into syntax nodes.

use std::{
    collections::BTreeMap,
    path::{Component, Path, PathBuf},
};

use harvester_core::CancellationToken;
use serde::{Deserialize, Serialize};
use syn::{Attribute, Ident, Item, UseTree};

use crate::{AttributeRef, ItemKind, NodeContext, Span, SyntaxError, SyntaxNode, UseScope};

/// All declarations of one source file, plus the `use` scope of each module
/// the file defines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxTree {
    pub path: PathBuf,
    pub nodes: Vec<SyntaxNode>,
    scopes: BTreeMap<Vec<String>, UseScope>,
}

impl SyntaxTree {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// The `use` scope of the module at `module_path`.
    pub fn scope(&self, module_path: &[String]) -> &UseScope {
        self.scopes
            .get(module_path)
            .unwrap_or(UseScope::empty())
    }

    /// Mutable access to a module's scope, creating it when missing.
    pub fn scope_mut(&mut self, module_path: Vec<String>) -> &mut UseScope {
        self.scopes.entry(module_path).or_default()
    }

    /// Every node with its inspection context.
    pub fn contexts<'a>(&'a self, crate_name: &'a str) -> impl Iterator<Item = NodeContext<'a>> {
        self.nodes
            .iter()
            .map(move |node| NodeContext::new(node, self.scope(&node.module_path), crate_name))
    }
}

/// Parse one Rust source file.
///
/// `module_path` is the module the file defines inside its crate (empty for
/// the crate root). Cancellation is checked before every item.
pub fn parse_source(
    path: impl Into<PathBuf>,
    text: &str,
    module_path: Vec<String>,
    cancel: &CancellationToken,
) -> Result<SyntaxTree, SyntaxError> {
    let path = path.into();
    cancel.check()?;

    let file = syn::parse_file(text).map_err(|e| {
        let start = e.span().start();
        SyntaxError::Parse {
            path: path.clone(),
            line: start.line,
            column: start.column + 1,
            message: e.to_string(),
        }
    })?;

    let mut tree = SyntaxTree::new(path);
    Lowering {
        tree: &mut tree,
        cancel,
    }
    .items(&file.items, &module_path)?;

    tracing::trace!(path = %tree.path.display(), nodes = tree.nodes.len(), "parsed source");
    Ok(tree)
}

/// Derive the module path a file defines from its location under `src_root`.
///
/// `lib.rs`, `main.rs` and `mod.rs` name their directory's module.
pub fn module_path_for(src_root: &Path, file: &Path) -> Vec<String> {
    let relative = file.strip_prefix(src_root).unwrap_or(file);
    let mut segments: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => s.to_str().map(str::to_owned),
            _ => None,
        })
        .collect();

    if let Some(last) = segments.pop() {
        let stem = last.strip_suffix(".rs").unwrap_or(&last);
        let names_directory = matches!(stem, "mod")
            || (segments.is_empty() && matches!(stem, "lib" | "main"));
        if !names_directory {
            segments.push(stem.to_owned());
        }
    }
    segments
}

struct Lowering<'a> {
    tree: &'a mut SyntaxTree,
    cancel: &'a CancellationToken,
}

impl Lowering<'_> {
    fn items(&mut self, items: &[Item], module_path: &[String]) -> Result<(), SyntaxError> {
        for item in items {
            self.cancel.check()?;
            match item {
                Item::Struct(s) => self.push(ItemKind::Struct, &s.ident, &s.attrs, module_path),
                Item::Enum(e) => self.push(ItemKind::Enum, &e.ident, &e.attrs, module_path),
                Item::Union(u) => self.push(ItemKind::Union, &u.ident, &u.attrs, module_path),
                Item::Trait(t) => self.push(ItemKind::Trait, &t.ident, &t.attrs, module_path),
                Item::Type(t) => self.push(ItemKind::TypeAlias, &t.ident, &t.attrs, module_path),
                Item::Fn(f) => self.push(ItemKind::Function, &f.sig.ident, &f.attrs, module_path),
                Item::Const(c) => self.push(ItemKind::Const, &c.ident, &c.attrs, module_path),
                Item::Static(s) => self.push(ItemKind::Static, &s.ident, &s.attrs, module_path),
                Item::Mod(m) => {
                    self.push(ItemKind::Module, &m.ident, &m.attrs, module_path);
                    if let Some((_, content)) = &m.content {
                        let mut child = module_path.to_vec();
                        child.push(m.ident.to_string());
                        self.items(content, &child)?;
                    }
                }
                Item::Use(u) => {
                    let scope = self.tree.scope_mut(module_path.to_vec());
                    collect_use(&u.tree, &mut Vec::new(), scope);
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn push(&mut self, kind: ItemKind, ident: &Ident, attrs: &[Attribute], module_path: &[String]) {
        let start = ident.span().start();
        let node = SyntaxNode {
            kind,
            ident: ident.to_string(),
            module_path: module_path.to_vec(),
            attributes: lower_attributes(attrs),
            span: Span::new(self.tree.path.clone(), start.line, start.column + 1),
        };
        self.tree.nodes.push(node);
    }
}

fn lower_attributes(attrs: &[Attribute]) -> Vec<AttributeRef> {
    let mut lowered = Vec::new();
    for attr in attrs {
        let path = path_to_string(attr.path());
        if path == "derive" {
            // A malformed derive list still keeps whatever parsed before the error.
            let _ = attr.parse_nested_meta(|meta| {
                lowered.push(AttributeRef::derive(path_to_string(&meta.path)));
                Ok(())
            });
        } else {
            lowered.push(AttributeRef::outer(path));
        }
    }
    lowered
}

fn path_to_string(path: &syn::Path) -> String {
    let joined = path
        .segments
        .iter()
        .map(|s| s.ident.to_string())
        .collect::<Vec<_>>()
        .join("::");
    if path.leading_colon.is_some() {
        format!("::{joined}")
    } else {
        joined
    }
}

fn collect_use(tree: &UseTree, prefix: &mut Vec<String>, scope: &mut UseScope) {
    match tree {
        UseTree::Path(p) => {
            prefix.push(p.ident.to_string());
            collect_use(&p.tree, prefix, scope);
            prefix.pop();
        }
        UseTree::Name(n) => {
            let name = n.ident.to_string();
            if name == "self" {
                if let Some(last) = prefix.last() {
                    scope.insert(last.clone(), prefix.join("::"));
                }
            } else {
                scope.insert(name.clone(), extend(prefix, &name));
            }
        }
        UseTree::Rename(r) => {
            let target = r.ident.to_string();
            let target = if target == "self" {
                prefix.join("::")
            } else {
                extend(prefix, &target)
            };
            scope.insert(r.rename.to_string(), target);
        }
        // A glob does not say which names it brings in.
        UseTree::Glob(_) => {}
        UseTree::Group(g) => {
            for item in &g.items {
                collect_use(item, prefix, scope);
            }
        }
    }
}

fn extend(prefix: &[String], name: &str) -> String {
    if prefix.is_empty() {
        name.to_owned()
    } else {
        format!("{}::{}", prefix.join("::"), name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AttributeKind;

    fn parse(text: &str) -> SyntaxTree {
        parse_source("src/lib.rs", text, Vec::new(), &CancellationToken::new()).unwrap()
    }

    #[test]
    fn test_lowers_declarations() {
        let tree = parse(
            r#"
            pub struct Order;
            enum State { Open }
            pub fn place() {}
            type Id = u64;
            "#,
        );

        let kinds: Vec<_> = tree.nodes.iter().map(|n| (n.kind, n.ident.as_str())).collect();
        assert_eq!(
            kinds,
            vec![
                (ItemKind::Struct, "Order"),
                (ItemKind::Enum, "State"),
                (ItemKind::Function, "place"),
                (ItemKind::TypeAlias, "Id"),
            ]
        );
    }

    #[test]
    fn test_lowers_attributes_and_derives() {
        let tree = parse(
            r#"
            #[derive(Debug, serde::Serialize)]
            #[registry::entry(name = "x")]
            /// Docs
            pub struct Order;
            "#,
        );

        let attrs = &tree.nodes[0].attributes;
        assert_eq!(
            attrs,
            &vec![
                AttributeRef::derive("Debug"),
                AttributeRef::derive("serde::Serialize"),
                AttributeRef::outer("registry::entry"),
                AttributeRef::outer("doc"),
            ]
        );
        assert_eq!(attrs[0].kind, AttributeKind::Derive);
    }

    #[test]
    fn test_records_spans() {
        let tree = parse("\n\npub struct Order;\n");
        let span = &tree.nodes[0].span;
        assert_eq!(span.line, 3);
        assert_eq!(span.column, 12);
    }

    #[test]
    fn test_descends_into_inline_modules() {
        let tree = parse(
            r#"
            mod models {
                use crate::markers::Tracked;

                #[Tracked]
                pub struct Item;
            }
            "#,
        );

        let item = tree.nodes.iter().find(|n| n.ident == "Item").unwrap();
        assert_eq!(item.module_path, vec!["models".to_owned()]);
        assert_eq!(
            tree.scope(&item.module_path).get("Tracked"),
            Some("crate::markers::Tracked")
        );
        assert!(tree.scope(&[]).is_empty());
    }

    #[test]
    fn test_collects_use_forms() {
        let tree = parse(
            r#"
            use serde::{Serialize, de::{self, Deserialize as De}};
            use markers::*;
            use ::registry::Entry;
            "#,
        );

        let scope = tree.scope(&[]);
        assert_eq!(scope.get("Serialize"), Some("serde::Serialize"));
        assert_eq!(scope.get("de"), Some("serde::de"));
        assert_eq!(scope.get("De"), Some("serde::de::Deserialize"));
        assert_eq!(scope.get("Entry"), Some("registry::Entry"));
        assert_eq!(scope.get("markers"), None);
    }

    #[test]
    fn test_parse_error_has_location() {
        let err = parse_source(
            "src/lib.rs",
            "pub struct {",
            Vec::new(),
            &CancellationToken::new(),
        )
        .unwrap_err();

        assert!(matches!(err, SyntaxError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_cancelled_before_parsing() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = parse_source("src/lib.rs", "struct A;", Vec::new(), &cancel).unwrap_err();
        assert!(matches!(err, SyntaxError::Cancelled(_)));
    }

    #[test]
    fn test_module_path_for() {
        let root = Path::new("/p/src");
        assert!(module_path_for(root, Path::new("/p/src/lib.rs")).is_empty());
        assert!(module_path_for(root, Path::new("/p/src/main.rs")).is_empty());
        assert_eq!(module_path_for(root, Path::new("/p/src/orders.rs")), vec!["orders"]);
        assert_eq!(
            module_path_for(root, Path::new("/p/src/orders/mod.rs")),
            vec!["orders"]
        );
        assert_eq!(
            module_path_for(root, Path::new("/p/src/orders/lib.rs")),
            vec!["orders", "lib"]
        );
    }
}
