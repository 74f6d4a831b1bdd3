use eyre::Result;
use harvester_core::Artifact;
use harvester_pipeline::Feature;
use harvester_syntax::{AttributeKind, AttributeRef, NodeContext, SyntaxNode};

use crate::{
    CollectTypesWithAttributesConfig, TypeFact, TypeFactCodec, files::TypesByAttributes,
};

/// Attributes the compiler itself understands. Never collected.
pub const BUILTIN_ATTRIBUTES: &[&str] = &[
    "allow",
    "automatically_derived",
    "cfg",
    "cfg_attr",
    "cold",
    "deny",
    "deprecated",
    "derive",
    "doc",
    "expect",
    "export_name",
    "forbid",
    "ignore",
    "inline",
    "link",
    "link_section",
    "macro_export",
    "macro_use",
    "must_use",
    "no_mangle",
    "non_exhaustive",
    "path",
    "repr",
    "should_panic",
    "test",
    "track_caller",
    "used",
    "warn",
];

/// Derives provided by the standard library.
const BUILTIN_DERIVES: &[&str] = &[
    "Clone",
    "Copy",
    "Debug",
    "Default",
    "Eq",
    "Hash",
    "Ord",
    "PartialEq",
    "PartialOrd",
];

const STD_CRATES: &[&str] = &["std", "core", "alloc"];

/// Collects every type carrying a non-builtin attribute or derive.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectTypesWithAttributesGenerator {
    codec: TypeFactCodec,
}

impl CollectTypesWithAttributesGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

fn is_builtin(kind: AttributeKind, path: &str) -> bool {
    let path = path.trim_start_matches("::");
    let (first, last) = match path.rsplit_once("::") {
        Some((prefix, last)) => (prefix.split("::").next(), last),
        None => (None, path),
    };
    if first.is_some_and(|krate| !STD_CRATES.contains(&krate)) {
        return false;
    }
    match kind {
        AttributeKind::Outer => BUILTIN_ATTRIBUTES.contains(&last),
        AttributeKind::Derive => BUILTIN_DERIVES.contains(&last),
    }
}

fn is_collectable(attribute: &AttributeRef) -> bool {
    !is_builtin(attribute.kind, &attribute.path)
}

impl Feature for CollectTypesWithAttributesGenerator {
    type Config = CollectTypesWithAttributesConfig;
    type Fact = TypeFact;
    type Codec = TypeFactCodec;

    fn matches(&self, node: &SyntaxNode) -> bool {
        node.kind.is_type() && node.attributes.iter().any(is_collectable)
    }

    fn extract(&self, ctx: &NodeContext<'_>) -> Result<Option<TypeFact>> {
        // An import can alias a builtin, so check again after resolving.
        let attributes: Vec<String> = ctx
            .node()
            .attributes
            .iter()
            .filter(|a| is_collectable(a))
            .map(|a| (a.kind, ctx.resolve_path(&a.path)))
            .filter(|(kind, resolved)| !resolved.is_empty() && !is_builtin(*kind, resolved))
            .map(|(_, resolved)| resolved)
            .collect();

        if attributes.is_empty() {
            return Ok(None);
        }
        Ok(Some(TypeFact::new(ctx.qualified_name(), attributes)))
    }

    fn needs_filtering(&self, config: &CollectTypesWithAttributesConfig) -> bool {
        !config.attributes.is_empty()
    }

    fn filter(&self, fact: &TypeFact, config: &CollectTypesWithAttributesConfig) -> bool {
        fact.attributes.iter().any(|a| config.selects(a))
    }

    fn codec(&self) -> &TypeFactCodec {
        &self.codec
    }

    fn generate(
        &self,
        config: &CollectTypesWithAttributesConfig,
        facts: &[TypeFact],
    ) -> Result<Vec<Artifact>> {
        let table = TypesByAttributes::new(config, facts);
        tracing::debug!(
            facts = facts.len(),
            rows = table.rows().len(),
            partial = config.partial,
            "rendering {}",
            TypesByAttributes::FILE_NAME
        );
        Ok(vec![table.artifact()?])
    }

    fn clear(&self) -> Result<Vec<String>> {
        Ok(vec![TypesByAttributes::FILE_NAME.to_owned()])
    }
}
