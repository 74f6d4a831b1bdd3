use std::collections::{BTreeMap, BTreeSet};

use eyre::{Result, bail};
use harvester_core::{Artifact, CodeBuilder, escape_literal};

use super::GENERATED_HEADER;
use crate::{CollectTypesWithAttributesConfig, TypeFact, config::attribute_matches};

/// The `types_by_attributes.g.rs` lookup table.
///
/// Rows are keyed by attribute name as configured, or by every resolved
/// attribute seen when none are configured. Both rows and the types inside
/// them are sorted, so equal fact sets always render the same text.
pub struct TypesByAttributes<'a> {
    config: &'a CollectTypesWithAttributesConfig,
    facts: &'a [TypeFact],
}

impl<'a> TypesByAttributes<'a> {
    pub const FILE_NAME: &'static str = "types_by_attributes.g.rs";

    pub fn new(config: &'a CollectTypesWithAttributesConfig, facts: &'a [TypeFact]) -> Self {
        Self { config, facts }
    }

    /// The table rows: attribute name to the sorted type paths carrying it.
    pub fn rows(&self) -> BTreeMap<&'a str, BTreeSet<&'a str>> {
        let mut rows: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();

        if self.config.attributes.is_empty() {
            for fact in self.facts {
                for attribute in &fact.attributes {
                    rows.entry(attribute.as_str())
                        .or_default()
                        .insert(fact.type_path.as_str());
                }
            }
            return rows;
        }

        for configured in &self.config.attributes {
            let types = rows.entry(configured.as_str()).or_default();
            for fact in self.facts {
                if fact
                    .attributes
                    .iter()
                    .any(|attribute| attribute_matches(configured, attribute))
                {
                    types.insert(fact.type_path.as_str());
                }
            }
        }
        rows
    }

    /// Render the file.
    ///
    /// # Errors
    ///
    /// Fails when the configured namespace has a segment that is not a valid
    /// module name.
    pub fn render(&self) -> Result<String> {
        let namespace = match self.config.namespace_for_generations.as_deref() {
            Some(ns) => namespace_segments(ns)?,
            None => Vec::new(),
        };

        let mut builder = CodeBuilder::new().raw(GENERATED_HEADER).blank();
        for segment in &namespace {
            builder = builder.line(&format!("pub mod {segment} {{")).indent();
        }
        builder = self.render_body(builder);
        for _ in &namespace {
            builder = builder.dedent().line("}");
        }
        Ok(builder.build())
    }

    pub fn artifact(&self) -> Result<Artifact> {
        Ok(Artifact::new(Self::FILE_NAME, self.render()?))
    }

    fn render_body(&self, builder: CodeBuilder) -> CodeBuilder {
        builder
            .doc("Types collected by the attributes they carry.")
            .line("pub const TYPES_BY_ATTRIBUTE: &[(&str, &[&str])] = &[")
            .indent()
            .each(self.rows(), |b, (attribute, types)| {
                let key = escape_literal(attribute);
                if types.is_empty() {
                    return b.line(&format!("(\"{key}\", &[]),"));
                }
                b.block(&format!("(\"{key}\", &["), "]),", |b| {
                    b.each(types, |b, ty| {
                        b.line(&format!("\"{}\",", escape_literal(ty)))
                    })
                })
            })
            .dedent()
            .line("];")
            .when(!self.config.partial, render_accessors)
    }
}

/// Split a namespace written as `a::b` or `a.b` into module names.
fn namespace_segments(namespace: &str) -> Result<Vec<&str>> {
    let mut segments = Vec::new();
    for segment in namespace.split("::").flat_map(|s| s.split('.')).map(str::trim) {
        if segment.is_empty() {
            continue;
        }
        if !is_module_name(segment) {
            bail!("namespace '{namespace}' has an invalid module name '{segment}'");
        }
        segments.push(segment);
    }
    Ok(segments)
}

fn is_module_name(segment: &str) -> bool {
    let mut chars = segment.chars();
    let starts_well = chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_');
    starts_well && segment != "_" && chars.all(|c| c.is_alphanumeric() || c == '_')
}

fn render_accessors(builder: CodeBuilder) -> CodeBuilder {
    builder
        .blank()
        .doc("Types carrying `attribute`.")
        .block(
            "pub fn types_with(attribute: &str) -> &'static [&'static str] {",
            "}",
            |b| {
                b.line("TYPES_BY_ATTRIBUTE")
                    .indent()
                    .line(".iter()")
                    .line(".find(|(name, _)| *name == attribute)")
                    .line(".map(|(_, types)| *types)")
                    .line(".unwrap_or(&[])")
                    .dedent()
            },
        )
        .blank()
        .doc("Types carrying any of `attributes`, sorted and without duplicates.")
        .block(
            "pub fn types_with_any(attributes: &[&str]) -> Vec<&'static str> {",
            "}",
            |b| {
                b.line("let mut types: Vec<&'static str> = attributes")
                    .indent()
                    .line(".iter()")
                    .line(".flat_map(|attribute| types_with(attribute).iter().copied())")
                    .line(".collect();")
                    .dedent()
                    .line("types.sort_unstable();")
                    .line("types.dedup();")
                    .line("types")
            },
        )
}
