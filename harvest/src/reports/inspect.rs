//! Inspect command report data structures.

use super::output::{Output, Report};

/// Report data from reading one module's metadata.
#[derive(Debug)]
pub struct InspectReport {
    pub module: String,
    pub references: Vec<String>,
    /// Annotations grouped by feature, sorted by feature name.
    pub features: Vec<InspectedFeature>,
}

#[derive(Debug)]
pub struct InspectedFeature {
    pub name: String,
    /// Whether the feature is built in, so its facts could be decoded.
    pub known: bool,
    pub facts: Vec<String>,
}

impl Report for InspectReport {
    fn render(&self, out: &mut dyn Output) {
        out.key_value("Module", &self.module);
        if self.references.is_empty() {
            out.key_value("References", "none");
        } else {
            out.key_value("References", &self.references.join(", "));
        }

        if self.features.is_empty() {
            out.newline();
            out.preformatted("No cached facts.");
            return;
        }

        for feature in &self.features {
            out.newline();
            let suffix = if feature.known { "" } else { ", unknown feature" };
            out.section(&format!(
                "{} ({} fact{}{})",
                feature.name,
                feature.facts.len(),
                if feature.facts.len() == 1 { "" } else { "s" },
                suffix
            ));
            for fact in &feature.facts {
                out.list_item(fact);
            }
        }
    }
}
