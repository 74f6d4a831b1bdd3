//! Build command report data structures.

use std::path::PathBuf;

use super::output::{Output, Report};

/// Report data from building one module.
#[derive(Debug)]
pub struct BuildReport {
    pub module: String,
    /// Config file the build used, if any.
    pub config_path: Option<PathBuf>,
    pub output_dir: PathBuf,
    /// One entry per feature, in run order.
    pub features: Vec<FeatureSummary>,
    /// Artifacts and metadata, in write order.
    pub written: Vec<WrittenFile>,
    /// Rendered diagnostics.
    pub errors: Vec<String>,
    /// Path to debug snapshots, if visualization was enabled.
    pub debug_dir: Option<PathBuf>,
}

/// What one feature did during the build.
#[derive(Debug)]
pub struct FeatureSummary {
    pub name: String,
    pub action: String,
    pub facts_local: usize,
    pub facts_recovered: usize,
}

#[derive(Debug)]
pub struct WrittenFile {
    pub name: String,
    /// Whether the file content changed on disk.
    pub changed: bool,
    /// Whether the file was emptied.
    pub cleared: bool,
}

impl BuildReport {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

impl Report for BuildReport {
    fn render(&self, out: &mut dyn Output) {
        if let Some(debug_dir) = &self.debug_dir {
            out.key_value(
                "Pipeline snapshots written to",
                &debug_dir.display().to_string(),
            );
            out.newline();
        }

        for error in &self.errors {
            out.error(error);
        }

        out.key_value("Module", &self.module);
        match &self.config_path {
            Some(path) => out.key_value("Config", &path.display().to_string()),
            None => out.key_value("Config", "none"),
        }
        out.newline();

        out.section(&format!("Features ({})", self.features.len()));
        for feature in &self.features {
            out.list_item(&format!(
                "{}: {} ({} local, {} upstream)",
                feature.name, feature.action, feature.facts_local, feature.facts_recovered
            ));
        }
        out.newline();

        let changed: Vec<&WrittenFile> = self.written.iter().filter(|f| f.changed).collect();
        if changed.is_empty() {
            out.key_value("Up to date", &self.output_dir.display().to_string());
            return;
        }

        out.section(&format!("Written to {}", self.output_dir.display()));
        for file in changed {
            if file.cleared {
                out.removed_item(&format!("{} (cleared)", file.name));
            } else {
                out.added_item(&file.name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::output::BufferOutput;

    fn report(written: Vec<WrittenFile>) -> BuildReport {
        BuildReport {
            module: "shop".into(),
            config_path: None,
            output_dir: PathBuf::from("out"),
            features: vec![FeatureSummary {
                name: "CollectTypesWithAttributesGenerator".into(),
                action: "generate files".into(),
                facts_local: 2,
                facts_recovered: 3,
            }],
            written,
            errors: Vec::new(),
            debug_dir: None,
        }
    }

    #[test]
    fn test_render_written_files() {
        let mut out = BufferOutput::default();
        report(vec![
            WrittenFile {
                name: "types_by_attributes.g.rs".into(),
                changed: true,
                cleared: false,
            },
            WrittenFile {
                name: "harvest.metadata.json".into(),
                changed: false,
                cleared: false,
            },
        ])
        .render(&mut out);

        let text = out.text();
        assert!(text.contains(
            "CollectTypesWithAttributesGenerator: generate files (2 local, 3 upstream)"
        ));
        assert!(text.contains("  + types_by_attributes.g.rs"));
        assert!(!text.contains("harvest.metadata.json"));
    }

    #[test]
    fn test_render_up_to_date() {
        let mut out = BufferOutput::default();
        report(Vec::new()).render(&mut out);
        assert!(out.text().contains("Up to date: out"));
    }
}
