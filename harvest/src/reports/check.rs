//! Check command report data structures.

use std::{path::PathBuf, sync::Arc};

use harvester_pipeline::Action;
use miette::GraphicalReportHandler;

use super::output::{Output, Report};

/// Report data from config resolution.
#[derive(Debug)]
pub struct CheckReport {
    /// Path to the config file, if one was found.
    pub config_path: Option<PathBuf>,
    /// One entry per built-in feature.
    pub plans: Vec<FeaturePlan>,
}

/// The action one feature would take.
#[derive(Debug)]
pub struct FeaturePlan {
    pub name: String,
    pub action: Action,
    pub error: Option<Arc<harvester_config::Error>>,
}

impl CheckReport {
    /// Whether the check passed (no config errors).
    pub fn is_valid(&self) -> bool {
        self.plans.iter().all(|p| p.error.is_none())
    }
}

impl Report for CheckReport {
    fn render(&self, out: &mut dyn Output) {
        let handler = GraphicalReportHandler::new();
        for error in self.plans.iter().filter_map(|p| p.error.as_deref()) {
            let mut rendered = String::new();
            match handler.render_report(&mut rendered, error) {
                Ok(()) => out.error(&rendered),
                Err(_) => out.error(&format!("error: {error}")),
            }
        }

        match &self.config_path {
            Some(path) => out.key_value("Config", &path.display().to_string()),
            None => out.key_value("Config", "none found"),
        }
        out.newline();

        out.section("Features");
        for plan in &self.plans {
            out.list_item(&format!("{}: {}", plan.name, plan.action));
        }

        if self.is_valid() {
            out.newline();
            out.preformatted("✓ config is valid");
        }
    }
}
