//! Check operation - resolve every feature's config without building.

use harvester_config::ConfigSource;

use crate::{
    features,
    reports::{CheckReport, FeaturePlan},
};

/// Execute the check operation.
///
/// Resolves each built-in feature's config section and records the action
/// its next pass would take.
pub fn check(config: Option<&ConfigSource>) -> CheckReport {
    let plans = features::pipeline()
        .plan(config)
        .into_iter()
        .map(|(name, plan)| FeaturePlan {
            name: name.to_owned(),
            action: plan.action,
            error: plan.error,
        })
        .collect();

    CheckReport {
        config_path: config.map(|c| c.path().to_path_buf()),
        plans,
    }
}
