//! Inspect operation - decode the facts cached in module metadata.

use std::{collections::BTreeMap, fs, path::Path};

use eyre::{Result, WrapErr};
use harvester_pipeline::{CACHE_ARTIFACT_SUFFIX, ModuleMetadata, parse_embedded};

use crate::{
    features,
    reports::{InspectReport, InspectedFeature},
};

/// Execute the inspect operation.
///
/// Groups the annotations of one metadata file, or one cache artifact, by
/// feature. Values of built-in features are decoded; values that fail to
/// decode, or belong to unknown features, are shown raw.
pub fn inspect(path: &Path) -> Result<InspectReport> {
    let metadata = if is_cache_artifact(path) {
        load_cache_artifact(path)?
    } else {
        ModuleMetadata::load(path)?
    };
    let pipeline = features::pipeline();

    let mut grouped: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for annotation in &metadata.annotations {
        grouped
            .entry(annotation.feature.as_str())
            .or_default()
            .push(annotation.value.as_str());
    }

    let features = grouped
        .into_iter()
        .map(|(name, values)| {
            let feature = pipeline.find(name);
            let facts = values
                .into_iter()
                .map(|value| match feature.map(|f| f.describe(value)) {
                    Some(Ok(described)) => described,
                    Some(Err(err)) => format!("{value} (undecodable: {err})"),
                    None => value.to_owned(),
                })
                .collect();
            InspectedFeature {
                name: name.to_owned(),
                known: feature.is_some(),
                facts,
            }
        })
        .collect();

    Ok(InspectReport {
        module: metadata.module.to_string(),
        references: metadata.references.iter().map(ToString::to_string).collect(),
        features,
    })
}

fn is_cache_artifact(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(CACHE_ARTIFACT_SUFFIX))
}

/// Rebuild metadata from a cache artifact. The artifact does not record its
/// module, so the name of the directory holding it stands in.
fn load_cache_artifact(path: &Path) -> Result<ModuleMetadata> {
    let text = fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read '{}'", path.display()))?;
    let annotations = parse_embedded(&text)
        .wrap_err_with(|| format!("'{}' is not a valid cache artifact", path.display()))?;
    let module = path
        .parent()
        .and_then(|dir| dir.file_name())
        .and_then(|name| name.to_str())
        .unwrap_or("unknown");
    Ok(ModuleMetadata::new(module).with_annotations(annotations))
}
