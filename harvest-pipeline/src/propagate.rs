//! Carrying facts across module boundaries.
//!
//! The write path turns a module's facts into annotations tagged with the
//! feature's identity. The read path walks every referenced module's
//! metadata and decodes the annotations of one feature, without touching any
//! upstream source.

use eyre::WrapErr;
use harvester_core::{Artifact, CancellationToken, Cancelled};
use thiserror::Error;

use crate::{
    Annotation, Feature, ModuleGraph, ModuleId, contain::contain, embed::render_embedded,
    feature::FactCodec,
};

/// Failure on the read path.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error(transparent)]
    Cancelled(#[from] Cancelled),

    #[error("cached fact `{value}` from module '{module}' could not be decoded")]
    Decode {
        module: ModuleId,
        value: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// Encode `facts` as annotations and render the cache artifact embedding them.
///
/// Facts are encoded in the order given.
pub fn write_annotations<F: Feature>(
    feature: &F,
    facts: &[F::Fact],
) -> eyre::Result<(Vec<Annotation>, Artifact)> {
    let codec = feature.codec();
    let annotations: Vec<Annotation> = facts
        .iter()
        .map(|fact| {
            contain(|| Ok(codec.encode(fact)))
                .map(|value| Annotation::new(feature.name(), value))
                .wrap_err_with(|| format!("failed to encode {fact:?}"))
        })
        .collect::<eyre::Result<_>>()?;

    let artifact = render_embedded(feature.cache_artifact_name(), &annotations);
    Ok((annotations, artifact))
}

/// Decode the facts `feature` cached in every module reachable from
/// `references`.
///
/// Facts are returned in module visiting order and are not deduplicated.
/// Cancellation is checked before every annotation.
pub fn read_facts<F: Feature>(
    feature: &F,
    graph: &ModuleGraph,
    references: &[ModuleId],
    cancel: &CancellationToken,
) -> Result<Vec<F::Fact>, ReadError> {
    let codec = feature.codec();
    let mut facts = Vec::new();

    for metadata in graph.transitive(references) {
        for annotation in metadata.annotations_for(feature.name()) {
            cancel.check()?;
            let fact = contain(|| codec.decode(&annotation.value)).map_err(|source| {
                ReadError::Decode {
                    module: metadata.module.clone(),
                    value: annotation.value.clone(),
                    source: source.into(),
                }
            })?;
            facts.push(fact);
        }
    }

    tracing::debug!(
        feature = feature.name(),
        modules = references.len(),
        facts = facts.len(),
        "recovered cached facts"
    );
    Ok(facts)
}
