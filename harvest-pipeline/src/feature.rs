//! The capability interface every harvesting feature implements.

use std::{fmt::Debug, hash::Hash};

use eyre::Result;
use harvester_config::FeatureConfig;
use harvester_core::{Artifact, short_type_name};
use harvester_syntax::{NodeContext, SyntaxNode};

/// File name suffix of every cache artifact.
pub const CACHE_ARTIFACT_SUFFIX: &str = ".cache.g.rs";

/// Encodes facts to compact strings and back.
///
/// `decode(encode(f)) == f` must hold for every fact the feature can
/// extract. Encoded values may contain any character; the embedding layer
/// escapes them for its own format.
pub trait FactCodec: Send + Sync {
    type Fact;

    fn encode(&self, fact: &Self::Fact) -> String;

    /// # Errors
    ///
    /// Returns an error when `value` was not produced by [`encode`](Self::encode).
    fn decode(&self, value: &str) -> Result<Self::Fact>;
}

/// One configurable harvesting capability.
///
/// A feature supplies its config type, how to recognise and extract facts
/// from declarations, how to encode them across module boundaries, and how to
/// render and clear its artifacts. The pipeline owns everything else:
/// deciding which of those to run and containing any failure they raise.
///
/// `matches`, `extract` and the codec must be deterministic and must not
/// depend on the order in which nodes are visited.
pub trait Feature: Send + Sync + 'static {
    type Config: FeatureConfig;
    type Fact: Clone + Eq + Ord + Hash + Debug + Send + Sync + 'static;
    type Codec: FactCodec<Fact = Self::Fact>;

    /// Identity used to tag annotations and diagnostics.
    fn name(&self) -> &'static str {
        short_type_name::<Self>()
    }

    /// Cheap structural predicate evaluated against every declaration.
    fn matches(&self, node: &SyntaxNode) -> bool;

    /// Produce a fact from a matched declaration, or decline with `None`.
    fn extract(&self, ctx: &NodeContext<'_>) -> Result<Option<Self::Fact>>;

    /// Whether locally extracted facts must pass [`filter`](Self::filter).
    #[allow(unused_variables)]
    fn needs_filtering(&self, config: &Self::Config) -> bool {
        false
    }

    #[allow(unused_variables)]
    fn filter(&self, fact: &Self::Fact, config: &Self::Config) -> bool {
        true
    }

    fn codec(&self) -> &Self::Codec;

    /// Render consumable artifacts from the full, sorted fact set.
    fn generate(&self, config: &Self::Config, facts: &[Self::Fact]) -> Result<Vec<Artifact>>;

    /// Names of the consumable artifacts this feature may have emitted.
    fn clear(&self) -> Result<Vec<String>>;

    /// Name of the artifact that embeds this feature's cached facts.
    fn cache_artifact_name(&self) -> String {
        format!("{}{CACHE_ARTIFACT_SUFFIX}", self.name())
    }
}
