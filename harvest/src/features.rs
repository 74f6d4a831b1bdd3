//! Built-in feature registry.
//!
//! Every command sees the same set of features, registered in a fixed order.

use harvester_attributes::CollectTypesWithAttributesGenerator;
use harvester_pipeline::Pipeline;

/// A pipeline holding every built-in feature.
pub fn pipeline() -> Pipeline {
    Pipeline::new().feature(CollectTypesWithAttributesGenerator::new())
}
