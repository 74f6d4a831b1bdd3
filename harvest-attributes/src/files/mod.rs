//! Artifacts rendered by the feature, one module per file.

pub use harvester_core::GENERATED_HEADER;

mod types_by_attributes;

pub use types_by_attributes::TypesByAttributes;
