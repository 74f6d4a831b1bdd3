//! Configuration resolution for harvester features.
//!
//! A project carries a single config source (`codegen.config.json`, or its
//! TOML twin) holding one top-level section per feature. Each feature looks up
//! its own section by a name derived from its config type name and decodes it
//! into a typed [`FeatureConfig`]. Decode failures never escape: they are
//! captured inside a [`ConfigParseResult`].

// Miette's derive macro generates code that triggers these warnings
#![allow(unused_assignments)]

mod error;
mod resolve;
mod source;

pub use error::{Error, Result, SourceContext};
pub use resolve::{
    CONFIG_SUFFIX, ConfigParseResult, FeatureConfig, default_enabled, parse_section, resolve,
    resolve_text,
};
pub use source::{CONFIG_FILE_STEM, ConfigFormat, ConfigSource};
