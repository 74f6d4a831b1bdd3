//! Report data structures for commands.
//!
//! This module provides data structures that separate data collection from rendering.
//! Commands build reports, then render them to an Output target.

mod build;
mod check;
mod clean;
mod inspect;
mod output;

pub use build::{BuildReport, FeatureSummary, WrittenFile};
pub use check::{CheckReport, FeaturePlan};
pub use clean::CleanReport;
pub use inspect::{InspectReport, InspectedFeature};
pub use output::{Report, TerminalOutput};
