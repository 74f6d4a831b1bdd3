//! Core operations.
//!
//! This module contains the business logic for harvest commands,
//! separated from CLI argument parsing and output rendering.

pub mod build;
pub mod check;
pub mod clean;
pub mod inspect;

pub use build::build;
pub use check::check;
pub use clean::clean;
pub use inspect::inspect;
