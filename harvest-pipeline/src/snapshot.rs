//! Pipeline snapshot plugin for visualization and debugging.
//!
//! This module provides a plugin that captures each feature's pass output,
//! so the decisions of a build can be inspected after the fact.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{PoisonError, RwLock},
};

use eyre::{Result, WrapErr};
use serde::Serialize;

use crate::{PassOutput, Plugin};

/// The state of one feature's pass, as captured after it completed.
#[derive(Debug, Clone, Serialize)]
pub struct PassSnapshot {
    /// Position of the pass within the build.
    pub sequence: usize,
    #[serde(flatten)]
    pub output: PassOutput,
}

/// A plugin that captures every feature's pass output.
///
/// Used by `harvest build --visualize` to dump what each feature decided.
///
/// # Example
///
/// ```ignore
/// let pipeline = Pipeline::new()
///     .feature(CollectTypesWithAttributesGenerator::new())
///     .plugin(SnapshotPlugin::with_output_dir("target/harvest-debug"));
/// ```
pub struct SnapshotPlugin {
    snapshots: RwLock<Vec<PassSnapshot>>,
    output_dir: Option<PathBuf>,
}

impl SnapshotPlugin {
    pub fn new() -> Self {
        Self {
            snapshots: RwLock::new(Vec::new()),
            output_dir: None,
        }
    }

    /// Create a snapshot plugin that writes each snapshot to `output_dir` as
    /// soon as it is captured.
    pub fn with_output_dir(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            snapshots: RwLock::new(Vec::new()),
            output_dir: Some(output_dir.into()),
        }
    }

    /// Get all collected snapshots.
    pub fn snapshots(&self) -> Vec<PassSnapshot> {
        self.snapshots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Write all snapshots to `dir`, one `<feature>.json` file each.
    pub fn write_to_dir(&self, dir: impl AsRef<Path>) -> Result<()> {
        let snapshots = self.snapshots();
        for snapshot in &snapshots {
            write_snapshot(dir.as_ref(), snapshot)?;
        }
        Ok(())
    }
}

fn write_snapshot(dir: &Path, snapshot: &PassSnapshot) -> Result<()> {
    fs::create_dir_all(dir).wrap_err_with(|| format!("failed to create '{}'", dir.display()))?;
    let path = dir.join(format!("{}.json", snapshot.output.feature));
    let json = serde_json::to_string_pretty(snapshot)?;
    fs::write(&path, json).wrap_err_with(|| format!("failed to write '{}'", path.display()))?;
    Ok(())
}

impl Default for SnapshotPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for SnapshotPlugin {
    fn name(&self) -> &'static str {
        "snapshot"
    }

    fn on_after_pass(&self, _feature: &str, output: &mut PassOutput) -> Result<()> {
        let mut snapshots = self
            .snapshots
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let snapshot = PassSnapshot {
            sequence: snapshots.len(),
            output: output.clone(),
        };

        if let Some(dir) = &self.output_dir {
            write_snapshot(dir, &snapshot)?;
        }
        snapshots.push(snapshot);
        Ok(())
    }
}
