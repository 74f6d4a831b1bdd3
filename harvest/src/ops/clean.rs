//! Clean operation - remove generated artifacts.

use std::{fs, path::Path};

use eyre::{Context, Result};
use harvester_pipeline::METADATA_FILE_NAME;

use crate::reports::CleanReport;

const ARTIFACT_SUFFIX: &str = ".g.rs";

/// Options for the clean operation.
pub struct CleanOptions<'a> {
    /// Output directory containing generated files.
    pub output_dir: &'a Path,
    /// Whether to preview without deleting.
    pub dry_run: bool,
}

/// Execute the clean operation.
///
/// Removes every `*.g.rs` artifact and the module metadata from the output
/// directory. Other files are left alone. A missing directory is already
/// clean.
pub fn clean(opts: CleanOptions) -> Result<CleanReport> {
    let mut deleted = Vec::new();

    if opts.output_dir.is_dir() {
        let entries = fs::read_dir(opts.output_dir)
            .wrap_err_with(|| format!("Failed to read '{}'", opts.output_dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !path.is_file() || !is_generated(name) {
                continue;
            }
            if !opts.dry_run {
                fs::remove_file(&path)
                    .wrap_err_with(|| format!("Failed to remove '{}'", path.display()))?;
            }
            deleted.push(name.to_owned());
        }
    }
    deleted.sort();

    Ok(CleanReport {
        dry_run: opts.dry_run,
        deleted,
    })
}

fn is_generated(name: &str) -> bool {
    name.ends_with(ARTIFACT_SUFFIX) || name == METADATA_FILE_NAME
}
