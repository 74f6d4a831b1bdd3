//! Clean command report data structures.

use super::output::{Output, Report};

/// Report data from cleaning an output directory.
#[derive(Debug)]
pub struct CleanReport {
    /// Whether this was a dry run.
    pub dry_run: bool,
    /// Deleted file names, sorted.
    pub deleted: Vec<String>,
}

impl CleanReport {
    /// Whether any files were deleted (or would be deleted in dry run).
    pub fn has_deletions(&self) -> bool {
        !self.deleted.is_empty()
    }
}

impl Report for CleanReport {
    fn render(&self, out: &mut dyn Output) {
        if !self.has_deletions() {
            out.preformatted("No generated files found.");
            return;
        }

        if self.dry_run {
            out.section("Would delete");
        } else {
            out.section("Deleted");
        }
        for name in &self.deleted {
            out.removed_item(name);
        }
    }
}
