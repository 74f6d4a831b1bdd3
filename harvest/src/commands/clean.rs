use std::path::PathBuf;

use clap::Args;
use eyre::Result;

use crate::{
    ops,
    reports::{Report, TerminalOutput},
};

#[derive(Args)]
pub struct CleanCommand {
    /// Output directory of a previous build
    #[arg(short, long)]
    pub out: PathBuf,

    /// Preview what would be deleted without actually deleting
    #[arg(long)]
    pub dry_run: bool,
}

impl CleanCommand {
    pub fn run(&self) -> Result<()> {
        let report = ops::clean(ops::clean::CleanOptions {
            output_dir: &self.out,
            dry_run: self.dry_run,
        })?;

        report.render(&mut TerminalOutput::new());
        Ok(())
    }
}
