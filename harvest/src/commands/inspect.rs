use std::path::PathBuf;

use clap::Args;
use eyre::Result;

use crate::{
    ops,
    reports::{Report, TerminalOutput},
};

#[derive(Args)]
pub struct InspectCommand {
    /// Path to a harvest.metadata.json file or a <feature>.cache.g.rs artifact
    pub metadata: PathBuf,
}

impl InspectCommand {
    pub fn run(&self) -> Result<()> {
        let report = ops::inspect(&self.metadata)?;
        report.render(&mut TerminalOutput::new());
        Ok(())
    }
}
