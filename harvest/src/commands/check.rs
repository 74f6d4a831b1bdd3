use std::path::PathBuf;

use clap::Args;
use eyre::Result;
use harvester_config::ConfigSource;

use super::UnwrapOrExit;
use crate::{
    ops,
    reports::{Report, TerminalOutput},
};

#[derive(Args)]
pub struct CheckCommand {
    /// Path to the config file (defaults to the first codegen.config.* in the current directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl CheckCommand {
    /// Run the check command
    pub fn run(&self) -> Result<()> {
        let config = match &self.config {
            Some(path) => Some(ConfigSource::open(path)),
            None => ConfigSource::discover(".").unwrap_or_exit(),
        };

        let report = ops::check(config.as_ref());
        report.render(&mut TerminalOutput::new());

        if !report.is_valid() {
            std::process::exit(1);
        }
        Ok(())
    }
}
