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
pub struct BuildCommand {
    /// Name of the module being built; qualifies every harvested type
    #[arg(short, long)]
    pub module: String,

    /// Directory holding the module's `.rs` sources
    #[arg(short, long, default_value = "src")]
    pub src: PathBuf,

    /// Directory artifacts and metadata are written to
    #[arg(short, long)]
    pub out: PathBuf,

    /// Config file (defaults to the first codegen.config.* next to the sources)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Metadata file of a referenced module (repeatable)
    #[arg(short, long = "reference")]
    pub references: Vec<PathBuf>,

    /// Write per-feature pass snapshots to <out>/.harvest/debug
    #[arg(long)]
    pub visualize: bool,
}

impl BuildCommand {
    pub fn run(&self) -> Result<()> {
        let config = match &self.config {
            Some(path) => Some(ConfigSource::open(path)),
            None => ops::build::discover_config(&self.src).unwrap_or_exit(),
        };

        let report = ops::build(ops::build::BuildOptions {
            module: &self.module,
            src_dir: &self.src,
            out_dir: &self.out,
            config: config.as_ref(),
            references: &self.references,
            visualize: self.visualize,
        })?;

        report.render(&mut TerminalOutput::new());
        if report.has_errors() {
            std::process::exit(1);
        }
        Ok(())
    }
}
