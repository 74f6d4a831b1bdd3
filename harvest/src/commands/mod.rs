mod build;
mod check;
mod clean;
mod inspect;

use build::BuildCommand;
use check::CheckCommand;
use clap::{ArgAction, Parser, Subcommand};
use clean::CleanCommand;
use eyre::Result;
use inspect::InspectCommand;

/// Extension trait for exiting on config errors with pretty formatting
pub(crate) trait UnwrapOrExit<T> {
    fn unwrap_or_exit(self) -> T;
}

impl<T> UnwrapOrExit<T> for harvester_config::Result<T> {
    fn unwrap_or_exit(self) -> T {
        match self {
            Ok(v) => v,
            Err(e) => {
                eprintln!("{:?}", miette::Report::new(*e));
                std::process::exit(1);
            }
        }
    }
}

#[derive(Parser)]
#[command(name = "harvest")]
#[command(version)]
#[command(about = "Harvest facts from Rust sources and generate code from them")]
pub(crate) struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    pub fn run(&self) -> Result<()> {
        match &self.command {
            Commands::Build(cmd) => cmd.run(),
            Commands::Check(cmd) => cmd.run(),
            Commands::Inspect(cmd) => cmd.run(),
            Commands::Clean(cmd) => cmd.run(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run every feature over a module and write its artifacts
    Build(BuildCommand),

    /// Show what each feature would do with a config
    Check(CheckCommand),

    /// List the facts cached in a module's metadata
    Inspect(InspectCommand),

    /// Remove generated artifacts from an output directory
    Clean(CleanCommand),
}
