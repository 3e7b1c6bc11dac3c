//! Command-line interface.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "crucible",
    about = "Evaluation harness for cognitive agents: runs trial batches and scores them along nine quality dimensions",
    version
)]
pub struct Cli {
    /// Emit JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    /// Path to a configuration file (default: .crucible/config.yaml)
    #[arg(long, global = true, env = "CRUCIBLE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the project-local .crucible directory and default config
    Init(commands::init::InitArgs),
    /// Run an experiment from a spec file
    Run(commands::run::RunArgs),
    /// Show progress for an experiment
    Status(commands::status::StatusArgs),
    /// Show completed trials and score statistics
    Results(commands::results::ResultsArgs),
}

/// Print a top-level error and exit non-zero.
pub fn handle_error(err: anyhow::Error, json: bool) -> ! {
    if json {
        eprintln!(
            "{}",
            serde_json::json!({ "error": format!("{err:#}") })
        );
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1);
}
