//! Crucible CLI entry point.

use clap::Parser;

use crucible::cli::{handle_error, Cli, Commands};
use crucible::infrastructure::config::ConfigLoader;
use crucible::infrastructure::logging;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(err) => handle_error(err, cli.json),
    };

    if let Err(err) = logging::init(&config.logging) {
        handle_error(err, cli.json);
    }

    let result = match &cli.command {
        Commands::Init(args) => crucible::cli::commands::init::execute(args, cli.json),
        Commands::Run(args) => crucible::cli::commands::run::execute(args, &config, cli.json).await,
        Commands::Status(args) => {
            crucible::cli::commands::status::execute(args, &config, cli.json).await
        }
        Commands::Results(args) => {
            crucible::cli::commands::results::execute(args, &config, cli.json).await
        }
    };

    if let Err(err) = result {
        handle_error(err, cli.json);
    }
}
