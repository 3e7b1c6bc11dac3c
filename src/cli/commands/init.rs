use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Args;

use crate::domain::models::Config;

#[derive(Args)]
pub struct InitArgs {
    /// Overwrite an existing configuration
    #[arg(long)]
    pub force: bool,
}

pub fn execute(args: &InitArgs, json: bool) -> Result<()> {
    let dir = Path::new(".crucible");
    let config_path = dir.join("config.yaml");

    if config_path.exists() && !args.force {
        bail!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        );
    }

    std::fs::create_dir_all(dir).context("failed to create .crucible directory")?;
    let yaml = serde_yaml::to_string(&Config::default())
        .context("failed to serialize default configuration")?;
    std::fs::write(&config_path, yaml).context("failed to write configuration")?;

    if json {
        println!(
            "{}",
            serde_json::json!({ "created": config_path.display().to_string() })
        );
    } else {
        println!("Initialized {}", config_path.display());
        println!("Set ANTHROPIC_API_KEY (or oracle.api_key / agent.api_key) before running experiments.");
    }
    Ok(())
}
