//! Implementation of the `tamly config` command.

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::cli::load_config;
use crate::infrastructure::ConfigLoader;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print a commented sample configuration
    Sample,
    /// Print the resolved configuration (API key redacted)
    Show,
}

pub async fn execute(args: ConfigArgs, config_path: Option<&std::path::PathBuf>, json_mode: bool) -> Result<()> {
    match args.command {
        ConfigCommand::Sample => {
            println!("{}", ConfigLoader::sample_yaml()?);
        }
        ConfigCommand::Show => {
            let mut config = load_config(config_path)?;
            if !config.generation.api_key.is_empty() {
                config.generation.api_key = "[redacted]".to_string();
            }
            if json_mode {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                println!("{}", serde_yaml::to_string(&config)?);
            }
        }
    }
    Ok(())
}
