//! Tamly CLI entry point.

use clap::Parser;

use tamly::cli::{init_tracing, load_config, Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // An unloadable config falls back to default logging here; the
    // command itself reports the load error properly.
    let logging = load_config(cli.config.as_ref())
        .map(|config| config.logging)
        .unwrap_or_default();
    init_tracing(&logging);

    let result = match cli.command {
        Commands::Ask(args) => tamly::cli::commands::ask::execute(args, cli.config.as_ref(), cli.json).await,
        Commands::Chat(args) => tamly::cli::commands::chat::execute(args, cli.config.as_ref()).await,
        Commands::Config(args) => {
            tamly::cli::commands::config::execute(args, cli.config.as_ref(), cli.json).await
        }
    };

    if let Err(err) = result {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}
