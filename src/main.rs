//! Stylize CLI - Neural Style Transfer
//!
//! Command-line interface for the style-transfer inference bridge.

use clap::Parser;
use env_logger::Env;
use log::info;

use stylize::cli::{commands, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    info!("Stylize v{}", env!("CARGO_PKG_VERSION"));

    let config = cli.resolve_config()?;

    match cli.command {
        Some(cmd) => handle_command(cmd, config).await,
        None => {
            println!("Stylize v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

async fn handle_command(cmd: Commands, config: stylize::BridgeConfig) -> anyhow::Result<()> {
    match cmd {
        Commands::Styles => commands::list_styles(&config),
        Commands::Run {
            input,
            width,
            height,
            style,
            strength,
            output,
            mock,
        } => {
            commands::run(config, &input, width, height, &style, strength, &output, mock).await
        }
        Commands::Inspect { style, mock } => commands::inspect(config, &style, mock).await,
    }
}
