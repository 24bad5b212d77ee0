use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use docchat::cli::commands::{
    handle_ask, handle_chat, handle_config, handle_db, handle_serve, handle_status,
    shutdown_signal,
};
use docchat::cli::{Cli, Commands};
use docchat::models::{Config, OutputFormat};

fn init_tracing(verbose: bool) {
    let default = if verbose { "docchat=debug,info" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let default_format = Config::load(cli.config.as_deref())
        .map(|c| c.output.default_format)
        .unwrap_or_default();
    let format = cli.format.unwrap_or(default_format);

    // The server drains connections on its own shutdown signal.
    let command = match cli.command {
        Commands::Serve(args) => return handle_serve(args, cli.config.as_deref()).await,
        other => other,
    };

    tokio::select! {
        result = run_command(command, cli.config, format, cli.verbose) => {
            result?;
        }
        _ = shutdown_signal() => {
            eprintln!("\nReceived shutdown signal, cleaning up...");
            tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
        }
    }

    Ok(())
}

async fn run_command(
    command: Commands,
    config: Option<std::path::PathBuf>,
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    let config = config.as_deref();
    match command {
        Commands::Db(args) => handle_db(args, config, format, verbose).await?,
        Commands::Ask(args) => handle_ask(args, config, format, verbose).await?,
        Commands::Chat(args) => handle_chat(args, config, format, verbose).await?,
        Commands::Status => handle_status(config, format, verbose).await?,
        Commands::Config(cmd) => handle_config(cmd, config, format).await?,
        Commands::Serve(args) => handle_serve(args, config).await?,
    }

    Ok(())
}
