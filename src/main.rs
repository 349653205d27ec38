// ABOUTME: Entry point for the strofi CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use std::env;
use strofi::config::{self, Config};
use strofi::error::Result;
use strofi::output::Output;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let output = Output::new(cli.output_mode());
    let result = run(cli, output).await;

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, output: Output) -> Result<()> {
    match cli.command {
        Commands::Init { app, force } => {
            let cwd = env::current_dir()?;
            config::init_config(&cwd, app.as_deref(), force)
        }
        Commands::Deploy {
            destination,
            force,
            yes,
        } => {
            let config = load_config(destination.as_deref())?;
            commands::deploy(config, force, yes, output).await
        }
        Commands::Rollback { destination } => {
            let config = load_config(destination.as_deref())?;
            commands::rollback(config, output).await
        }
        Commands::Releases { destination } => {
            let config = load_config(destination.as_deref())?;
            commands::releases(config, output).await
        }
    }
}

fn load_config(destination: Option<&str>) -> Result<Config> {
    let cwd = env::current_dir()?;
    let config = Config::discover(&cwd)?;

    match destination {
        Some(dest) => config.for_destination(dest),
        None => Ok(config),
    }
}
