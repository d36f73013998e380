//! ShapeCAD CLI - Command-line interface
//!
//! Thin driver over the conversion engine: argument parsing, configuration
//! layering, Ctrl-C cancellation and human or JSON output.

mod cli;
mod commands;
mod config_loader;
mod errors;
mod output;
mod output_types;
mod progress;

use anyhow::Result;
use clap::Parser;
use cli::Cli;

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();
    let json = cli.json;

    // Create async runtime
    let runtime = tokio::runtime::Runtime::new()?;

    // Execute the command
    if let Err(error) = runtime.block_on(async { commands::execute(cli).await }) {
        let cli_error = errors::from_anyhow(error);
        if json {
            eprintln!("{}", serde_json::to_string_pretty(&cli_error.to_json())?);
        } else {
            cli_error.display();
        }
        std::process::exit(cli_error.exit_code);
    }

    Ok(())
}
