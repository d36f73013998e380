//! Command implementations

mod analyze;
mod config;
mod convert;
mod crs;

use crate::cli::{Cli, Commands};
use crate::output::OutputWriter;
use anyhow::Result;

/// Execute a CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Convert(args) => convert::execute(args, config_path, &output).await,
        Commands::Analyze(args) => analyze::execute(args, &output),
        Commands::Crs(args) => crs::execute(args, &output),
        Commands::Config => config::execute(config_path, &output),
    }
}
