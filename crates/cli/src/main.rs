//! sfsync - Salesforce account sync
//!
//! Main entry point for the command-line tool.

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use sfsync_cli::{logging, Cli};
use tracing::debug;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logging first so the .env outcome is visible
    let _guard = match logging::init(cli.verbose, Path::new(".")) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("Error: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    match dotenvy::dotenv() {
        Ok(path) => debug!(path = %path.display(), "loaded .env"),
        Err(err) => debug!(error = %err, "no .env loaded"),
    }

    match sfsync_cli::run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
