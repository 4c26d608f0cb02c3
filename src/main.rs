//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `domain_grade` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use domain_grade::initialization::init_logger_with;
use domain_grade::{run_server, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; flags and the real environment still apply
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Ignoring unreadable .env file: {}", e);
        }
    }

    let config = Config::parse();

    let log_level = config.log_level.clone();
    let log_format = config.log_format.clone();
    init_logger_with(log_level.into(), log_format).context("Failed to initialize logger")?;

    if let Err(e) = run_server(config).await {
        eprintln!("domain_grade error: {:#}", e);
        process::exit(1);
    }
    Ok(())
}
