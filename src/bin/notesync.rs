//! Notesync CLI Binary
//!
//! Command-line interface for the directory-backed note synchronizer.

use anyhow::Context;
use clap::Parser;
use notesync::logging::init_logging;
use notesync::tooling::cli::{Cli, CliContext};
use std::process;

fn run() -> anyhow::Result<String> {
    let cli = Cli::parse();

    let context = CliContext::new(cli.config.clone(), cli.base_path.clone(), cli.read_only)
        .context("Error loading configuration")?;

    let logging = cli.logging_config(&context.config().logging);
    init_logging(Some(&logging)).context("Error initializing logging")?;

    Ok(context.execute(&cli.command)?)
}

fn main() {
    match run() {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}
