//! cliconf — inspect layered configuration from the command line.
//!
//! Entry point and error handling boundary. Uses `anyhow` for
//! ergonomic error propagation and user-facing messages.

mod cli;

use std::process;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::args::Cli;
use cliconf::command;
use cliconf::constants;

fn main() {
    init_logging();
    if let Err(err) = run() {
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(constants::ENV_LOG)
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let options = cli.resolve_options();
    tracing::debug!(?options, "resolving configuration");

    let paths = options
        .layer_paths()
        .context("failed to locate configuration files")?;
    let tree = cli::command_tree(paths);

    command::run(&options, &tree, None)?
}
