// Allow common clippy pedantic lints
#![allow(clippy::must_use_candidate)]
#![allow(clippy::needless_pass_by_value)]

//! Workday connector CLI
//!
//! Command-line interface for building requests and normalizing responses

use clap::Parser;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use workday_connector::cli::{Cli, Runner};

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries messages
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    let runner = Runner::new(cli);

    if let Err(e) = runner.run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
