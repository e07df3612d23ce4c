//! # Build Tools CLI
//!
//! This is the binary entry point for the `build-tools` command-line tool.
//!
//! Its primary responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Setting up logging.
//! - Running the selected packager and reporting the outcome.
//!
//! The packaging logic lives in the `build_tools` library crate; the binary
//! is a thin wrapper around it.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
