//! # cub-compose CLI
//!
//! Binary entry point for the `cub-compose` command-line tool: parses
//! arguments with `clap` and dispatches to a subcommand. The work itself
//! lives in the `cub_compose` library crate.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
