//! CLI argument parsing and command dispatch

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::LevelFilter;

use cub_compose::config::{self, Manifest};
use cub_compose::defaults::{default_cache_root, default_confighub_dir, DEFAULT_MANIFEST_FILENAME};
use cub_compose::output::OutputConfig;
use cub_compose::resolver::ResolveOptions;
use cub_compose::suggestions;

use crate::commands;

/// cub-compose - Sync config units from Git repositories into ConfigHub
#[derive(Parser, Debug)]
#[command(name = "cub-compose")]
#[command(version, about)]
#[command(long_about = "cub-compose manages ConfigHub config units from multiple Git repositories.\n\n\
It reads a configs.yaml file that defines repos, spaces, and units, runs the\n\
configured commands (or concatenates the listed files) to produce each unit's\n\
content, and creates or updates the matching units in ConfigHub.\n\n\
Authentication uses the existing cub CLI credentials from ~/.confighub/")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalArgs,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Path to the manifest
    #[arg(
        short = 'f',
        long,
        global = true,
        value_name = "PATH",
        env = "CUB_COMPOSE_FILE",
        default_value = DEFAULT_MANIFEST_FILENAME
    )]
    pub file: PathBuf,

    /// Show per-unit progress and resolution detail
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Colorize output (always, never, auto)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    pub color: String,

    /// Set log level (error, warn, info, debug, trace); defaults to warn, or info with -v
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Directory holding cached repository working trees
    #[arg(long, global = true, value_name = "DIR", env = "CUB_COMPOSE_CACHE")]
    pub cache_root: Option<PathBuf>,

    /// Directory holding the cub CLI config and tokens (default ~/.confighub)
    #[arg(long, global = true, value_name = "DIR", env = "CUB_COMPOSE_CONFIGHUB_DIR")]
    pub confighub_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create or update config units in ConfigHub
    Up(commands::up::UpArgs),

    /// Delete the manifest's config units from ConfigHub
    Down(commands::down::DownArgs),

    /// Show the current cub context and verify authentication
    Status,

    /// List declared spaces and units
    Ls,

    /// Validate the manifest without touching any repository or ConfigHub
    Validate,
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(self.global.log_filter()?);

        match self.command {
            Commands::Up(args) => commands::up::execute(args, &self.global),
            Commands::Down(args) => commands::down::execute(args, &self.global),
            Commands::Status => commands::status::execute(&self.global),
            Commands::Ls => commands::ls::execute(&self.global),
            Commands::Validate => commands::validate::execute(&self.global),
        }
    }
}

fn init_logging(level: LevelFilter) {
    // A second initialization only happens in tests; keep the first logger.
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .target(env_logger::Target::Stderr)
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}

impl GlobalArgs {
    /// Explicit `--log-level` wins; otherwise warn, raised to info by `-v`.
    pub fn log_filter(&self) -> Result<LevelFilter> {
        match &self.log_level {
            Some(level) => LevelFilter::from_str(level)
                .with_context(|| format!("invalid --log-level {:?}", level)),
            None if self.verbose => Ok(LevelFilter::Info),
            None => Ok(LevelFilter::Warn),
        }
    }

    pub fn output(&self) -> OutputConfig {
        OutputConfig::from_env_and_flag(&self.color)
    }

    pub fn cache_root(&self) -> PathBuf {
        self.cache_root.clone().unwrap_or_else(default_cache_root)
    }

    pub fn confighub_dir(&self) -> PathBuf {
        self.confighub_dir
            .clone()
            .unwrap_or_else(default_confighub_dir)
    }

    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            verbose: self.verbose,
        }
    }

    pub fn manifest_path(&self) -> &Path {
        &self.file
    }

    /// Read and validate the manifest named by `--file`.
    pub fn load_manifest(&self) -> Result<Manifest> {
        if !self.file.exists() {
            return Err(suggestions::manifest_not_found(&self.file));
        }
        Ok(config::from_file(&self.file)?)
    }
}
