//! # Up Command Implementation
//!
//! Resolves every unit in the manifest and creates or updates it in
//! ConfigHub:
//!
//! 1. Load and validate the manifest.
//! 2. Clone or update each repository and produce unit content.
//! 3. Load the `cub` credentials and reconcile against ConfigHub.
//!
//! With `--dry-run` the command stops after step 2 and prints the plan;
//! credentials are not read and ConfigHub is not contacted.

use anyhow::Result;
use clap::Args;

use cub_compose::client::ConfigHubClient;
use cub_compose::context::ContextLoader;
use cub_compose::output::{count, emoji, format_labels, OutputConfig};
use cub_compose::reconcile::{ApplyReport, Reconciler};
use cub_compose::repository::RepositoryManager;
use cub_compose::resolver::{ManifestResolver, Resolution};
use cub_compose::suggestions;

use crate::cli::GlobalArgs;

/// Arguments for the up command
#[derive(Args, Debug)]
pub struct UpArgs {
    /// Show what would be synced without contacting ConfigHub
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

/// Execute the up command
pub fn execute(args: UpArgs, global: &GlobalArgs) -> Result<()> {
    let out = global.output();
    println!(
        "{} Loading manifest {}",
        emoji(&out, "📋", "[LOAD]"),
        global.manifest_path().display()
    );
    let manifest = global.load_manifest()?;

    println!("{} Resolving units...", emoji(&out, "🔍", "[SCAN]"));
    let repositories = RepositoryManager::new(global.cache_root());
    let resolution =
        ManifestResolver::new(&repositories, global.resolve_options()).resolve(&manifest)?;
    println!(
        "   Found {} in {}",
        count(resolution.units.len(), "unit"),
        count(resolution.spaces.len(), "space")
    );

    if args.dry_run || global.verbose {
        print_plan(&out, &resolution);
    }

    if args.dry_run {
        println!();
        println!("{} Dry run - no changes made", emoji(&out, "🔎", "[DRY]"));
        return Ok(());
    }

    let confighub_dir = global.confighub_dir();
    let credentials = ContextLoader::new(&confighub_dir)
        .load_credentials()
        .map_err(|e| suggestions::from_error(e, &confighub_dir))?;
    let client = ConfigHubClient::from_credentials(&credentials)?;

    println!();
    println!(
        "{} Syncing to {}...",
        emoji(&out, "🔄", "[SYNC]"),
        credentials.server_url
    );
    let report = Reconciler::new(&client)
        .apply(&resolution.spaces, &resolution.units)
        .map_err(|e| {
            println!("{} Sync failed", emoji(&out, "❌", "[ERR]"));
            suggestions::from_error(e, &confighub_dir)
        })?;

    print_report(&out, &report);
    Ok(())
}

fn print_plan(out: &OutputConfig, resolution: &Resolution) {
    for space in &resolution.spaces {
        println!(
            "   space {} {}",
            out.key(&space.name),
            out.dim(&format_labels(&space.labels))
        );
    }
    for unit in &resolution.units {
        let size = unit.content.as_ref().map_or(0, Vec::len);
        println!(
            "   - {} ({} bytes) {}",
            out.key(&unit.key()),
            size,
            out.dim(&format_labels(&unit.labels))
        );
    }
}

fn print_report(out: &OutputConfig, report: &ApplyReport) {
    for space in &report.spaces_created {
        println!("   {} created space {}", emoji(out, "✨", "+"), space);
    }
    for unit in &report.units_created {
        println!("   {} created {}", emoji(out, "✅", "+"), unit);
    }
    for unit in &report.units_updated {
        println!("   {} updated {}", emoji(out, "✅", "~"), unit);
    }
    println!();
    println!(
        "{} Done: {} created, {} updated",
        emoji(out, "🎉", "[DONE]"),
        count(report.units_created.len(), "unit"),
        report.units_updated.len()
    );
}
