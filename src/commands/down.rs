//! # Down Command Implementation
//!
//! Deletes the manifest's units from ConfigHub. Only final names are needed,
//! so no repository is cloned and no command runs. Units or spaces that do
//! not exist remotely are skipped, which makes repeated teardown harmless.
//!
//! Deletion is confirmed interactively unless `--force` is given. Without a
//! terminal to ask on, the command refuses rather than guessing.

use anyhow::Result;
use clap::Args;
use dialoguer::theme::ColorfulTheme;

use cub_compose::client::ConfigHubClient;
use cub_compose::context::ContextLoader;
use cub_compose::error::Error;
use cub_compose::output::{count, emoji, OutputConfig};
use cub_compose::reconcile::{remove_confirmed, AssumeYes, Confirm, RemoveReport};
use cub_compose::resolver::{resolve_names_only, ResolvedUnit};
use cub_compose::suggestions;

use crate::cli::GlobalArgs;

/// Arguments for the down command
#[derive(Args, Debug)]
pub struct DownArgs {
    /// Delete without asking for confirmation
    #[arg(long)]
    pub force: bool,
}

/// Asks on the terminal with a dialoguer prompt.
struct TerminalConfirm;

impl Confirm for TerminalConfirm {
    fn confirm(&self, units: &[ResolvedUnit]) -> cub_compose::error::Result<bool> {
        dialoguer::Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!(
                "Delete {} from ConfigHub?",
                count(units.len(), "unit")
            ))
            .default(false)
            .interact()
            .map_err(|e| Error::Io(std::io::Error::other(e.to_string())))
    }
}

/// Execute the down command
pub fn execute(args: DownArgs, global: &GlobalArgs) -> Result<()> {
    let out = global.output();
    println!(
        "{} Loading manifest {}",
        emoji(&out, "📋", "[LOAD]"),
        global.manifest_path().display()
    );
    let manifest = global.load_manifest()?;
    let units = resolve_names_only(&manifest);

    println!("   Found {} to delete", count(units.len(), "unit"));
    for unit in &units {
        println!("   - {}", out.key(&unit.key()));
    }
    if units.is_empty() {
        println!("{} Nothing to delete", emoji(&out, "✅", "[OK]"));
        return Ok(());
    }

    if !args.force && !console::user_attended_stderr() {
        anyhow::bail!(
            "Refusing to delete {} without confirmation\n\n\
             hint: Run in a terminal to confirm interactively\n\
             hint: Pass --force to skip the confirmation prompt",
            count(units.len(), "unit")
        );
    }

    println!();
    let confirm: &dyn Confirm = if args.force {
        &AssumeYes
    } else {
        &TerminalConfirm
    };
    let confighub_dir = global.confighub_dir();
    let report = remove_confirmed(&units, confirm, || {
        let credentials = ContextLoader::new(&confighub_dir).load_credentials()?;
        ConfigHubClient::from_credentials(&credentials)
    })
    .map_err(|e| suggestions::from_error(e, &confighub_dir))?;

    match report {
        Some(report) => print_report(&out, &report),
        None => println!("Aborted"),
    }
    Ok(())
}

fn print_report(out: &OutputConfig, report: &RemoveReport) {
    for unit in &report.units_deleted {
        println!("   {} deleted {}", emoji(out, "🗑️", "-"), unit);
    }
    for space in &report.spaces_missing {
        println!(
            "   {} space {} not found, its units were skipped",
            emoji(out, "⚠️", "!"),
            space
        );
    }
    println!();
    println!(
        "{} Done: {} deleted, {} skipped",
        emoji(out, "🎉", "[DONE]"),
        count(report.units_deleted.len(), "unit"),
        report.units_skipped.len()
    );
}
