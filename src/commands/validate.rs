//! # Validate Command Implementation
//!
//! Parses the manifest and checks its structural rules (required fields,
//! exactly one of `cmd`/`files` per unit, relative directories, unique
//! `space/unit` pairs after prefixing), then prints a summary.
//!
//! This is a read-only operation: no repository is cloned and ConfigHub is
//! not contacted.

use anyhow::Result;

use cub_compose::config;
use cub_compose::output::{count, emoji, format_labels};
use cub_compose::resolver::{declared_spaces, space_labels};
use cub_compose::suggestions;

use crate::cli::GlobalArgs;

/// Execute the validate command
pub fn execute(global: &GlobalArgs) -> Result<()> {
    let out = global.output();
    let path = global.manifest_path();
    println!(
        "{} Validating manifest: {}",
        emoji(&out, "🔍", "[SCAN]"),
        path.display()
    );

    if !path.exists() {
        return Err(suggestions::manifest_not_found(path));
    }
    let manifest = match config::from_file(path) {
        Ok(manifest) => manifest,
        Err(e) => {
            println!("{} Manifest is invalid", emoji(&out, "❌", "[ERR]"));
            return Err(e.into());
        }
    };

    let spaces = declared_spaces(&manifest);
    let unit_total: usize = spaces.iter().map(|s| s.unit_count).sum();
    let empty = spaces.iter().filter(|s| s.unit_count == 0).count();

    println!("\n{} Manifest Summary:", emoji(&out, "📊", "[INFO]"));
    if let Some(project) = &manifest.project {
        println!("   Project: {}", project);
    }
    if !manifest.name_prefix.is_empty() {
        println!("   Space name prefix: {}", manifest.name_prefix);
    }
    let labels = space_labels(&manifest);
    if !labels.is_empty() {
        println!("   Space labels: {}", format_labels(&labels));
    }
    println!("   Repositories: {}", manifest.configs.len());
    println!("   Spaces: {} ({} empty)", spaces.len(), empty);
    println!("   Units: {}", unit_total);

    println!(
        "\n{} Manifest is valid ({})",
        emoji(&out, "✅", "[OK]"),
        count(unit_total, "unit")
    );
    Ok(())
}
