//! # List Command Implementation
//!
//! Lists every declared space, in manifest order and under its final
//! (prefixed) name, with the units it holds. Empty spaces are shown with
//! zero units. Only the manifest is read.

use anyhow::Result;

use cub_compose::output::{count, emoji, format_labels};
use cub_compose::resolver::{declared_spaces, resolve_names_only};

use crate::cli::GlobalArgs;

/// Execute the ls command
pub fn execute(global: &GlobalArgs) -> Result<()> {
    let out = global.output();
    let manifest = global.load_manifest()?;
    let spaces = declared_spaces(&manifest);
    let units = resolve_names_only(&manifest);

    for space in &spaces {
        println!(
            "{} {} {}",
            emoji(&out, "📁", "*"),
            out.key(&space.name),
            out.dim(&format!(
                "({}, {})",
                space.repo_url,
                count(space.unit_count, "unit")
            ))
        );
        for unit in units
            .iter()
            .filter(|u| u.space_name == space.name && u.repo_url == space.repo_url)
        {
            let source = match &unit.cmd {
                Some(cmd) => format!("cmd: {}", cmd),
                None => "files".to_string(),
            };
            println!(
                "   - {} {} {}",
                unit.unit_name,
                out.dim(&format!("[dir: {}, {}]", unit.dir, source)),
                out.dim(&format_labels(&unit.labels))
            );
        }
    }

    println!();
    println!(
        "{} in {}",
        count(units.len(), "unit"),
        count(spaces.len(), "space")
    );
    Ok(())
}
