//! # Manifest Resolution
//!
//! Turns a validated `Manifest` into the flat, ordered lists the reconciler
//! works from:
//!
//! - `ResolvedSpace`: final (prefixed) space name and its labels
//!   (project label, then common labels).
//! - `ResolvedUnit`: final space name, unit name, merged labels and content.
//!
//! Labels merge in four layers, later layers winning on key collisions:
//!
//! ```text
//! project  <  commonLabels  <  unitLabels (repository)  <  labels (unit)
//! ```
//!
//! Each repository is acquired once, no matter how many units it feeds.
//! Spaces without units produce nothing. Resolution stops at the first
//! error; there are no partial results.
//!
//! `resolve_names_only` is the cheap path for teardown and listing: final
//! names and labels only, no repository access and no content.

use std::path::Path;

use log::info;

use crate::config::{self, Labels, Manifest};
use crate::content::ContentResolver;
use crate::defaults::{DEFAULT_TOOLCHAIN_TYPE, PROJECT_LABEL_KEY};
use crate::error::{Error, Result};
use crate::repository::RepositorySource;

/// A space as it will exist remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSpace {
    /// Prefixed name; also the remote slug.
    pub name: String,
    pub labels: Labels,
}

/// A unit as it will exist remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUnit {
    pub repo_url: String,
    /// Prefixed space name.
    pub space_name: String,
    pub unit_name: String,
    pub dir: String,
    pub cmd: Option<String>,
    pub labels: Labels,
    pub toolchain_type: String,
    /// Resolved content; `None` on the names-only path.
    pub content: Option<Vec<u8>>,
}

impl ResolvedUnit {
    /// `space/unit`, the form used in progress output and error context.
    pub fn key(&self) -> String {
        format!("{}/{}", self.space_name, self.unit_name)
    }
}

/// Output of a full resolution.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Distinct spaces that have at least one unit, in first-seen order.
    pub spaces: Vec<ResolvedSpace>,
    /// Units in manifest order.
    pub units: Vec<ResolvedUnit>,
}

/// A declared space as listed to the operator, including empty ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredSpace {
    pub name: String,
    pub repo_url: String,
    pub unit_count: usize,
}

/// Knobs for a resolution run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveOptions {
    /// Log per-file and per-command detail at info level instead of debug.
    pub verbose: bool,
}

/// Merge label layers; a key in a later layer overrides the same key in an
/// earlier one.
pub fn merge_labels<'a, I>(layers: I) -> Labels
where
    I: IntoIterator<Item = &'a Labels>,
{
    let mut merged = Labels::new();
    for layer in layers {
        merged.extend(layer.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    merged
}

/// The project layer: `{project: <name>}` when the manifest names a project.
pub fn project_labels(manifest: &Manifest) -> Labels {
    manifest
        .project
        .iter()
        .filter(|name| !name.is_empty())
        .map(|name| (PROJECT_LABEL_KEY.to_string(), name.clone()))
        .collect()
}

/// Labels carried by every resolved space.
pub fn space_labels(manifest: &Manifest) -> Labels {
    merge_labels([&project_labels(manifest), &manifest.common_labels])
}

/// Resolves manifests against repositories.
pub struct ManifestResolver<'a> {
    source: &'a dyn RepositorySource,
    content: ContentResolver,
}

impl<'a> ManifestResolver<'a> {
    pub fn new(source: &'a dyn RepositorySource, options: ResolveOptions) -> Self {
        Self {
            source,
            content: ContentResolver::new(options.verbose),
        }
    }

    /// Acquire every repository and resolve every unit's content.
    pub fn resolve(&self, manifest: &Manifest) -> Result<Resolution> {
        let project = project_labels(manifest);
        let common_space_labels = space_labels(manifest);
        let mut resolution = Resolution::default();

        for repo in &manifest.configs {
            if repo.spaces.iter().all(|(_, space)| space.units.is_empty()) {
                info!("Skipping {}: no units declared", repo.repo);
                continue;
            }

            let root = self
                .source
                .ensure_working_tree(&repo.repo, repo.r#ref.as_deref())?;

            for (declared_space, space) in repo.spaces.iter() {
                if space.units.is_empty() {
                    continue;
                }
                let space_name = manifest.space_name(declared_space);
                if !resolution.spaces.iter().any(|s| s.name == space_name) {
                    resolution.spaces.push(ResolvedSpace {
                        name: space_name.clone(),
                        labels: common_space_labels.clone(),
                    });
                }

                for (unit_name, unit) in space.units.iter() {
                    let key = format!("{}/{}", space_name, unit_name);
                    info!("Resolving {}", key);

                    let source = unit.source().ok_or_else(|| {
                        Error::Validation {
                            message: "either 'cmd' or 'files' is required, not both".to_string(),
                            hint: None,
                        }
                        .with_context(key.clone())
                    })?;
                    let content = self
                        .content
                        .resolve(&root, &unit.dir, source)
                        .map_err(|e| e.with_context(key.clone()))?;

                    resolution.units.push(ResolvedUnit {
                        repo_url: repo.repo.clone(),
                        space_name: space_name.clone(),
                        unit_name: unit_name.to_string(),
                        dir: unit.dir.clone(),
                        cmd: unit.command().map(str::to_string),
                        labels: merge_labels([
                            &project,
                            &manifest.common_labels,
                            &repo.unit_labels,
                            &unit.labels,
                        ]),
                        toolchain_type: toolchain_type(unit.toolchain_type.as_deref()),
                        content: Some(content),
                    });
                }
            }
        }

        Ok(resolution)
    }
}

fn toolchain_type(declared: Option<&str>) -> String {
    declared
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_TOOLCHAIN_TYPE)
        .to_string()
}

/// Units with final names and labels, without touching any repository.
pub fn resolve_names_only(manifest: &Manifest) -> Vec<ResolvedUnit> {
    let project = project_labels(manifest);
    let mut units = Vec::new();

    for repo in &manifest.configs {
        for (declared_space, space) in repo.spaces.iter() {
            let space_name = manifest.space_name(declared_space);
            for (unit_name, unit) in space.units.iter() {
                units.push(ResolvedUnit {
                    repo_url: repo.repo.clone(),
                    space_name: space_name.clone(),
                    unit_name: unit_name.to_string(),
                    dir: unit.dir.clone(),
                    cmd: unit.command().map(str::to_string),
                    labels: merge_labels([
                        &project,
                        &manifest.common_labels,
                        &repo.unit_labels,
                        &unit.labels,
                    ]),
                    toolchain_type: toolchain_type(unit.toolchain_type.as_deref()),
                    content: None,
                });
            }
        }
    }
    units
}

/// Every declared space with its final name, empty ones included.
pub fn declared_spaces(manifest: &Manifest) -> Vec<DeclaredSpace> {
    manifest
        .configs
        .iter()
        .flat_map(|repo| {
            repo.spaces.iter().map(move |(name, space)| DeclaredSpace {
                name: manifest.space_name(name),
                repo_url: repo.repo.clone(),
                unit_count: space.units.len(),
            })
        })
        .collect()
}

/// Load the manifest at `path` and fully resolve it.
pub fn resolve_file(
    path: &Path,
    source: &dyn RepositorySource,
    options: ResolveOptions,
) -> Result<Resolution> {
    let manifest = config::from_file(path)?;
    ManifestResolver::new(source, options).resolve(&manifest)
}

/// Load the manifest at `path` and list its units by name only.
pub fn list_declared_units(path: &Path) -> Result<Vec<ResolvedUnit>> {
    let manifest = config::from_file(path)?;
    Ok(resolve_names_only(&manifest))
}
