//! # Reconciliation
//!
//! Drives a `RemoteStore` toward the resolved state.
//!
//! ## Upsert (`apply`)
//!
//! For each unit, in order:
//!
//! 1. Find the owning space: in-run cache, then a lookup by slug, then a
//!    create carrying the space's labels. Each distinct space is looked up
//!    at most once and created at most once per run.
//! 2. Look the unit up by slug inside that space.
//! 3. Update it when found (full overwrite of content, labels, and
//!    toolchain type), create it otherwise.
//!
//! The first remote failure aborts the run. Units already applied stay
//! applied.
//!
//! ## Teardown (`remove`)
//!
//! Spaces are only looked up, never created. A missing space is remembered
//! and every later unit in it is skipped without another lookup. A missing
//! unit is skipped. A delete that reports not-found counts as done. Both
//! skips are logged as warnings, so running teardown twice is not an error.

use std::collections::{HashMap, HashSet};

use log::{info, warn};

use crate::config::Labels;
use crate::error::{Error, Result};
use crate::remote::{RemoteStore, UnitSpec};
use crate::resolver::{ResolvedSpace, ResolvedUnit};

/// What an `apply` run changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub spaces_created: Vec<String>,
    /// `space/unit` keys
    pub units_created: Vec<String>,
    pub units_updated: Vec<String>,
}

/// What a `remove` run changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoveReport {
    pub units_deleted: Vec<String>,
    pub units_skipped: Vec<String>,
    pub spaces_missing: Vec<String>,
}

/// Asks the operator before anything is deleted.
pub trait Confirm {
    fn confirm(&self, units: &[ResolvedUnit]) -> Result<bool>;
}

/// Confirmation that always agrees, for `--force`.
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&self, _units: &[ResolvedUnit]) -> Result<bool> {
        Ok(true)
    }
}

pub struct Reconciler<'a> {
    store: &'a dyn RemoteStore,
}

impl<'a> Reconciler<'a> {
    pub fn new(store: &'a dyn RemoteStore) -> Self {
        Self { store }
    }

    /// Verify connectivity and credentials.
    pub fn probe(&self) -> Result<()> {
        self.store.probe()
    }

    /// Create or update every unit, creating missing spaces on the way.
    pub fn apply(&self, spaces: &[ResolvedSpace], units: &[ResolvedUnit]) -> Result<ApplyReport> {
        let space_labels: HashMap<&str, &Labels> = spaces
            .iter()
            .map(|s| (s.name.as_str(), &s.labels))
            .collect();
        let empty = Labels::new();
        let mut space_ids: HashMap<String, String> = HashMap::new();
        let mut report = ApplyReport::default();

        for unit in units {
            let key = unit.key();
            info!("Syncing {}", key);

            let space_id = match space_ids.get(&unit.space_name) {
                Some(id) => id.clone(),
                None => {
                    let labels = space_labels
                        .get(unit.space_name.as_str())
                        .copied()
                        .unwrap_or(&empty);
                    let id = self
                        .ensure_space(&unit.space_name, labels, &mut report)
                        .map_err(|e| e.with_context(format!("space {}", unit.space_name)))?;
                    space_ids.insert(unit.space_name.clone(), id.clone());
                    id
                }
            };

            let spec = UnitSpec::from_resolved(unit, unit_data(unit)?);
            let existing = self
                .store
                .list_units(&space_id, &unit.unit_name)
                .map_err(|e| e.with_context(key.clone()))?
                .into_iter()
                .next();

            match existing {
                Some(found) => {
                    self.store
                        .update_unit(&space_id, &found.unit_id, &spec)
                        .map_err(|e| e.with_context(key.clone()))?;
                    info!("Updated {}", key);
                    report.units_updated.push(key);
                }
                None => {
                    self.store
                        .create_unit(&space_id, &spec)
                        .map_err(|e| e.with_context(key.clone()))?;
                    info!("Created {}", key);
                    report.units_created.push(key);
                }
            }
        }

        Ok(report)
    }

    fn ensure_space(&self, name: &str, labels: &Labels, report: &mut ApplyReport) -> Result<String> {
        if let Some(space) = self.store.list_spaces(name)?.into_iter().next() {
            return Ok(space.space_id);
        }
        info!("Creating space {}", name);
        let space = self.store.create_space(name, name, labels)?;
        report.spaces_created.push(name.to_string());
        Ok(space.space_id)
    }

    /// Delete every unit that exists remotely; skip the rest.
    pub fn remove(&self, units: &[ResolvedUnit]) -> Result<RemoveReport> {
        let mut space_ids: HashMap<String, String> = HashMap::new();
        let mut missing: HashSet<String> = HashSet::new();
        let mut report = RemoveReport::default();

        for unit in units {
            let key = unit.key();
            info!("Deleting {}", key);

            if missing.contains(&unit.space_name) {
                warn!("Space {} not found, skipping {}", unit.space_name, key);
                report.units_skipped.push(key);
                continue;
            }

            let space_id = match space_ids.get(&unit.space_name) {
                Some(id) => id.clone(),
                None => {
                    let found = self
                        .store
                        .list_spaces(&unit.space_name)
                        .map_err(|e| e.with_context(format!("space {}", unit.space_name)))?
                        .into_iter()
                        .next();
                    match found {
                        Some(space) => {
                            space_ids.insert(unit.space_name.clone(), space.space_id.clone());
                            space.space_id
                        }
                        None => {
                            warn!("Space {} not found, skipping {}", unit.space_name, key);
                            missing.insert(unit.space_name.clone());
                            report.spaces_missing.push(unit.space_name.clone());
                            report.units_skipped.push(key);
                            continue;
                        }
                    }
                }
            };

            let existing = self
                .store
                .list_units(&space_id, &unit.unit_name)
                .map_err(|e| e.with_context(key.clone()))?
                .into_iter()
                .next();
            let Some(found) = existing else {
                warn!("Unit {} not found, skipping", key);
                report.units_skipped.push(key);
                continue;
            };

            match self.store.delete_unit(&space_id, &found.unit_id) {
                Ok(()) => {
                    info!("Deleted {}", key);
                    report.units_deleted.push(key);
                }
                Err(e) if e.is_not_found() => {
                    warn!("Unit {} already gone", key);
                    report.units_skipped.push(key);
                }
                Err(e) => return Err(e.with_context(key)),
            }
        }

        Ok(report)
    }
}

/// `remove`, gated on `confirm`. The store comes from `connect`, which runs
/// only after the operator agrees, so declining needs neither credentials
/// nor the network. Returns `None` when declined.
pub fn remove_confirmed<S, F>(
    units: &[ResolvedUnit],
    confirm: &dyn Confirm,
    connect: F,
) -> Result<Option<RemoveReport>>
where
    S: RemoteStore,
    F: FnOnce() -> Result<S>,
{
    if !confirm.confirm(units)? {
        info!("Teardown declined");
        return Ok(None);
    }
    let store = connect()?;
    Reconciler::new(&store).remove(units).map(Some)
}

fn unit_data(unit: &ResolvedUnit) -> Result<String> {
    let content = unit.content.as_ref().ok_or_else(|| {
        Error::Validation {
            message: "unit has no resolved content".to_string(),
            hint: None,
        }
        .with_context(unit.key())
    })?;
    String::from_utf8(content.clone()).map_err(|_| {
        Error::Validation {
            message: "unit content is not valid UTF-8".to_string(),
            hint: None,
        }
        .with_context(unit.key())
    })
}
