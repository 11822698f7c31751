//! Remote store capability.
//!
//! `RemoteStore` is the seam between reconciliation and ConfigHub. The
//! production implementation is `client::ConfigHubClient`; tests use the
//! in-memory store below.
//!
//! Spaces and units are identified remotely by server-assigned IDs and looked
//! up by slug. The slug of a space is its final (prefixed) name; the slug of
//! a unit is its unit name.

use serde::{Deserialize, Serialize};

use crate::config::Labels;
use crate::error::Result;
use crate::resolver::ResolvedUnit;

/// A space as stored remotely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Space {
    #[serde(rename = "SpaceID", skip_serializing_if = "String::is_empty")]
    pub space_id: String,
    pub slug: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Labels::is_empty")]
    pub labels: Labels,
}

/// A unit as stored remotely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Unit {
    #[serde(rename = "UnitID", skip_serializing_if = "String::is_empty")]
    pub unit_id: String,
    #[serde(rename = "SpaceID", skip_serializing_if = "String::is_empty")]
    pub space_id: String,
    pub slug: String,
    pub display_name: String,
    pub data: String,
    /// Always sent, even when empty: an update replaces the whole label map.
    pub labels: Labels,
    pub toolchain_type: String,
}

/// The full desired state of one unit, sent on both create and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitSpec {
    pub slug: String,
    pub display_name: String,
    pub data: String,
    pub labels: Labels,
    pub toolchain_type: String,
}

impl UnitSpec {
    /// Build the payload for a resolved unit. The unit must carry content.
    pub fn from_resolved(unit: &ResolvedUnit, data: String) -> Self {
        Self {
            slug: unit.unit_name.clone(),
            display_name: unit.unit_name.clone(),
            data,
            labels: unit.labels.clone(),
            toolchain_type: unit.toolchain_type.clone(),
        }
    }
}

/// Operations the reconciler needs from a remote store.
///
/// Every method is a single attempt. Implementations report non-success
/// responses as `Error::Remote` (carrying the status, so a 404 is
/// recognizable through `Error::is_not_found`) and rejected credentials as
/// `Error::Auth`.
pub trait RemoteStore {
    /// Spaces whose slug equals `slug` exactly.
    fn list_spaces(&self, slug: &str) -> Result<Vec<Space>>;

    fn create_space(&self, slug: &str, display_name: &str, labels: &Labels) -> Result<Space>;

    /// Units in `space_id` whose slug equals `slug` exactly.
    fn list_units(&self, space_id: &str, slug: &str) -> Result<Vec<Unit>>;

    fn create_unit(&self, space_id: &str, spec: &UnitSpec) -> Result<Unit>;

    /// Overwrite content, labels, and toolchain type of an existing unit.
    fn update_unit(&self, space_id: &str, unit_id: &str, spec: &UnitSpec) -> Result<Unit>;

    fn delete_unit(&self, space_id: &str, unit_id: &str) -> Result<()>;

    /// Cheap authenticated request used to verify connectivity and credentials.
    fn probe(&self) -> Result<()>;
}

#[cfg(test)]
pub(crate) mod memory {
    //! In-memory `RemoteStore` that records every call.

    use super::*;
    use crate::error::Error;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct State {
        spaces: Vec<Space>,
        units: Vec<Unit>,
        next_id: u64,
        calls: Vec<String>,
        failures: HashMap<String, u16>,
    }

    #[derive(Default)]
    pub struct MemoryStore {
        state: Mutex<State>,
    }

    impl MemoryStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make every call to `operation` fail with the given HTTP status.
        pub fn fail(&self, operation: &str, status: u16) {
            self.state
                .lock()
                .unwrap()
                .failures
                .insert(operation.to_string(), status);
        }

        /// Insert a space directly, bypassing call recording.
        pub fn seed_space(&self, slug: &str) -> String {
            let mut state = self.state.lock().unwrap();
            let id = next_id(&mut state, "space");
            state.spaces.push(Space {
                space_id: id.clone(),
                slug: slug.to_string(),
                display_name: slug.to_string(),
                labels: Labels::new(),
            });
            id
        }

        /// Recorded calls, as `operation:argument`.
        pub fn calls(&self) -> Vec<String> {
            self.state.lock().unwrap().calls.clone()
        }

        /// Number of recorded calls to `operation`.
        pub fn count(&self, operation: &str) -> usize {
            let prefix = format!("{}:", operation);
            self.calls()
                .iter()
                .filter(|c| c.starts_with(&prefix))
                .count()
        }

        pub fn spaces(&self) -> Vec<Space> {
            self.state.lock().unwrap().spaces.clone()
        }

        pub fn units(&self) -> Vec<Unit> {
            self.state.lock().unwrap().units.clone()
        }

        fn enter(&self, operation: &str, argument: &str) -> Result<std::sync::MutexGuard<'_, State>> {
            let mut state = self.state.lock().unwrap();
            state.calls.push(format!("{}:{}", operation, argument));
            if let Some(status) = state.failures.get(operation) {
                return Err(Error::Remote {
                    operation: operation.replace('_', " "),
                    status: Some(*status),
                    message: "injected failure".to_string(),
                });
            }
            Ok(state)
        }
    }

    fn next_id(state: &mut State, kind: &str) -> String {
        state.next_id += 1;
        format!("{}-{}", kind, state.next_id)
    }

    fn not_found(operation: &str) -> Error {
        Error::Remote {
            operation: operation.to_string(),
            status: Some(404),
            message: "not found".to_string(),
        }
    }

    impl RemoteStore for MemoryStore {
        fn list_spaces(&self, slug: &str) -> Result<Vec<Space>> {
            let state = self.enter("list_spaces", slug)?;
            Ok(state
                .spaces
                .iter()
                .filter(|s| s.slug == slug)
                .cloned()
                .collect())
        }

        fn create_space(&self, slug: &str, display_name: &str, labels: &Labels) -> Result<Space> {
            let mut state = self.enter("create_space", slug)?;
            let space = Space {
                space_id: next_id(&mut state, "space"),
                slug: slug.to_string(),
                display_name: display_name.to_string(),
                labels: labels.clone(),
            };
            state.spaces.push(space.clone());
            Ok(space)
        }

        fn list_units(&self, space_id: &str, slug: &str) -> Result<Vec<Unit>> {
            let state = self.enter("list_units", slug)?;
            Ok(state
                .units
                .iter()
                .filter(|u| u.space_id == space_id && u.slug == slug)
                .cloned()
                .collect())
        }

        fn create_unit(&self, space_id: &str, spec: &UnitSpec) -> Result<Unit> {
            let mut state = self.enter("create_unit", &spec.slug)?;
            let unit = Unit {
                unit_id: next_id(&mut state, "unit"),
                space_id: space_id.to_string(),
                slug: spec.slug.clone(),
                display_name: spec.display_name.clone(),
                data: spec.data.clone(),
                labels: spec.labels.clone(),
                toolchain_type: spec.toolchain_type.clone(),
            };
            state.units.push(unit.clone());
            Ok(unit)
        }

        fn update_unit(&self, space_id: &str, unit_id: &str, spec: &UnitSpec) -> Result<Unit> {
            let mut state = self.enter("update_unit", &spec.slug)?;
            let unit = state
                .units
                .iter_mut()
                .find(|u| u.space_id == space_id && u.unit_id == unit_id)
                .ok_or_else(|| not_found("update unit"))?;
            unit.data = spec.data.clone();
            unit.labels = spec.labels.clone();
            unit.display_name = spec.display_name.clone();
            unit.toolchain_type = spec.toolchain_type.clone();
            Ok(unit.clone())
        }

        fn delete_unit(&self, space_id: &str, unit_id: &str) -> Result<()> {
            let mut state = self.enter("delete_unit", unit_id)?;
            let before = state.units.len();
            state
                .units
                .retain(|u| !(u.space_id == space_id && u.unit_id == unit_id));
            if state.units.len() == before {
                return Err(not_found("delete unit"));
            }
            Ok(())
        }

        fn probe(&self) -> Result<()> {
            self.enter("probe", "")?;
            Ok(())
        }
    }
}
