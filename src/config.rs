//! # Manifest Schema and Parsing
//!
//! This module defines the data structures that represent a `configs.yaml`
//! manifest and the logic for loading and validating it.
//!
//! ## Key Components
//!
//! - **`Manifest`**: the whole file. Project-wide settings (`project`,
//!   `namePrefix`, `commonLabels`) plus the list of repositories.
//! - **`RepoDeclaration`**: one repository, its optional ref, labels for all of
//!   its units, and its spaces.
//! - **`SpaceDeclaration`** / **`UnitDeclaration`**: the units to build and
//!   where their content comes from.
//!
//! Spaces and units are stored in `OrderedMap`, which keeps the order they
//! were written in; that order is the order units are resolved and synced.
//!
//! ## Validation
//!
//! `parse` and `from_file` run `validate` after deserialization, so a
//! `Manifest` obtained from them is structurally sound: every unit has a
//! relative `dir` and exactly one of `cmd` / `files`, and no `(space, unit)`
//! pair is declared twice.

use crate::error::{Error, Result};
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::marker::PhantomData;
use std::path::Path;

/// Label key/value pairs. Sorted so requests and output are deterministic.
pub type Labels = BTreeMap<String, String>;

/// A string-keyed map that preserves declaration order.
///
/// A `null` value deserializes to `V::default()`, so `staging:` with nothing
/// under it reads as an empty space. A key written twice is an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for OrderedMap<V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = OrderedMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl<'de, V> Deserialize<'de> for OrderedMap<V>
where
    V: Deserialize<'de> + Default,
{
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct OrderedMapVisitor<V>(PhantomData<V>);

        impl<'de, V> Visitor<'de> for OrderedMapVisitor<V>
        where
            V: Deserialize<'de> + Default,
        {
            type Value = OrderedMap<V>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a mapping")
            }

            fn visit_unit<E>(self) -> std::result::Result<Self::Value, E> {
                Ok(OrderedMap::new())
            }

            fn visit_map<A>(self, mut access: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut map = OrderedMap::new();
                while let Some(key) = access.next_key::<String>()? {
                    if map.get(&key).is_some() {
                        return Err(de::Error::custom(format!("duplicate key {:?}", key)));
                    }
                    let value = access.next_value::<Option<V>>()?.unwrap_or_default();
                    map.insert(key, value);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_any(OrderedMapVisitor(PhantomData))
    }
}

/// Root of a `configs.yaml` manifest
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Manifest {
    /// Project name; becomes the `project` label on every space and unit.
    #[serde(default)]
    pub project: Option<String>,
    /// Prepended to every declared space name.
    #[serde(default)]
    pub name_prefix: String,
    /// Labels applied to every space and unit.
    #[serde(default)]
    pub common_labels: Labels,
    /// Repositories to build units from.
    #[serde(default)]
    pub configs: Vec<RepoDeclaration>,
}

/// A Git repository with its spaces
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RepoDeclaration {
    /// URL or local path of the repository.
    #[serde(default)]
    pub repo: String,
    /// Branch or tag to check out.
    #[serde(default, rename = "ref")]
    pub r#ref: Option<String>,
    /// Labels for every unit in this repository.
    #[serde(default)]
    pub unit_labels: Labels,
    #[serde(default)]
    pub spaces: OrderedMap<SpaceDeclaration>,
}

/// A space and the units it should contain
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpaceDeclaration {
    #[serde(default)]
    pub units: OrderedMap<UnitDeclaration>,
}

/// A unit and where its content comes from
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UnitDeclaration {
    /// Directory relative to the repository root.
    #[serde(default)]
    pub dir: String,
    /// Command whose standard output is the content (e.g. `kubectl kustomize .`).
    #[serde(default)]
    pub cmd: Option<String>,
    /// Files to concatenate, as an alternative to `cmd`.
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub labels: Labels,
    /// How the content is interpreted downstream; defaults to `Kubernetes/YAML`.
    #[serde(default)]
    pub toolchain_type: Option<String>,
}

/// Where a unit's content comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitSource<'a> {
    Files(&'a [String]),
    Command(&'a str),
}

impl UnitDeclaration {
    /// The populated source, or `None` unless exactly one of `cmd` and
    /// `files` is set.
    pub fn source(&self) -> Option<UnitSource<'_>> {
        let command = self.command();
        match (command, self.files.is_empty()) {
            (Some(command), true) => Some(UnitSource::Command(command)),
            (None, false) => Some(UnitSource::Files(&self.files)),
            _ => None,
        }
    }

    /// The command, ignoring a blank `cmd:`.
    pub fn command(&self) -> Option<&str> {
        self.cmd.as_deref().filter(|c| !c.trim().is_empty())
    }
}

impl Manifest {
    /// The final name of a declared space.
    pub fn space_name(&self, declared: &str) -> String {
        format!("{}{}", self.name_prefix, declared)
    }
}

/// Check the structural rules that must hold before any I/O happens.
pub fn validate(manifest: &Manifest) -> Result<()> {
    if manifest.configs.is_empty() {
        return Err(Error::Validation {
            message: "no configs defined".to_string(),
            hint: Some("Add at least one entry under `configs:`".to_string()),
        });
    }

    let mut seen = HashSet::new();
    for (i, repo) in manifest.configs.iter().enumerate() {
        if repo.repo.trim().is_empty() {
            return Err(invalid(format!("config[{}]: repo is required", i)));
        }
        if repo.spaces.is_empty() {
            return Err(invalid(format!(
                "config[{}]: no spaces defined for repo {}",
                i, repo.repo
            )));
        }

        for (space_name, space) in repo.spaces.iter() {
            for (unit_name, unit) in space.units.iter() {
                let at = format!("config[{}]: unit {}/{}", i, space_name, unit_name);
                if unit.dir.trim().is_empty() {
                    return Err(Error::Validation {
                        message: format!("{}: dir is required", at),
                        hint: Some("Use `dir: .` for the repository root".to_string()),
                    });
                }
                if Path::new(&unit.dir).is_absolute() {
                    return Err(invalid(format!(
                        "{}: dir must be relative to the repository root",
                        at
                    )));
                }
                match (unit.command().is_some(), !unit.files.is_empty()) {
                    (false, false) => {
                        return Err(Error::Validation {
                            message: format!("{}: either 'cmd' or 'files' is required", at),
                            hint: Some(
                                "Add `cmd: kubectl kustomize .` or a `files:` list".to_string(),
                            ),
                        })
                    }
                    (true, true) => {
                        return Err(invalid(format!(
                            "{}: 'cmd' and 'files' are mutually exclusive",
                            at
                        )))
                    }
                    _ => {}
                }

                let key = (manifest.space_name(space_name), unit_name.to_string());
                if !seen.insert(key.clone()) {
                    return Err(invalid(format!(
                        "{}: unit {}/{} is declared more than once",
                        at, key.0, key.1
                    )));
                }
            }
        }
    }

    Ok(())
}

fn invalid(message: String) -> Error {
    Error::Validation {
        message,
        hint: None,
    }
}

/// Parse and validate a manifest from a YAML string.
pub fn parse(yaml_content: &str) -> Result<Manifest> {
    let manifest: Manifest = serde_yaml::from_str(yaml_content)?;
    validate(&manifest)?;
    Ok(manifest)
}

/// Read, parse, and validate a manifest file.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Manifest> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| Error::Validation {
        message: format!("failed to read {}: {}", path.display(), e),
        hint: None,
    })?;
    parse(&content)
}
