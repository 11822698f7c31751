//! # cub-compose
//!
//! Declaratively sync configuration units from Git repositories into
//! ConfigHub. A YAML manifest names repositories, the spaces they feed, and
//! the units in each space; `cub-compose` turns that into remote state.
//!
//! ## Quick Example
//!
//! ```
//! use cub_compose::config;
//! use cub_compose::resolver::resolve_names_only;
//!
//! let manifest = config::parse(r#"
//! project: acme
//! namePrefix: acme-
//! configs:
//!   - repo: https://github.com/acme/deploy.git
//!     spaces:
//!       billing:
//!         units:
//!           api:
//!             dir: k8s/api
//!             cmd: kubectl kustomize .
//! "#).unwrap();
//!
//! let units = resolve_names_only(&manifest);
//! assert_eq!(units[0].space_name, "acme-billing");
//! assert_eq!(units[0].labels.get("project").map(String::as_str), Some("acme"));
//! ```
//!
//! ## Core Concepts
//!
//! - **Manifest (`config`)**: the `configs.yaml` schema and its structural
//!   validation.
//! - **Repository Cache (`repository`, `git`)**: one shallow working tree per
//!   repository URL, reused and fast-forwarded across runs.
//! - **Content Resolution (`content`, `path`)**: a unit's bytes, from
//!   concatenated files or a command's standard output, confined to the
//!   repository tree.
//! - **Manifest Resolution (`resolver`)**: final space names, merged labels,
//!   and content for every declared unit.
//! - **Reconciliation (`reconcile`, `remote`)**: idempotent create-or-update
//!   and teardown against a `RemoteStore`.
//! - **ConfigHub access (`client`, `context`)**: the HTTP `RemoteStore` and
//!   the `cub` CLI credentials it authenticates with.
//!
//! ## Execution Flow
//!
//! 1.  **Load**: parse and validate the manifest.
//! 2.  **Acquire**: clone or update each repository once.
//! 3.  **Resolve**: produce content for every unit, in manifest order.
//! 4.  **Reconcile**: ensure each space exists, then create or update each unit.
//!
//! Teardown skips steps 2 and 3 and deletes units by name.

pub mod client;
pub mod config;
pub mod content;
pub mod context;
pub mod defaults;
pub mod error;
pub mod git;
pub mod output;
pub mod path;
pub mod reconcile;
pub mod remote;
pub mod repository;
pub mod resolver;
pub mod suggestions;

#[cfg(test)]
mod path_proptest;
