//! # Error Suggestions
//!
//! Operator-facing errors for the command layer. Each helper says what went
//! wrong and how to fix it.
//!
//! ```rust,ignore
//! use cub_compose::suggestions;
//!
//! if !path.exists() {
//!     return Err(suggestions::manifest_not_found(path));
//! }
//! ```

use std::path::Path;

use crate::error::Error;

/// The manifest file does not exist.
pub fn manifest_not_found(path: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "Manifest not found: {path}\n\n\
         hint: Create a configs.yaml listing your repositories, spaces and units\n\
         hint: Use -f/--file to point at a different manifest\n\
         hint: Set the CUB_COMPOSE_FILE environment variable",
        path = path.display()
    )
}

/// Credentials could not be loaded or were rejected.
pub fn not_authenticated(error: Error, confighub_dir: &Path) -> anyhow::Error {
    anyhow::anyhow!(
        "{error}\n\n\
         hint: cub-compose uses the credentials of the `cub` CLI in {dir}\n\
         hint: Run 'cub auth login' and try again\n\
         hint: Use --confighub-dir or CUB_COMPOSE_CONFIGHUB_DIR for a different location",
        dir = confighub_dir.display()
    )
}

/// Convert a library error, routing credential problems through
/// `not_authenticated`.
pub fn from_error(error: Error, confighub_dir: &Path) -> anyhow::Error {
    if error.is_auth() {
        not_authenticated(error, confighub_dir)
    } else {
        error.into()
    }
}
