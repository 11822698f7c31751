//! Default values for cub-compose configuration.
//!
//! This module provides centralized default values used across commands,
//! ensuring consistency and avoiding duplication.

use std::path::PathBuf;
use std::time::Duration;

/// Manifest file read when `--file` is not given.
pub const DEFAULT_MANIFEST_FILENAME: &str = "configs.yaml";

/// Server used when the current `cub` context does not name one.
pub const DEFAULT_SERVER_URL: &str = "https://hub.confighub.com";

/// Toolchain type attached to units that do not declare one.
pub const DEFAULT_TOOLCHAIN_TYPE: &str = "Kubernetes/YAML";

/// Label key that carries the manifest's project name.
pub const PROJECT_LABEL_KEY: &str = "project";

/// Upper bound for a single remote request.
pub const REMOTE_TIMEOUT: Duration = Duration::from_secs(30);

/// Returns the default cache root directory for repository working trees.
///
/// Uses the platform-appropriate cache directory:
/// - Linux: `~/.cache/cub-compose/repos` (XDG Base Directory)
/// - macOS: `~/Library/Caches/cub-compose/repos`
/// - Windows: `{FOLDERID_LocalAppData}\cub-compose\repos`
///
/// Falls back to `.cub-compose-cache/repos` in the current directory if the
/// platform cache directory cannot be determined.
///
/// This can be overridden by the `--cache-root` CLI flag or the
/// `CUB_COMPOSE_CACHE` environment variable.
pub fn default_cache_root() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("cub-compose"))
        .unwrap_or_else(|| PathBuf::from(".cub-compose-cache"))
        .join("repos")
}

/// Returns the directory holding the `cub` CLI configuration and tokens
/// (`~/.confighub`).
pub fn default_confighub_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".confighub")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cache_root_returns_path() {
        let cache_root = default_cache_root();
        assert!(cache_root.ends_with("repos"));
        assert!(cache_root
            .parent()
            .map(|p| p.ends_with("cub-compose") || p.ends_with(".cub-compose-cache"))
            .unwrap_or(false));
    }

    #[test]
    fn test_default_confighub_dir() {
        assert!(default_confighub_dir().ends_with(".confighub"));
    }
}
