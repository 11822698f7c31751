//! # Repository Cache
//!
//! This module provides the `RepositoryManager`, which turns a repository
//! identifier (URL or local path) into a local working tree that unit
//! content can be resolved from.
//!
//! ## Design
//!
//! Two traits separate the policy from the mechanics:
//!
//! - **`RepositorySource`**: the capability the manifest resolver consumes,
//!   "give me a working tree for this repository at this ref".
//!
//! - **`GitOperations`**: the individual git steps (clone, fast-forward,
//!   fetch, checkout) the manager is built from. `DefaultGitOperations` shells
//!   out to the system `git`; tests substitute a recording mock.
//!
//! Working trees live under a cache root, one directory per repository,
//! named by a hash of the identifier (see `git::url_to_cache_path`). The
//! cache is not locked: two concurrent runs against the same cache root and
//! repository race on the filesystem.

use crate::error::Result;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

/// Trait for git operations - allows mocking in tests
pub trait GitOperations: Send + Sync {
    /// Shallow-clone `url` into `target_dir`.
    fn clone_shallow(&self, url: &str, target_dir: &Path) -> Result<()>;

    /// Fast-forward the working tree's current branch from its upstream.
    fn pull_fast_forward(&self, url: &str, repo_dir: &Path) -> Result<()>;

    /// Fetch `ref_name` from the origin remote.
    fn fetch_ref(&self, url: &str, repo_dir: &Path, ref_name: &str) -> Result<()>;

    /// Check out `ref_name` in the working tree.
    fn checkout(&self, url: &str, repo_dir: &Path, ref_name: &str) -> Result<()>;

    /// Whether HEAD is attached to a branch.
    fn is_on_branch(&self, repo_dir: &Path) -> bool;
}

/// The default implementation of `GitOperations`, which uses the system's
/// `git` command to perform real Git operations.
pub struct DefaultGitOperations;

impl GitOperations for DefaultGitOperations {
    fn clone_shallow(&self, url: &str, target_dir: &Path) -> Result<()> {
        crate::git::clone_shallow(url, target_dir)
    }

    fn pull_fast_forward(&self, url: &str, repo_dir: &Path) -> Result<()> {
        crate::git::pull_fast_forward(url, repo_dir)
    }

    fn fetch_ref(&self, url: &str, repo_dir: &Path, ref_name: &str) -> Result<()> {
        crate::git::fetch_ref(url, repo_dir, ref_name)
    }

    fn checkout(&self, url: &str, repo_dir: &Path, ref_name: &str) -> Result<()> {
        crate::git::checkout(url, repo_dir, ref_name)
    }

    fn is_on_branch(&self, repo_dir: &Path) -> bool {
        crate::git::is_on_branch(repo_dir)
    }
}

/// Capability for materializing a repository working tree.
pub trait RepositorySource {
    /// Ensure a working tree for `url` exists locally, up to date and at
    /// `ref_name` when one is given, and return its path.
    fn ensure_working_tree(&self, url: &str, ref_name: Option<&str>) -> Result<PathBuf>;
}

/// The main entry point for managing repository working trees.
pub struct RepositoryManager {
    git_ops: Box<dyn GitOperations>,
    cache_root: PathBuf,
}

impl RepositoryManager {
    /// Creates a new `RepositoryManager` backed by the system `git`, keeping
    /// working trees under `cache_root`.
    pub fn new(cache_root: PathBuf) -> Self {
        Self::with_operations(Box::new(DefaultGitOperations), cache_root)
    }

    /// Creates a `RepositoryManager` with a custom `GitOperations`
    /// implementation.
    pub fn with_operations(git_ops: Box<dyn GitOperations>, cache_root: PathBuf) -> Self {
        Self {
            git_ops,
            cache_root,
        }
    }

    /// The directory holding all working trees.
    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    /// The working-tree path for `url`, without touching git.
    pub fn working_tree_path(&self, url: &str) -> PathBuf {
        crate::git::url_to_cache_path(&self.cache_root, url)
    }
}

impl RepositorySource for RepositoryManager {
    /// This method will:
    /// 1.  Shallow-clone the repository if no working tree exists yet, or
    ///     fast-forward the existing one. A working tree on a detached HEAD
    ///     (a pinned tag or commit) has nothing to fast-forward and skips
    ///     this step.
    /// 2.  When a ref is given, fetch it (failures tolerated, the ref may
    ///     already be local) and check it out.
    fn ensure_working_tree(&self, url: &str, ref_name: Option<&str>) -> Result<PathBuf> {
        let repo_dir = self.working_tree_path(url);

        if !repo_dir.exists() {
            info!("Cloning {} into {}", url, repo_dir.display());
            self.git_ops.clone_shallow(url, &repo_dir)?;
        } else if self.git_ops.is_on_branch(&repo_dir) {
            info!("Updating {} in {}", url, repo_dir.display());
            self.git_ops.pull_fast_forward(url, &repo_dir)?;
        } else {
            debug!("{} is on a detached HEAD, skipping fast-forward", url);
        }

        if let Some(ref_name) = ref_name {
            if let Err(e) = self.git_ops.fetch_ref(url, &repo_dir, ref_name) {
                warn!("Could not fetch {} for {}: {}", ref_name, url, e);
            }
            self.git_ops.checkout(url, &repo_dir, ref_name)?;
        }

        Ok(repo_dir)
    }
}
