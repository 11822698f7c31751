use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use log::debug;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Clone a repository with a shallow (depth 1) clone.
///
/// This uses the system git command, which automatically handles:
/// - SSH keys from ~/.ssh/
/// - Git credential helpers
/// - Personal access tokens
/// - Any authentication configured in ~/.gitconfig
pub fn clone_shallow(url: &str, target_dir: &Path) -> Result<()> {
    // Create parent directory if it doesn't exist
    if let Some(parent) = target_dir.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut command = Command::new("git");
    command
        .args(["clone", "--depth", "1", url])
        .arg(target_dir);
    run(command, url, "clone")
}

/// Fast-forward the current branch of an existing working tree.
pub fn pull_fast_forward(url: &str, repo_dir: &Path) -> Result<()> {
    let mut command = Command::new("git");
    command.args(["pull", "--ff-only"]).current_dir(repo_dir);
    run(command, url, "pull")
}

/// Fetch a single ref from `origin`.
pub fn fetch_ref(url: &str, repo_dir: &Path, ref_name: &str) -> Result<()> {
    let mut command = Command::new("git");
    command
        .args(["fetch", "origin", ref_name])
        .current_dir(repo_dir);
    run(command, url, "fetch")
}

/// Check out a branch, tag, or commit.
pub fn checkout(url: &str, repo_dir: &Path, ref_name: &str) -> Result<()> {
    let mut command = Command::new("git");
    command.args(["checkout", ref_name]).current_dir(repo_dir);
    run(command, url, "checkout")
}

/// Whether HEAD points at a branch (as opposed to a detached tag or commit).
pub fn is_on_branch(repo_dir: &Path) -> bool {
    Command::new("git")
        .args(["symbolic-ref", "-q", "HEAD"])
        .current_dir(repo_dir)
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

fn run(mut command: Command, url: &str, operation: &str) -> Result<()> {
    debug!("git {} for {}", operation, url);
    let output: Output = command.output().map_err(|e| Error::Acquisition {
        url: url.to_string(),
        operation: operation.to_string(),
        message: format!("failed to run git: {}", e),
        hint: Some("Make sure `git` is installed and on PATH".to_string()),
    })?;

    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    Err(Error::Acquisition {
        url: url.to_string(),
        operation: operation.to_string(),
        hint: failure_hint(operation, &stderr),
        message: stderr,
    })
}

/// Map common git failures to something the operator can act on.
fn failure_hint(operation: &str, stderr: &str) -> Option<String> {
    if stderr.contains("Authentication failed")
        || stderr.contains("Permission denied")
        || stderr.contains("Could not read from remote repository")
    {
        Some(
            "Make sure you have access to the repository. For private repos, ensure you have \
             an SSH key added to ssh-agent, git credentials configured, or a personal access \
             token set up"
                .to_string(),
        )
    } else if operation == "pull" && stderr.contains("Not possible to fast-forward") {
        Some(
            "The cached working tree has diverged from its remote; remove it from the cache \
             root to re-clone"
                .to_string(),
        )
    } else {
        None
    }
}

/// Convert a repository URL to its working-tree path under `cache_root`.
///
/// The directory name is the hex encoding of the first 8 bytes of the
/// SHA-256 of the URL, so the same URL always lands in the same place and
/// URL punctuation never reaches the filesystem.
pub fn url_to_cache_path(cache_root: &Path, url: &str) -> PathBuf {
    let digest = Sha256::digest(url.as_bytes());
    cache_root.join(hex::encode(&digest[..8]))
}
