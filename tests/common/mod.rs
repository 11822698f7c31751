//! Shared test utilities for integration and E2E tests.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! #[cfg_attr(not(feature = "integration-tests"), ignore)]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_manifest(manifests::FILES_ONLY);
//!     fixture.command().arg("validate").assert().success();
//! }
//! ```

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use assert_fs::prelude::*;
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use super::git_repo;
    #[allow(unused_imports)]
    pub use super::manifests;
    pub use super::TestFixture;
    pub use assert_fs::prelude::*;
    pub use predicates::prelude::*;
}

/// Manifest snippets for testing.
#[allow(dead_code)]
pub mod manifests {
    /// One space, one files-mode unit.
    pub const FILES_ONLY: &str = r#"
configs:
  - repo: https://example.com/acme/deploy.git
    spaces:
      billing:
        units:
          api:
            dir: k8s
            files: [deployment.yaml, service.yaml]
"#;

    /// Prefix, project, labels at every layer and an empty space.
    pub const FULL: &str = r#"
project: acme
namePrefix: acme-
commonLabels:
  team: platform
configs:
  - repo: https://example.com/acme/deploy.git
    ref: main
    unitLabels:
      tier: backend
    spaces:
      billing:
        units:
          api:
            dir: k8s/api
            cmd: kubectl kustomize .
            labels:
              app: api
          worker:
            dir: k8s/worker
            files: [deployment.yaml]
      staging: {}
"#;

    /// Structurally invalid: a unit with both cmd and files.
    pub const BOTH_SOURCES: &str = r#"
configs:
  - repo: https://example.com/acme/deploy.git
    spaces:
      billing:
        units:
          api:
            dir: k8s
            cmd: kubectl kustomize .
            files: [deployment.yaml]
"#;

    /// Invalid YAML for error testing.
    pub const INVALID_YAML: &str = "configs: [unclosed";
}

/// A temporary working directory with its own manifest, repository cache,
/// and `cub` configuration directory.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Write `configs.yaml` with the given content.
    pub fn with_manifest(self, content: &str) -> Self {
        self.temp_dir
            .child("configs.yaml")
            .write_str(content)
            .expect("Failed to write manifest");
        self
    }

    /// Write a `cub` context pointing at `server_url`, with a token.
    #[allow(dead_code)]
    pub fn with_context(self, server_url: &str, token: &str) -> Self {
        let config = format!(
            r#"currentContext: test
contexts:
  - name: test
    coordinate:
      serverURL: {server_url}
      organizationID: org_test
      user: dev@example.com
    metadata:
      tokenFile: test.json
      organizationName: Test Org
"#
        );
        self.temp_dir
            .child("confighub/config.yaml")
            .write_str(&config)
            .expect("Failed to write cub config");
        self.temp_dir
            .child("confighub/tokens/test.json")
            .write_str(&format!(r#"{{"accessToken":"{token}"}}"#))
            .expect("Failed to write token");
        self
    }

    /// Add a file with the given path and content.
    #[allow(dead_code)]
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    #[allow(dead_code)]
    pub fn manifest_path(&self) -> PathBuf {
        self.path().join("configs.yaml")
    }

    #[allow(dead_code)]
    pub fn cache_root(&self) -> PathBuf {
        self.path().join("cache")
    }

    /// The `cub-compose` binary, isolated to this fixture: working directory,
    /// cache root and ConfigHub directory all live in the temp dir.
    pub fn command(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("cub-compose");
        cmd.current_dir(self.path())
            .env("CUB_COMPOSE_CACHE", self.cache_root())
            .env("CUB_COMPOSE_CONFIGHUB_DIR", self.path().join("confighub"))
            .env("NO_COLOR", "1")
            .env_remove("CUB_COMPOSE_FILE")
            .env_remove("RUST_LOG");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a git repository at `dir` containing `files`, with one commit.
#[allow(dead_code)]
pub fn git_repo(dir: &Path, files: &[(&str, &str)]) {
    for (path, content) in files {
        let full = dir.join(path);
        std::fs::create_dir_all(full.parent().expect("file has a parent"))
            .expect("Failed to create directory");
        std::fs::write(full, content).expect("Failed to write file");
    }
    let git = |args: &[&str]| {
        let status = std::process::Command::new("git")
            .args(args)
            .current_dir(dir)
            .status()
            .expect("Failed to run git");
        assert!(status.success(), "git {:?} failed", args);
    };
    git(&["init", "-q"]);
    git(&["add", "."]);
    git(&[
        "-c",
        "user.name=Test",
        "-c",
        "user.email=test@example.com",
        "commit",
        "-q",
        "-m",
        "initial",
    ]);
}
