//! # Error Handling
//!
//! This module defines the centralized error type for `cub-compose`. It uses
//! the `thiserror` library to build a single `Error` enum whose variants map
//! one-to-one onto the failure modes of a run:
//!
//! - **`Validation`**: the manifest is structurally invalid. Raised before any
//!   repository is touched or any remote call is made.
//! - **`Acquisition`**: a `git` clone, update, or checkout failed.
//! - **`PathEscape`**: a unit directory or file name resolves outside the
//!   repository working tree.
//! - **`Execution`**: a unit command could not be spawned or exited non-zero.
//! - **`Remote`**: the remote store returned a non-success response.
//! - **`Auth`**: credentials are missing or were rejected.
//!
//! Every variant carries the context an operator needs to act on it (the
//! repository URL, the `space/unit` pair, the captured standard error), and
//! some carry an optional `hint` rendered on its own line.
//!
//! The `Result` alias is used throughout the library.

use thiserror::Error;

fn render_hint(hint: &Option<String>) -> String {
    hint.as_ref()
        .map(|h| format!("\n  hint: {}", h))
        .unwrap_or_default()
}

/// Main error type for cub-compose operations
#[derive(Error, Debug)]
pub enum Error {
    /// The manifest violates a structural rule.
    #[error("Manifest validation error: {message}{}", render_hint(hint))]
    Validation {
        message: String,
        /// Optional hint for how to fix the manifest
        hint: Option<String>,
    },

    /// A repository could not be cloned, updated, or checked out.
    #[error("Repository acquisition failed for {url} ({operation}): {message}{}", render_hint(hint))]
    Acquisition {
        url: String,
        /// The git operation that failed (clone, pull, checkout)
        operation: String,
        message: String,
        hint: Option<String>,
    },

    /// A path declared in the manifest resolves outside its allowed root.
    #[error("Path escape: {path:?} resolves outside {root}")]
    PathEscape { path: String, root: String },

    /// A path declared in the manifest could not be opened.
    #[error("Path operation error: {message}")]
    Path { message: String },

    /// A unit command failed to start or exited unsuccessfully.
    #[error("Command `{command}` failed in {dir}: {message}{}", render_stderr(stderr))]
    Execution {
        command: String,
        dir: String,
        message: String,
        /// Standard error captured from the process, possibly empty
        stderr: String,
    },

    /// The remote store rejected a request or could not be reached.
    #[error("Remote {operation} failed{}: {message}", status.map(|s| format!(" (HTTP {})", s)).unwrap_or_default())]
    Remote {
        operation: String,
        /// HTTP status, absent for transport failures
        status: Option<u16>,
        message: String,
    },

    /// Credentials are missing, unreadable, or were rejected by the server.
    #[error("Authentication error: {message}{}", render_hint(hint))]
    Auth {
        message: String,
        hint: Option<String>,
    },

    /// Wraps an error with the `space/unit` or repository it occurred for.
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<Error>,
    },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A JSON parsing error, wrapped from `serde_json::Error`.
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// A URL parsing error, wrapped from `url::ParseError`.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),
}

fn render_stderr(stderr: &str) -> String {
    let trimmed = stderr.trim_end();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("\nstderr: {}", trimmed)
    }
}

impl Error {
    /// Wrap this error with operator-facing context such as `billing/api`.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Error::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, with all `Context` layers removed.
    pub fn root(&self) -> &Error {
        match self {
            Error::Context { source, .. } => source.root(),
            other => other,
        }
    }

    /// Whether the remote store reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self.root(),
            Error::Remote {
                status: Some(404),
                ..
            }
        )
    }

    /// Whether this is a credential problem rather than a manifest or
    /// remote-state problem.
    pub fn is_auth(&self) -> bool {
        matches!(self.root(), Error::Auth { .. })
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_validation() {
        let error = Error::Validation {
            message: "config[0]: repo is required".to_string(),
            hint: None,
        };
        let display = format!("{}", error);
        assert!(display.contains("Manifest validation error"));
        assert!(display.contains("repo is required"));
        assert!(!display.contains("hint:"));
    }

    #[test]
    fn test_error_display_validation_with_hint() {
        let error = Error::Validation {
            message: "unit billing/api: either 'cmd' or 'files' is required".to_string(),
            hint: Some("Add `cmd: kubectl kustomize .` or a `files:` list".to_string()),
        };
        let display = format!("{}", error);
        assert!(display.contains("hint:"));
        assert!(display.contains("kubectl kustomize"));
    }

    #[test]
    fn test_error_display_acquisition() {
        let error = Error::Acquisition {
            url: "https://github.com/test/repo.git".to_string(),
            operation: "clone".to_string(),
            message: "Repository not found".to_string(),
            hint: None,
        };
        let display = format!("{}", error);
        assert!(display.contains("https://github.com/test/repo.git"));
        assert!(display.contains("clone"));
        assert!(display.contains("Repository not found"));
    }

    #[test]
    fn test_error_display_path_escape() {
        let error = Error::PathEscape {
            path: "../../etc".to_string(),
            root: "/cache/abc".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("Path escape"));
        assert!(display.contains("../../etc"));
        assert!(display.contains("/cache/abc"));
    }

    #[test]
    fn test_error_display_execution_includes_stderr() {
        let error = Error::Execution {
            command: "kubectl kustomize .".to_string(),
            dir: "/repo/k8s".to_string(),
            message: "exit status: 1".to_string(),
            stderr: "error: no kustomization found\n".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("kubectl kustomize ."));
        assert!(display.contains("exit status: 1"));
        assert!(display.contains("stderr: error: no kustomization found"));
    }

    #[test]
    fn test_error_display_execution_without_stderr() {
        let error = Error::Execution {
            command: "missing-binary".to_string(),
            dir: "/repo".to_string(),
            message: "No such file or directory".to_string(),
            stderr: String::new(),
        };
        assert!(!format!("{}", error).contains("stderr:"));
    }

    #[test]
    fn test_error_display_remote() {
        let error = Error::Remote {
            operation: "create unit".to_string(),
            status: Some(500),
            message: "internal error".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("create unit"));
        assert!(display.contains("HTTP 500"));
    }

    #[test]
    fn test_context_wraps_and_root_unwraps() {
        let error = Error::Remote {
            operation: "delete unit".to_string(),
            status: Some(404),
            message: "not found".to_string(),
        }
        .with_context("billing/api");

        assert!(format!("{}", error).starts_with("billing/api: "));
        assert!(error.is_not_found());
        assert!(matches!(error.root(), Error::Remote { .. }));
    }

    #[test]
    fn test_is_not_found_only_for_404() {
        let error = Error::Remote {
            operation: "list units".to_string(),
            status: Some(500),
            message: "boom".to_string(),
        };
        assert!(!error.is_not_found());

        let transport = Error::Remote {
            operation: "list units".to_string(),
            status: None,
            message: "connection refused".to_string(),
        };
        assert!(!transport.is_not_found());
    }

    #[test]
    fn test_is_auth() {
        let error = Error::Auth {
            message: "token rejected".to_string(),
            hint: Some("run 'cub auth login'".to_string()),
        };
        assert!(error.is_auth());
        assert!(format!("{}", error).contains("cub auth login"));
        assert!(!Error::Path {
            message: "x".to_string()
        }
        .is_auth());
    }

    #[test]
    fn test_error_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let error: Error = io_error.into();
        let display = format!("{}", error);
        assert!(display.contains("I/O error"));
        assert!(display.contains("File not found"));
    }

    #[test]
    fn test_error_from_yaml_error() {
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>("invalid: [unclosed").unwrap_err();
        let error: Error = yaml_error.into();
        assert!(format!("{}", error).contains("YAML parsing error"));
    }
}
