//! # Content Resolution
//!
//! Produces the bytes of one unit from a repository working tree, in one of
//! two modes:
//!
//! - **Files**: the listed files, read from the unit directory in declared
//!   order and joined with a `---` document separator. Every file's bytes
//!   end with a newline in the output, inserted when the file lacks one.
//! - **Command**: the command string, split on whitespace (no shell, no
//!   quoting), run with the unit directory as working directory. Standard
//!   output is the content.
//!
//! The unit directory, and each file name within it, is confined with
//! `path::confine` before anything is opened or spawned.

use std::fs;
use std::path::Path;
use std::process::Command;

use log::{debug, log, Level};

use crate::config::UnitSource;
use crate::error::{Error, Result};
use crate::path::confine;

const DOCUMENT_SEPARATOR: &[u8] = b"---\n";

/// Resolves unit content from a working tree.
#[derive(Debug, Clone)]
pub struct ContentResolver {
    /// Level for per-file and per-command detail messages.
    detail: Level,
}

impl ContentResolver {
    pub fn new(verbose: bool) -> Self {
        Self {
            detail: if verbose { Level::Info } else { Level::Debug },
        }
    }

    /// Resolve `source` for the unit directory `dir` under `root`.
    ///
    /// Unit data is stored remotely as text, so content that is not valid
    /// UTF-8 is rejected here rather than at sync time.
    pub fn resolve(&self, root: &Path, dir: &str, source: UnitSource<'_>) -> Result<Vec<u8>> {
        let content = match source {
            UnitSource::Files(files) => self.resolve_files(root, dir, files)?,
            UnitSource::Command(command) => self.resolve_command(root, dir, command)?,
        };
        if let Err(e) = std::str::from_utf8(&content) {
            return Err(Error::Validation {
                message: format!(
                    "unit content is not valid UTF-8 (invalid byte at offset {})",
                    e.valid_up_to()
                ),
                hint: Some("Unit content must be text; check file encodings".to_string()),
            });
        }
        Ok(content)
    }

    /// Concatenate `files` from `root/dir`.
    pub fn resolve_files(&self, root: &Path, dir: &str, files: &[String]) -> Result<Vec<u8>> {
        let unit_dir = confine(root, dir)?;
        log!(self.detail, "Reading files from {}", unit_dir.display());

        let mut content = Vec::new();
        for (index, file) in files.iter().enumerate() {
            let path = confine(&unit_dir, file)?;
            log!(self.detail, "  - {}", file);

            let data = fs::read(&path).map_err(|e| Error::Path {
                message: format!("failed to read {}: {}", path.display(), e),
            })?;

            if index > 0 {
                content.extend_from_slice(DOCUMENT_SEPARATOR);
            }
            content.extend_from_slice(&data);
            if !data.ends_with(b"\n") {
                content.push(b'\n');
            }
        }
        Ok(content)
    }

    /// Run `command` in `root/dir` and return its standard output.
    pub fn resolve_command(&self, root: &Path, dir: &str, command: &str) -> Result<Vec<u8>> {
        let unit_dir = confine(root, dir)?;
        let execution_error = |message: String, stderr: String| Error::Execution {
            command: command.to_string(),
            dir: unit_dir.display().to_string(),
            message,
            stderr,
        };

        let mut tokens = command.split_whitespace();
        let program = tokens
            .next()
            .ok_or_else(|| execution_error("empty command".to_string(), String::new()))?;

        log!(self.detail, "Executing `{}` in {}", command, unit_dir.display());
        let output = Command::new(program)
            .args(tokens)
            .current_dir(&unit_dir)
            .output()
            .map_err(|e| execution_error(format!("failed to start: {}", e), String::new()))?;

        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        if !output.status.success() {
            return Err(execution_error(output.status.to_string(), stderr));
        }
        if !stderr.is_empty() {
            debug!("`{}` stderr: {}", command, stderr.trim_end());
        }
        Ok(output.stdout)
    }
}

impl Default for ContentResolver {
    fn default() -> Self {
        Self::new(false)
    }
}
