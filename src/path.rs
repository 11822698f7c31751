//! Path confinement for manifest-supplied paths.
//!
//! Unit directories and file names come from the manifest, but the tree
//! they point into was fetched from a user-supplied URL. Every such path is
//! checked twice: lexically (absolute paths and `..` that climbs above the
//! root are rejected without touching the filesystem), then physically
//! (after canonicalization, so a symlink inside the tree cannot point out
//! of it).

use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Lexically normalize `relative`, rejecting anything that leaves the root.
///
/// Returns the normalized relative path. `.` components are dropped and
/// `..` pops the previous component; popping past the root, an absolute
/// path, or a Windows prefix is an escape.
pub fn normalize_relative(relative: &str, root: &Path) -> Result<PathBuf> {
    let escape = || Error::PathEscape {
        path: relative.to_string(),
        root: root.display().to_string(),
    };

    let mut normalized = PathBuf::new();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => normalized.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    return Err(escape());
                }
            }
            Component::RootDir | Component::Prefix(_) => return Err(escape()),
        }
    }
    Ok(normalized)
}

/// Resolve `relative` against `root`, guaranteeing the result stays inside
/// `root` even through symlinks.
///
/// The target must exist. Errors:
/// - `Error::PathEscape` when the path leaves `root`.
/// - `Error::Path` when the target does not exist or `root` is unreadable.
pub fn confine(root: &Path, relative: &str) -> Result<PathBuf> {
    let normalized = normalize_relative(relative, root)?;

    let canonical_root = root.canonicalize().map_err(|e| Error::Path {
        message: format!("cannot open {}: {}", root.display(), e),
    })?;
    let candidate = canonical_root.join(&normalized);
    let canonical = candidate.canonicalize().map_err(|e| Error::Path {
        message: format!("cannot open {:?} in {}: {}", relative, root.display(), e),
    })?;

    if !canonical.starts_with(&canonical_root) {
        return Err(Error::PathEscape {
            path: relative.to_string(),
            root: root.display().to_string(),
        });
    }
    Ok(canonical)
}
