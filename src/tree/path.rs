//! Path normalization for manifest entries.
//!
//! Every path recorded in a generation is relative to its sealed root, uses
//! forward slashes, contains no `.`/`..` components or leading separator, and
//! is in Unicode NFC. Child ordering everywhere is byte-wise comparison of
//! the normalized name, not locale collation.

use crate::error::SealError;
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};
use unicode_normalization::UnicodeNormalization;

/// Relative path of the sealed root itself.
pub const ROOT_PATH: &str = ".";

/// Normalize a single file or directory name: NFC, lossy UTF-8.
pub fn normalize_name(name: &OsStr) -> String {
    name.to_string_lossy().nfc().collect()
}

/// Join a normalized parent-relative path with a normalized child name.
pub fn join_rel(parent: &str, name: &str) -> String {
    if parent == ROOT_PATH {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}

/// Canonicalize a sealed-root path for filesystem access.
///
/// Uses dunce so Windows paths come back without the verbatim prefix.
pub fn canonicalize_root(path: &Path) -> Result<PathBuf, SealError> {
    dunce::canonicalize(path).map_err(|e| SealError::io(path, e))
}

/// Normalize an arbitrary relative path string into manifest form.
///
/// Rejects absolute paths and `..` components; collapses `.` components;
/// converts separators to forward slashes; applies NFC per component.
pub fn normalize_rel_path(path: &Path) -> Result<String, SealError> {
    let mut parts: Vec<String> = Vec::new();
    for component in path.components() {
        match component {
            Component::Normal(name) => parts.push(normalize_name(name)),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(SealError::Config(format!(
                    "path {:?} is not a plain relative path",
                    path
                )));
            }
        }
    }
    if parts.is_empty() {
        return Ok(ROOT_PATH.to_string());
    }
    Ok(parts.join("/"))
}

/// Whether `path` equals `prefix` or lies beneath it, in normalized form.
pub fn is_under(path: &str, prefix: &str) -> bool {
    path == prefix || path.starts_with(prefix) && path.as_bytes().get(prefix.len()) == Some(&b'/')
}
