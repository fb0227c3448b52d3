//! Filesystem helpers for validators that inspect paths from task arguments.

use std::path::{Path, PathBuf};

/// Expand a leading `~` to the user's home directory.
///
/// Paths without a leading `~`, or when `HOME` is unset, are returned as-is.
#[must_use]
pub(crate) fn expand_home(raw: &str) -> PathBuf {
    let rest = match raw.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => return PathBuf::from(raw),
    };
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(rest.trim_start_matches('/')),
        None => PathBuf::from(raw),
    }
}

/// Returns `true` if the path is a regular file that can be opened for reading.
///
/// Symlinks are followed; a link to a readable file counts.
#[must_use]
pub(crate) fn is_readable_file(path: &Path) -> bool {
    let is_file = path.metadata().map(|m| m.is_file()).unwrap_or(false);
    is_file && std::fs::File::open(path).is_ok()
}
