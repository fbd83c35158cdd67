//! Path utilities.
//!
//! Version trees and diff headers carry repository-relative paths as plain
//! `/`-separated strings, so these helpers work on `&str` rather than `Path`.

use std::path::PathBuf;

/// Get the revscope configuration directory.
///
/// - `$XDG_CONFIG_HOME/revscope` if set
/// - `~/.config/revscope` otherwise
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("revscope"))
}

/// Split a relative path into its meaningful segments.
///
/// Leading `./` and `/`, repeated separators, trailing separators and `.`
/// segments are dropped. `..` is kept verbatim; version trees never resolve it.
pub fn path_segments(path: &str) -> Vec<&str> {
    path.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect()
}
