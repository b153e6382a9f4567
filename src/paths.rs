// src/paths.rs

//! Display helpers for file paths shown in the panel.

use directories_next::BaseDirs;
use std::path::{Path, PathBuf};

pub fn home_dir() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf())
}

/// Replace the `home` prefix of `path` with `~/` for display. Paths outside `home`
/// are returned unchanged.
pub fn trim_home_path(path: &Path, home: Option<&Path>) -> String {
    if let Some(rest) = home.and_then(|home| path.strip_prefix(home).ok()) {
        let parts: Vec<String> = rest
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        return format!("~/{}", parts.join("/"));
    }
    path.display().to_string()
}

/// Final path component, falling back to the whole path.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
