// src/settings/mod.rs

pub mod io;

use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// How the backend executable is launched.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct BackendSettings {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            program: "size-table-backend".to_string(),
            args: Vec::new(),
        }
    }
}

#[derive(Resource, Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AppSettings {
    pub backend: BackendSettings,
    /// Extensions offered by the file picker, without the dot.
    pub file_extensions: Vec<String>,
    pub status_reset_secs: u64,
    /// Folder the export dialog opens in; updated after every export that wrote files.
    pub last_export_dir: Option<PathBuf>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            backend: BackendSettings::default(),
            file_extensions: vec!["xlsx".to_string(), "xls".to_string()],
            status_reset_secs: 5,
            last_export_dir: None,
        }
    }
}

impl AppSettings {
    pub fn status_reset(&self) -> Duration {
        Duration::from_secs(self.status_reset_secs)
    }

    /// Whether `path` has one of the accepted extensions (case-insensitive).
    /// An empty extension list accepts everything.
    pub fn accepts(&self, path: &std::path::Path) -> bool {
        if self.file_extensions.is_empty() {
            return true;
        }
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                self.file_extensions
                    .iter()
                    .any(|accepted| accepted.eq_ignore_ascii_case(ext))
            })
    }
}
