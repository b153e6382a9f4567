// src/workflow/models.rs

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// File chosen by the user. Replaced wholesale on every new selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub absolute_path: PathBuf,
    /// Final path component, e.g. `data.xlsx`.
    pub display_name: String,
    /// Home-trimmed path shown in the panel, e.g. `~/data.xlsx`.
    pub display_path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    #[default]
    Normal,
    Error,
}

/// The single user-visible status line.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusInfo {
    pub kind: StatusKind,
    pub message: String,
}

pub const READY_MESSAGE: &str = "ready";
pub const PROCESSING_MESSAGE: &str = "processing file";
pub const DONE_MESSAGE: &str = "done";
pub const NO_FILE_MESSAGE: &str = "please select a source file first";
pub const PROCESS_FAILED_MESSAGE: &str = "processing failed";

impl StatusInfo {
    pub fn normal(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Normal,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            message: message.into(),
        }
    }

    pub fn ready() -> Self {
        Self::normal(READY_MESSAGE)
    }

    pub fn processing() -> Self {
        Self::normal(PROCESSING_MESSAGE)
    }

    pub fn done() -> Self {
        Self::normal(DONE_MESSAGE)
    }

    pub fn is_error(&self) -> bool {
        self.kind == StatusKind::Error
    }
}

/// Payload of the `update-state` event stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ItemTable {
    pub head: Vec<String>,
    pub body: Vec<Vec<String>>,
}

/// One generated size table, as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemMeta {
    pub code: String,
    pub size_code: String,
    #[serde(default)]
    pub table: ItemTable,
}

/// Table currently shown in the preview pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewTable {
    pub title: String,
    pub table: ItemTable,
}

impl PreviewTable {
    pub fn from_item(item: &ItemMeta) -> Self {
        Self {
            title: format!("{} ({})", item.code, item.size_code),
            table: item.table.clone(),
        }
    }
}
