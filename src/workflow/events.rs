// src/workflow/events.rs

use bevy::prelude::*;
use std::path::PathBuf;

use super::coordinator::{ProcessOutcome, SelectOutcome};

/// Open the file picker and make the chosen file current.
#[derive(Event, Debug)]
pub struct RequestSelectFile;

/// Make a known path current without a picker (drag and drop, `--file`).
#[derive(Event, Debug, Clone)]
pub struct RequestSelectPath(pub PathBuf);

/// Run the backend on the current file.
#[derive(Event, Debug)]
pub struct RequestProcessFile;

/// Show the table of the item at this index in the preview pane.
#[derive(Event, Debug, Clone, Copy)]
pub struct RequestPreviewItem(pub usize);

/// Pick a folder and write the current items into it.
#[derive(Event, Debug)]
pub struct RequestExportResults;

/// Sent from background tasks once the matching request has settled.
#[derive(Event, Debug, Clone)]
pub enum WorkflowSettled {
    Selection(SelectOutcome),
    Processing(ProcessOutcome),
    /// Target folder and number of files written.
    Export(Result<(PathBuf, usize), String>),
}
