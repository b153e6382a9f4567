// src/backend/protocol.rs
//! JSON-lines protocol spoken with the backend executable.
//!
//! The request is a single line on stdin. The backend answers on stdout with any
//! number of `event` lines followed by exactly one `response` line. Anything on
//! stdout that does not start with `{` is treated as backend log output.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

use crate::workflow::error::WorkflowError;
use crate::workflow::models::ItemMeta;

pub const UNKNOWN_BACKEND_ERROR: &str = "Unknown error";

#[derive(Debug, Serialize)]
pub struct ProcessRequest<'a> {
    pub path: &'a Path,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackendMessage {
    Event {
        event: String,
        #[serde(default)]
        payload: Value,
    },
    Response(BackendResponse),
}

#[derive(Debug, Deserialize)]
pub struct BackendResponse {
    pub status: String,
    #[serde(default)]
    pub item_meta: Option<Vec<ItemMeta>>,
    #[serde(default)]
    pub error: Option<String>,
}

impl BackendResponse {
    pub fn into_result(self) -> Result<Vec<ItemMeta>, WorkflowError> {
        match self.status.as_str() {
            "ok" => Ok(self.item_meta.unwrap_or_default()),
            "error" => Err(WorkflowError::Backend(
                self.error
                    .filter(|message| !message.trim().is_empty())
                    .unwrap_or_else(|| UNKNOWN_BACKEND_ERROR.to_string()),
            )),
            other => Err(WorkflowError::Transport(format!(
                "unknown response status '{}'",
                other
            ))),
        }
    }
}

pub fn encode_request(path: &Path) -> Result<String, WorkflowError> {
    serde_json::to_string(&ProcessRequest { path })
        .map_err(|e| WorkflowError::Transport(format!("could not encode request: {}", e)))
}

/// Decode one stdout line. `Ok(None)` means the line is not a protocol message.
pub fn parse_line(line: &str) -> Result<Option<BackendMessage>, WorkflowError> {
    let line = line.trim();
    if !line.starts_with('{') {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(line)?))
}
