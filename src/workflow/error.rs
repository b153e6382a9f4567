// src/workflow/error.rs

use thiserror::Error;

use super::models::{NO_FILE_MESSAGE, PROCESS_FAILED_MESSAGE};

/// Every way a processing attempt can fail.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    /// Processing requested before a file was selected. Never reaches the gateway.
    #[error("no source file selected")]
    Precondition,
    /// The backend could not be reached or answered with something unreadable.
    #[error("backend transport error: {0}")]
    Transport(String),
    /// The backend ran and reported a failure; the message is backend-authored.
    #[error("{0}")]
    Backend(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl WorkflowError {
    /// Text for the status line. Only backend messages are shown verbatim.
    pub fn user_message(&self) -> String {
        match self {
            WorkflowError::Precondition => NO_FILE_MESSAGE.to_string(),
            WorkflowError::Backend(message) => message.clone(),
            WorkflowError::Transport(_) | WorkflowError::Unexpected(_) => {
                PROCESS_FAILED_MESSAGE.to_string()
            }
        }
    }
}

impl From<std::io::Error> for WorkflowError {
    fn from(err: std::io::Error) -> Self {
        WorkflowError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for WorkflowError {
    fn from(err: serde_json::Error) -> Self {
        WorkflowError::Transport(format!("malformed backend message: {}", err))
    }
}
