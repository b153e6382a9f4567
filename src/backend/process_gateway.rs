// src/backend/process_gateway.rs
//! Production gateway: native file dialog plus a backend executable driven over
//! the JSON-lines protocol in [`super::protocol`].

use async_trait::async_trait;
use bevy::log::{debug, error, info, warn};
use rfd::FileDialog;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};

use super::protocol::{encode_request, parse_line, BackendMessage, BackendResponse};
use crate::settings::AppSettings;
use crate::workflow::error::WorkflowError;
use crate::workflow::event_bus::{EventBus, Subscription};
use crate::workflow::gateway::{subscribe_update_state, BackendGateway, ProgressHandler};
use crate::workflow::models::ItemMeta;

/// How long the backend may take to exit once its output is done before it is killed.
pub const DEFAULT_EXIT_GRACE: Duration = Duration::from_secs(2);

pub struct ProcessGateway {
    program: String,
    args: Vec<String>,
    extensions: Vec<String>,
    exit_grace: Duration,
    bus: EventBus,
}

impl ProcessGateway {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            extensions: Vec::new(),
            exit_grace: DEFAULT_EXIT_GRACE,
            bus: EventBus::new(),
        }
    }

    pub fn from_settings(settings: &AppSettings) -> Self {
        Self::new(settings.backend.program.clone(), settings.backend.args.clone())
            .with_extensions(settings.file_extensions.clone())
    }

    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn with_exit_grace(mut self, exit_grace: Duration) -> Self {
        self.exit_grace = exit_grace;
        self
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    fn transport(&self, what: &str, err: impl std::fmt::Display) -> WorkflowError {
        WorkflowError::Transport(format!("{} '{}': {}", what, self.program, err))
    }

    async fn run_backend(&self, path: &Path) -> Result<BackendResponse, WorkflowError> {
        let request = encode_request(path)?;
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.transport("failed to start backend", e))?;
        debug!("Backend: started '{}' for {:?}", self.program, path);

        // Closing stdin tells the backend the request is complete.
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(request.as_bytes()).await?;
            stdin.write_all(b"\n").await?;
            stdin.shutdown().await?;
        }

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| self.transport("no stdout from backend", "pipe missing"))?;
        let mut lines = BufReader::new(stdout).lines();
        let mut response = None;
        while let Some(line) = lines.next_line().await? {
            match parse_line(&line)? {
                Some(BackendMessage::Event { event, payload }) => {
                    let delivered = self.bus.emit(&event, &payload);
                    debug!("Backend: event '{}' delivered to {} subscriber(s)", event, delivered);
                }
                Some(BackendMessage::Response(reply)) => {
                    response = Some(reply);
                    break;
                }
                None if line.trim().is_empty() => {}
                None => debug!("Backend log: {}", line.trim_end()),
            }
        }

        // Our end of stdout closes here, so a backend still writing gets EPIPE instead of blocking.
        drop(lines);
        let status = self.settle(&mut child).await;

        response.ok_or_else(|| {
            let how = status.map_or_else(|| "was killed".to_string(), |s| format!("exited ({})", s));
            WorkflowError::Transport(format!("backend '{}' {} without a response", self.program, how))
        })
    }

    /// Wait for the child to exit, killing it if it outlives `exit_grace`.
    /// `None` means it had to be killed or could not be waited on.
    async fn settle(&self, child: &mut Child) -> Option<ExitStatus> {
        match tokio::time::timeout(self.exit_grace, child.wait()).await {
            Ok(Ok(status)) => {
                if !status.success() {
                    warn!("Backend '{}' exited with {}", self.program, status);
                }
                Some(status)
            }
            Ok(Err(e)) => {
                warn!("Backend '{}': waiting for exit failed: {}", self.program, e);
                None
            }
            Err(_) => {
                warn!(
                    "Backend '{}' still running {:?} after its output ended, killing it",
                    self.program, self.exit_grace
                );
                if let Err(e) = child.kill().await {
                    warn!("Backend '{}': kill failed: {}", self.program, e);
                }
                None
            }
        }
    }
}

#[async_trait]
impl BackendGateway for ProcessGateway {
    async fn select_file(&self) -> Option<PathBuf> {
        let extensions = self.extensions.clone();
        let picked = tokio::task::spawn_blocking(move || {
            let mut dialog = FileDialog::new().set_title("Select source spreadsheet");
            if !extensions.is_empty() {
                dialog = dialog.add_filter("Spreadsheet", extensions.as_slice());
            }
            dialog.pick_file()
        })
        .await;
        match picked {
            Ok(path) => path,
            Err(e) => {
                error!("File dialog task failed: {}", e);
                None
            }
        }
    }

    async fn process_file(&self, path: &Path) -> Result<Vec<ItemMeta>, WorkflowError> {
        info!("Backend: processing {:?} with '{}'", path, self.program);
        self.run_backend(path).await?.into_result()
    }

    fn subscribe_progress(&self, handler: ProgressHandler) -> Result<Subscription, WorkflowError> {
        Ok(subscribe_update_state(&self.bus, handler))
    }
}
