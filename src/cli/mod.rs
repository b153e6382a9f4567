// src/cli/mod.rs

//! Command-line flags and the window-less `process` command.

use bevy::log::{error, info, warn};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use crate::backend::ProcessGateway;
use crate::settings::AppSettings;
use crate::workflow::coordinator::{CoordinatorConfig, ProcessOutcome};
use crate::workflow::status_store::StatusStore;
use crate::workflow::WorkflowCoordinator;

#[derive(Parser, Debug)]
#[command(name = "size-table-generator")]
#[command(about = "Generate size tables from product spreadsheets", long_about = None)]
pub struct Cli {
    /// Backend executable to use instead of the configured one
    #[arg(long, global = true)]
    pub backend: Option<String>,

    /// Preselect this file when the window opens
    #[arg(long)]
    pub file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process a spreadsheet without opening the window
    Process {
        /// Path to the source spreadsheet
        path: PathBuf,
    },
}

impl Cli {
    /// Settings with command-line overrides applied.
    pub fn apply_overrides(&self, mut settings: AppSettings) -> AppSettings {
        if let Some(program) = &self.backend {
            info!("Using backend '{}' from the command line", program);
            settings.backend.program = program.clone();
        }
        settings
    }
}

/// Exit code for a finished `process` run.
pub fn exit_code(outcome: &ProcessOutcome) -> u8 {
    match outcome {
        ProcessOutcome::Succeeded { .. } => 0,
        ProcessOutcome::Rejected | ProcessOutcome::Failed(_) | ProcessOutcome::Superseded => 1,
    }
}

/// Lines printed after a `process` run: the final status, then one line per item.
pub fn format_report(store: &StatusStore) -> Vec<String> {
    store.read(|snapshot| {
        let mut lines = Vec::with_capacity(snapshot.item_meta.len() + 1);
        let label = if snapshot.status.is_error() { "error" } else { "status" };
        lines.push(format!("{}: {}", label, snapshot.status.message));
        for item in &snapshot.item_meta {
            lines.push(format!(
                "  {} ({}): {} row(s)",
                item.code,
                item.size_code,
                item.table.body.len()
            ));
        }
        lines
    })
}

pub fn run_process(settings: &AppSettings, path: PathBuf) -> u8 {
    if !settings.accepts(&path) {
        warn!("{:?} does not have an accepted extension {:?}", path, settings.file_extensions);
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Could not start async runtime: {}", e);
            return 2;
        }
    };

    let store = StatusStore::new();
    let coordinator = WorkflowCoordinator::new(
        Arc::new(ProcessGateway::from_settings(settings)),
        store.clone(),
        CoordinatorConfig {
            status_reset: settings.status_reset(),
            ..Default::default()
        },
    );

    let outcome = runtime.block_on(async {
        let file = coordinator.select_path(path);
        println!("Processing {}", file.display_path);
        coordinator.process_selected_file().await
    });

    for line in format_report(&store) {
        println!("{}", line);
    }
    exit_code(&outcome)
}
