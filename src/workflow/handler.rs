// src/workflow/handler.rs

use bevy::prelude::*;
use bevy_tokio_tasks::TokioTasksRuntime;
use rfd::FileDialog;
use std::path::PathBuf;

use super::coordinator::{ProcessOutcome, SelectOutcome, WorkflowCoordinator};
use crate::settings::{io::remember_export_dir, AppSettings};
use super::events::*;

/// Background work currently in flight. Requests arriving while their kind is
/// busy are dropped.
#[derive(Resource, Debug, Default)]
pub struct WorkflowTasks {
    pub selecting: bool,
    pub processing: bool,
    pub exporting: bool,
    /// Folder of the last export that wrote at least one file.
    pub last_export_dir: Option<PathBuf>,
}

pub(crate) fn handle_select_file_request_system(
    mut events: EventReader<RequestSelectFile>,
    mut tasks: ResMut<WorkflowTasks>,
    coordinator: Res<WorkflowCoordinator>,
    runtime: Res<TokioTasksRuntime>,
) {
    if events.read().last().is_none() {
        return;
    }
    if tasks.selecting {
        debug!("Workflow: picker already open, ignoring select request");
        return;
    }
    tasks.selecting = true;
    let coordinator = coordinator.clone();
    runtime.spawn_background_task(move |mut ctx| async move {
        let outcome = coordinator.select_file().await;
        ctx.run_on_main_thread(move |ctx| {
            ctx.world.send_event(WorkflowSettled::Selection(outcome));
        })
        .await;
    });
}

pub(crate) fn handle_select_path_request_system(
    mut events: EventReader<RequestSelectPath>,
    coordinator: Res<WorkflowCoordinator>,
) {
    // Only the newest path matters when several arrive in one frame.
    if let Some(RequestSelectPath(path)) = events.read().last() {
        let file = coordinator.select_path(path.clone());
        info!("Workflow: selected {} directly", file.display_path);
    }
}

pub(crate) fn handle_process_file_request_system(
    mut events: EventReader<RequestProcessFile>,
    mut tasks: ResMut<WorkflowTasks>,
    coordinator: Res<WorkflowCoordinator>,
    runtime: Res<TokioTasksRuntime>,
) {
    if events.read().last().is_none() {
        return;
    }
    if tasks.processing || coordinator.store().is_loading() {
        warn!("Workflow: processing already running, ignoring request");
        return;
    }
    tasks.processing = true;
    let coordinator = coordinator.clone();
    runtime.spawn_background_task(move |mut ctx| async move {
        let outcome = coordinator.process_selected_file().await;
        ctx.run_on_main_thread(move |ctx| {
            ctx.world.send_event(WorkflowSettled::Processing(outcome));
        })
        .await;
    });
}

pub(crate) fn handle_preview_item_request_system(
    mut events: EventReader<RequestPreviewItem>,
    coordinator: Res<WorkflowCoordinator>,
) {
    for RequestPreviewItem(index) in events.read() {
        coordinator.show_preview(*index);
    }
}

pub(crate) fn handle_export_request_system(
    mut events: EventReader<RequestExportResults>,
    mut tasks: ResMut<WorkflowTasks>,
    coordinator: Res<WorkflowCoordinator>,
    settings: Res<AppSettings>,
    runtime: Res<TokioTasksRuntime>,
) {
    if events.read().last().is_none() || tasks.exporting {
        return;
    }
    let mut dialog = FileDialog::new().set_title("Export size tables");
    if let Some(start) = tasks.last_export_dir.as_ref().or(settings.last_export_dir.as_ref()) {
        dialog = dialog.set_directory(start);
    }
    let Some(dir) = dialog.pick_folder()
    else {
        info!("Workflow: export cancelled");
        return;
    };

    tasks.exporting = true;
    let coordinator = coordinator.clone();
    runtime.spawn_background_task(move |mut ctx| async move {
        let target = dir.clone();
        let result = match tokio::task::spawn_blocking(move || coordinator.export_results(&target)).await
        {
            Ok(Ok(written)) => Ok((dir, written.len())),
            Ok(Err(e)) => Err(e.to_string()),
            Err(e) => Err(format!("export task failed: {}", e)),
        };
        ctx.run_on_main_thread(move |ctx| {
            ctx.world.send_event(WorkflowSettled::Export(result));
        })
        .await;
    });
}

pub(crate) fn handle_workflow_settled_system(
    mut events: EventReader<WorkflowSettled>,
    mut tasks: ResMut<WorkflowTasks>,
    mut settings: ResMut<AppSettings>,
) {
    for event in events.read() {
        match event {
            WorkflowSettled::Selection(outcome) => {
                tasks.selecting = false;
                match outcome {
                    SelectOutcome::Selected(file) => {
                        info!("Workflow: selection settled on {}", file.display_path)
                    }
                    SelectOutcome::Cancelled => debug!("Workflow: selection cancelled"),
                }
            }
            WorkflowSettled::Processing(outcome) => {
                tasks.processing = false;
                match outcome {
                    ProcessOutcome::Succeeded { items } => {
                        info!("Workflow: processing finished with {} item(s)", items)
                    }
                    ProcessOutcome::Failed(err) => warn!("Workflow: processing failed: {}", err),
                    ProcessOutcome::Rejected => debug!("Workflow: processing rejected, no file"),
                    ProcessOutcome::Superseded => debug!("Workflow: processing result superseded"),
                }
            }
            WorkflowSettled::Export(result) => {
                tasks.exporting = false;
                match result {
                    Ok((dir, 0)) => debug!("Workflow: nothing exported to {:?}", dir),
                    Ok((dir, count)) => {
                        info!("Workflow: exported {} table(s) to {:?}", count, dir);
                        tasks.last_export_dir = Some(dir.clone());
                        settings.last_export_dir = Some(dir.clone());
                        if let Err(e) = remember_export_dir(dir) {
                            warn!("AppSettings: could not save export folder: {}", e);
                        }
                    }
                    Err(e) => error!("Workflow: export failed: {}", e),
                }
            }
        }
    }
}
