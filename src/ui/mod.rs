// src/ui/mod.rs

use bevy::prelude::*;
use bevy::window::FileDragAndDrop;
use bevy_egui::{egui, EguiContextPass, EguiContexts};
use bevy_tokio_tasks::TokioTasksRuntime;

pub mod control_panel;
pub mod history;
pub mod preview;

use crate::settings::AppSettings;
use crate::workflow::events::{
    RequestExportResults, RequestPreviewItem, RequestProcessFile, RequestSelectFile,
    RequestSelectPath,
};
use crate::workflow::handler::WorkflowTasks;
use crate::workflow::models::StatusInfo;
use crate::workflow::{StatusStore, WorkflowCoordinator};
use control_panel::show_control_panel;
use preview::{show_item_list, show_preview, ItemSummary};

#[derive(Resource, Default, Debug)]
pub struct PanelUiState {
    pub show_history: bool,
}

/// Desktop panel: controls, status line, item preview and status history.
pub struct PanelUiPlugin;

impl Plugin for PanelUiPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PanelUiState>()
            .add_systems(Update, handle_file_drop_system)
            .add_systems(EguiContextPass, panel_ui_system);

        info!("PanelUiPlugin initialized.");
    }
}

#[allow(clippy::too_many_arguments)]
pub fn panel_ui_system(
    mut contexts: EguiContexts,
    mut ui_state: ResMut<PanelUiState>,
    store: Res<StatusStore>,
    coordinator: Res<WorkflowCoordinator>,
    tasks: Res<WorkflowTasks>,
    mut select_writer: EventWriter<RequestSelectFile>,
    mut process_writer: EventWriter<RequestProcessFile>,
    mut preview_writer: EventWriter<RequestPreviewItem>,
    mut export_writer: EventWriter<RequestExportResults>,
) {
    let ctx = contexts.ctx_mut();
    let show_history = ui_state.show_history;

    // Copy what this frame needs so background writers are not held up while drawing.
    let (loading, status, items, preview, history) = store.read(|snapshot| {
        let items: Vec<ItemSummary> = snapshot
            .item_meta
            .iter()
            .map(|item| (item.code.clone(), item.size_code.clone(), item.table.body.len()))
            .collect();
        let history = if show_history {
            snapshot.history.iter().cloned().collect()
        } else {
            Vec::new()
        };
        (
            snapshot.loading,
            snapshot.status.clone(),
            items,
            snapshot.preview.clone(),
            history,
        )
    });
    let selected = coordinator.selected_file();

    egui::TopBottomPanel::top("control_panel").show(ctx, |ui| {
        ui.add_space(4.0);
        let actions = show_control_panel(
            ui,
            selected.as_ref(),
            &status,
            loading,
            items.len(),
            &tasks,
            &mut ui_state.show_history,
        );
        if actions.select_file {
            select_writer.write(RequestSelectFile);
        }
        if actions.process_file {
            process_writer.write(RequestProcessFile);
        }
        if actions.export_results {
            export_writer.write(RequestExportResults);
        }
        ui.add_space(4.0);
    });

    if show_history {
        egui::TopBottomPanel::bottom("status_history")
            .resizable(true)
            .default_height(140.0)
            .show(ctx, |ui| history::show_history(ui, &history));
    }

    egui::SidePanel::left("item_list")
        .resizable(true)
        .default_width(200.0)
        .show(ctx, |ui| {
            let title = preview.as_ref().map(|p| p.title.as_str());
            if let Some(index) = show_item_list(ui, &items, title) {
                preview_writer.write(RequestPreviewItem(index));
            }
        });

    egui::CentralPanel::default().show(ctx, |ui| show_preview(ui, preview.as_ref()));
}

/// A file dropped on the window becomes the current selection.
pub fn handle_file_drop_system(
    mut drops: EventReader<FileDragAndDrop>,
    settings: Res<AppSettings>,
    store: Res<StatusStore>,
    coordinator: Res<WorkflowCoordinator>,
    runtime: Res<TokioTasksRuntime>,
    mut select_writer: EventWriter<RequestSelectPath>,
) {
    for drop in drops.read() {
        let FileDragAndDrop::DroppedFile { path_buf, .. } = drop else {
            continue;
        };
        if store.is_loading() {
            warn!("Ignoring dropped file {:?} while processing", path_buf);
            continue;
        }
        if !settings.accepts(path_buf) {
            warn!("Dropped file {:?} has an unsupported extension", path_buf);
            let message = format!(
                "unsupported file type, expected one of: {}",
                settings.file_extensions.join(", ")
            );
            // Flashed from a task so the delayed reset has a runtime to run on.
            let coordinator = coordinator.clone();
            runtime.spawn_background_task(move |_ctx| async move {
                coordinator.flash_status(StatusInfo::error(message));
            });
            continue;
        }
        select_writer.write(RequestSelectPath(path_buf.clone()));
    }
}
