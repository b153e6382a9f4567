// src/ui/control_panel.rs

use bevy::log::{error, info};
use bevy_egui::egui::{self, RichText};

use crate::workflow::handler::WorkflowTasks;
use crate::workflow::models::{SelectedFile, StatusInfo};

/// What the user asked for this frame. Turned into workflow events by the caller.
#[derive(Debug, Default)]
pub struct ControlActions {
    pub select_file: bool,
    pub process_file: bool,
    pub export_results: bool,
}

pub fn show_control_panel(
    ui: &mut egui::Ui,
    selected: Option<&SelectedFile>,
    status: &StatusInfo,
    loading: bool,
    item_count: usize,
    tasks: &WorkflowTasks,
    show_history: &mut bool,
) -> ControlActions {
    let mut actions = ControlActions::default();

    ui.horizontal(|ui| {
        let can_pick = !loading && !tasks.selecting;
        if ui
            .add_enabled(can_pick, egui::Button::new("Open source file"))
            .clicked()
        {
            actions.select_file = true;
        }

        match selected {
            Some(file) => {
                ui.label(RichText::new(&file.display_name).strong())
                    .on_hover_text(file.absolute_path.display().to_string());
                ui.weak(&file.display_path);
            }
            None => {
                ui.weak("No file selected (drop one here)");
            }
        }
    });

    ui.horizontal(|ui| {
        let can_process = selected.is_some() && !loading && !tasks.processing;
        if ui
            .add_enabled(can_process, egui::Button::new("Start generating"))
            .clicked()
        {
            actions.process_file = true;
        }
        if loading {
            ui.spinner();
        }

        ui.separator();

        let can_export = item_count > 0 && !loading && !tasks.exporting;
        if ui
            .add_enabled(can_export, egui::Button::new("Export tables"))
            .clicked()
        {
            actions.export_results = true;
        }
        if let Some(dir) = &tasks.last_export_dir {
            if ui
                .button("Open export folder")
                .on_hover_text(dir.display().to_string())
                .clicked()
            {
                match open::that(dir) {
                    Ok(()) => info!("Opened export folder {:?}", dir),
                    Err(e) => error!("Failed to open export folder {:?}: {}", dir, e),
                }
            }
        }

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.toggle_value(show_history, "History");
        });
    });

    ui.separator();
    status_line(ui, status);
    actions
}

pub fn status_line(ui: &mut egui::Ui, status: &StatusInfo) {
    let color = if status.is_error() {
        ui.visuals().error_fg_color
    } else {
        ui.visuals().text_color()
    };
    ui.horizontal(|ui| {
        ui.label("Status:");
        ui.label(RichText::new(&status.message).color(color));
    });
}
