// src/ui/history.rs

use bevy_egui::egui::{self, RichText};

use crate::workflow::status_store::StatusEntry;

pub fn show_history(ui: &mut egui::Ui, history: &[StatusEntry]) {
    ui.heading("Status history");
    egui::ScrollArea::vertical()
        .id_salt("status_history_scroll")
        .stick_to_bottom(true)
        .show(ui, |ui| {
            for entry in history {
                let text = RichText::new(&entry.status.message);
                let text = if entry.status.is_error() {
                    text.color(ui.visuals().error_fg_color)
                } else {
                    text
                };
                ui.horizontal(|ui| {
                    ui.monospace(entry.at.format("%H:%M:%S").to_string());
                    ui.label(text);
                });
            }
        });
}
