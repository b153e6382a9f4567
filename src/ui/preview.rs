// src/ui/preview.rs

use bevy_egui::egui;
use egui_extras::{Column, TableBuilder};

use crate::workflow::models::{ItemTable, PreviewTable};

/// `(code, size_code, row count)` per item, in backend order.
pub type ItemSummary = (String, String, usize);

/// Item list on the left; returns the index the user clicked.
pub fn show_item_list(ui: &mut egui::Ui, items: &[ItemSummary], preview_title: Option<&str>) -> Option<usize> {
    let mut clicked = None;
    ui.heading(format!("Items ({})", items.len()));
    ui.separator();
    if items.is_empty() {
        ui.weak("Nothing generated yet.");
        return None;
    }
    egui::ScrollArea::vertical()
        .id_salt("item_list_scroll")
        .show(ui, |ui| {
            for (index, (code, size_code, rows)) in items.iter().enumerate() {
                let title = format!("{} ({})", code, size_code);
                let selected = preview_title == Some(title.as_str());
                if ui
                    .selectable_label(selected, &title)
                    .on_hover_text(format!("{} row(s)", rows))
                    .clicked()
                {
                    clicked = Some(index);
                }
            }
        });
    clicked
}

pub fn show_preview(ui: &mut egui::Ui, preview: Option<&PreviewTable>) {
    let Some(preview) = preview else {
        ui.centered_and_justified(|ui| {
            ui.weak("Select an item to preview its size table.");
        });
        return;
    };
    ui.heading(&preview.title);
    ui.separator();
    egui::ScrollArea::horizontal()
        .id_salt("preview_table_scroll")
        .show(ui, |ui| preview_table(ui, &preview.table));
}

fn preview_table(ui: &mut egui::Ui, table: &ItemTable) {
    let num_cols = table
        .body
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(table.head.len()))
        .max()
        .unwrap_or(0);
    if num_cols == 0 {
        ui.weak("Empty table.");
        return;
    }

    let row_height = 20.0;
    let mut table_builder = TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .min_scrolled_height(0.0);
    for _ in 0..num_cols {
        table_builder = table_builder.column(Column::initial(90.0).at_least(40.0).resizable(true).clip(true));
    }

    table_builder
        .header(row_height, |mut header| {
            for i in 0..num_cols {
                header.col(|ui| {
                    ui.strong(table.head.get(i).map(String::as_str).unwrap_or(""));
                });
            }
        })
        .body(|body| {
            body.rows(row_height, table.body.len(), |mut row| {
                let cells = &table.body[row.index()];
                for i in 0..num_cols {
                    row.col(|ui| {
                        ui.label(cells.get(i).map(String::as_str).unwrap_or(""));
                    });
                }
            });
        });
}
