use egui::{menu, RichText, Ui};

use gantt_chart::config::{AxisTimeZone, RowDragPolicy};

use crate::app::GanttApp;

/// Render the top menu bar.
pub fn show_toolbar(app: &mut GanttApp, ui: &mut Ui) {
    menu::bar(ui, |ui| {
        ui.menu_button("  Edit  ", |ui| {
            if ui
                .add_enabled(app.dispatcher.can_undo(), egui::Button::new("  Undo          Ctrl+Z"))
                .clicked()
            {
                app.undo();
                ui.close_menu();
            }
            if ui
                .add_enabled(app.dispatcher.can_redo(), egui::Button::new("  Redo          Ctrl+Y"))
                .clicked()
            {
                app.redo();
                ui.close_menu();
            }
            ui.separator();
            if ui.button("  Add Task").clicked() {
                app.add_task();
                ui.close_menu();
            }
            if ui.button("  Clear Selection").clicked() {
                app.chart.selection_mut().clear();
                ui.close_menu();
            }
        });

        ui.menu_button("  View  ", |ui| {
            if ui.button("  Zoom In        Ctrl+Scroll ↑").clicked() {
                app.zoom_by(1.5);
                ui.close_menu();
            }
            if ui.button("  Zoom Out      Ctrl+Scroll ↓").clicked() {
                app.zoom_by(1.0 / 1.5);
                ui.close_menu();
            }
            if ui.button("  Reset Zoom").clicked() {
                app.reset_zoom();
                ui.close_menu();
            }
            ui.separator();
            ui.label(RichText::new("Axis time zone").small().weak());
            let mut zone = app.settings().time_zone;
            ui.radio_value(&mut zone, AxisTimeZone::Local, "Local");
            ui.radio_value(&mut zone, AxisTimeZone::Utc, "UTC");
            if zone != app.settings().time_zone {
                app.update_settings(|s| s.time_zone = zone);
                ui.close_menu();
            }
        });

        ui.menu_button("  Settings  ", |ui| {
            ui.label(RichText::new("Dragging across rows").small().weak());
            let mut policy = app.settings().row_drag;
            ui.radio_value(&mut policy, RowDragPolicy::SwapRows, "Swap rows");
            ui.radio_value(&mut policy, RowDragPolicy::Reassign, "Move task to row");
            if policy != app.settings().row_drag {
                app.update_settings(|s| s.row_drag = policy);
            }
            let mut snapping = app.settings().snap_granularity > 1;
            if ui.checkbox(&mut snapping, "Snap to whole seconds").changed() {
                app.update_settings(|s| s.snap_granularity = if snapping { 1_000 } else { 0 });
            }
            ui.separator();
            if ui.button("  Save Settings").clicked() {
                app.save_settings();
                ui.close_menu();
            }
            if ui.button("  Open Settings Folder").clicked() {
                app.open_settings_folder();
                ui.close_menu();
            }
        });

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            ui.label(
                RichText::new(format!("{} edit(s) in history", app.dispatcher.undo_manager().len()))
                    .size(11.0)
                    .weak(),
            );
        });
    });
}
