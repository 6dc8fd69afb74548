use egui::{Color32, RichText, Ui};

use gantt_chart::model::{TaskId, TaskSet};

use crate::ui::theme;

/// Actions that the task table can request.
pub enum TaskTableAction {
    None,
    /// Select a task; `toggle` keeps the rest of the selection.
    Select { task: TaskId, toggle: bool },
    Delete(TaskId),
    Add,
}

/// Render the left-side list of rows and their tasks.
pub fn show_task_table(
    tasks: &dyn TaskSet,
    is_selected: &dyn Fn(TaskId) -> bool,
    ui: &mut Ui,
) -> TaskTableAction {
    let mut action = TaskTableAction::None;
    let total = tasks.all_tasks().len();

    ui.add_space(2.0);
    ui.horizontal(|ui| {
        ui.label(RichText::new("Rows").strong().size(15.0).color(theme::TEXT_PRIMARY));
        ui.add_space(4.0);
        ui.label(
            RichText::new(format!("({} rows, {} tasks)", tasks.row_count(), total))
                .size(11.0)
                .color(theme::TEXT_DIM),
        );
    });
    ui.add_space(4.0);

    let btn = egui::Button::new(RichText::new("＋  Add Task").color(Color32::WHITE).size(12.0))
        .fill(theme::ACCENT)
        .rounding(egui::Rounding::same(5.0));
    if ui.add_sized([ui.available_width(), 28.0], btn).clicked() {
        action = TaskTableAction::Add;
    }

    ui.add_space(6.0);
    ui.separator();

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            for row in 0..tasks.row_count() {
                let title = tasks.title_at(row).unwrap_or_default();
                ui.add_space(4.0);
                ui.label(RichText::new(title).size(10.0).strong().color(theme::TEXT_DIM));

                for id in tasks.tasks_in_row(row) {
                    let Some(task) = tasks.task(id) else {
                        continue;
                    };
                    let selected = is_selected(id);
                    let frame = egui::Frame {
                        fill: if selected { theme::BG_SELECTED } else { theme::BG_DARK },
                        rounding: egui::Rounding::same(4.0),
                        inner_margin: egui::Margin::symmetric(6.0, 3.0),
                        ..egui::Frame::default()
                    };

                    let frame_resp = frame.show(ui, |ui| {
                        ui.horizontal(|ui| {
                            let (dot, _) = ui.allocate_exact_size(egui::vec2(6.0, 6.0), egui::Sense::hover());
                            ui.painter()
                                .circle_filled(dot.center(), 3.0, theme::bar_color(task.status()));
                            ui.add(
                                egui::Label::new(RichText::new(task.name()).size(12.0).color(if selected {
                                    Color32::WHITE
                                } else {
                                    theme::TEXT_PRIMARY
                                }))
                                .truncate(),
                            );
                            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                                let del = ui.add(
                                    egui::Button::new(RichText::new("✕").size(10.0).color(theme::TEXT_DIM))
                                        .frame(false),
                                );
                                if del.on_hover_text("Delete task").clicked() {
                                    action = TaskTableAction::Delete(id);
                                }
                            });
                        });
                    });

                    let row_click = ui.interact(
                        frame_resp.response.rect,
                        egui::Id::new(("task-row", id)),
                        egui::Sense::click(),
                    );
                    if row_click.clicked() && matches!(action, TaskTableAction::None) {
                        let toggle = ui.input(|i| i.modifiers.command);
                        action = TaskTableAction::Select { task: id, toggle };
                    }
                    ui.add_space(1.0);
                }
            }
        });

    action
}
