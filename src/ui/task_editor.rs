use egui::{RichText, Ui};

use gantt_chart::chart::{GanttChart, GestureDispatcher};
use gantt_chart::model::{LinkRelation, TaskId, TaskLink, TaskModel, TaskStatus};

use crate::ui::theme;
use crate::ui::time_axis::AxisPainter;

const RELATIONS: [LinkRelation; 4] = [
    LinkRelation::FinishToStart,
    LinkRelation::StartToStart,
    LinkRelation::FinishToFinish,
    LinkRelation::StartToFinish,
];

/// Actions the editor reports back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorAction {
    None,
    Changed,
    LinksChanged,
}

/// Text buffers of the editor. They follow the task unless a field is
/// being typed into.
#[derive(Default)]
pub struct EditorState {
    task: Option<TaskId>,
    name: String,
    row_key: String,
    detail: String,
    editing: bool,
}

impl EditorState {
    fn sync(&mut self, id: TaskId, task: &dyn TaskModel) {
        if self.task == Some(id) && self.editing {
            return;
        }
        self.task = Some(id);
        self.name = task.name().to_string();
        self.row_key = task.row_key().to_string();
        self.detail = task.detail().to_string();
    }
}

struct LinkEntry {
    index: usize,
    link: TaskLink,
    other: String,
    outgoing: bool,
}

fn field_label(ui: &mut Ui, text: &str) {
    ui.label(RichText::new(text).size(10.0).color(theme::TEXT_DIM).strong());
}

/// Render the editor for `id`. Field edits go through the dispatcher so they
/// can be undone.
pub fn show_task_editor(
    chart: &GanttChart,
    dispatcher: &mut GestureDispatcher,
    state: &mut EditorState,
    axis: &AxisPainter,
    id: TaskId,
    ui: &mut Ui,
) -> EditorAction {
    let (name, row_key, detail, status, start, end, links) = {
        let tasks = chart.tasks();
        let Some(task) = tasks.task(id) else {
            return EditorAction::None;
        };
        state.sync(id, task);
        let links: Vec<LinkEntry> = (0..tasks.link_count())
            .filter_map(|index| {
                let link = tasks.link_at(index)?.clone();
                if !link.touches(id) {
                    return None;
                }
                let outgoing = link.from() == id;
                let other = if outgoing { link.to() } else { link.from() };
                let other = tasks.task(other).map(|t| t.name().to_string()).unwrap_or_default();
                Some(LinkEntry {
                    index,
                    link,
                    other,
                    outgoing,
                })
            })
            .collect();
        (
            task.name().to_string(),
            task.row_key().to_string(),
            task.detail().to_string(),
            task.status(),
            task.start(),
            task.end(),
            links,
        )
    };

    let mut action = EditorAction::None;

    ui.add_space(6.0);
    ui.label(RichText::new("Edit Task").strong().size(13.0).color(theme::TEXT_PRIMARY));
    ui.add_space(4.0);

    let frame = egui::Frame {
        fill: theme::BG_DARK,
        rounding: egui::Rounding::same(6.0),
        inner_margin: egui::Margin::same(8.0),
        stroke: egui::Stroke::new(1.0, theme::BORDER_SUBTLE),
        ..egui::Frame::default()
    };

    frame.show(ui, |ui| {
        ui.spacing_mut().item_spacing.y = 6.0;

        field_label(ui, "Name");
        let name_resp = ui.add_sized(
            [ui.available_width(), 24.0],
            egui::TextEdit::singleline(&mut state.name).font(egui::FontId::proportional(12.0)),
        );
        if name_resp.lost_focus() && state.name != name {
            let value = state.name.clone();
            if dispatcher.edit_tasks(chart, &[id], &mut |t: &mut dyn TaskModel| t.set_name(value.clone())) {
                action = EditorAction::Changed;
            }
        }

        field_label(ui, "Row");
        let row_resp = ui.add_sized(
            [ui.available_width(), 24.0],
            egui::TextEdit::singleline(&mut state.row_key).font(egui::FontId::proportional(12.0)),
        );
        if row_resp.lost_focus() && state.row_key != row_key && !state.row_key.trim().is_empty() {
            let value = state.row_key.trim().to_string();
            if dispatcher.edit_tasks(chart, &[id], &mut |t: &mut dyn TaskModel| t.set_row_key(value.clone())) {
                action = EditorAction::Changed;
            }
        }

        field_label(ui, "Status");
        let mut picked = status;
        egui::ComboBox::from_id_salt("status_combo")
            .selected_text(RichText::new(theme::status_label(status)).size(11.0))
            .width(ui.available_width())
            .show_ui(ui, |ui| {
                for option in [TaskStatus::Fine, TaskStatus::Delayed] {
                    ui.selectable_value(&mut picked, option, theme::status_label(option));
                }
            });
        if picked != status
            && dispatcher.edit_tasks(chart, &[id], &mut |t: &mut dyn TaskModel| t.set_status(picked))
        {
            action = EditorAction::Changed;
        }

        field_label(ui, "Schedule");
        ui.label(
            RichText::new(format!(
                "{}  →  {}",
                axis.format_time(start, "%Y-%m-%d %H:%M"),
                axis.format_time(end, "%Y-%m-%d %H:%M")
            ))
            .size(11.0)
            .color(theme::TEXT_SECONDARY),
        );

        field_label(ui, "Detail");
        let detail_resp = ui.add_sized(
            [ui.available_width(), 56.0],
            egui::TextEdit::multiline(&mut state.detail)
                .font(egui::FontId::proportional(11.0))
                .hint_text("Shown in the tooltip"),
        );
        if detail_resp.lost_focus() && state.detail != detail {
            let value = state.detail.clone();
            if dispatcher.edit_tasks(chart, &[id], &mut |t: &mut dyn TaskModel| t.set_detail(value.clone())) {
                action = EditorAction::Changed;
            }
        }

        state.editing = name_resp.has_focus() || row_resp.has_focus() || detail_resp.has_focus();

        if links.is_empty() {
            return;
        }
        ui.separator();
        field_label(ui, "Links");
        for entry in &links {
            ui.horizontal(|ui| {
                let arrow = if entry.outgoing { "→" } else { "←" };
                let mut relation = entry.link.relation;
                egui::ComboBox::from_id_salt(("link_relation", entry.index))
                    .selected_text(relation.short_label())
                    .width(44.0)
                    .show_ui(ui, |ui| {
                        for option in RELATIONS {
                            ui.selectable_value(&mut relation, option, option.short_label());
                        }
                    });
                if relation != entry.link.relation && chart.tasks_mut().set_link_relation(entry.index, relation) {
                    action = EditorAction::LinksChanged;
                }
                ui.label(RichText::new(format!("{arrow} {}", entry.other)).size(11.0));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let remove = ui.add(egui::Button::new(RichText::new("✕").size(10.0)).frame(false));
                    if remove.on_hover_text("Remove link").clicked() && chart.tasks_mut().remove_link(&entry.link) {
                        action = EditorAction::LinksChanged;
                    }
                });
            });
        }
    });

    action
}
