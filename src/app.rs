use std::cell::RefCell;
use std::rc::Rc;

use gantt_chart::chart::{GanttChart, GestureDispatcher, GestureOutcome};
use gantt_chart::config::ChartSettings;
use gantt_chart::model::{BasicTask, BasicTaskSet, LinkRelation, TaskId, TaskLink, TaskSet, TaskStatus, Time};

use crate::ui;
use crate::ui::gantt_chart::ChartView;
use crate::ui::task_editor::{EditorAction, EditorState};
use crate::ui::task_table::TaskTableAction;

const HOUR: Time = 3_600_000;
const DAY: Time = 24 * HOUR;

/// Main application state.
pub struct GanttApp {
    pub chart: GanttChart,
    pub dispatcher: GestureDispatcher,
    pub view: ChartView,
    pub editor: EditorState,
    pub status_message: String,
}

impl GanttApp {
    pub fn new(cc: &eframe::CreationContext<'_>, settings: ChartSettings) -> Self {
        ui::theme::apply_theme(&cc.egui_ctx);

        let tasks: Rc<RefCell<dyn TaskSet>> = Rc::new(RefCell::new(Self::sample_tasks()));
        let chart = GanttChart::new(tasks);
        let view = ChartView::new(settings.time_zone);
        log::info!("chart opened with {} row(s)", chart.tasks().row_count());

        Self {
            chart,
            dispatcher: GestureDispatcher::new(settings),
            view,
            editor: EditorState::default(),
            status_message: "Ready".to_string(),
        }
    }

    /// A small plan around the current day for demonstration.
    fn sample_tasks() -> BasicTaskSet {
        let now = chrono::Utc::now().timestamp_millis();
        let day0 = now - now.rem_euclid(DAY);
        let mut set = BasicTaskSet::new();

        let kickoff = set.add_task(Box::new(
            BasicTask::new("Kickoff", "Planning", day0 - 2 * DAY, day0 - DAY)
                .with_detail("Agree on scope and owners"),
        ));
        let requirements = set.add_task(Box::new(BasicTask::new(
            "Requirements",
            "Planning",
            day0 - DAY + 4 * HOUR,
            day0 + 2 * DAY,
        )));
        let design = set.add_task(Box::new(BasicTask::new("UI design", "Design", day0 + DAY, day0 + 5 * DAY)));
        let backend = set.add_task(Box::new(
            BasicTask::new("Backend", "Build", day0 + 2 * DAY, day0 + 9 * DAY).with_status(TaskStatus::Delayed),
        ));
        let frontend = set.add_task(Box::new(BasicTask::new(
            "Frontend",
            "Build",
            day0 + 5 * DAY + 12 * HOUR,
            day0 + 10 * DAY,
        )));
        let qa = set.add_task(Box::new(BasicTask::new("Testing", "QA", day0 + 9 * DAY, day0 + 12 * DAY)));

        for (from, to, relation) in [
            (kickoff, requirements, LinkRelation::FinishToStart),
            (requirements, design, LinkRelation::FinishToStart),
            (design, frontend, LinkRelation::FinishToStart),
            (backend, frontend, LinkRelation::StartToStart),
            (frontend, qa, LinkRelation::FinishToStart),
        ] {
            set.add_link(TaskLink::new(from, to, relation));
        }
        set
    }

    pub fn settings(&self) -> &ChartSettings {
        self.dispatcher.settings()
    }

    pub fn update_settings(&mut self, change: impl FnOnce(&mut ChartSettings)) {
        let mut settings = self.settings().clone();
        change(&mut settings);
        self.view.set_time_zone(settings.time_zone);
        self.dispatcher.set_settings(settings);
        self.chart.request_repaint();
    }

    pub fn save_settings(&mut self) {
        let Some(path) = ChartSettings::default_path() else {
            self.status_message = "No settings folder on this platform".to_string();
            return;
        };
        self.status_message = match self.settings().save_to(&path) {
            Ok(()) => format!("Settings saved to {}", path.display()),
            Err(err) => {
                log::warn!("{err}");
                err.to_string()
            }
        };
    }

    pub fn open_settings_folder(&mut self) {
        let Some(dir) = ChartSettings::default_path().and_then(|p| p.parent().map(|d| d.to_path_buf())) else {
            return;
        };
        if let Err(err) = std::fs::create_dir_all(&dir).and_then(|()| open::that(&dir)) {
            log::warn!("cannot open {}: {err}", dir.display());
            self.status_message = format!("Cannot open {}", dir.display());
        }
    }

    pub fn undo(&mut self) {
        if self.dispatcher.undo(&self.chart) {
            self.status_message = "Undo".to_string();
        }
    }

    pub fn redo(&mut self) {
        if self.dispatcher.redo(&self.chart) {
            self.status_message = "Redo".to_string();
        }
    }

    pub fn zoom_by(&mut self, factor: f64) {
        self.chart.set_zoom(self.chart.zoom() * factor);
    }

    pub fn reset_zoom(&mut self) {
        self.chart.set_zoom(1.0);
        self.view.scroll_to(0.0);
    }

    /// Append a one-day task on a new row after everything else.
    pub fn add_task(&mut self) {
        let (start, row) = {
            let tasks = self.chart.tasks();
            let start = tasks
                .all_tasks()
                .into_iter()
                .filter_map(|id| tasks.task(id).map(|t| t.end()))
                .max()
                .unwrap_or_else(|| chrono::Utc::now().timestamp_millis());
            (start, tasks.row_count() + 1)
        };
        let task = BasicTask::new("New task", format!("Row {row}"), start, start + DAY);
        let id = self.chart.tasks_mut().add_task(Box::new(task));
        let mut selection = self.chart.selection_mut();
        selection.clear();
        selection.select(id);
        self.status_message = "Task added".to_string();
    }

    pub fn delete_task(&mut self, id: TaskId) {
        let removed = self.chart.tasks_mut().remove_task(id);
        if let Some(task) = removed {
            self.status_message = format!("Deleted '{}'", task.name());
        }
    }

    fn task_name(&self, id: TaskId) -> String {
        self.chart
            .tasks()
            .task(id)
            .map(|t| t.name().to_string())
            .unwrap_or_default()
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        // Text fields keep their own undo and arrow keys.
        if ctx.memory(|m| m.focused().is_some()) {
            return;
        }
        let (undo, redo) = ctx.input(|i| {
            let undo = i.modifiers.command && !i.modifiers.shift && i.key_pressed(egui::Key::Z);
            let redo = i.modifiers.command
                && (i.key_pressed(egui::Key::Y) || (i.modifiers.shift && i.key_pressed(egui::Key::Z)));
            (undo, redo)
        });
        if undo {
            self.undo();
        }
        if redo {
            self.redo();
        }

        let steps = ctx.input(|i| {
            let step = if i.modifiers.shift { 10 } else { 1 };
            let mut steps = 0;
            if i.key_pressed(egui::Key::ArrowLeft) {
                steps -= step;
            }
            if i.key_pressed(egui::Key::ArrowRight) {
                steps += step;
            }
            steps
        });
        if steps != 0 && self.dispatcher.nudge(&self.chart, steps).changed {
            self.status_message = format!("Moved selection by {steps} step(s)");
        }

        // Ctrl+scroll and pinch arrive as a zoom factor, not as scrolling.
        let zoom = ctx.input(|i| i.zoom_delta());
        if zoom != 1.0 {
            self.zoom_by(zoom as f64);
        }
    }

    fn report(&mut self, outcome: &GestureOutcome) {
        if let Some(link) = &outcome.new_link {
            self.status_message = format!(
                "Linked '{}' → '{}'",
                self.task_name(link.from()),
                self.task_name(link.to())
            );
        } else if outcome.changed {
            let selected = self.chart.selected();
            self.status_message = match selected.as_slice() {
                [one] => format!("Updated '{}'", self.task_name(*one)),
                many => format!("Updated {} task(s)", many.len()),
            };
        } else if outcome.scroll_to.is_some() {
            self.status_message = format!("Zoom {:.1}×", self.chart.zoom());
        }
    }
}

impl eframe::App for GanttApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_shortcuts(ctx);

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            ui::toolbar::show_toolbar(self, ui);
        });

        egui::TopBottomPanel::bottom("status_bar")
            .exact_height(ui::theme::STATUS_BAR_HEIGHT)
            .frame(
                egui::Frame::default()
                    .fill(ui::theme::BG_HEADER)
                    .inner_margin(egui::Margin::symmetric(10.0, 0.0)),
            )
            .show(ctx, |ui| {
                ui.horizontal_centered(|ui| {
                    ui.label(
                        egui::RichText::new(&self.status_message)
                            .font(ui::theme::font_status())
                            .color(ui::theme::TEXT_SECONDARY),
                    );
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(
                            egui::RichText::new(format!(
                                "Selected: {} · Zoom: {:.0}%",
                                self.chart.selection().len(),
                                self.chart.zoom() * 100.0
                            ))
                            .size(10.5)
                            .color(ui::theme::TEXT_DIM),
                        );
                    });
                });
            });

        let mut table_action = TaskTableAction::None;
        let mut editor_action = EditorAction::None;
        egui::SidePanel::left("task_panel")
            .default_width(ui::theme::SIDE_PANEL_WIDTH)
            .resizable(true)
            .frame(
                egui::Frame::default()
                    .fill(ui::theme::BG_PANEL)
                    .inner_margin(egui::Margin::same(8.0))
                    .stroke(egui::Stroke::new(1.0, ui::theme::BORDER_SUBTLE)),
            )
            .show(ctx, |ui| {
                let single = self.chart.selection().single();
                if let Some(id) = single {
                    editor_action = ui::task_editor::show_task_editor(
                        &self.chart,
                        &mut self.dispatcher,
                        &mut self.editor,
                        &self.view.axis,
                        id,
                        ui,
                    );
                    ui.add_space(4.0);
                    ui.separator();
                }
                let chart = &self.chart;
                let tasks = chart.tasks();
                table_action = ui::task_table::show_task_table(&*tasks, &|id| chart.is_selected(id), ui);
            });

        match table_action {
            TaskTableAction::Select { task, toggle } => {
                let mut selection = self.chart.selection_mut();
                if !toggle {
                    selection.clear();
                }
                selection.toggle(task);
            }
            TaskTableAction::Delete(id) => self.delete_task(id),
            TaskTableAction::Add => self.add_task(),
            TaskTableAction::None => {}
        }
        match editor_action {
            EditorAction::Changed => self.status_message = "Task updated".to_string(),
            EditorAction::LinksChanged => self.status_message = "Links updated".to_string(),
            EditorAction::None => {}
        }

        let chart_frame = egui::Frame::default()
            .fill(ui::theme::BG_DARK)
            .inner_margin(egui::Margin::ZERO);
        egui::CentralPanel::default().frame(chart_frame).show(ctx, |ui| {
            let outcome =
                ui::gantt_chart::show_gantt_chart(&self.chart, &mut self.dispatcher, &mut self.view, ui);
            self.report(&outcome);
        });
        if let Some(err) = self.view.axis_error() {
            self.status_message = format!("Time axis unavailable: {err}");
        }
    }
}
