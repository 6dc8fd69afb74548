use egui::{pos2, vec2, Align2, CursorIcon, Id, Key, PointerButton, Pos2, Rect, Sense, Shape, Stroke, Ui, Vec2};

use gantt_chart::chart::{cursor_for, CursorKind, EditMode, GanttChart, GestureDispatcher, GestureOutcome, GesturePreview};
use gantt_chart::config::AxisTimeZone;
use gantt_chart::model::{LinkRelation, TaskId};

use crate::ui::theme;
use crate::ui::time_axis::AxisPainter;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Chart view state that has to survive between frames.
pub struct ChartView {
    pub axis: AxisPainter,
    /// Button whose press opened the current gesture.
    held: Option<PointerButton>,
    rename_text: String,
    rename_focus: bool,
    scroll_to: Option<f32>,
    /// Why the time axis could not be laid out, while it keeps failing.
    axis_error: Option<String>,
}

impl ChartView {
    pub fn new(zone: AxisTimeZone) -> Self {
        Self {
            axis: AxisPainter::new(zone),
            held: None,
            rename_text: String::new(),
            rename_focus: false,
            scroll_to: None,
            axis_error: None,
        }
    }

    pub fn set_time_zone(&mut self, zone: AxisTimeZone) {
        if self.axis.zone() != zone {
            self.axis = AxisPainter::new(zone);
        }
    }

    pub fn scroll_to(&mut self, x: f32) {
        self.scroll_to = Some(x);
    }

    pub fn axis_error(&self) -> Option<&str> {
        self.axis_error.as_deref()
    }

    /// Remember how the last axis layout went. Each failure is logged once
    /// when it first appears, not on every frame.
    fn record_axis_result(&mut self, result: gantt_chart::Result<()>) {
        match result {
            Ok(()) => {
                if self.axis_error.take().is_some() {
                    log::info!("time axis restored");
                }
            }
            Err(err) => {
                let message = err.to_string();
                if self.axis_error.as_deref() != Some(message.as_str()) {
                    log::error!("time axis cannot be drawn: {message}");
                    self.axis_error = Some(message);
                }
            }
        }
    }
}

/// Render the chart area and route pointer input to the dispatcher.
pub fn show_gantt_chart(
    chart: &GanttChart,
    dispatcher: &mut GestureDispatcher,
    view: &mut ChartView,
    ui: &mut Ui,
) -> GestureOutcome {
    let mut outcome = GestureOutcome::default();
    let available = ui.available_size();
    chart.set_viewport_width(available.x);

    let header = view.axis.height(ui.ctx());
    let body = chart.preferred_size();
    let size = vec2(
        body.x.max(available.x),
        (header + body.y + theme::CHART_FOOTER).max(available.y),
    );

    let mut area = egui::ScrollArea::both()
        .auto_shrink([false, false])
        .drag_to_scroll(false);
    if let Some(x) = view.scroll_to.take() {
        area = area.horizontal_scroll_offset(x);
    }

    area.show(ui, |ui| {
        let (response, painter) = ui.allocate_painter(size, Sense::click_and_drag());
        // Chart coordinates put (0, 0) at the top of the first row.
        let origin = response.rect.min + vec2(0.0, header);
        let offset = origin.to_vec2();
        let clip = ui.clip_rect();

        painter.rect_filled(response.rect, 0.0, theme::BG_DARK);
        paint_rows(&painter, chart, origin, response.rect);
        paint_now_line(&painter, chart, origin, response.rect);
        paint_links(&painter, chart, offset);
        paint_bars(&painter, chart, offset);
        paint_preview(&painter, chart, dispatcher.preview(), offset, response.rect);

        // The axis sticks to the top of the visible area.
        let axis_top = clip.top().max(response.rect.top());
        let painted = view.axis.paint(
            &painter,
            &chart.mapper(),
            clip.left() - origin.x,
            clip.right() - origin.x,
            pos2(origin.x, axis_top),
        );
        view.record_axis_result(painted);

        absorb(
            &mut outcome,
            handle_pointer(ui, &response, chart, dispatcher, view, origin, axis_top + header),
        );
        show_hover(ui, &response, chart, dispatcher, view, origin, axis_top + header);
        absorb(&mut outcome, show_rename(ui, chart, dispatcher, view, offset));
    });

    if let Some(x) = outcome.scroll_to {
        view.scroll_to(x);
    }
    if outcome.repaint || chart.take_repaint_request() {
        ui.ctx().request_repaint();
    }
    outcome
}

fn absorb(into: &mut GestureOutcome, next: GestureOutcome) {
    into.changed |= next.changed;
    into.selection_changed |= next.selection_changed;
    into.repaint |= next.repaint;
    if next.new_link.is_some() {
        into.new_link = next.new_link;
    }
    if next.scroll_to.is_some() {
        into.scroll_to = next.scroll_to;
    }
}

fn handle_pointer(
    ui: &Ui,
    response: &egui::Response,
    chart: &GanttChart,
    dispatcher: &mut GestureDispatcher,
    view: &mut ChartView,
    origin: Pos2,
    axis_bottom: f32,
) -> GestureOutcome {
    let mut outcome = GestureOutcome::default();

    if view.held.is_some() && ui.input(|i| i.key_pressed(Key::Escape)) {
        dispatcher.cancel(chart);
        view.held = None;
        outcome.repaint = true;
        return outcome;
    }

    let (pointer, modifiers, moved, double_clicked) = ui.input(|i| {
        (
            i.pointer.interact_pos(),
            i.modifiers,
            i.pointer.delta() != Vec2::ZERO,
            i.pointer.button_double_clicked(PointerButton::Primary),
        )
    });
    let Some(screen) = pointer else {
        return outcome;
    };
    let at = screen - origin.to_vec2();
    let over_rows = response.hovered() && screen.y > axis_bottom;

    if view.held.is_none() && over_rows {
        for button in [PointerButton::Primary, PointerButton::Secondary] {
            if ui.input(|i| i.pointer.button_pressed(button)) {
                absorb(&mut outcome, dispatcher.pointer_pressed(chart, at, button, modifiers));
                view.held = Some(button);
                break;
            }
        }
    }
    // A quick click can press and release within one frame.
    if let Some(button) = view.held {
        if moved {
            absorb(&mut outcome, dispatcher.pointer_dragged(chart, at));
        }
        if ui.input(|i| i.pointer.button_released(button)) {
            absorb(&mut outcome, dispatcher.pointer_released(chart, at));
            view.held = None;
        }
    }

    if double_clicked && over_rows && view.held.is_none() {
        if let Some(task) = dispatcher.double_clicked(chart, at) {
            view.rename_text = chart
                .tasks()
                .task(task)
                .map(|t| t.name().to_string())
                .unwrap_or_default();
            view.rename_focus = true;
            outcome.repaint = true;
        }
    }
    outcome
}

/// Cursor and tooltip for whatever is under the pointer.
fn show_hover(
    ui: &Ui,
    response: &egui::Response,
    chart: &GanttChart,
    dispatcher: &GestureDispatcher,
    view: &ChartView,
    origin: Pos2,
    axis_bottom: f32,
) {
    let Some(screen) = ui.input(|i| i.pointer.hover_pos()) else {
        return;
    };
    let at = screen - origin.to_vec2();
    let kind = match dispatcher.mode() {
        EditMode::None if dispatcher.is_idle() => {
            if !response.hovered() || screen.y <= axis_bottom {
                return;
            }
            dispatcher.cursor_at(chart, at)
        }
        EditMode::None => CursorKind::Default,
        EditMode::Multiple => CursorKind::Move,
        EditMode::Link => CursorKind::Crosshair,
        mode => cursor_for(mode),
    };
    ui.ctx().set_cursor_icon(cursor_icon(kind));

    if !dispatcher.is_idle() || dispatcher.renaming().is_some() {
        return;
    }
    let Some(id) = chart.hit_test_task(at) else {
        return;
    };
    let tasks = chart.tasks();
    let Some(task) = tasks.task(id) else {
        return;
    };
    egui::show_tooltip_at_pointer(ui.ctx(), ui.layer_id(), Id::new(("task-tip", id)), |ui| {
        ui.strong(task.name());
        ui.label(format!(
            "{} → {}",
            view.axis.format_time(task.start(), TIME_FORMAT),
            view.axis.format_time(task.end(), TIME_FORMAT)
        ));
        ui.label(theme::status_label(task.status()));
        if !task.detail().is_empty() {
            ui.label(egui::RichText::new(task.detail()).color(theme::TEXT_SECONDARY));
        }
    });
}

fn cursor_icon(kind: CursorKind) -> CursorIcon {
    match kind {
        CursorKind::Default => CursorIcon::Default,
        CursorKind::ResizeWest => CursorIcon::ResizeWest,
        CursorKind::ResizeEast => CursorIcon::ResizeEast,
        CursorKind::Move => CursorIcon::Move,
        CursorKind::Crosshair => CursorIcon::Crosshair,
    }
}

/// Inline name editor over the task being renamed.
fn show_rename(
    ui: &mut Ui,
    chart: &GanttChart,
    dispatcher: &mut GestureDispatcher,
    view: &mut ChartView,
    offset: Vec2,
) -> GestureOutcome {
    let Some(task) = dispatcher.renaming() else {
        return GestureOutcome::default();
    };
    let Some(bounds) = chart.task_bounds(task) else {
        dispatcher.cancel_rename();
        return GestureOutcome::default();
    };
    let bounds = bounds.translate(offset);
    let rect = Rect::from_min_size(bounds.min, vec2(bounds.width().max(140.0), bounds.height()));
    let edit = ui.put(
        rect,
        egui::TextEdit::singleline(&mut view.rename_text).font(theme::font_bar()),
    );
    if view.rename_focus {
        edit.request_focus();
        view.rename_focus = false;
    }
    if !edit.lost_focus() {
        return GestureOutcome::default();
    }
    if ui.input(|i| i.key_pressed(Key::Escape)) {
        dispatcher.cancel_rename();
        GestureOutcome {
            repaint: true,
            ..GestureOutcome::default()
        }
    } else {
        dispatcher.commit_rename(chart, &view.rename_text)
    }
}

fn paint_rows(painter: &egui::Painter, chart: &GanttChart, origin: Pos2, canvas: Rect) {
    let rows = chart.tasks().row_count();
    for row in 0..rows {
        let bounds = chart.row_bounds(row);
        let stripe = Rect::from_min_size(
            pos2(canvas.left(), origin.y + bounds.top()),
            vec2(canvas.width(), bounds.height()),
        );
        let fill = if row % 2 == 0 { theme::BG_PANEL } else { theme::BG_DARK };
        painter.rect_filled(stripe, 0.0, fill);
        painter.line_segment(
            [stripe.left_bottom(), stripe.right_bottom()],
            Stroke::new(0.5, theme::GRID_LINE),
        );
    }
}

fn paint_now_line(painter: &egui::Painter, chart: &GanttChart, origin: Pos2, canvas: Rect) {
    let now = chrono::Utc::now().timestamp_millis();
    let (min, max) = {
        let mapper = chart.mapper();
        (mapper.range_min(), mapper.range_max())
    };
    if now < min || now > max {
        return;
    }
    let x = origin.x + chart.to_screen(now);
    painter.line_segment(
        [pos2(x, origin.y), pos2(x, canvas.bottom())],
        Stroke::new(1.5, theme::NOW_LINE),
    );
}

fn paint_bars(painter: &egui::Painter, chart: &GanttChart, offset: Vec2) {
    let bars = chart.all_task_bounds();
    let tasks = chart.tasks();
    for (id, bounds) in bars {
        let Some(task) = tasks.task(id) else {
            continue;
        };
        let rect = bounds.translate(offset);
        painter.rect_filled(rect, theme::BAR_ROUNDING, theme::bar_color(task.status()));
        if chart.is_selected(id) {
            painter.rect_stroke(rect.expand(1.0), theme::BAR_ROUNDING, Stroke::new(2.0, theme::ACCENT));
        }
        painter.with_clip_rect(rect.shrink(2.0)).text(
            rect.left_center() + vec2(4.0, 0.0),
            Align2::LEFT_CENTER,
            task.name(),
            theme::font_bar(),
            theme::TEXT_ON_BAR,
        );
    }
}

/// Anchor points of a link on its two bars.
fn link_anchors(relation: LinkRelation, from: Rect, to: Rect) -> (Pos2, Pos2) {
    match relation {
        LinkRelation::StartToFinish => (from.left_center(), to.right_center()),
        LinkRelation::StartToStart => (from.left_center(), to.left_center()),
        LinkRelation::FinishToStart => (from.right_center(), to.left_center()),
        LinkRelation::FinishToFinish => (from.right_center(), to.right_center()),
    }
}

fn paint_links(painter: &egui::Painter, chart: &GanttChart, offset: Vec2) {
    let links: Vec<_> = {
        let tasks = chart.tasks();
        (0..tasks.link_count())
            .filter_map(|i| tasks.link_at(i).cloned())
            .collect()
    };
    let stroke = Stroke::new(1.2, theme::LINK_LINE);
    for link in links {
        let (Some(from), Some(to)) = (chart.task_bounds(link.from()), chart.task_bounds(link.to())) else {
            continue;
        };
        let (a, b) = link_anchors(link.relation, from.translate(offset), to.translate(offset));
        let mid = (a.x + b.x) / 2.0;
        painter.add(Shape::line(
            vec![a, pos2(mid, a.y), pos2(mid, b.y), b],
            stroke,
        ));
        paint_arrow_head(painter, b, if b.x >= mid { 1.0 } else { -1.0 }, theme::LINK_LINE);
    }
}

fn paint_arrow_head(painter: &egui::Painter, tip: Pos2, direction: f32, color: egui::Color32) {
    let s = theme::ARROW_SIZE;
    painter.add(Shape::convex_polygon(
        vec![
            tip,
            pos2(tip.x - direction * s, tip.y - s * 0.6),
            pos2(tip.x - direction * s, tip.y + s * 0.6),
        ],
        color,
        Stroke::NONE,
    ));
}

fn paint_preview(
    painter: &egui::Painter,
    chart: &GanttChart,
    preview: GesturePreview,
    offset: Vec2,
    canvas: Rect,
) {
    match preview {
        GesturePreview::None => {}
        GesturePreview::Box(area) => {
            let rect = area.translate(offset);
            painter.rect_filled(rect, 0.0, theme::BOX_FILL);
            painter.rect_stroke(rect, 0.0, Stroke::new(1.0, theme::ACCENT));
        }
        GesturePreview::Link { from, to, target } => {
            let stroke = Stroke::new(1.5, theme::LINK_TARGET);
            painter.extend(Shape::dashed_line(&[from + offset, to + offset], stroke, 6.0, 4.0));
            if let Some(bounds) = target.and_then(|t: TaskId| chart.task_bounds(t)) {
                painter.rect_stroke(bounds.translate(offset).expand(2.0), theme::BAR_ROUNDING, stroke);
            }
        }
        GesturePreview::Zoom { from_x, to_x } => {
            let band = Rect::from_x_y_ranges(
                (offset.x + from_x.min(to_x))..=(offset.x + from_x.max(to_x)),
                canvas.y_range(),
            );
            painter.rect_filled(band, 0.0, theme::ZOOM_FILL);
        }
    }
}
