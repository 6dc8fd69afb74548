//! Pointer and keyboard gestures over a [`GanttChart`].
//!
//! A gesture is press, any number of drags, release. The dispatcher decides
//! what the press means (edit, box selection, link, zoom), keeps the edit
//! session for it and commits finished edits to its undo history.

use egui::{Modifiers, PointerButton, Pos2, Rect};

use super::gantt::GanttChart;
use crate::config::{ChartSettings, RowDragPolicy};
use crate::model::task::{LinkRelation, TaskId, TaskLink, TaskModel, Time};
use crate::model::undo::{EditSession, EditSource, UndoManager};

/// Right-drags shorter than this do not zoom.
const ZOOM_DEAD_ZONE: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditMode {
    None,
    ResizeStart,
    ResizeEnd,
    Move,
    Multiple,
    Link,
}

/// Cursor shapes the UI should show; mapped to the toolkit's icons there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorKind {
    Default,
    ResizeWest,
    ResizeEast,
    Move,
    Crosshair,
}

/// Classify a pointer over a single task bar spanning `start_x..end_x`.
/// The start edge wins when both edges are within `tolerance`.
pub fn edit_mode_at(pointer_x: f32, start_x: f32, end_x: f32, tolerance: f32) -> EditMode {
    if (pointer_x - start_x).abs() <= tolerance {
        EditMode::ResizeStart
    } else if (pointer_x - end_x).abs() <= tolerance {
        EditMode::ResizeEnd
    } else {
        EditMode::Move
    }
}

/// Hover cursor for a mode returned by [`edit_mode_at`].
pub fn cursor_for(mode: EditMode) -> CursorKind {
    match mode {
        EditMode::ResizeStart => CursorKind::ResizeWest,
        EditMode::ResizeEnd => CursorKind::ResizeEast,
        EditMode::Move => CursorKind::Move,
        other => unreachable!("hover over a task cannot be {other:?}"),
    }
}

/// What a gesture callback did, for the UI to act on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GestureOutcome {
    /// Task values changed.
    pub changed: bool,
    pub selection_changed: bool,
    pub repaint: bool,
    pub new_link: Option<TaskLink>,
    /// Scroll the chart so this x position is at the left edge.
    pub scroll_to: Option<f32>,
}

/// Live feedback for the gesture in progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GesturePreview {
    None,
    Box(Rect),
    Link {
        from: Pos2,
        to: Pos2,
        target: Option<TaskId>,
    },
    Zoom {
        from_x: f32,
        to_x: f32,
    },
}

#[derive(Debug, Default)]
enum Gesture {
    #[default]
    Idle,
    Edit {
        press: Pos2,
        mode: EditMode,
        session: EditSession,
    },
    BoxSelect {
        press: Pos2,
        current: Option<Pos2>,
    },
    Link {
        source: TaskId,
        press: Pos2,
        current: Pos2,
        target: Option<TaskId>,
    },
    Zoom {
        press: Pos2,
        current: Option<Pos2>,
    },
}

pub struct GestureDispatcher {
    settings: ChartSettings,
    gesture: Gesture,
    undo: UndoManager,
    renaming: Option<TaskId>,
}

impl GestureDispatcher {
    pub fn new(settings: ChartSettings) -> Self {
        let undo = UndoManager::new(settings.undo_limit);
        Self {
            settings,
            gesture: Gesture::Idle,
            undo,
            renaming: None,
        }
    }

    pub fn settings(&self) -> &ChartSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: ChartSettings) {
        self.undo.set_limit(settings.undo_limit);
        self.settings = settings;
    }

    pub fn undo_manager(&self) -> &UndoManager {
        &self.undo
    }

    /// Mode of the open gesture; `None` when idle, box-selecting or zooming.
    pub fn mode(&self) -> EditMode {
        match &self.gesture {
            Gesture::Edit { mode, .. } => *mode,
            Gesture::Link { .. } => EditMode::Link,
            _ => EditMode::None,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.gesture, Gesture::Idle)
    }

    pub fn preview(&self) -> GesturePreview {
        match &self.gesture {
            Gesture::BoxSelect {
                press,
                current: Some(current),
            } => GesturePreview::Box(Rect::from_two_pos(*press, *current)),
            Gesture::Link {
                press,
                current,
                target,
                ..
            } => GesturePreview::Link {
                from: *press,
                to: *current,
                target: *target,
            },
            Gesture::Zoom {
                press,
                current: Some(current),
            } => GesturePreview::Zoom {
                from_x: press.x,
                to_x: current.x,
            },
            _ => GesturePreview::None,
        }
    }

    /// Cursor for a pointer hovering at `pos` with no button held.
    pub fn cursor_at(&self, chart: &GanttChart, pos: Pos2) -> CursorKind {
        if matches!(self.gesture, Gesture::Link { .. }) {
            return CursorKind::Crosshair;
        }
        if self.renaming.is_some() {
            return CursorKind::Default;
        }
        match chart.hit_test_task(pos).and_then(|id| chart.task_bounds(id)) {
            Some(bounds) => cursor_for(edit_mode_at(
                pos.x,
                bounds.left(),
                bounds.right(),
                self.settings.edge_tolerance as f32,
            )),
            None => CursorKind::Default,
        }
    }

    pub fn pointer_pressed(
        &mut self,
        chart: &GanttChart,
        pos: Pos2,
        button: PointerButton,
        modifiers: Modifiers,
    ) -> GestureOutcome {
        if !self.is_idle() {
            log::debug!("press while a gesture is open, cancelling it");
            self.cancel(chart);
        }
        let selected_before = chart.selected();
        let mut outcome = match button {
            PointerButton::Primary => self.press_primary(chart, pos, modifiers),
            PointerButton::Secondary => self.press_secondary(chart, pos),
            _ => GestureOutcome::default(),
        };
        outcome.selection_changed = chart.selected() != selected_before;
        outcome.repaint |= outcome.selection_changed;
        outcome
    }

    fn press_primary(&mut self, chart: &GanttChart, pos: Pos2, modifiers: Modifiers) -> GestureOutcome {
        let hit = chart.hit_test_task(pos);
        let toggle = modifiers.command;
        match hit {
            None if !toggle => chart.selection_mut().clear(),
            None => {}
            Some(task) if toggle => chart.selection_mut().toggle(task),
            Some(task) => {
                if !chart.is_selected(task) {
                    let mut selection = chart.selection_mut();
                    selection.clear();
                    selection.select(task);
                }
            }
        }
        if toggle {
            return GestureOutcome::default();
        }
        let Some(task) = hit else {
            self.gesture = Gesture::BoxSelect {
                press: pos,
                current: None,
            };
            return GestureOutcome::default();
        };

        let selected = chart.selected();
        let mode = match selected.len() {
            0 => EditMode::None,
            1 => match chart.task_bounds(task) {
                Some(bounds) => edit_mode_at(
                    pos.x,
                    bounds.left(),
                    bounds.right(),
                    self.settings.edge_tolerance as f32,
                ),
                None => EditMode::None,
            },
            _ => EditMode::Multiple,
        };
        if mode == EditMode::None {
            return GestureOutcome::default();
        }

        let mut session = EditSession::new(EditSource::Pointer);
        for id in &selected {
            session.add_edited_task(*id);
        }
        session.grab_before_snapshot(&*chart.tasks());
        chart.set_range_locked(true);
        log::debug!("edit gesture started: {mode:?} on {} task(s)", selected.len());
        self.gesture = Gesture::Edit {
            press: pos,
            mode,
            session,
        };
        GestureOutcome::default()
    }

    fn press_secondary(&mut self, chart: &GanttChart, pos: Pos2) -> GestureOutcome {
        self.gesture = match chart.hit_test_task(pos) {
            Some(source) => {
                log::debug!("link gesture started from {source}");
                Gesture::Link {
                    source,
                    press: pos,
                    current: pos,
                    target: None,
                }
            }
            None => Gesture::Zoom {
                press: pos,
                current: None,
            },
        };
        GestureOutcome {
            repaint: true,
            ..GestureOutcome::default()
        }
    }

    pub fn pointer_dragged(&mut self, chart: &GanttChart, pos: Pos2) -> GestureOutcome {
        let mut outcome = GestureOutcome {
            repaint: !self.is_idle(),
            ..GestureOutcome::default()
        };
        match &mut self.gesture {
            Gesture::Idle => {}
            Gesture::Edit {
                press,
                mode,
                session,
            } => {
                apply_drag(chart, &self.settings, *press, *mode, session, pos);
                outcome.changed = true;
                if self.settings.fire_change_during_edit {
                    chart.fire_change();
                } else {
                    chart.request_repaint();
                }
            }
            Gesture::BoxSelect { current, .. } | Gesture::Zoom { current, .. } => {
                *current = Some(pos);
            }
            Gesture::Link {
                source,
                current,
                target,
                ..
            } => {
                *current = pos;
                *target = chart.hit_test_task(pos).filter(|t| t != source);
            }
        }
        outcome
    }

    pub fn pointer_released(&mut self, chart: &GanttChart, pos: Pos2) -> GestureOutcome {
        let mut outcome = GestureOutcome::default();
        match std::mem::take(&mut self.gesture) {
            Gesture::Idle => return outcome,
            Gesture::Edit { mode, mut session, .. } => {
                chart.set_range_locked(false);
                session.grab_after_snapshot(&*chart.tasks());
                if session.has_changes() {
                    session.commit(&mut self.undo);
                    outcome.changed = true;
                } else {
                    log::debug!("{mode:?} gesture left tasks unchanged, discarding edit");
                }
                chart.tasks().fire_all_changed();
            }
            Gesture::BoxSelect { press, current } => {
                if let Some(current) = current {
                    let area = Rect::from_two_pos(press, current);
                    outcome.selection_changed = chart.select_all_intersecting(area);
                }
            }
            Gesture::Link { source, .. } => {
                outcome.new_link = self.finish_link(chart, source, pos);
            }
            Gesture::Zoom { press, .. } => {
                outcome.scroll_to = finish_zoom(chart, press.x, pos.x);
            }
        }
        outcome.repaint = true;
        outcome
    }

    fn finish_link(&self, chart: &GanttChart, source: TaskId, pos: Pos2) -> Option<TaskLink> {
        let target = chart.hit_test_task(pos).filter(|t| *t != source);
        let Some(target) = target else {
            log::debug!("link from {source} abandoned");
            return None;
        };
        let link = TaskLink::new(source, target, LinkRelation::FinishToStart);
        if !chart.tasks_mut().add_link(link.clone()) {
            return None;
        }
        log::info!("linked {source} -> {target} ({})", link.relation.short_label());
        Some(link)
    }

    /// Abort the open gesture. An open edit is rolled back to its before state.
    pub fn cancel(&mut self, chart: &GanttChart) {
        if let Gesture::Edit { mut session, .. } = std::mem::take(&mut self.gesture) {
            chart.set_range_locked(false);
            if let Some(record) = session.seal() {
                record.undo(&mut *chart.tasks_mut());
            }
            log::debug!("edit gesture cancelled");
        }
    }

    /// Start an inline rename of the task under `pos`, if any.
    pub fn double_clicked(&mut self, chart: &GanttChart, pos: Pos2) -> Option<TaskId> {
        let task = chart.hit_test_task(pos)?;
        self.renaming = Some(task);
        Some(task)
    }

    pub fn renaming(&self) -> Option<TaskId> {
        self.renaming
    }

    pub fn commit_rename(&mut self, chart: &GanttChart, name: &str) -> GestureOutcome {
        let Some(task) = self.renaming.take() else {
            return GestureOutcome::default();
        };
        let name = name.to_string();
        let changed = self.edit_tasks(chart, &[task], &mut |t: &mut dyn TaskModel| {
            t.set_name(name.clone())
        });
        GestureOutcome {
            changed,
            repaint: true,
            ..GestureOutcome::default()
        }
    }

    pub fn cancel_rename(&mut self) {
        self.renaming = None;
    }

    /// Apply a keyboard-source edit to `tasks` and record it for undo.
    /// Returns false, recording nothing, if no value changed.
    pub fn edit_tasks(
        &mut self,
        chart: &GanttChart,
        tasks: &[TaskId],
        edit: &mut dyn FnMut(&mut dyn TaskModel),
    ) -> bool {
        if tasks.is_empty() || !self.is_idle() {
            return false;
        }
        let mut session = EditSession::new(EditSource::Keyboard);
        for id in tasks {
            session.add_edited_task(*id);
        }
        session.grab_before_snapshot(&*chart.tasks());
        {
            let mut set = chart.tasks_mut();
            for id in tasks {
                set.update_task(*id, edit);
            }
        }
        session.grab_after_snapshot(&*chart.tasks());
        if !session.has_changes() {
            return false;
        }
        session.commit(&mut self.undo);
        chart.tasks().fire_all_changed();
        true
    }

    /// Shift the selection by `steps` keyboard steps.
    pub fn nudge(&mut self, chart: &GanttChart, steps: i64) -> GestureOutcome {
        let dt = steps * self.settings.keyboard_step;
        let selected = chart.selected();
        let changed = self.edit_tasks(chart, &selected, &mut |t: &mut dyn TaskModel| {
            t.set_start(t.start() + dt);
            t.set_end(t.end() + dt);
        });
        GestureOutcome {
            changed,
            repaint: changed,
            ..GestureOutcome::default()
        }
    }

    pub fn can_undo(&self) -> bool {
        self.is_idle() && self.undo.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.is_idle() && self.undo.can_redo()
    }

    pub fn undo(&mut self, chart: &GanttChart) -> bool {
        self.can_undo() && self.undo.undo(&mut *chart.tasks_mut())
    }

    pub fn redo(&mut self, chart: &GanttChart) -> bool {
        self.can_redo() && self.undo.redo(&mut *chart.tasks_mut())
    }

    /// Drop the undo history, e.g. after the collection was replaced.
    pub fn clear_history(&mut self) {
        self.undo.clear();
    }
}

/// One drag frame of an edit gesture. The delta is measured from the press
/// point and applied to the before snapshots, so every tracked task moves by
/// the same amount.
fn apply_drag(
    chart: &GanttChart,
    settings: &ChartSettings,
    press: Pos2,
    mode: EditMode,
    session: &EditSession,
    pos: Pos2,
) {
    let min = settings.min_duration;
    let spans: Vec<(TaskId, Time, Time)> = session
        .tracked_tasks()
        .into_iter()
        .filter_map(|id| session.before(id).map(|t| (id, t.start(), t.end())))
        .collect();

    let mut dt = chart.canonical_delta(press.x, pos.x);
    for (_, start, end) in &spans {
        match mode {
            EditMode::ResizeStart if start + dt >= end - min => dt = end - start - min,
            EditMode::ResizeEnd if end + dt <= start + min => dt = start - end + min,
            _ => {}
        }
    }

    let destination = match mode {
        EditMode::Move => chart.hit_test_row(pos.y),
        _ => None,
    };

    let mut set = chart.tasks_mut();
    for (id, start, end) in spans {
        let (start, end) = match mode {
            // Clamp against the fixed edge as stored; it is never snapped.
            EditMode::ResizeStart => (settings.snap(start + dt).min(end - min), end),
            EditMode::ResizeEnd => (start, settings.snap(end + dt).max(start + min)),
            _ => (settings.snap(start + dt), settings.snap(end + dt)),
        };
        set.update_task(id, &mut |t: &mut dyn TaskModel| {
            if mode != EditMode::ResizeEnd {
                t.set_start(start);
            }
            if mode != EditMode::ResizeStart {
                t.set_end(end);
            }
        });

        let (Some(destination), Some(current)) = (destination, set.row_of(id)) else {
            continue;
        };
        if destination == current {
            continue;
        }
        match settings.row_drag {
            RowDragPolicy::SwapRows => {
                log::debug!("swapping rows {current} and {destination}");
                set.swap_rows(destination, current);
            }
            RowDragPolicy::Reassign => {
                let Some(key) = set.title_at(destination).map(str::to_string) else {
                    continue;
                };
                log::debug!("moving {id} to row {key}");
                set.update_task(id, &mut |t: &mut dyn TaskModel| t.set_row_key(key.clone()));
                set.fire_all_changed();
            }
        }
    }
}

/// Finish a right-drag zoom. Returns where to scroll afterwards.
fn finish_zoom(chart: &GanttChart, from_x: f32, to_x: f32) -> Option<f32> {
    if (to_x - from_x).abs() < ZOOM_DEAD_ZONE {
        return None;
    }
    if from_x > to_x {
        chart.set_zoom(1.0);
        return Some(0.0);
    }
    let min = chart.to_canonical(from_x);
    let max = chart.to_canonical(to_x);
    let span = chart.mapper().span();
    if max <= min || span <= 0 {
        return None;
    }
    chart.set_zoom(span as f64 / (max - min) as f64);
    Some(chart.to_screen(min))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::BasicTask;
    use crate::model::task_set::{BasicTaskSet, TaskSet};
    use egui::pos2;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    /// Rows "one" (a: 1000..2000), "two" (b: 4000..6000) and "three"
    /// (anchor: 0..10000, pins the range). 0.1px per unit: x = t / 10 + 1,
    /// row r spans y in 22r..22r+22.
    struct Fixture {
        chart: GanttChart,
        a: TaskId,
        b: TaskId,
        anchor: TaskId,
    }

    fn fixture() -> Fixture {
        let mut set = BasicTaskSet::new();
        let a = set.add_task(Box::new(BasicTask::new("a", "one", 1_000, 2_000)));
        let b = set.add_task(Box::new(BasicTask::new("b", "two", 4_000, 6_000)));
        let anchor = set.add_task(Box::new(BasicTask::new("anchor", "three", 0, 10_000)));
        let chart = GanttChart::new(Rc::new(RefCell::new(set)));
        chart.set_viewport_width(1_002.0);
        Fixture { chart, a, b, anchor }
    }

    fn unsnapped() -> ChartSettings {
        ChartSettings {
            snap_granularity: 0,
            ..ChartSettings::default()
        }
    }

    fn span(chart: &GanttChart, id: TaskId) -> (Time, Time) {
        let tasks = chart.tasks();
        let task = tasks.task(id).expect("task exists");
        (task.start(), task.end())
    }

    fn press(d: &mut GestureDispatcher, chart: &GanttChart, pos: Pos2) -> GestureOutcome {
        d.pointer_pressed(chart, pos, PointerButton::Primary, Modifiers::NONE)
    }

    fn drag(d: &mut GestureDispatcher, chart: &GanttChart, from: Pos2, to: Pos2) -> GestureOutcome {
        press(d, chart, from);
        d.pointer_dragged(chart, to);
        d.pointer_released(chart, to)
    }

    fn right_drag(d: &mut GestureDispatcher, chart: &GanttChart, from: Pos2, to: Pos2) -> GestureOutcome {
        d.pointer_pressed(chart, from, PointerButton::Secondary, Modifiers::NONE);
        d.pointer_dragged(chart, to);
        d.pointer_released(chart, to)
    }

    #[test]
    fn hover_classification_is_a_pure_function() {
        assert_eq!(edit_mode_at(100.0, 100.0, 200.0, 1.0), EditMode::ResizeStart);
        assert_eq!(edit_mode_at(101.0, 100.0, 200.0, 1.0), EditMode::ResizeStart);
        assert_eq!(edit_mode_at(101.5, 100.0, 200.0, 1.0), EditMode::Move);
        assert_eq!(edit_mode_at(199.5, 100.0, 200.0, 1.0), EditMode::ResizeEnd);
        assert_eq!(edit_mode_at(100.5, 100.0, 100.5, 1.0), EditMode::ResizeStart);
        assert_eq!(cursor_for(EditMode::ResizeEnd), CursorKind::ResizeEast);
    }

    #[test]
    #[should_panic]
    fn hover_cursor_for_multiple_is_a_bug() {
        cursor_for(EditMode::Multiple);
    }

    #[test]
    fn move_commits_and_undoes_exactly() {
        let f = fixture();
        let mut d = GestureDispatcher::new(unsnapped());

        press(&mut d, &f.chart, pos2(150.0, 10.0));
        assert_eq!(d.mode(), EditMode::Move);
        assert_eq!(f.chart.selected(), vec![f.a]);
        d.pointer_dragged(&f.chart, pos2(200.0, 10.0));
        let outcome = d.pointer_released(&f.chart, pos2(200.0, 10.0));

        assert!(outcome.changed);
        assert_eq!(span(&f.chart, f.a), (1_500, 2_500));
        assert!(d.undo(&f.chart));
        assert_eq!(span(&f.chart, f.a), (1_000, 2_000));
        assert!(d.redo(&f.chart));
        assert_eq!(span(&f.chart, f.a), (1_500, 2_500));
    }

    #[test]
    fn moves_snap_to_whole_seconds() {
        let f = fixture();
        let mut d = GestureDispatcher::new(ChartSettings::default());
        drag(&mut d, &f.chart, pos2(150.0, 10.0), pos2(260.0, 10.0));
        assert_eq!(span(&f.chart, f.a), (2_000, 3_000));
    }

    #[test]
    fn resize_start_clamps_at_the_end() {
        let mut set = BasicTaskSet::new();
        let t = set.add_task(Box::new(BasicTask::new("t", "one", 1_000, 1_005)));
        set.add_task(Box::new(BasicTask::new("anchor", "two", 0, 10_000)));
        let chart = GanttChart::new(Rc::new(RefCell::new(set)));
        chart.set_viewport_width(1_002.0);
        let mut d = GestureDispatcher::new(unsnapped());

        press(&mut d, &chart, pos2(101.0, 10.0));
        assert_eq!(d.mode(), EditMode::ResizeStart);
        // +20 units
        d.pointer_dragged(&chart, pos2(103.0, 10.0));
        d.pointer_released(&chart, pos2(103.0, 10.0));
        assert_eq!(span(&chart, t), (1_005, 1_005));
    }

    #[test]
    fn resize_end_respects_minimum_duration() {
        let f = fixture();
        let mut d = GestureDispatcher::new(ChartSettings {
            min_duration: 100,
            ..unsnapped()
        });
        press(&mut d, &f.chart, pos2(201.0, 10.0));
        assert_eq!(d.mode(), EditMode::ResizeEnd);
        d.pointer_dragged(&f.chart, pos2(50.0, 10.0));
        d.pointer_released(&f.chart, pos2(50.0, 10.0));
        assert_eq!(span(&f.chart, f.a), (1_000, 1_100));
    }

    #[test]
    fn resize_end_never_crosses_an_unaligned_start() {
        let mut set = BasicTaskSet::new();
        let t = set.add_task(Box::new(BasicTask::new("t", "one", 1_500, 5_000)));
        set.add_task(Box::new(BasicTask::new("anchor", "two", 0, 10_000)));
        let chart = GanttChart::new(Rc::new(RefCell::new(set)));
        chart.set_viewport_width(1_002.0);
        let mut d = GestureDispatcher::new(ChartSettings::default());

        press(&mut d, &chart, pos2(501.0, 10.0));
        assert_eq!(d.mode(), EditMode::ResizeEnd);
        d.pointer_dragged(&chart, pos2(50.0, 10.0));
        d.pointer_released(&chart, pos2(50.0, 10.0));
        assert_eq!(span(&chart, t), (1_500, 1_500));
    }

    #[test]
    fn resize_start_never_crosses_an_unaligned_end() {
        let mut set = BasicTaskSet::new();
        let t = set.add_task(Box::new(BasicTask::new("t", "one", 1_000, 4_500)));
        set.add_task(Box::new(BasicTask::new("anchor", "two", 0, 10_000)));
        let chart = GanttChart::new(Rc::new(RefCell::new(set)));
        chart.set_viewport_width(1_002.0);
        let mut d = GestureDispatcher::new(ChartSettings {
            min_duration: 200,
            ..ChartSettings::default()
        });

        press(&mut d, &chart, pos2(101.0, 10.0));
        assert_eq!(d.mode(), EditMode::ResizeStart);
        d.pointer_dragged(&chart, pos2(900.0, 10.0));
        d.pointer_released(&chart, pos2(900.0, 10.0));
        let (start, end) = span(&chart, t);
        assert_eq!(end, 4_500);
        assert!(start <= end - 200, "start {start} too close to end {end}");
    }

    #[test]
    fn lowering_the_undo_limit_drops_oldest_edits() {
        let f = fixture();
        let mut d = GestureDispatcher::new(unsnapped());
        for step in 0..3 {
            let x = 150.0 + 10.0 * step as f32;
            assert!(drag(&mut d, &f.chart, pos2(x, 10.0), pos2(x + 10.0, 10.0)).changed);
        }
        assert_eq!(d.undo_manager().len(), 3);

        d.set_settings(ChartSettings {
            undo_limit: 1,
            ..unsnapped()
        });
        assert_eq!(d.undo_manager().len(), 1);
        assert!(d.undo(&f.chart));
        assert_eq!(span(&f.chart, f.a), (1_200, 2_200));
        assert!(!d.undo(&f.chart));
    }

    #[test]
    fn multiple_selection_moves_by_one_delta_and_keeps_rows() {
        let f = fixture();
        let mut d = GestureDispatcher::new(unsnapped());
        let command = Modifiers::COMMAND;
        d.pointer_pressed(&f.chart, pos2(150.0, 10.0), PointerButton::Primary, command);
        d.pointer_released(&f.chart, pos2(150.0, 10.0));
        d.pointer_pressed(&f.chart, pos2(500.0, 30.0), PointerButton::Primary, command);
        d.pointer_released(&f.chart, pos2(500.0, 30.0));
        assert_eq!(f.chart.selected(), vec![f.a, f.b]);

        press(&mut d, &f.chart, pos2(150.0, 10.0));
        assert_eq!(d.mode(), EditMode::Multiple);
        d.pointer_dragged(&f.chart, pos2(450.0, 30.0));
        d.pointer_released(&f.chart, pos2(450.0, 30.0));

        assert_eq!(span(&f.chart, f.a), (4_000, 5_000));
        assert_eq!(span(&f.chart, f.b), (7_000, 9_000));
        assert_eq!(f.chart.tasks().title_at(0), Some("one"));
        assert_eq!(d.undo_manager().len(), 1);
    }

    #[test]
    fn zero_delta_release_records_nothing() {
        let f = fixture();
        let mut d = GestureDispatcher::new(ChartSettings::default());
        press(&mut d, &f.chart, pos2(150.0, 10.0));
        let outcome = d.pointer_released(&f.chart, pos2(150.0, 10.0));

        assert!(!outcome.changed);
        assert!(d.is_idle());
        assert!(!d.can_undo());
        assert_eq!(span(&f.chart, f.a), (1_000, 2_000));
    }

    #[test]
    fn cancel_rolls_back_the_open_edit() {
        let f = fixture();
        let mut d = GestureDispatcher::new(unsnapped());
        press(&mut d, &f.chart, pos2(150.0, 10.0));
        d.pointer_dragged(&f.chart, pos2(300.0, 10.0));
        assert_eq!(span(&f.chart, f.a), (2_500, 3_500));

        d.cancel(&f.chart);
        assert!(d.is_idle());
        assert_eq!(span(&f.chart, f.a), (1_000, 2_000));
        assert!(!d.can_undo());
    }

    #[test]
    fn box_selection_replaces_prior_selection() {
        let f = fixture();
        let mut d = GestureDispatcher::new(ChartSettings::default());
        press(&mut d, &f.chart, pos2(700.0, 50.0));
        d.pointer_released(&f.chart, pos2(700.0, 50.0));
        assert_eq!(f.chart.selected(), vec![f.anchor]);

        let outcome = drag(&mut d, &f.chart, pos2(450.0, 5.0), pos2(150.0, 30.0));
        assert!(outcome.selection_changed);
        assert_eq!(f.chart.selected(), vec![f.a, f.b]);
        assert!(!f.chart.is_selected(f.anchor));
    }

    #[test]
    fn click_on_empty_space_clears_selection() {
        let f = fixture();
        let mut d = GestureDispatcher::new(ChartSettings::default());
        f.chart.selection_mut().select(f.a);
        let outcome = press(&mut d, &f.chart, pos2(500.0, 10.0));
        d.pointer_released(&f.chart, pos2(500.0, 10.0));
        assert!(outcome.selection_changed);
        assert!(f.chart.selected().is_empty());
    }

    #[test]
    fn link_gesture_links_source_to_release_target() {
        let f = fixture();
        let mut d = GestureDispatcher::new(ChartSettings::default());

        d.pointer_pressed(&f.chart, pos2(150.0, 10.0), PointerButton::Secondary, Modifiers::NONE);
        assert_eq!(d.mode(), EditMode::Link);
        d.pointer_dragged(&f.chart, pos2(500.0, 30.0));
        assert!(matches!(d.preview(), GesturePreview::Link { target: Some(t), .. } if t == f.b));
        let outcome = d.pointer_released(&f.chart, pos2(500.0, 30.0));

        let link = outcome.new_link.expect("link created");
        assert_eq!((link.from(), link.to()), (f.a, f.b));
        let tasks = f.chart.tasks();
        assert_eq!(tasks.link_count(), 1);
        assert_eq!(tasks.link_at(0).map(|l| l.relation), Some(LinkRelation::FinishToStart));
    }

    #[test]
    fn link_released_over_nothing_or_itself_is_abandoned() {
        let f = fixture();
        let mut d = GestureDispatcher::new(ChartSettings::default());
        assert!(right_drag(&mut d, &f.chart, pos2(150.0, 10.0), pos2(800.0, 10.0))
            .new_link
            .is_none());
        assert!(right_drag(&mut d, &f.chart, pos2(150.0, 10.0), pos2(160.0, 10.0))
            .new_link
            .is_none());
        assert_eq!(f.chart.tasks().link_count(), 0);
    }

    #[test]
    fn swap_rows_policy_reorders_rows_only() {
        let f = fixture();
        let mut d = GestureDispatcher::new(ChartSettings::default());
        drag(&mut d, &f.chart, pos2(150.0, 10.0), pos2(150.0, 30.0));

        let tasks = f.chart.tasks();
        assert_eq!(tasks.title_at(0), Some("two"));
        assert_eq!(tasks.title_at(1), Some("one"));
        assert_eq!(tasks.row_of(f.a), Some(1));
        assert_eq!(tasks.task(f.a).map(|t| t.row_key()), Some("one"));
        assert!(!d.can_undo());
    }

    #[test]
    fn reassign_policy_rewrites_row_key_and_undoes() {
        let f = fixture();
        let mut d = GestureDispatcher::new(ChartSettings {
            row_drag: RowDragPolicy::Reassign,
            ..ChartSettings::default()
        });
        drag(&mut d, &f.chart, pos2(150.0, 10.0), pos2(150.0, 30.0));
        {
            let tasks = f.chart.tasks();
            assert_eq!(tasks.task(f.a).map(|t| t.row_key()), Some("two"));
            assert_eq!(tasks.row_count(), 2);
            assert_eq!(tasks.row_of(f.a), tasks.row_index("two"));
        }

        assert!(d.undo(&f.chart));
        let tasks = f.chart.tasks();
        assert_eq!(tasks.task(f.a).map(|t| t.row_key()), Some("one"));
        assert_eq!(tasks.row_of(f.a), tasks.row_index("one"));
    }

    #[test]
    fn keyboard_nudges_merge_into_one_record() {
        let f = fixture();
        let mut d = GestureDispatcher::new(ChartSettings::default());
        f.chart.selection_mut().select(f.a);

        assert!(d.nudge(&f.chart, 1).changed);
        assert!(d.nudge(&f.chart, 1).changed);
        assert_eq!(span(&f.chart, f.a), (121_000, 122_000));
        assert_eq!(d.undo_manager().len(), 1);

        assert!(d.undo(&f.chart));
        assert_eq!(span(&f.chart, f.a), (1_000, 2_000));
        assert!(!d.undo(&f.chart));
    }

    #[test]
    fn nudge_without_selection_does_nothing() {
        let f = fixture();
        let mut d = GestureDispatcher::new(ChartSettings::default());
        assert!(!d.nudge(&f.chart, -1).changed);
        assert!(!d.can_undo());
    }

    #[test]
    fn rename_is_an_undoable_keyboard_edit() {
        let f = fixture();
        let mut d = GestureDispatcher::new(ChartSettings::default());
        assert_eq!(d.double_clicked(&f.chart, pos2(150.0, 10.0)), Some(f.a));
        assert_eq!(d.cursor_at(&f.chart, pos2(150.0, 10.0)), CursorKind::Default);

        assert!(d.commit_rename(&f.chart, "renamed").changed);
        assert_eq!(d.renaming(), None);
        assert_eq!(f.chart.tasks().task(f.a).map(|t| t.name().to_string()), Some("renamed".into()));
        d.undo(&f.chart);
        assert_eq!(f.chart.tasks().task(f.a).map(|t| t.name().to_string()), Some("a".into()));
    }

    #[test]
    fn hover_cursor_tracks_bar_edges() {
        let f = fixture();
        let d = GestureDispatcher::new(ChartSettings::default());
        assert_eq!(d.cursor_at(&f.chart, pos2(101.0, 10.0)), CursorKind::ResizeWest);
        assert_eq!(d.cursor_at(&f.chart, pos2(150.0, 10.0)), CursorKind::Move);
        assert_eq!(d.cursor_at(&f.chart, pos2(200.5, 10.0)), CursorKind::ResizeEast);
        assert_eq!(d.cursor_at(&f.chart, pos2(500.0, 10.0)), CursorKind::Default);
    }

    #[test]
    fn right_drag_on_empty_space_zooms_and_resets() {
        let f = fixture();
        let mut d = GestureDispatcher::new(ChartSettings::default());

        // below the last row, so nothing is hit at any zoom
        let y = 100.0;
        assert_eq!(right_drag(&mut d, &f.chart, pos2(400.0, y), pos2(403.0, y)).scroll_to, None);
        assert_eq!(f.chart.zoom(), 1.0);

        let outcome = right_drag(&mut d, &f.chart, pos2(400.0, y), pos2(600.0, y));
        assert!((f.chart.zoom() - 5.0).abs() < 1e-9);
        assert!(outcome.scroll_to.is_some_and(|x| x > 1_000.0));

        let outcome = right_drag(&mut d, &f.chart, pos2(600.0, y), pos2(400.0, y));
        assert_eq!(f.chart.zoom(), 1.0);
        assert_eq!(outcome.scroll_to, Some(0.0));
    }

    #[test]
    fn drag_frames_notify_chart_listeners_when_enabled() {
        let f = fixture();
        let fired = Rc::new(Cell::new(0));
        {
            let fired = Rc::clone(&fired);
            f.chart
                .add_change_listener(Rc::new(move |_: &crate::model::event::ChartEvent| fired.set(fired.get() + 1)));
        }
        let mut d = GestureDispatcher::new(ChartSettings::default());
        press(&mut d, &f.chart, pos2(150.0, 10.0));
        d.pointer_dragged(&f.chart, pos2(160.0, 10.0));
        d.pointer_dragged(&f.chart, pos2(170.0, 10.0));
        assert_eq!(fired.get(), 2);

        let mut quiet = GestureDispatcher::new(ChartSettings {
            fire_change_during_edit: false,
            ..ChartSettings::default()
        });
        d.cancel(&f.chart);
        fired.set(0);
        press(&mut quiet, &f.chart, pos2(150.0, 10.0));
        quiet.pointer_dragged(&f.chart, pos2(160.0, 10.0));
        assert_eq!(fired.get(), 0);
    }
}
