use std::cell::{Ref, RefCell, RefMut};
use std::rc::{Rc, Weak};

use egui::{pos2, vec2, Pos2, Rect, Vec2};

use crate::model::event::{ChartEvent, ChartListener, ListenerId, Listeners, ModelEvent, SelectionListener};
use crate::model::selection::SelectionModel;
use crate::model::task::{TaskId, Time};
use crate::model::task_set::TaskSet;
use crate::model::timeline::{CoordinateMapper, Insets};

/// Height of a task bar, excluding the row insets.
pub const BAR_HEIGHT: f64 = 20.0;
pub const ROW_INSETS: Insets = Insets::uniform(1.0);

/// State shared with the collection listener.
struct ChartState {
    mapper: CoordinateMapper,
    selection: SelectionModel,
    repaint: bool,
    /// Set while a drag edit is open so the mapping under the pointer holds still.
    range_locked: bool,
    listeners: Listeners<ChartListener>,
}

impl ChartState {
    /// Reconcile with the collection after it changed. Returns the chart
    /// listeners to notify once the state borrow is released.
    fn collection_changed(&mut self, tasks: &dyn TaskSet) -> Vec<Rc<ChartListener>> {
        self.selection.prune(tasks);
        if !self.range_locked && self.mapper.compute_range(tasks) {
            log::debug!(
                "range now [{}, {}]",
                self.mapper.range_min(),
                self.mapper.range_max()
            );
        }
        self.repaint = true;
        self.listeners.snapshot()
    }
}

/// The chart core: geometry, hit testing, selection and change wiring over a
/// shared task collection.
///
/// Chart listeners run while the collection may still be mutably borrowed,
/// so they must not borrow it themselves; queue work for the next frame
/// instead.
pub struct GanttChart {
    tasks: Rc<RefCell<dyn TaskSet>>,
    state: Rc<RefCell<ChartState>>,
    subscription: ListenerId,
}

impl GanttChart {
    pub fn new(tasks: Rc<RefCell<dyn TaskSet>>) -> Self {
        let mut mapper = CoordinateMapper::new(ROW_INSETS);
        mapper.compute_range(&*tasks.borrow());
        let state = Rc::new(RefCell::new(ChartState {
            mapper,
            selection: SelectionModel::new(),
            repaint: true,
            range_locked: false,
            listeners: Listeners::new(),
        }));

        let weak: Weak<RefCell<ChartState>> = Rc::downgrade(&state);
        let subscription = tasks
            .borrow_mut()
            .add_listener(Rc::new(move |_: &ModelEvent, tasks: &dyn TaskSet| {
                let Some(state) = weak.upgrade() else {
                    return;
                };
                let listeners = state.borrow_mut().collection_changed(tasks);
                for listener in listeners {
                    listener(&ChartEvent);
                }
            }));

        Self {
            tasks,
            state,
            subscription,
        }
    }

    pub fn task_set(&self) -> &Rc<RefCell<dyn TaskSet>> {
        &self.tasks
    }

    pub fn tasks(&self) -> Ref<'_, dyn TaskSet> {
        self.tasks.borrow()
    }

    /// Mutable access to the collection. Listeners fire from inside the
    /// mutators, so no other chart borrow may be held across this.
    pub fn tasks_mut(&self) -> RefMut<'_, dyn TaskSet> {
        self.tasks.borrow_mut()
    }

    pub fn mapper(&self) -> Ref<'_, CoordinateMapper> {
        Ref::map(self.state.borrow(), |s| &s.mapper)
    }

    pub fn selection(&self) -> Ref<'_, SelectionModel> {
        Ref::map(self.state.borrow(), |s| &s.selection)
    }

    pub fn selection_mut(&self) -> RefMut<'_, SelectionModel> {
        RefMut::map(self.state.borrow_mut(), |s| &mut s.selection)
    }

    pub fn selected(&self) -> Vec<TaskId> {
        self.selection().selected().to_vec()
    }

    pub fn is_selected(&self, task: TaskId) -> bool {
        self.selection().is_selected(task)
    }

    /// Selection listeners run while the chart state is borrowed; they get
    /// the new selection in the event and must not query the chart.
    pub fn add_selection_listener(&self, listener: Rc<SelectionListener>) -> ListenerId {
        self.selection_mut().add_listener(listener)
    }

    pub fn add_change_listener(&self, listener: Rc<ChartListener>) -> ListenerId {
        self.state.borrow_mut().listeners.add(listener)
    }

    pub fn remove_change_listener(&self, id: ListenerId) -> bool {
        self.state.borrow_mut().listeners.remove(id)
    }

    /// Notify chart listeners and request a repaint.
    pub fn fire_change(&self) {
        let listeners = {
            let mut state = self.state.borrow_mut();
            state.repaint = true;
            state.listeners.snapshot()
        };
        for listener in listeners {
            listener(&ChartEvent);
        }
    }

    pub fn request_repaint(&self) {
        self.state.borrow_mut().repaint = true;
    }

    /// Returns and clears the pending repaint request.
    pub fn take_repaint_request(&self) -> bool {
        std::mem::take(&mut self.state.borrow_mut().repaint)
    }

    /// Recompute the range; repaint only if it moved. Returns whether it moved.
    pub fn resize(&self) -> bool {
        let tasks = self.tasks.borrow();
        let mut state = self.state.borrow_mut();
        let moved = state.mapper.compute_range(&*tasks);
        if moved {
            state.repaint = true;
        }
        moved
    }

    /// While locked, collection changes leave the range alone.
    pub fn set_range_locked(&self, locked: bool) {
        self.state.borrow_mut().range_locked = locked;
    }

    pub fn set_viewport_width(&self, width: f32) {
        let mut state = self.state.borrow_mut();
        if (state.mapper.viewport_width() - width as f64).abs() > f64::EPSILON {
            state.mapper.set_viewport_width(width as f64);
            state.repaint = true;
        }
    }

    pub fn zoom(&self) -> f64 {
        self.mapper().zoom()
    }

    pub fn set_zoom(&self, zoom: f64) {
        self.state.borrow_mut().mapper.set_zoom(zoom);
        log::debug!("zoom set to {:.2}", self.zoom());
        self.fire_change();
    }

    pub fn to_screen(&self, time: Time) -> f32 {
        self.mapper().to_screen(time) as f32
    }

    pub fn to_canonical(&self, x: f32) -> Time {
        self.mapper().to_canonical(x as f64)
    }

    /// Canonical distance covered by moving from `from_x` to `to_x`.
    pub fn canonical_delta(&self, from_x: f32, to_x: f32) -> Time {
        self.mapper().canonical_delta(from_x as f64, to_x as f64)
    }

    pub fn row_height(&self) -> f32 {
        (ROW_INSETS.top + ROW_INSETS.bottom + BAR_HEIGHT) as f32
    }

    pub fn width(&self) -> f32 {
        self.mapper().width() as f32
    }

    /// Zoomed width by the combined height of all rows.
    pub fn preferred_size(&self) -> Vec2 {
        vec2(self.width(), self.tasks().row_count() as f32 * self.row_height())
    }

    pub fn row_bounds(&self, row: usize) -> Rect {
        let height = self.row_height();
        Rect::from_min_size(pos2(0.0, row as f32 * height), vec2(self.width(), height))
    }

    /// Screen bounds of a task; `None` if it is not in the collection.
    pub fn task_bounds(&self, task: TaskId) -> Option<Rect> {
        let tasks = self.tasks();
        let row = tasks.row_of(task)?;
        let task = tasks.task(task)?;
        Some(self.bounds_at(row, task.start(), task.end()))
    }

    /// Bounds of a bar spanning `start..end` drawn in `row`.
    pub fn bounds_at(&self, row: usize, start: Time, end: Time) -> Rect {
        let mapper = self.mapper();
        let left = mapper.to_screen(start) as f32;
        let right = mapper.to_screen(end) as f32;
        let top = row as f32 * self.row_height() + ROW_INSETS.top as f32;
        Rect::from_min_max(pos2(left, top), pos2(right, top + BAR_HEIGHT as f32))
    }

    /// Row at vertical position `y`, or `None` outside the rows.
    pub fn hit_test_row(&self, y: f32) -> Option<usize> {
        if y < 0.0 {
            return None;
        }
        let row = (y / self.row_height()) as usize;
        (row < self.tasks().row_count()).then_some(row)
    }

    /// Task under `point`. Later tasks in a row are drawn on top and win.
    pub fn hit_test_task(&self, point: Pos2) -> Option<TaskId> {
        let row = self.hit_test_row(point.y)?;
        let ids = self.tasks().tasks_in_row(row);
        ids.into_iter()
            .rev()
            .find(|id| self.task_bounds(*id).is_some_and(|b| b.contains(point)))
    }

    /// Bounds of every task, row by row.
    pub fn all_task_bounds(&self) -> Vec<(TaskId, Rect)> {
        let ids = self.tasks().all_tasks();
        ids.into_iter()
            .filter_map(|id| self.task_bounds(id).map(|b| (id, b)))
            .collect()
    }

    pub fn select_all_intersecting(&self, area: Rect) -> bool {
        let candidates = self.all_task_bounds();
        self.selection_mut().select_all_intersecting(candidates, area)
    }
}

impl Drop for GanttChart {
    fn drop(&mut self) {
        if let Ok(mut tasks) = self.tasks.try_borrow_mut() {
            tasks.remove_listener(self.subscription);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::{BasicTask, TaskModel};
    use crate::model::task_set::BasicTaskSet;
    use std::cell::Cell;

    /// Two rows; 1px per time unit on a 1002px viewport over [0, 1000].
    fn chart() -> (GanttChart, TaskId, TaskId, TaskId) {
        let mut set = BasicTaskSet::new();
        let a = set.add_task(Box::new(BasicTask::new("a", "one", 0, 400)));
        let b = set.add_task(Box::new(BasicTask::new("b", "one", 300, 600)));
        let c = set.add_task(Box::new(BasicTask::new("c", "two", 500, 1_000)));
        let chart = GanttChart::new(Rc::new(RefCell::new(set)));
        chart.set_viewport_width(1_002.0);
        (chart, a, b, c)
    }

    #[test]
    fn geometry_follows_rows_and_mapper() {
        let (chart, a, _, c) = chart();
        assert_eq!(chart.row_height(), 22.0);
        assert_eq!(chart.preferred_size(), vec2(1_002.0, 44.0));
        assert_eq!(chart.row_bounds(1), Rect::from_min_size(pos2(0.0, 22.0), vec2(1_002.0, 22.0)));
        assert_eq!(
            chart.task_bounds(a),
            Some(Rect::from_min_max(pos2(1.0, 1.0), pos2(401.0, 21.0)))
        );
        assert_eq!(
            chart.task_bounds(c),
            Some(Rect::from_min_max(pos2(501.0, 23.0), pos2(1_001.0, 43.0)))
        );
        assert_eq!(chart.task_bounds(TaskId::new()), None);
    }

    #[test]
    fn hit_tests_prefer_later_tasks() {
        let (chart, a, b, c) = chart();
        assert_eq!(chart.hit_test_row(-1.0), None);
        assert_eq!(chart.hit_test_row(30.0), Some(1));
        assert_eq!(chart.hit_test_row(50.0), None);

        assert_eq!(chart.hit_test_task(pos2(100.0, 10.0)), Some(a));
        // a and b overlap in 301..=401; b was added later
        assert_eq!(chart.hit_test_task(pos2(350.0, 10.0)), Some(b));
        assert_eq!(chart.hit_test_task(pos2(700.0, 30.0)), Some(c));
        assert_eq!(chart.hit_test_task(pos2(700.0, 10.0)), None);
    }

    #[test]
    fn collection_changes_prune_selection_and_recompute_range() {
        let (chart, a, _, c) = chart();
        let fired = Rc::new(Cell::new(0));
        {
            let fired = Rc::clone(&fired);
            chart.add_change_listener(Rc::new(move |_: &ChartEvent| fired.set(fired.get() + 1)));
        }
        chart.selection_mut().select(c);
        chart.selection_mut().select(a);
        chart.take_repaint_request();

        chart.tasks_mut().remove_task(c);
        assert_eq!(chart.selected(), vec![a]);
        assert_eq!(chart.mapper().range_max(), 600);
        assert!(chart.take_repaint_request());
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn resize_repaints_only_when_range_moves() {
        let (chart, a, _, _) = chart();
        chart.take_repaint_request();
        assert!(!chart.resize());
        assert!(!chart.take_repaint_request());

        chart.tasks_mut().update_task(a, &mut |t: &mut dyn TaskModel| t.set_start(-100));
        assert!(chart.resize());
        assert_eq!(chart.mapper().range_min(), -100);
        assert!(chart.take_repaint_request());
    }

    #[test]
    fn empty_chart_is_degenerate_not_broken() {
        let chart = GanttChart::new(Rc::new(RefCell::new(BasicTaskSet::new())));
        chart.set_viewport_width(500.0);
        assert_eq!(chart.to_screen(42), 1.0);
        assert_eq!(chart.to_canonical(250.0), 0);
        assert_eq!(chart.canonical_delta(100.0, 300.0), 0);
        assert_eq!(chart.hit_test_task(pos2(10.0, 10.0)), None);
        assert_eq!(chart.preferred_size().y, 0.0);
    }
}
