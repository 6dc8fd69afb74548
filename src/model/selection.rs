use std::rc::Rc;

use egui::Rect;

use super::event::{ListenerId, Listeners, SelectionEvent, SelectionListener};
use super::task::TaskId;
use super::task_set::TaskSet;

/// The set of currently selected tasks.
///
/// Every mutating call notifies listeners before it returns. Listeners get
/// the new selection in the event and must not call back into the owner of
/// this model while it is being mutated.
#[derive(Default)]
pub struct SelectionModel {
    /// Insertion order is kept so edit records list tasks deterministically.
    selected: Vec<TaskId>,
    listeners: Listeners<SelectionListener>,
}

impl SelectionModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&mut self, listener: Rc<SelectionListener>) -> ListenerId {
        self.listeners.add(listener)
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    pub fn selected(&self) -> &[TaskId] {
        &self.selected
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    pub fn is_selected(&self, task: TaskId) -> bool {
        self.selected.contains(&task)
    }

    /// The single selected task, if exactly one is selected.
    pub fn single(&self) -> Option<TaskId> {
        match self.selected.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        self.selected.clear();
        self.fire();
    }

    pub fn select(&mut self, task: TaskId) {
        if !self.selected.contains(&task) {
            self.selected.push(task);
        }
        self.fire();
    }

    pub fn toggle(&mut self, task: TaskId) {
        if self.selected.contains(&task) {
            self.selected.retain(|t| *t != task);
        } else {
            self.selected.push(task);
        }
        self.fire();
    }

    /// Replace the selection with every candidate whose bounds intersect
    /// `area`. Listeners are notified only if the selected set changed.
    pub fn select_all_intersecting<I>(&mut self, candidates: I, area: Rect) -> bool
    where
        I: IntoIterator<Item = (TaskId, Rect)>,
    {
        let hits = candidates
            .into_iter()
            .filter(|(_, bounds)| bounds.intersects(area))
            .map(|(id, _)| id)
            .collect();
        self.replace(hits)
    }

    /// Drop entries whose task is gone from `tasks`. Listeners are notified
    /// only if something was pruned.
    pub fn prune(&mut self, tasks: &dyn TaskSet) -> bool {
        let before = self.selected.len();
        self.selected.retain(|id| tasks.contains(*id));
        let pruned = self.selected.len() != before;
        if pruned {
            log::debug!("pruned {} dangling selection entries", before - self.selected.len());
            self.fire();
        }
        pruned
    }

    fn replace(&mut self, mut tasks: Vec<TaskId>) -> bool {
        tasks.dedup();
        let same = tasks.len() == self.selected.len()
            && tasks.iter().all(|t| self.selected.contains(t));
        if same {
            return false;
        }
        self.selected = tasks;
        self.fire();
        true
    }

    fn fire(&self) {
        let event = SelectionEvent {
            selected: self.selected.clone(),
        };
        for listener in self.listeners.snapshot() {
            listener(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::BasicTask;
    use crate::model::task_set::BasicTaskSet;
    use egui::{pos2, vec2};
    use std::cell::RefCell;

    fn recording(model: &mut SelectionModel) -> Rc<RefCell<Vec<Vec<TaskId>>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        model.add_listener(Rc::new(move |event: &SelectionEvent| {
            sink.borrow_mut().push(event.selected.clone());
        }));
        events
    }

    fn bar(x: f32, y: f32) -> Rect {
        Rect::from_min_size(pos2(x, y), vec2(40.0, 20.0))
    }

    #[test]
    fn toggle_select_and_clear_notify_synchronously() {
        let mut model = SelectionModel::new();
        let events = recording(&mut model);
        let a = TaskId::new();
        let b = TaskId::new();

        model.select(a);
        model.toggle(b);
        model.toggle(a);
        assert_eq!(model.selected(), &[b]);
        assert_eq!(model.single(), Some(b));
        model.clear();

        assert!(model.is_empty());
        assert_eq!(*events.borrow(), vec![vec![a], vec![a, b], vec![b], vec![]]);
    }

    #[test]
    fn box_selection_replaces_prior_selection() {
        let mut model = SelectionModel::new();
        let (a, b, c) = (TaskId::new(), TaskId::new(), TaskId::new());
        model.select(c);
        let events = recording(&mut model);

        let candidates = vec![(a, bar(0.0, 0.0)), (b, bar(100.0, 0.0)), (c, bar(0.0, 50.0))];
        let area = Rect::from_min_max(pos2(10.0, 5.0), pos2(120.0, 15.0));
        assert!(model.select_all_intersecting(candidates, area));

        assert_eq!(model.selected(), &[a, b]);
        assert!(!model.is_selected(c));
        assert_eq!(events.borrow().len(), 1);
    }

    #[test]
    fn empty_box_notifies_only_when_selection_was_non_empty() {
        let mut model = SelectionModel::new();
        let events = recording(&mut model);
        let a = TaskId::new();
        let nowhere = Rect::from_min_max(pos2(500.0, 500.0), pos2(510.0, 510.0));

        assert!(!model.select_all_intersecting(vec![(a, bar(0.0, 0.0))], nowhere));
        assert!(events.borrow().is_empty());

        model.select(a);
        events.borrow_mut().clear();
        assert!(model.select_all_intersecting(vec![(a, bar(0.0, 0.0))], nowhere));
        assert!(model.is_empty());
        assert_eq!(*events.borrow(), vec![Vec::<TaskId>::new()]);
    }

    #[test]
    fn prune_drops_removed_tasks_and_notifies_once() {
        let mut set = BasicTaskSet::new();
        let a = set.add_task(Box::new(BasicTask::new("a", "r", 0, 1)));
        let b = set.add_task(Box::new(BasicTask::new("b", "r", 0, 1)));
        let mut model = SelectionModel::new();
        model.select(a);
        model.select(b);
        let events = recording(&mut model);

        assert!(!model.prune(&set));
        assert!(events.borrow().is_empty());

        set.remove_task(a);
        assert!(model.prune(&set));
        assert_eq!(model.selected(), &[b]);
        assert_eq!(events.borrow().len(), 1);
    }
}
