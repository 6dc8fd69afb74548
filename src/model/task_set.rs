use std::collections::HashMap;
use std::rc::Rc;

use super::event::{ListenerId, Listeners, ModelEvent};
use super::task::{LinkRelation, TaskId, TaskLink, TaskModel};

/// Listener for collection changes. It receives the event and a shared view
/// of the collection as it is after the change.
pub type ModelListener = dyn Fn(&ModelEvent, &dyn TaskSet);

/// The task collection consumed by the chart: ordered rows of tasks keyed by
/// a row label, an unordered list of links, and change notification.
pub trait TaskSet {
    fn row_count(&self) -> usize;
    fn task_count(&self, row: usize) -> usize;
    fn task_at(&self, row: usize, index: usize) -> Option<TaskId>;
    fn title_at(&self, row: usize) -> Option<&str>;
    fn task(&self, id: TaskId) -> Option<&dyn TaskModel>;

    /// Append a task to the row for its key, creating the row if needed.
    fn add_task(&mut self, task: Box<dyn TaskModel>) -> TaskId;
    /// Remove a task; its row goes away with its last task.
    fn remove_task(&mut self, id: TaskId) -> Option<Box<dyn TaskModel>>;
    /// Swap the position of two rows. Task row keys are left untouched.
    fn swap_rows(&mut self, a: usize, b: usize) -> bool;
    /// Edit a task in place. Does not notify listeners; callers fire a
    /// change once they are done. Returns `false` for unknown ids.
    fn update_task(&mut self, id: TaskId, edit: &mut dyn FnMut(&mut dyn TaskModel)) -> bool;

    fn link_count(&self) -> usize;
    fn link_at(&self, index: usize) -> Option<&TaskLink>;
    fn add_link(&mut self, link: TaskLink) -> bool;
    fn remove_link(&mut self, link: &TaskLink) -> bool;
    fn set_link_relation(&mut self, index: usize, relation: LinkRelation) -> bool;

    fn add_listener(&mut self, listener: Rc<ModelListener>) -> ListenerId;
    fn remove_listener(&mut self, id: ListenerId) -> bool;
    fn fire_changed(&self, event: ModelEvent);

    fn contains(&self, id: TaskId) -> bool {
        self.task(id).is_some()
    }

    /// Index of the row titled `key`, compared by value.
    fn row_index(&self, key: &str) -> Option<usize> {
        (0..self.row_count()).find(|&row| self.title_at(row) == Some(key))
    }

    /// Index of the row currently holding `id`.
    fn row_of(&self, id: TaskId) -> Option<usize> {
        let row = self.row_index(self.task(id)?.row_key())?;
        (0..self.task_count(row))
            .any(|i| self.task_at(row, i) == Some(id))
            .then_some(row)
    }

    fn tasks_in_row(&self, row: usize) -> Vec<TaskId> {
        (0..self.task_count(row))
            .filter_map(|i| self.task_at(row, i))
            .collect()
    }

    /// Every task, row by row.
    fn all_tasks(&self) -> Vec<TaskId> {
        (0..self.row_count())
            .flat_map(|row| self.tasks_in_row(row))
            .collect()
    }

    fn fire_all_changed(&self) {
        self.fire_changed(ModelEvent::all(self.row_count()));
    }
}

#[derive(Debug, Clone)]
struct Row {
    key: String,
    tasks: Vec<TaskId>,
}

/// Default collection: rows are created in first-insertion order of their
/// key and destroyed with their last task.
#[derive(Default)]
pub struct BasicTaskSet {
    rows: Vec<Row>,
    tasks: HashMap<TaskId, Box<dyn TaskModel>>,
    links: Vec<TaskLink>,
    listeners: Listeners<ModelListener>,
}

impl BasicTaskSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `id` to the row for `key`, returning the row index.
    fn attach(&mut self, id: TaskId, key: &str) -> usize {
        match self.rows.iter().position(|r| r.key == key) {
            Some(row) => {
                self.rows[row].tasks.push(id);
                row
            }
            None => {
                self.rows.push(Row {
                    key: key.to_string(),
                    tasks: vec![id],
                });
                self.rows.len() - 1
            }
        }
    }

    /// Detach `id` from whichever row holds it, dropping the row if empty.
    fn detach(&mut self, id: TaskId) -> Option<usize> {
        let row = self.rows.iter().position(|r| r.tasks.contains(&id))?;
        self.rows[row].tasks.retain(|t| *t != id);
        if self.rows[row].tasks.is_empty() {
            self.rows.remove(row);
        }
        Some(row)
    }
}

impl TaskSet for BasicTaskSet {
    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn task_count(&self, row: usize) -> usize {
        self.rows.get(row).map_or(0, |r| r.tasks.len())
    }

    fn task_at(&self, row: usize, index: usize) -> Option<TaskId> {
        self.rows.get(row)?.tasks.get(index).copied()
    }

    fn title_at(&self, row: usize) -> Option<&str> {
        self.rows.get(row).map(|r| r.key.as_str())
    }

    fn task(&self, id: TaskId) -> Option<&dyn TaskModel> {
        self.tasks.get(&id).map(|t| t.as_ref())
    }

    fn row_of(&self, id: TaskId) -> Option<usize> {
        self.rows.iter().position(|r| r.tasks.contains(&id))
    }

    fn add_task(&mut self, task: Box<dyn TaskModel>) -> TaskId {
        let id = TaskId::new();
        let key = task.row_key().to_string();
        self.tasks.insert(id, task);
        let row = self.attach(id, &key);
        log::debug!("task {id} added to row {row} ({key})");
        self.fire_changed(ModelEvent::row(row));
        id
    }

    fn remove_task(&mut self, id: TaskId) -> Option<Box<dyn TaskModel>> {
        let task = self.tasks.remove(&id)?;
        self.detach(id);
        let dropped = self.links.len();
        self.links.retain(|link| !link.touches(id));
        log::debug!(
            "task {id} removed, {} link(s) dropped",
            dropped - self.links.len()
        );
        self.fire_all_changed();
        Some(task)
    }

    fn swap_rows(&mut self, a: usize, b: usize) -> bool {
        if a >= self.rows.len() || b >= self.rows.len() {
            return false;
        }
        if a != b {
            self.rows.swap(a, b);
            self.fire_changed(ModelEvent::rows(a, b));
        }
        true
    }

    fn update_task(&mut self, id: TaskId, edit: &mut dyn FnMut(&mut dyn TaskModel)) -> bool {
        let Some(task) = self.tasks.get_mut(&id) else {
            return false;
        };
        let old_key = task.row_key().to_string();
        edit(task.as_mut());
        let new_key = task.row_key().to_string();
        if new_key != old_key {
            self.detach(id);
            self.attach(id, &new_key);
        }
        true
    }

    fn link_count(&self) -> usize {
        self.links.len()
    }

    fn link_at(&self, index: usize) -> Option<&TaskLink> {
        self.links.get(index)
    }

    fn add_link(&mut self, link: TaskLink) -> bool {
        if link.from() == link.to() {
            log::warn!("rejected self-link on task {}", link.from());
            return false;
        }
        if !self.tasks.contains_key(&link.from()) || !self.tasks.contains_key(&link.to()) {
            log::warn!("rejected link {} -> {}: unknown endpoint", link.from(), link.to());
            return false;
        }
        let exists = self
            .links
            .iter()
            .any(|l| l.from() == link.from() && l.to() == link.to());
        if exists {
            log::warn!("rejected duplicate link {} -> {}", link.from(), link.to());
            return false;
        }
        self.links.push(link);
        self.fire_all_changed();
        true
    }

    fn remove_link(&mut self, link: &TaskLink) -> bool {
        let Some(index) = self.links.iter().position(|l| l == link) else {
            return false;
        };
        self.links.remove(index);
        self.fire_all_changed();
        true
    }

    fn set_link_relation(&mut self, index: usize, relation: LinkRelation) -> bool {
        let Some(link) = self.links.get_mut(index) else {
            return false;
        };
        link.relation = relation;
        self.fire_all_changed();
        true
    }

    fn add_listener(&mut self, listener: Rc<ModelListener>) -> ListenerId {
        self.listeners.add(listener)
    }

    fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    fn fire_changed(&self, event: ModelEvent) {
        for listener in self.listeners.snapshot() {
            listener(&event, self);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::BasicTask;
    use std::cell::RefCell;

    fn task(name: &str, row: &str) -> Box<dyn TaskModel> {
        Box::new(BasicTask::new(name, row, 0, 10))
    }

    #[test]
    fn rows_follow_first_insertion_order() {
        let mut set = BasicTaskSet::new();
        let a = set.add_task(task("a", "beta"));
        let b = set.add_task(task("b", "alpha"));
        let c = set.add_task(task("c", "beta"));

        assert_eq!(set.row_count(), 2);
        assert_eq!(set.title_at(0), Some("beta"));
        assert_eq!(set.title_at(1), Some("alpha"));
        assert_eq!(set.tasks_in_row(0), vec![a, c]);
        assert_eq!(set.row_of(b), Some(1));
    }

    #[test]
    fn removing_last_task_removes_row_and_shifts_later_rows() {
        let mut set = BasicTaskSet::new();
        let a = set.add_task(task("a", "one"));
        set.add_task(task("b", "two"));
        let c = set.add_task(task("c", "three"));

        assert!(set.remove_task(a).is_some());
        assert_eq!(set.row_count(), 2);
        assert_eq!(set.title_at(0), Some("two"));
        assert_eq!(set.title_at(1), Some("three"));
        assert_eq!(set.row_of(c), Some(1));
        assert!(set.remove_task(a).is_none());
    }

    #[test]
    fn removing_a_task_drops_its_links() {
        let mut set = BasicTaskSet::new();
        let a = set.add_task(task("a", "r"));
        let b = set.add_task(task("b", "r"));
        let c = set.add_task(task("c", "r"));
        assert!(set.add_link(TaskLink::new(a, b, LinkRelation::FinishToStart)));
        assert!(set.add_link(TaskLink::new(b, c, LinkRelation::StartToStart)));

        set.remove_task(a);
        assert_eq!(set.link_count(), 1);
        assert_eq!(set.link_at(0).map(|l| l.from()), Some(b));
    }

    #[test]
    fn self_and_duplicate_links_are_rejected() {
        let mut set = BasicTaskSet::new();
        let a = set.add_task(task("a", "r"));
        let b = set.add_task(task("b", "r"));

        assert!(!set.add_link(TaskLink::new(a, a, LinkRelation::FinishToStart)));
        assert!(set.add_link(TaskLink::new(a, b, LinkRelation::FinishToStart)));
        assert!(!set.add_link(TaskLink::new(a, b, LinkRelation::StartToStart)));
        // the reverse direction is a different link
        assert!(set.add_link(TaskLink::new(b, a, LinkRelation::FinishToStart)));
        assert_eq!(set.link_count(), 2);
    }

    #[test]
    fn link_relation_is_mutable() {
        let mut set = BasicTaskSet::new();
        let a = set.add_task(task("a", "r"));
        let b = set.add_task(task("b", "r"));
        set.add_link(TaskLink::new(a, b, LinkRelation::FinishToStart));

        assert!(set.set_link_relation(0, LinkRelation::FinishToFinish));
        assert_eq!(set.link_at(0).map(|l| l.relation), Some(LinkRelation::FinishToFinish));
        assert!(!set.set_link_relation(3, LinkRelation::StartToStart));
    }

    #[test]
    fn swap_rows_keeps_row_keys() {
        let mut set = BasicTaskSet::new();
        let a = set.add_task(task("a", "one"));
        set.add_task(task("b", "two"));

        assert!(set.swap_rows(0, 1));
        assert_eq!(set.title_at(0), Some("two"));
        assert_eq!(set.row_of(a), Some(1));
        assert_eq!(set.task(a).map(|t| t.row_key()), Some("one"));
        assert!(!set.swap_rows(0, 5));
    }

    #[test]
    fn update_task_regroups_on_row_key_change() {
        let mut set = BasicTaskSet::new();
        let a = set.add_task(task("a", "one"));
        set.add_task(task("b", "two"));

        assert!(set.update_task(a, &mut |t: &mut dyn TaskModel| t.set_row_key("two".into())));
        assert_eq!(set.row_count(), 1);
        assert_eq!(set.row_of(a), Some(0));
        assert_eq!(set.task_count(0), 2);

        assert!(set.update_task(a, &mut |t: &mut dyn TaskModel| t.set_row_key("three".into())));
        assert_eq!(set.title_at(1), Some("three"));
        assert!(!set.update_task(TaskId::new(), &mut |_: &mut dyn TaskModel| {}));
    }

    #[test]
    fn listeners_receive_changes_in_order_until_removed() {
        let mut set = BasicTaskSet::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let first = {
            let log = Rc::clone(&log);
            set.add_listener(Rc::new(move |event: &ModelEvent, tasks: &dyn TaskSet| {
                log.borrow_mut().push(("first", *event, tasks.row_count()));
            }))
        };
        {
            let log = Rc::clone(&log);
            set.add_listener(Rc::new(move |event: &ModelEvent, tasks: &dyn TaskSet| {
                log.borrow_mut().push(("second", *event, tasks.row_count()));
            }));
        }

        set.add_task(task("a", "one"));
        assert_eq!(
            *log.borrow(),
            vec![
                ("first", ModelEvent::row(0), 1),
                ("second", ModelEvent::row(0), 1)
            ]
        );

        assert!(set.remove_listener(first));
        log.borrow_mut().clear();
        set.add_task(task("b", "two"));
        assert_eq!(*log.borrow(), vec![("second", ModelEvent::row(1), 2)]);
    }
}
