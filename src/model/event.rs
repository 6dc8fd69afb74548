//! Listener registries and the events they carry.
//!
//! Delivery is always synchronous and in registration order. Registries hand
//! out a snapshot of their listeners before dispatch so a listener may be
//! removed while an event is in flight without disturbing the current round.

use std::rc::Rc;

use super::task::TaskId;

/// Handle returned on registration, used to remove the listener again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Ordered list of listeners of one kind.
pub struct Listeners<L: ?Sized> {
    next_id: u64,
    entries: Vec<(ListenerId, Rc<L>)>,
}

impl<L: ?Sized> Default for Listeners<L> {
    fn default() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }
}

impl<L: ?Sized> Listeners<L> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, listener: Rc<L>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, listener));
        id
    }

    /// Returns `false` if the id was not registered.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The listeners in registration order.
    pub fn snapshot(&self) -> Vec<Rc<L>> {
        self.entries.iter().map(|(_, l)| Rc::clone(l)).collect()
    }
}

/// A change in a task collection, covering rows `first_row..=last_row`.
/// Events built by [`ModelEvent::all`] are the exception: there `last_row`
/// is the row count, one past the last row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelEvent {
    pub first_row: usize,
    pub last_row: usize,
}

impl ModelEvent {
    /// Every row of a collection with `row_count` rows. `last_row` is
    /// exclusive here.
    pub fn all(row_count: usize) -> Self {
        Self {
            first_row: 0,
            last_row: row_count,
        }
    }

    pub fn row(row: usize) -> Self {
        Self {
            first_row: row,
            last_row: row,
        }
    }

    pub fn rows(first_row: usize, last_row: usize) -> Self {
        Self {
            first_row: first_row.min(last_row),
            last_row: first_row.max(last_row),
        }
    }
}

/// Fired after the selected set changed; carries the new selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionEvent {
    pub selected: Vec<TaskId>,
}

pub type SelectionListener = dyn Fn(&SelectionEvent);

/// Fired when anything the chart displays has changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartEvent;

pub type ChartListener = dyn Fn(&ChartEvent);

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn listeners_run_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut listeners: Listeners<dyn Fn(&ChartEvent)> = Listeners::new();
        for tag in ["first", "second", "third"] {
            let log = Rc::clone(&log);
            listeners.add(Rc::new(move |_: &ChartEvent| log.borrow_mut().push(tag)));
        }
        for listener in listeners.snapshot() {
            listener(&ChartEvent);
        }
        assert_eq!(*log.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn remove_reports_unknown_ids() {
        let mut listeners: Listeners<dyn Fn(&ChartEvent)> = Listeners::new();
        let id = listeners.add(Rc::new(|_: &ChartEvent| {}));
        assert!(listeners.remove(id));
        assert!(!listeners.remove(id));
        assert!(listeners.is_empty());
    }

    #[test]
    fn rows_event_is_normalized() {
        assert_eq!(ModelEvent::rows(4, 1), ModelEvent { first_row: 1, last_row: 4 });
    }
}
