//! Reversible edit records and the undo stack they are committed to.
//!
//! An edit goes through four steps: register the tasks it touches, grab the
//! "before" snapshot, grab the "after" snapshot, commit to an [`UndoManager`].

use super::task::{TaskId, TaskModel};
use super::task_set::TaskSet;

pub const DEFAULT_UNDO_LIMIT: usize = 100;

/// Where an edit came from. Only keyboard edits merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditSource {
    Pointer,
    Keyboard,
}

#[derive(Debug)]
struct TrackedTask {
    task: TaskId,
    before: Option<Box<dyn TaskModel>>,
    after: Option<Box<dyn TaskModel>>,
}

impl TrackedTask {
    fn new(task: TaskId) -> Self {
        Self {
            task,
            before: None,
            after: None,
        }
    }

    fn state(&self, side: Side) -> Option<&dyn TaskModel> {
        match side {
            Side::Before => self.before.as_deref(),
            Side::After => self.after.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Before,
    After,
}

fn snapshot(tasks: &dyn TaskSet, id: TaskId) -> Option<Box<dyn TaskModel>> {
    tasks.task(id).map(|t| t.boxed_clone())
}

/// An edit that is still being recorded.
#[derive(Debug)]
pub struct EditSession {
    source: EditSource,
    tracked: Vec<TrackedTask>,
    sealed: bool,
}

impl EditSession {
    pub fn new(source: EditSource) -> Self {
        Self {
            source,
            tracked: Vec::new(),
            sealed: false,
        }
    }

    pub fn source(&self) -> EditSource {
        self.source
    }

    /// Track `task`. Must happen before the snapshots are taken.
    pub fn add_edited_task(&mut self, task: TaskId) {
        if !self.tracked.iter().any(|t| t.task == task) {
            self.tracked.push(TrackedTask::new(task));
        }
        self.sealed = false;
    }

    pub fn tracked_tasks(&self) -> Vec<TaskId> {
        self.tracked.iter().map(|t| t.task).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tracked.is_empty()
    }

    pub fn grab_before_snapshot(&mut self, tasks: &dyn TaskSet) {
        for entry in &mut self.tracked {
            entry.before = snapshot(tasks, entry.task);
        }
    }

    pub fn grab_after_snapshot(&mut self, tasks: &dyn TaskSet) {
        for entry in &mut self.tracked {
            entry.after = snapshot(tasks, entry.task);
        }
    }

    /// The "before" snapshot of a tracked task.
    pub fn before(&self, task: TaskId) -> Option<&dyn TaskModel> {
        self.tracked
            .iter()
            .find(|t| t.task == task)
            .and_then(|t| t.before.as_deref())
    }

    /// True if any tracked task's after snapshot differs from its before.
    pub fn has_changes(&self) -> bool {
        self.tracked.iter().any(|t| match (&t.before, &t.after) {
            (Some(before), Some(after)) => !before.same_values(&**after),
            (None, None) => false,
            _ => true,
        })
    }

    /// Seal the session into a record and clear the tracking list.
    /// Returns `None` if nothing was registered since the last seal.
    pub fn seal(&mut self) -> Option<EditRecord> {
        if self.sealed {
            return None;
        }
        self.sealed = true;
        Some(EditRecord {
            source: self.source,
            entries: std::mem::take(&mut self.tracked),
        })
    }

    /// Push the sealed record onto `undo`. A second commit without new
    /// registrations is a no-op and returns false.
    pub fn commit(&mut self, undo: &mut UndoManager) -> bool {
        match self.seal() {
            Some(record) => {
                undo.add_edit(record);
                true
            }
            None => false,
        }
    }
}

/// A sealed, reversible edit.
#[derive(Debug)]
pub struct EditRecord {
    source: EditSource,
    entries: Vec<TrackedTask>,
}

impl EditRecord {
    pub fn source(&self) -> EditSource {
        self.source
    }

    pub fn tasks(&self) -> Vec<TaskId> {
        self.entries.iter().map(|e| e.task).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Restore every task to its "before" state. Returns how many tasks
    /// were restored; tasks no longer in the collection are skipped.
    pub fn undo(&self, tasks: &mut dyn TaskSet) -> usize {
        self.restore(tasks, Side::Before)
    }

    /// Restore every task to its "after" state.
    pub fn redo(&self, tasks: &mut dyn TaskSet) -> usize {
        self.restore(tasks, Side::After)
    }

    fn restore(&self, tasks: &mut dyn TaskSet, side: Side) -> usize {
        if self.entries.is_empty() {
            return 0;
        }
        let mut restored = 0;
        for entry in &self.entries {
            let Some(state) = entry.state(side) else {
                continue;
            };
            if tasks.update_task(entry.task, &mut |task: &mut dyn TaskModel| task.assign_from(state)) {
                restored += 1;
            }
        }
        tasks.fire_all_changed();
        restored
    }

    /// Keyboard records over the exact same set of tasks may merge.
    pub fn can_merge(&self, next: &EditRecord) -> bool {
        self.source == EditSource::Keyboard
            && next.source == EditSource::Keyboard
            && self.entries.len() == next.entries.len()
            && next
                .entries
                .iter()
                .all(|n| self.entries.iter().any(|e| e.task == n.task))
    }

    /// Fold `next` into this record: the before states stay, the after
    /// states are taken from `next`. Returns whether the merge happened.
    pub fn merge(&mut self, next: &EditRecord) -> bool {
        if !self.can_merge(next) {
            return false;
        }
        for incoming in &next.entries {
            if let Some(entry) = self.entries.iter_mut().find(|e| e.task == incoming.task) {
                entry.after = incoming.after.clone();
            }
        }
        true
    }
}

/// Linear undo history with a cursor; records past the cursor can be redone.
#[derive(Debug)]
pub struct UndoManager {
    edits: Vec<EditRecord>,
    cursor: usize,
    limit: usize,
}

impl Default for UndoManager {
    fn default() -> Self {
        Self::new(DEFAULT_UNDO_LIMIT)
    }
}

impl UndoManager {
    pub fn new(limit: usize) -> Self {
        Self {
            edits: Vec::new(),
            cursor: 0,
            limit: limit.max(1),
        }
    }

    /// Add a record, discarding anything that could have been redone.
    pub fn add_edit(&mut self, record: EditRecord) {
        self.edits.truncate(self.cursor);
        if let Some(last) = self.edits.last_mut() {
            if last.merge(&record) {
                log::debug!("merged keyboard edit into previous record");
                return;
            }
        }
        log::info!(
            "committed {:?} edit touching {} task(s)",
            record.source(),
            record.entries.len()
        );
        self.edits.push(record);
        if self.edits.len() > self.limit {
            let overflow = self.edits.len() - self.limit;
            self.edits.drain(..overflow);
        }
        self.cursor = self.edits.len();
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.edits.len()
    }

    pub fn undo(&mut self, tasks: &mut dyn TaskSet) -> bool {
        if !self.can_undo() {
            return false;
        }
        self.cursor -= 1;
        let restored = self.edits[self.cursor].undo(tasks);
        log::info!("undo restored {restored} task(s)");
        true
    }

    pub fn redo(&mut self, tasks: &mut dyn TaskSet) -> bool {
        if !self.can_redo() {
            return false;
        }
        let restored = self.edits[self.cursor].redo(tasks);
        self.cursor += 1;
        log::info!("redo restored {restored} task(s)");
        true
    }

    /// Change the history size, dropping the oldest records that no longer fit.
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit.max(1);
        if self.edits.len() > self.limit {
            let overflow = self.edits.len() - self.limit;
            self.edits.drain(..overflow);
            self.cursor = self.cursor.saturating_sub(overflow);
            log::debug!("undo history trimmed by {overflow} record(s)");
        }
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn clear(&mut self) {
        self.edits.clear();
        self.cursor = 0;
    }
}
