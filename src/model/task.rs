use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Canonical time: the data layer's native, monotonically comparable unit
/// (epoch milliseconds for the built-in task type).
pub type Time = i64;

/// Identity of a task inside a collection. Two value-equal tasks are still
/// different tasks if their ids differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form is enough to tell tasks apart in logs.
        let text = self.0.simple().to_string();
        f.write_str(&text[..8])
    }
}

/// Health of a task as shown by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    Fine,
    Delayed,
}

/// Represents the type of relation between the two endpoints of a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkRelation {
    StartToFinish,
    StartToStart,
    FinishToStart,
    FinishToFinish,
}

impl LinkRelation {
    pub fn short_label(&self) -> &'static str {
        match self {
            LinkRelation::StartToFinish => "SF",
            LinkRelation::StartToStart => "SS",
            LinkRelation::FinishToStart => "FS",
            LinkRelation::FinishToFinish => "FF",
        }
    }
}

/// A directed link between two tasks. The endpoints are fixed at creation,
/// only the relation may change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskLink {
    from: TaskId,
    to: TaskId,
    pub relation: LinkRelation,
}

impl TaskLink {
    pub fn new(from: TaskId, to: TaskId, relation: LinkRelation) -> Self {
        Self { from, to, relation }
    }

    pub fn from(&self) -> TaskId {
        self.from
    }

    pub fn to(&self) -> TaskId {
        self.to
    }

    /// True if either endpoint is `task`.
    pub fn touches(&self, task: TaskId) -> bool {
        self.from == task || self.to == task
    }
}

/// Data capability every task type exposes to the chart.
///
/// The chart never depends on a concrete task type: it reads and writes
/// fields through this trait and snapshots tasks with [`TaskModel::boxed_clone`].
/// `start <= end` is not enforced here; edit gestures clamp instead.
pub trait TaskModel: fmt::Debug {
    fn name(&self) -> &str;
    fn set_name(&mut self, name: String);

    /// Key of the row this task is grouped under.
    fn row_key(&self) -> &str;
    fn set_row_key(&mut self, key: String);

    fn start(&self) -> Time;
    fn set_start(&mut self, start: Time);

    fn end(&self) -> Time;
    fn set_end(&mut self, end: Time);

    fn status(&self) -> TaskStatus;
    fn set_status(&mut self, status: TaskStatus);

    fn detail(&self) -> &str;
    fn set_detail(&mut self, detail: String);

    /// A fully independent, value-equal copy.
    fn boxed_clone(&self) -> Box<dyn TaskModel>;

    /// Copy every field of `other` onto `self`, in the order
    /// name, row key, start, end, status, detail.
    fn assign_from(&mut self, other: &dyn TaskModel) {
        self.set_name(other.name().to_string());
        self.set_row_key(other.row_key().to_string());
        self.set_start(other.start());
        self.set_end(other.end());
        self.set_status(other.status());
        self.set_detail(other.detail().to_string());
    }

    /// Field-by-field comparison, independent of the concrete type.
    fn same_values(&self, other: &dyn TaskModel) -> bool {
        self.name() == other.name()
            && self.row_key() == other.row_key()
            && self.start() == other.start()
            && self.end() == other.end()
            && self.status() == other.status()
            && self.detail() == other.detail()
    }
}

impl Clone for Box<dyn TaskModel> {
    fn clone(&self) -> Self {
        self.boxed_clone()
    }
}

/// The built-in task type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicTask {
    pub name: String,
    pub row_key: String,
    pub start: Time,
    pub end: Time,
    pub status: TaskStatus,
    pub detail: String,
}

impl BasicTask {
    /// Create a new task with sensible defaults.
    pub fn new(name: impl Into<String>, row_key: impl Into<String>, start: Time, end: Time) -> Self {
        Self {
            name: name.into(),
            row_key: row_key.into(),
            start,
            end,
            status: TaskStatus::Fine,
            detail: String::new(),
        }
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }
}

impl TaskModel for BasicTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }

    fn row_key(&self) -> &str {
        &self.row_key
    }

    fn set_row_key(&mut self, key: String) {
        self.row_key = key;
    }

    fn start(&self) -> Time {
        self.start
    }

    fn set_start(&mut self, start: Time) {
        self.start = start;
    }

    fn end(&self) -> Time {
        self.end
    }

    fn set_end(&mut self, end: Time) {
        self.end = end;
    }

    fn status(&self) -> TaskStatus {
        self.status
    }

    fn set_status(&mut self, status: TaskStatus) {
        self.status = status;
    }

    fn detail(&self) -> &str {
        &self.detail
    }

    fn set_detail(&mut self, detail: String) {
        self.detail = detail;
    }

    fn boxed_clone(&self) -> Box<dyn TaskModel> {
        Box::new(self.clone())
    }
}
