pub mod event;
pub mod selection;
pub mod task;
pub mod task_set;
pub mod timeline;
pub mod undo;

pub use event::{ChartEvent, ListenerId, ModelEvent, SelectionEvent};
pub use selection::SelectionModel;
pub use task::{BasicTask, LinkRelation, TaskId, TaskLink, TaskModel, TaskStatus, Time};
pub use task_set::{BasicTaskSet, TaskSet};
pub use timeline::{CoordinateMapper, Insets};
pub use undo::{EditRecord, EditSession, EditSource, UndoManager};
