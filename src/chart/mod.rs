pub mod axis;
pub mod gantt;
pub mod gesture;

pub use axis::{AxisCell, AxisFormat, AxisLayout, CalendarField, TextMeasure, TimeAxis, DEFAULT_FORMATS};
pub use gantt::{GanttChart, BAR_HEIGHT, ROW_INSETS};
pub use gesture::{
    cursor_for, edit_mode_at, CursorKind, EditMode, GestureDispatcher, GestureOutcome, GesturePreview,
};
