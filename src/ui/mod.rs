pub mod gantt_chart;
pub mod task_editor;
pub mod task_table;
pub mod theme;
pub mod time_axis;
pub mod toolbar;
