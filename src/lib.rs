//! Core of an interactive Gantt chart: a row-grouped task collection, the
//! time-to-pixel mapping, selection, undoable edit gestures and the time
//! axis layout. The egui front end in the binary drives it.

pub mod chart;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;

pub use chart::{GanttChart, GestureDispatcher};
pub use config::ChartSettings;
pub use error::{ChartError, Result};
