use std::path::PathBuf;

use crate::chart::axis::CalendarField;

#[derive(thiserror::Error, Debug)]
pub enum ChartError {
    #[error("unsupported calendar step: {0:?}")]
    UnsupportedStep(CalendarField),

    #[error("time {0} is outside the supported calendar range")]
    OutOfCalendar(crate::model::task::Time),

    #[error("failed to access settings at {}: {source}", path.display())]
    Settings {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed settings at {}: {source}", path.display())]
    SettingsFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot start logging: {0}")]
    Logging(#[from] flexi_logger::FlexiLoggerError),
}

pub type Result<T> = std::result::Result<T, ChartError>;
