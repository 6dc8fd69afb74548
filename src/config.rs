use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ChartError, Result};
use crate::model::task::Time;
use crate::model::undo::DEFAULT_UNDO_LIMIT;

const SETTINGS_FILE: &str = "settings.json";

/// What a MOVE drag does when the pointer crosses into another row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RowDragPolicy {
    /// Reorder the row sequence; the task keeps its row key.
    #[default]
    SwapRows,
    /// Rewrite the task's row key to the destination row's key.
    Reassign,
}

/// Zone used for calendar arithmetic on the time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AxisTimeZone {
    Utc,
    #[default]
    Local,
}

/// User-tunable behaviour of the chart, stored as JSON in the config dir.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartSettings {
    /// Floor for `end - start` while resizing.
    pub min_duration: Time,
    /// Edited timestamps are rounded down to a multiple of this; `<= 1` disables snapping.
    pub snap_granularity: Time,
    /// Pixel distance from a bar edge that still counts as grabbing the edge.
    pub edge_tolerance: f64,
    pub row_drag: RowDragPolicy,
    /// Notify collection listeners on every drag frame, not only on release.
    pub fire_change_during_edit: bool,
    pub undo_limit: usize,
    /// Distance moved by one keyboard nudge.
    pub keyboard_step: Time,
    pub time_zone: AxisTimeZone,
    /// Logger spec, e.g. `info` or `gantt_chart=debug`.
    pub log_level: String,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            min_duration: 0,
            snap_granularity: 1_000,
            edge_tolerance: 1.0,
            row_drag: RowDragPolicy::SwapRows,
            fire_change_during_edit: true,
            undo_limit: DEFAULT_UNDO_LIMIT,
            keyboard_step: 60_000,
            time_zone: AxisTimeZone::Local,
            log_level: "info".into(),
        }
    }
}

impl ChartSettings {
    /// `<config dir>/settings.json`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "GanttChart")
            .map(|dirs| dirs.config_dir().join(SETTINGS_FILE))
    }

    /// Read settings from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|source| ChartError::Settings {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ChartError::SettingsFormat {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from the default location, falling back to defaults on any error.
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        Self::load_from(&path).unwrap_or_else(|err| {
            log::warn!("{err}; using default settings");
            Self::default()
        })
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir).map_err(|source| ChartError::Settings {
                path: dir.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| ChartError::SettingsFormat {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, json).map_err(|source| ChartError::Settings {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Round `time` down to the snap granularity.
    pub fn snap(&self, time: Time) -> Time {
        if self.snap_granularity <= 1 {
            time
        } else {
            time - time.rem_euclid(self.snap_granularity)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = ChartSettings::load_from(&dir.path().join("nope.json")).unwrap();
        assert_eq!(settings, ChartSettings::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, r#"{ "min_duration": 500, "row_drag": "Reassign" }"#).unwrap();

        let settings = ChartSettings::load_from(&path).unwrap();
        assert_eq!(settings.min_duration, 500);
        assert_eq!(settings.row_drag, RowDragPolicy::Reassign);
        assert_eq!(settings.snap_granularity, 1_000);
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn malformed_file_is_a_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, "{ not json").unwrap();

        let err = ChartSettings::load_from(&path).unwrap_err();
        assert!(matches!(err, ChartError::SettingsFormat { .. }));
    }

    #[test]
    fn saved_settings_load_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(SETTINGS_FILE);
        let settings = ChartSettings {
            keyboard_step: 5_000,
            time_zone: AxisTimeZone::Utc,
            ..ChartSettings::default()
        };
        settings.save_to(&path).unwrap();
        assert_eq!(ChartSettings::load_from(&path).unwrap(), settings);
    }

    #[test]
    fn snapping_zeroes_sub_granularity_part() {
        let settings = ChartSettings::default();
        assert_eq!(settings.snap(1_999), 1_000);
        assert_eq!(settings.snap(-1), -1_000);
        let off = ChartSettings {
            snap_granularity: 0,
            ..ChartSettings::default()
        };
        assert_eq!(off.snap(1_005), 1_005);
    }
}
