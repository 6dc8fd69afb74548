use super::task::Time;
use super::task_set::TaskSet;

/// Zoom limits for the chart width multiplier.
pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 10_000.0;

/// Pixel margins around every row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Insets {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
}

impl Insets {
    pub const fn uniform(value: f64) -> Self {
        Self {
            top: value,
            left: value,
            bottom: value,
            right: value,
        }
    }
}

/// Converts between canonical time and horizontal screen position.
///
/// Both directions share one scale factor
/// `k = (width - insets) / (range_max - range_min)`. When the range collapses
/// to a single point (including the empty collection, which maps to `[0, 0]`)
/// `k` is zero: every time maps to the left inset and every pixel maps back to
/// `range_min`.
#[derive(Debug, Clone)]
pub struct CoordinateMapper {
    range_min: Time,
    range_max: Time,
    /// Width of the visible area, before zoom.
    viewport_width: f64,
    zoom: f64,
    insets: Insets,
}

impl CoordinateMapper {
    pub fn new(insets: Insets) -> Self {
        Self {
            range_min: 0,
            range_max: 0,
            viewport_width: 0.0,
            zoom: 1.0,
            insets,
        }
    }

    /// Full scan for `min(start)` and `max(end)`. Returns true if the range moved.
    pub fn compute_range(&mut self, tasks: &dyn TaskSet) -> bool {
        let (min, max) = tasks
            .all_tasks()
            .into_iter()
            .filter_map(|id| tasks.task(id))
            .fold(None, |acc: Option<(Time, Time)>, task| match acc {
                None => Some((task.start(), task.end())),
                Some((min, max)) => Some((min.min(task.start()), max.max(task.end()))),
            })
            .unwrap_or((0, 0));
        self.set_range(min, max)
    }

    /// Returns true if the range moved.
    pub fn set_range(&mut self, min: Time, max: Time) -> bool {
        let changed = (min, max) != (self.range_min, self.range_max);
        self.range_min = min;
        self.range_max = max;
        changed
    }

    pub fn range_min(&self) -> Time {
        self.range_min
    }

    pub fn range_max(&self) -> Time {
        self.range_max
    }

    pub fn span(&self) -> Time {
        self.range_max - self.range_min
    }

    pub fn insets(&self) -> Insets {
        self.insets
    }

    pub fn viewport_width(&self) -> f64 {
        self.viewport_width
    }

    pub fn set_viewport_width(&mut self, width: f64) {
        self.viewport_width = width.max(0.0);
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Total width of the chart in pixels (viewport width times zoom).
    pub fn width(&self) -> f64 {
        self.viewport_width * self.zoom
    }

    /// Pixels per canonical time unit; zero for a collapsed range.
    pub fn scale(&self) -> f64 {
        if self.range_max <= self.range_min {
            return 0.0;
        }
        let usable = (self.width() - self.insets.left - self.insets.right).max(0.0);
        usable / (self.range_max - self.range_min) as f64
    }

    pub fn to_screen(&self, value: Time) -> f64 {
        self.scale() * (value - self.range_min) as f64 + self.insets.left
    }

    pub fn to_canonical(&self, x: f64) -> Time {
        let scale = self.scale();
        if scale <= 0.0 {
            return self.range_min;
        }
        ((x - self.insets.left) / scale).round() as Time + self.range_min
    }

    /// Canonical distance covered by moving from `from_x` to `to_x`.
    pub fn canonical_delta(&self, from_x: f64, to_x: f64) -> Time {
        self.to_canonical(to_x) - self.to_canonical(from_x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::BasicTask;
    use crate::model::task_set::BasicTaskSet;

    fn mapper(min: Time, max: Time, width: f64) -> CoordinateMapper {
        let mut mapper = CoordinateMapper::new(Insets::uniform(1.0));
        mapper.set_viewport_width(width);
        mapper.set_range(min, max);
        mapper
    }

    #[test]
    fn empty_collection_collapses_to_zero() {
        let mut mapper = mapper(5, 10, 800.0);
        assert!(mapper.compute_range(&BasicTaskSet::new()));
        assert_eq!((mapper.range_min(), mapper.range_max()), (0, 0));
        assert_eq!(mapper.scale(), 0.0);
        assert_eq!(mapper.to_screen(123_456), 1.0);
        assert_eq!(mapper.to_canonical(400.0), 0);
        assert_eq!(mapper.to_canonical(-50.0), 0);
    }

    #[test]
    fn range_spans_all_tasks() {
        let mut set = BasicTaskSet::new();
        set.add_task(Box::new(BasicTask::new("a", "r1", 1_000, 2_000)));
        set.add_task(Box::new(BasicTask::new("b", "r2", 500, 1_500)));
        set.add_task(Box::new(BasicTask::new("c", "r2", 1_200, 9_000)));

        let mut mapper = mapper(0, 0, 100.0);
        assert!(mapper.compute_range(&set));
        assert_eq!((mapper.range_min(), mapper.range_max()), (500, 9_000));
        assert!(!mapper.compute_range(&set));
    }

    #[test]
    fn range_endpoints_map_to_insets() {
        let mapper = mapper(1_000, 3_000, 202.0);
        for (t, x) in [(1_000, 1.0), (3_000, 201.0), (2_000, 101.0)] {
            assert!((mapper.to_screen(t) - x).abs() < 1e-9, "t={t}");
        }
    }

    #[test]
    fn round_trip_stays_within_one_unit() {
        let day = 86_400_000;
        let start = 1_700_000_000_000;
        for (span, width) in [(day, 900.0), (730 * day, 640.0), (60_000, 1_920.0), (7, 300.0)] {
            let mapper = mapper(start, start + span, width);
            let step = (span / 97).max(1);
            let mut t = start;
            while t <= start + span {
                let back = mapper.to_canonical(mapper.to_screen(t));
                assert!((back - t).abs() <= 1, "t={t} back={back} span={span}");
                t += step;
            }
        }
    }

    #[test]
    fn zoom_widens_the_chart() {
        let mut mapper = mapper(0, 1_000, 502.0);
        let before = mapper.to_screen(500);
        mapper.set_zoom(2.0);
        assert_eq!(mapper.width(), 1_004.0);
        assert!(mapper.to_screen(500) > before);
        mapper.set_zoom(0.1);
        assert_eq!(mapper.zoom(), MIN_ZOOM);
    }

    #[test]
    fn canonical_delta_is_shared_scale() {
        let mapper = mapper(0, 10_000, 1_002.0);
        assert_eq!(mapper.canonical_delta(100.0, 150.0), 500);
        assert_eq!(mapper.canonical_delta(150.0, 100.0), -500);
    }
}
