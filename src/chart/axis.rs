//! Time axis above the chart: picks the finest label resolution that fits the
//! visible span and lays out two stacked label rows for it.

use std::fmt;

use chrono::{DateTime, Datelike, Days, Duration, Months, NaiveDate, NaiveDateTime, TimeZone, Timelike};
use egui::{pos2, Pos2, Rect};

use crate::error::{ChartError, Result};
use crate::model::task::Time;
use crate::model::timeline::CoordinateMapper;

/// Calendar fields. Only some of them can be used as an axis step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarField {
    Year,
    Month,
    WeekOfYear,
    Date,
    DayOfWeek,
    HourOfDay,
    Minute,
    Second,
    Millisecond,
}

/// Measures label text for the fit check.
pub trait TextMeasure {
    fn text_width(&self, text: &str) -> f32;
    fn line_height(&self) -> f32;
}

/// One candidate resolution: a fine row tested for fit and a coarse row above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisFormat {
    pub fine: CalendarField,
    pub fine_pattern: &'static str,
    pub coarse: CalendarField,
    pub coarse_pattern: &'static str,
}

/// Candidates from finest to coarsest.
pub const DEFAULT_FORMATS: [AxisFormat; 5] = [
    AxisFormat {
        fine: CalendarField::Minute,
        fine_pattern: "%M",
        coarse: CalendarField::HourOfDay,
        coarse_pattern: "%H %d",
    },
    AxisFormat {
        fine: CalendarField::HourOfDay,
        fine_pattern: "%H:00",
        coarse: CalendarField::Date,
        coarse_pattern: "%Y %b %d",
    },
    AxisFormat {
        fine: CalendarField::Date,
        fine_pattern: "%d",
        coarse: CalendarField::Month,
        coarse_pattern: "%Y %b",
    },
    AxisFormat {
        fine: CalendarField::WeekOfYear,
        fine_pattern: "Week %V",
        coarse: CalendarField::Month,
        coarse_pattern: "%Y %b",
    },
    AxisFormat {
        fine: CalendarField::Month,
        fine_pattern: "%b",
        coarse: CalendarField::Year,
        coarse_pattern: "%Y",
    },
];

const FALLBACK_STEP: CalendarField = CalendarField::Year;
const FALLBACK_PATTERN: &str = "%Y";

/// A label and the span it owns.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisCell {
    pub rect: Rect,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AxisLayout {
    /// Index of the chosen format, or `None` for the single-row fallback.
    pub resolution: Option<usize>,
    pub cells: Vec<AxisCell>,
    /// Tick separators and the rule between the two rows.
    pub rules: Vec<[Pos2; 2]>,
    pub height: f32,
}

/// Reduce `time` to the start of its `step`: every finer field is zeroed, and
/// weeks snap back to their ISO Monday.
pub fn normalize<Tz: TimeZone>(time: &DateTime<Tz>, step: CalendarField) -> Result<DateTime<Tz>> {
    let local = time.naive_local();
    let date = local.date();
    let start = match step {
        CalendarField::Year => day_start(NaiveDate::from_ymd_opt(date.year(), 1, 1)),
        CalendarField::Month => day_start(NaiveDate::from_ymd_opt(date.year(), date.month(), 1)),
        CalendarField::WeekOfYear => {
            let back = date.weekday().num_days_from_monday() as u64;
            day_start(date.checked_sub_days(Days::new(back)))
        }
        CalendarField::Date => day_start(Some(date)),
        CalendarField::HourOfDay => date.and_hms_opt(local.hour(), 0, 0),
        CalendarField::Minute => date.and_hms_opt(local.hour(), local.minute(), 0),
        CalendarField::Second => date.and_hms_opt(local.hour(), local.minute(), local.second()),
        CalendarField::DayOfWeek | CalendarField::Millisecond => {
            return Err(ChartError::UnsupportedStep(step))
        }
    };
    start
        .and_then(|naive| resolve(&time.timezone(), naive))
        .ok_or(ChartError::OutOfCalendar(time.timestamp_millis()))
}

/// The tick one `step` after `time`.
pub fn advance<Tz: TimeZone>(time: &DateTime<Tz>, step: CalendarField) -> Result<DateTime<Tz>> {
    let local = time.naive_local();
    let next = match step {
        CalendarField::Year => local.checked_add_months(Months::new(12)),
        CalendarField::Month => local.checked_add_months(Months::new(1)),
        CalendarField::WeekOfYear => local.checked_add_days(Days::new(7)),
        CalendarField::Date => local.checked_add_days(Days::new(1)),
        // Sub-day steps are absolute so DST shifts do not stall the walk.
        CalendarField::HourOfDay => return Ok(time.clone() + Duration::hours(1)),
        CalendarField::Minute => return Ok(time.clone() + Duration::minutes(1)),
        CalendarField::Second => return Ok(time.clone() + Duration::seconds(1)),
        CalendarField::DayOfWeek | CalendarField::Millisecond => {
            return Err(ChartError::UnsupportedStep(step))
        }
    };
    next.and_then(|naive| resolve(&time.timezone(), naive))
        .ok_or(ChartError::OutOfCalendar(time.timestamp_millis()))
}

fn day_start(date: Option<NaiveDate>) -> Option<NaiveDateTime> {
    date.and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Local wall time to an instant. Times inside a DST gap move forward an hour.
fn resolve<Tz: TimeZone>(zone: &Tz, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
    zone.from_local_datetime(&naive)
        .earliest()
        .or_else(|| zone.from_local_datetime(&(naive + Duration::hours(1))).earliest())
}

#[derive(Debug, Clone, PartialEq)]
struct Tick {
    start: f64,
    end: f64,
    label: String,
}

/// Walks the ticks of one row from the step containing `from` until a tick
/// passes `to`. Always yields at least one tick.
struct Ticks<'a, Tz: TimeZone> {
    mapper: &'a CoordinateMapper,
    step: CalendarField,
    pattern: &'a str,
    next: Option<DateTime<Tz>>,
    to: Time,
}

impl<Tz: TimeZone> Iterator for Ticks<'_, Tz>
where
    Tz::Offset: fmt::Display,
{
    type Item = Result<Tick>;

    fn next(&mut self) -> Option<Self::Item> {
        let tick = self.next.take()?;
        let label = tick.format(self.pattern).to_string();
        let following = match advance(&tick, self.step) {
            Ok(t) => t,
            Err(err) => return Some(Err(err)),
        };
        let start = self.mapper.to_screen(tick.timestamp_millis());
        let end = self.mapper.to_screen(following.timestamp_millis());
        if following.timestamp_millis() <= self.to {
            self.next = Some(following);
        }
        Some(Ok(Tick { start, end, label }))
    }
}

/// Lays out the time axis for a mapper in a given zone.
pub struct TimeAxis<Tz: TimeZone> {
    zone: Tz,
    formats: Vec<AxisFormat>,
}

impl<Tz: TimeZone> TimeAxis<Tz>
where
    Tz::Offset: fmt::Display,
{
    pub fn new(zone: Tz) -> Self {
        Self::with_formats(zone, DEFAULT_FORMATS.to_vec())
    }

    pub fn with_formats(zone: Tz, formats: Vec<AxisFormat>) -> Self {
        Self { zone, formats }
    }

    pub fn formats(&self) -> &[AxisFormat] {
        &self.formats
    }

    fn ticks<'a>(
        &self,
        mapper: &'a CoordinateMapper,
        step: CalendarField,
        pattern: &'a str,
        min_x: f32,
        max_x: f32,
    ) -> Result<Ticks<'a, Tz>> {
        let from = mapper.to_canonical(min_x as f64);
        let to = mapper.to_canonical(max_x as f64);
        let at = self
            .zone
            .timestamp_millis_opt(from)
            .single()
            .ok_or(ChartError::OutOfCalendar(from))?;
        Ok(Ticks {
            mapper,
            step,
            pattern,
            next: Some(normalize(&at, step)?),
            to,
        })
    }

    /// Dry run: true if every label of the row fits inside its tick span.
    pub fn can_render_row(
        &self,
        mapper: &CoordinateMapper,
        step: CalendarField,
        pattern: &str,
        min_x: f32,
        max_x: f32,
        measure: &dyn TextMeasure,
    ) -> Result<bool> {
        for tick in self.ticks(mapper, step, pattern, min_x, max_x)? {
            let tick = tick?;
            if tick.end - tick.start < measure.text_width(&tick.label) as f64 {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Cells and separators of one label row between `y` and `y + height`.
    pub fn render_row(
        &self,
        mapper: &CoordinateMapper,
        step: CalendarField,
        pattern: &str,
        (min_x, max_x): (f32, f32),
        (y, height): (f32, f32),
        layout: &mut AxisLayout,
    ) -> Result<()> {
        for tick in self.ticks(mapper, step, pattern, min_x, max_x)? {
            let tick = tick?;
            let (start, end) = (tick.start as f32, tick.end as f32);
            layout.rules.push([pos2(start, y), pos2(start, y + height)]);
            layout.cells.push(AxisCell {
                rect: Rect::from_min_max(pos2(start, y), pos2(end, y + height)),
                label: tick.label,
            });
        }
        Ok(())
    }

    /// Choose the finest fitting format and lay out both rows for the
    /// visible span `min_x..max_x`.
    pub fn layout(
        &self,
        mapper: &CoordinateMapper,
        min_x: f32,
        max_x: f32,
        measure: &dyn TextMeasure,
    ) -> Result<AxisLayout> {
        let line = measure.line_height();
        let mut layout = AxisLayout {
            resolution: None,
            cells: Vec::new(),
            rules: Vec::new(),
            height: 2.0 * line,
        };
        for (index, format) in self.formats.iter().enumerate() {
            if !self.can_render_row(mapper, format.fine, format.fine_pattern, min_x, max_x, measure)? {
                continue;
            }
            self.render_row(
                mapper,
                format.coarse,
                format.coarse_pattern,
                (min_x, max_x),
                (0.0, line),
                &mut layout,
            )?;
            layout.rules.push([pos2(min_x, line), pos2(max_x, line)]);
            self.render_row(
                mapper,
                format.fine,
                format.fine_pattern,
                (min_x, max_x),
                (line, line),
                &mut layout,
            )?;
            layout.resolution = Some(index);
            return Ok(layout);
        }

        log::debug!("no axis format fits, falling back to years");
        self.render_row(
            mapper,
            FALLBACK_STEP,
            FALLBACK_PATTERN,
            (min_x, max_x),
            (0.0, 2.0 * line),
            &mut layout,
        )?;
        Ok(layout)
    }
}
