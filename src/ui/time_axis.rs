use chrono::{Local, TimeZone, Utc};
use egui::{vec2, Align2, Color32, Context, FontId, Painter, Pos2, Rect, Stroke};

use gantt_chart::chart::{AxisLayout, TextMeasure, TimeAxis};
use gantt_chart::config::AxisTimeZone;
use gantt_chart::model::{CoordinateMapper, Time};

use crate::ui::theme;

/// Horizontal room kept free on each side of a label.
const LABEL_PADDING: f32 = 4.0;

/// Measures labels with the font the axis is painted in.
struct FontMeasure<'a> {
    ctx: &'a Context,
    font: FontId,
}

impl TextMeasure for FontMeasure<'_> {
    fn text_width(&self, text: &str) -> f32 {
        let width = self.ctx.fonts(|fonts| {
            fonts
                .layout_no_wrap(text.to_owned(), self.font.clone(), Color32::WHITE)
                .size()
                .x
        });
        width + 2.0 * LABEL_PADDING
    }

    fn line_height(&self) -> f32 {
        self.ctx.fonts(|fonts| fonts.row_height(&self.font)) + LABEL_PADDING
    }
}

/// The axis in whichever zone the settings ask for.
pub enum AxisPainter {
    Utc(TimeAxis<Utc>),
    Local(TimeAxis<Local>),
}

impl AxisPainter {
    pub fn new(zone: AxisTimeZone) -> Self {
        match zone {
            AxisTimeZone::Utc => Self::Utc(TimeAxis::new(Utc)),
            AxisTimeZone::Local => Self::Local(TimeAxis::new(Local)),
        }
    }

    pub fn zone(&self) -> AxisTimeZone {
        match self {
            Self::Utc(_) => AxisTimeZone::Utc,
            Self::Local(_) => AxisTimeZone::Local,
        }
    }

    /// Height of the two label rows.
    pub fn height(&self, ctx: &Context) -> f32 {
        2.0 * measure(ctx).line_height()
    }

    /// `time` formatted in the axis zone, for tooltips and the editor.
    pub fn format_time(&self, time: Time, pattern: &str) -> String {
        let formatted = match self {
            Self::Utc(_) => Utc.timestamp_millis_opt(time).single().map(|t| t.format(pattern).to_string()),
            Self::Local(_) => Local.timestamp_millis_opt(time).earliest().map(|t| t.format(pattern).to_string()),
        };
        formatted.unwrap_or_else(|| time.to_string())
    }

    fn layout(&self, mapper: &CoordinateMapper, min_x: f32, max_x: f32, ctx: &Context) -> gantt_chart::Result<AxisLayout> {
        let measure = measure(ctx);
        match self {
            Self::Utc(axis) => axis.layout(mapper, min_x, max_x, &measure),
            Self::Local(axis) => axis.layout(mapper, min_x, max_x, &measure),
        }
    }

    /// Paint the axis for chart columns `min_x..max_x`, with chart x = 0 at
    /// `origin.x` and the top of the axis at `origin.y`.
    pub fn paint(
        &self,
        painter: &Painter,
        mapper: &CoordinateMapper,
        min_x: f32,
        max_x: f32,
        origin: Pos2,
    ) -> gantt_chart::Result<()> {
        let layout = self.layout(mapper, min_x, max_x, painter.ctx())?;
        let offset = origin.to_vec2();
        let band = Rect::from_min_max(
            origin + vec2(min_x, 0.0),
            origin + vec2(max_x, layout.height),
        );
        painter.rect_filled(band, 0.0, theme::BG_HEADER);

        let rule = Stroke::new(1.0, theme::BORDER_SUBTLE);
        for [a, b] in &layout.rules {
            painter.line_segment([*a + offset, *b + offset], rule);
        }
        for cell in &layout.cells {
            let rect = cell.rect.translate(offset);
            painter.with_clip_rect(rect.intersect(band)).text(
                rect.left_center() + vec2(LABEL_PADDING, 0.0),
                Align2::LEFT_CENTER,
                &cell.label,
                theme::font_axis(),
                theme::TEXT_SECONDARY,
            );
        }
        painter.line_segment([band.left_bottom(), band.right_bottom()], rule);
        Ok(())
    }
}

fn measure(ctx: &Context) -> FontMeasure<'_> {
    FontMeasure {
        ctx,
        font: theme::font_axis(),
    }
}
