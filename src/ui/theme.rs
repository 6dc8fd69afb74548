use egui::{Color32, FontId, Rounding, Stroke, Visuals};

use gantt_chart::model::TaskStatus;

// ── Palette ──────────────────────────────────────────────────────────────────

pub const BG_DARK: Color32 = Color32::from_rgb(24, 24, 32);
pub const BG_PANEL: Color32 = Color32::from_rgb(30, 30, 40);
pub const BG_HEADER: Color32 = Color32::from_rgb(34, 37, 48);
pub const BG_SELECTED: Color32 = Color32::from_rgba_premultiplied(80, 140, 220, 45);

pub const BORDER_SUBTLE: Color32 = Color32::from_rgb(50, 52, 64);

pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(230, 232, 240);
pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(155, 160, 178);
pub const TEXT_DIM: Color32 = Color32::from_rgb(100, 105, 120);
pub const TEXT_ON_BAR: Color32 = Color32::from_rgb(255, 255, 255);

pub const ACCENT: Color32 = Color32::from_rgb(80, 140, 220);
pub const NOW_LINE: Color32 = Color32::from_rgb(240, 75, 75);
pub const GRID_LINE: Color32 = Color32::from_rgb(44, 46, 58);
pub const LINK_LINE: Color32 = Color32::from_rgb(170, 175, 195);
pub const LINK_TARGET: Color32 = Color32::from_rgb(255, 193, 7);

pub const BOX_FILL: Color32 = Color32::from_rgba_premultiplied(80, 140, 220, 30);
pub const ZOOM_FILL: Color32 = Color32::from_rgba_premultiplied(255, 193, 7, 28);

pub const BAR_FINE: Color32 = Color32::from_rgb(66, 133, 244);
pub const BAR_DELAYED: Color32 = Color32::from_rgb(229, 57, 53);

// ── Sizes ────────────────────────────────────────────────────────────────────

pub const BAR_ROUNDING: f32 = 4.0;
pub const SIDE_PANEL_WIDTH: f32 = 280.0;
pub const STATUS_BAR_HEIGHT: f32 = 24.0;
/// Room below the last row so empty space is always there to box-select or zoom in.
pub const CHART_FOOTER: f32 = 40.0;
pub const ARROW_SIZE: f32 = 5.0;

// ── Fonts ────────────────────────────────────────────────────────────────────

pub fn font_axis() -> FontId {
    FontId::proportional(11.0)
}

pub fn font_bar() -> FontId {
    FontId::proportional(11.5)
}

pub fn font_status() -> FontId {
    FontId::proportional(11.0)
}

pub fn bar_color(status: TaskStatus) -> Color32 {
    match status {
        TaskStatus::Fine => BAR_FINE,
        TaskStatus::Delayed => BAR_DELAYED,
    }
}

pub fn status_label(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Fine => "On track",
        TaskStatus::Delayed => "Delayed",
    }
}

// ── Apply custom visuals ─────────────────────────────────────────────────────

pub fn apply_theme(ctx: &egui::Context) {
    let mut visuals = Visuals::dark();
    let rounding = Rounding::same(4.0);

    visuals.override_text_color = Some(TEXT_PRIMARY);
    visuals.panel_fill = BG_PANEL;
    visuals.window_fill = BG_PANEL;
    visuals.extreme_bg_color = Color32::from_rgb(20, 20, 28);
    visuals.faint_bg_color = BG_HEADER;

    visuals.widgets.noninteractive.bg_fill = BG_PANEL;
    visuals.widgets.noninteractive.bg_stroke = Stroke::new(1.0, BORDER_SUBTLE);
    visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, TEXT_SECONDARY);
    visuals.widgets.noninteractive.rounding = rounding;

    visuals.widgets.inactive.bg_fill = Color32::from_rgb(42, 44, 56);
    visuals.widgets.inactive.bg_stroke = Stroke::new(1.0, BORDER_SUBTLE);
    visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, TEXT_PRIMARY);
    visuals.widgets.inactive.rounding = rounding;

    visuals.widgets.hovered.bg_fill = Color32::from_rgb(52, 54, 68);
    visuals.widgets.hovered.bg_stroke = Stroke::new(1.0, ACCENT);
    visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, TEXT_PRIMARY);
    visuals.widgets.hovered.rounding = rounding;

    visuals.widgets.active.bg_fill = Color32::from_rgb(60, 62, 76);
    visuals.widgets.active.bg_stroke = Stroke::new(1.0, ACCENT);
    visuals.widgets.active.fg_stroke = Stroke::new(2.0, Color32::WHITE);
    visuals.widgets.active.rounding = rounding;

    visuals.selection.bg_fill = BG_SELECTED;
    visuals.selection.stroke = Stroke::new(1.0, ACCENT);

    visuals.window_rounding = Rounding::same(8.0);
    visuals.window_stroke = Stroke::new(1.0, BORDER_SUBTLE);
    visuals.striped = false;

    ctx.set_visuals(visuals);

    let mut style = (*ctx.style()).clone();
    style.spacing.item_spacing = egui::vec2(8.0, 4.0);
    style.spacing.button_padding = egui::vec2(8.0, 4.0);
    ctx.set_style(style);
}
