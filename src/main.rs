#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
mod ui;

use gantt_chart::ChartSettings;

fn main() -> eframe::Result<()> {
    let settings = ChartSettings::load();
    // Without a logger the chart still works; say so once and carry on.
    let _logger = match gantt_chart::logging::init(&settings.log_level) {
        Ok(handle) => Some(handle),
        Err(err) => {
            eprintln!("{err}");
            None
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_min_inner_size([800.0, 400.0])
            .with_title("Gantt Chart"),
        ..Default::default()
    };

    eframe::run_native(
        "Gantt Chart",
        options,
        Box::new(|cc| Ok(Box::new(app::GanttApp::new(cc, settings)))),
    )
}
