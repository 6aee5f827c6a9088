mod app;
mod data;
mod diagram;
mod processing;
mod render;
mod state;
mod ui;

use app::TaylorPlotApp;
use eframe::egui;

fn main() -> eframe::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("TaylorPlot")
            .with_inner_size([1200.0, 850.0])
            .with_min_inner_size([800.0, 600.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "TaylorPlot",
        options,
        Box::new(|cc| Ok(Box::new(TaylorPlotApp::new(cc)))),
    )
}
