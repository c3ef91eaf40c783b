mod app;
mod color;
mod config;
mod pipeline;
mod state;
mod ui;

use app::ThicknessMapperApp;
use config::PipelineConfig;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();

    let config = PipelineConfig::load();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1500.0, 850.0])
            .with_min_inner_size([900.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "3D mapping of the sample thickness from ToF-SIMS images",
        options,
        Box::new(|_cc| Ok(Box::new(ThicknessMapperApp::new(config)))),
    )
}
