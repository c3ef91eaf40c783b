use eframe::egui;

use crate::config::PipelineConfig;
use crate::state::AppState;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct ThicknessMapperApp {
    pub state: AppState,
}

impl ThicknessMapperApp {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            state: AppState::new(config),
        }
    }
}

impl eframe::App for ThicknessMapperApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: load / convert / calibrate ----
        egui::SidePanel::left("control_panel")
            .default_width(460.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: surface ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::surface_plot(ui, &mut self.state);
        });

        panels::help_window(ctx, &mut self.state);
    }
}
