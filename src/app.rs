use eframe::egui;

use crate::state::{AppState, Page};
use crate::ui::{counts, explorer, home, moisture, panels, postcode, shrink_swell};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct RustyClayApp {
    pub state: AppState,
}

impl RustyClayApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for RustyClayApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: navigation ----
        egui::SidePanel::left("nav_panel")
            .default_width(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: active page ----
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| match self.state.page {
                    Page::Home => home::show(ui, &mut self.state),
                    Page::PostcodeData => postcode::show(ui, &mut self.state),
                    Page::DataVisualiser => explorer::show(ui, &mut self.state),
                    Page::PlasticityCounts => counts::show(ui, &mut self.state),
                    Page::MoistureOverTime => moisture::show(ui, &mut self.state),
                    Page::ShrinkSwell => shrink_swell::show(ui, &mut self.state),
                });
        });
    }
}
