mod app;
mod color;
mod config;
mod data;
mod state;
mod ui;

use app::RustyClayApp;
use config::AppConfig;
use eframe::egui;
use state::AppState;

fn main() -> eframe::Result {
    env_logger::init();

    let config = AppConfig::discover().unwrap_or_else(|e| {
        log::error!("Configuration error, using defaults: {e:#}");
        AppConfig::default()
    });
    let mut state = AppState::new(config);
    state.load_all();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Rusty Clay – Geotechnical Survey Dashboard",
        options,
        Box::new(|cc| {
            // Install image loaders so egui can render png/jpg/etc.
            egui_extras::install_image_loaders(&cc.egui_ctx);
            Ok(Box::new(RustyClayApp::new(state)))
        }),
    )
}
