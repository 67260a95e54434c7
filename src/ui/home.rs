use eframe::egui::{RichText, Ui};

use crate::state::{AppState, Page};

pub fn show(ui: &mut Ui, state: &mut AppState) {
    ui.heading(RichText::new("Welcome!").size(28.0));
    ui.add_space(8.0);
    ui.label("Laboratory survey data: plasticity index, moisture content, geology and postcode locations.");
    ui.label("This dashboard covers spatial analysis, tabular analysis and graphs.");
    ui.add_space(12.0);
    ui.strong("Select a page from the side panel, or jump straight in:");
    ui.add_space(4.0);

    for page in Page::ALL.into_iter().skip(1) {
        if ui.link(page.title()).clicked() {
            state.page = page;
        }
    }

    ui.add_space(12.0);
    ui.separator();
    ui.small(format!(
        "Data directory: {}   (File → Open to load other tables)",
        state.config.data.data_dir.display()
    ));
}
