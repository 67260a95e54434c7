use eframe::egui::{self, Color32, RichText, Ui};

use crate::data::model::SampleSet;
use crate::state::{AppState, Loaded, Page};

// ---------------------------------------------------------------------------
// Left side panel – logo and page navigation
// ---------------------------------------------------------------------------

/// Render the navigation panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    // ---- Logo (centered) ----
    let logo = egui::include_image!("../../assets/logo.png");
    ui.vertical_centered(|ui: &mut Ui| {
        ui.add(
            egui::Image::new(logo)
                .max_width(ui.available_width() * 0.8)
                .max_height(100.0)
                .corner_radius(4.0),
        );
    });
    ui.add_space(4.0);
    ui.separator();

    for page in Page::ALL {
        if ui
            .selectable_label(state.page == page, page.title())
            .clicked()
        {
            state.page = page;
        }
    }

    ui.separator();
    ui.small(page_blurb(state.page));
}

fn page_blurb(page: Page) -> &'static str {
    match page {
        Page::Home => "Select a page above.",
        Page::PostcodeData => {
            "Project locations with markers coloured by plasticity index. \
             Filter by range, bucket, project and geology."
        }
        Page::DataVisualiser => {
            "Compare any fields as scatter or bar charts, build a custom table and export it to CSV."
        }
        Page::PlasticityCounts => {
            "How often each plasticity index value occurs within a geology, with a LOWESS trendline."
        }
        Page::MoistureOverTime => {
            "Moisture content and depth over time for one geology, with yearly maxima and site averages."
        }
        Page::ShrinkSwell => "Shrink-swell hazard classes overlaid with Jurassic formations.",
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

fn dataset_status<T>(name: &str, loaded: Option<&Loaded<T>>, len: impl Fn(&T) -> usize) -> String {
    let Some(loaded) = loaded else {
        return format!("{name}: not loaded");
    };
    let file = loaded
        .path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();
    match (loaded.get(), loaded.error()) {
        (Some(v), _) => format!("{name}: {} rows ({file})", len(v)),
        (None, Some(_)) => format!("{name}: error ({file})"),
        (None, None) => format!("{name}: not loaded"),
    }
}

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open points…").clicked() {
                if let Some(path) = pick_table("Open point samples") {
                    state.load_points(&path);
                }
                ui.close_menu();
            }
            if ui.button("Open dated samples…").clicked() {
                if let Some(path) = pick_table("Open dated samples") {
                    state.load_dated(&path);
                }
                ui.close_menu();
            }
            ui.separator();
            if ui.button("Reload boundary layers").clicked() {
                state.reload_layers();
                ui.close_menu();
            }
        });

        ui.separator();
        ui.label(dataset_status("Points", state.points.as_ref(), SampleSet::len));
        ui.separator();
        ui.label(dataset_status("Dated", state.dated.as_ref(), SampleSet::len));

        if let Some(msg) = &state.status_message {
            ui.separator();
            let color = if msg.starts_with("Error") { Color32::RED } else { ui.visuals().text_color() };
            ui.label(RichText::new(msg).color(color));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn pick_table(title: &str) -> Option<std::path::PathBuf> {
    rfd::FileDialog::new()
        .set_title(title)
        .add_filter("Supported files", &["csv", "parquet", "pq", "json"])
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .pick_file()
}
