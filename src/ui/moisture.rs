use chrono::Datelike;
use eframe::egui::{self, Ui};
use egui_extras::DatePickerButton;

use crate::color::severity_color;
use crate::data::classify::{classify, Measure};
use crate::data::model::SampleSet;
use crate::state::moisture::{GraphKind, MoistureView};
use crate::state::AppState;
use crate::ui::legend::severity_legend;
use crate::ui::map::{map_view, Marker};
use crate::ui::{choice_combo, plot, require_dataset, table};

pub fn show(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Moisture Content and Depth vs. Time");
    let Some(dataset) = require_dataset(ui, state.dated.as_ref(), "dated dataset") else {
        return;
    };
    let Some(view) = state.moisture.as_mut() else {
        return;
    };

    controls(ui, dataset, view);
    ui.separator();

    ui.horizontal_top(|ui: &mut Ui| {
        ui.vertical(|ui: &mut Ui| {
            ui.set_width((ui.available_width() * 0.35).max(260.0));
            rows_table(ui, dataset, view);
        });
        ui.vertical(|ui: &mut Ui| {
            ui.set_width((ui.available_width() - 180.0).max(300.0));
            ui.strong("Map");
            let markers: Vec<Marker> = view
                .sites
                .iter()
                .enumerate()
                .map(|(i, site)| Marker {
                    row: i,
                    lat: site.latitude,
                    lon: site.longitude,
                    color: severity_color(classify(site.mean)),
                    summary: format!(
                        "Average Moisture: {:.2}\nDate: {}\nGeology: {}\nReadings: {}",
                        site.mean, site.date, site.geology, site.count
                    ),
                })
                .collect();
            map_view(ui, "moisture_map", &mut view.map, &state.config.map, &[], &markers, false);
        });
        severity_legend(ui, Measure::MoistureContent);
    });

    ui.separator();
    match view.graph {
        GraphKind::Scatter => plot::moisture_scatter(ui, dataset, view),
        GraphKind::Box => plot::moisture_boxes(ui, view),
    }
}

fn controls(ui: &mut Ui, dataset: &SampleSet, view: &mut MoistureView) {
    ui.horizontal_wrapped(|ui: &mut Ui| {
        let options = view.geology_options.clone();
        if let Some(g) = choice_combo(ui, "moisture_geology", "Geology", &view.geology, &options, None) {
            view.select_geology(dataset, &g);
        }

        ui.separator();
        ui.label("Graph Type");
        egui::ComboBox::from_id_salt("moisture_graph")
            .selected_text(view.graph.label())
            .show_ui(ui, |ui: &mut Ui| {
                for kind in GraphKind::ALL {
                    ui.selectable_value(&mut view.graph, kind, kind.label());
                }
            });

        ui.separator();
        if view.date_bounds.is_none() {
            ui.label("No dated samples for this geology.");
            return;
        }
        let (mut start, mut end) = (view.start, view.end);
        ui.label("From");
        let a = ui
            .add(DatePickerButton::new(&mut start).id_salt("moisture_start").format("%d/%m/%Y"))
            .changed();
        ui.label("to");
        let b = ui
            .add(DatePickerButton::new(&mut end).id_salt("moisture_end").format("%d/%m/%Y"))
            .changed();
        if a || b {
            view.set_window(dataset, start, end);
        }
    });
}

fn rows_table(ui: &mut Ui, dataset: &SampleSet, view: &MoistureView) {
    let cell = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_default();
    match view.graph {
        GraphKind::Scatter => {
            ui.label("Moisture Content and Depth with Date Data:");
            let rows: Vec<Vec<String>> = view
                .visible
                .iter()
                .map(|&i| {
                    let s = &dataset.samples[i];
                    vec![
                        s.date.map(|d| d.format("%d/%m/%Y").to_string()).unwrap_or_default(),
                        cell(s.moisture_content),
                        cell(s.depth),
                    ]
                })
                .collect();
            table::text_table(ui, "moisture_rows", &["Date", "MoistureContent", "DepthValue"], &rows);
        }
        GraphKind::Box => {
            ui.label("Moisture Content Data by Year:");
            let rows: Vec<Vec<String>> = view
                .visible
                .iter()
                .filter_map(|&i| {
                    let s = &dataset.samples[i];
                    Some(vec![s.date?.year().to_string(), cell(s.moisture_content)])
                })
                .collect();
            table::text_table(ui, "moisture_years", &["Year", "Moisture Content"], &rows);
        }
    }
}
