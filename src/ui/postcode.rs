use eframe::egui::{self, Color32, Stroke, Ui};

use crate::color::severity_color;
use crate::data::boundary::BoundaryFeature;
use crate::data::classify::{Measure, Severity};
use crate::data::model::{Sample, SampleSet};
use crate::state::postcode::PostcodeView;
use crate::state::AppState;
use crate::ui::legend::severity_legend;
use crate::ui::map::{map_view, MapLayer, Marker};
use crate::ui::{choice_combo, error_label, require_dataset, table};

const BOUNDARY: Color32 = Color32::from_rgb(0x33, 0x88, 0xff);

fn postcode_fill(_: &BoundaryFeature) -> Color32 {
    BOUNDARY.gamma_multiply(0.1)
}

fn postcode_tooltip(feature: &BoundaryFeature) -> Option<String> {
    feature.property("name").map(|name| format!("Postcode: {name}"))
}

fn cell(v: Option<f64>) -> String {
    v.map(|v| v.to_string()).unwrap_or_default()
}

fn summary(s: &Sample) -> String {
    format!(
        "Postcode: {}\nProject ID: {}\nGeology: {}\nPlastic Limit: {}\nLiquid Limit: {}\nPlasticity Index: {}\nMoisture Content: {}",
        s.postcode,
        s.project_id,
        s.geology_code,
        cell(s.plastic_limit),
        cell(s.liquid_limit),
        cell(s.plasticity_index),
        cell(s.moisture_content),
    )
}

pub fn show(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Postcode Data");
    let Some(dataset) = require_dataset(ui, state.points.as_ref(), "points dataset") else {
        return;
    };
    let Some(view) = state.postcode.as_mut() else {
        return;
    };

    filters(ui, dataset, view);
    ui.separator();

    ui.horizontal_top(|ui: &mut Ui| {
        ui.vertical(|ui: &mut Ui| {
            ui.set_width((ui.available_width() - 180.0).max(300.0));
            let mut layers = Vec::new();
            match state.postcode_layer.as_ref().map(|l| &l.result) {
                Some(Ok(layer)) => layers.push(MapLayer {
                    layer,
                    fill: Some(postcode_fill),
                    outline: Some(Stroke::new(1.5, BOUNDARY)),
                    tooltip: postcode_tooltip,
                }),
                Some(Err(e)) => error_label(ui, e),
                None => {}
            }
            let markers: Vec<Marker> = view
                .visible
                .iter()
                .filter_map(|&row| {
                    let s = &dataset.samples[row];
                    let (lat, lon) = s.position()?;
                    Some(Marker {
                        row,
                        lat,
                        lon,
                        color: severity_color(Measure::PlasticityIndex.classify(s)),
                        summary: summary(s),
                    })
                })
                .collect();
            map_view(ui, "postcode_map", &mut view.map, &state.config.map, &layers, &markers, true);
        });
        severity_legend(ui, Measure::PlasticityIndex);
    });

    ui.horizontal(|ui: &mut Ui| {
        ui.checkbox(&mut view.show_utm, "Show UTM Coordinates");
        ui.checkbox(&mut view.show_latlong, "Show LATLONG Coordinates");
    });
    ui.label(format!("{} of {} samples", view.visible.len(), dataset.len()));
    let columns = view.table_columns(dataset);
    table::sample_table(ui, "postcode_table", dataset, &view.visible, &columns);
}

fn filters(ui: &mut Ui, dataset: &SampleSet, view: &mut PostcodeView) {
    ui.horizontal_wrapped(|ui: &mut Ui| {
        let (min, max) = view.pi_limits;
        let (mut lo, mut hi) = view.pi_range;
        ui.label("Plasticity Index");
        let changed = ui.add(egui::Slider::new(&mut lo, min..=max).text("min")).changed()
            | ui.add(egui::Slider::new(&mut hi, min..=max).text("max")).changed();
        if changed {
            view.set_pi_range(dataset, lo, hi);
        }

        ui.separator();
        ui.label("PI ranges");
        for severity in Severity::ALL {
            let mut on = view.severities.contains(&severity);
            let text = egui::RichText::new(severity.label()).color(severity_color(severity));
            if ui.checkbox(&mut on, text).changed() {
                view.toggle_severity(dataset, severity);
            }
        }
    });

    ui.horizontal_wrapped(|ui: &mut Ui| {
        let projects = view.project_options(dataset);
        if let Some(p) = choice_combo(ui, "project_id", "Project ID", &view.project_id, &projects, Some("Any")) {
            view.select_project(dataset, &p);
        }
        ui.separator();
        let geologies = view.geology_options(dataset);
        if let Some(g) = choice_combo(ui, "geology_code", "Geology Code", &view.geology_code, &geologies, Some("Any")) {
            view.select_geology(dataset, &g);
        }
    });
}
