use eframe::egui::{self, Color32, Stroke, Ui};

use crate::color::risk_color;
use crate::data::boundary::{BoundaryFeature, RiskClass};
use crate::state::AppState;
use crate::ui::legend::risk_legend;
use crate::ui::map::{map_view, MapLayer};
use crate::ui::error_label;

fn risk_fill(feature: &BoundaryFeature) -> Color32 {
    risk_color(RiskClass::of(feature)).gamma_multiply(0.5)
}

fn no_tooltip(_: &BoundaryFeature) -> Option<String> {
    None
}

fn jurassic_fill(_: &BoundaryFeature) -> Color32 {
    Color32::from_rgb(0x33, 0x88, 0xff).gamma_multiply(0.3)
}

fn jurassic_tooltip(feature: &BoundaryFeature) -> Option<String> {
    feature.property("LEX_D").map(|d| format!("Geology: {d}"))
}

pub fn show(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Shrink Swell Risk and Geology");

    let mut layers = Vec::new();
    match state.shrink_swell_layer.as_ref().map(|l| &l.result) {
        Some(Ok(layer)) => layers.push(MapLayer {
            layer,
            fill: Some(risk_fill),
            outline: None,
            tooltip: no_tooltip,
        }),
        Some(Err(e)) => error_label(ui, e),
        None => {}
    }
    match state.jurassic_layer.as_ref().map(|l| &l.result) {
        Some(Ok(layer)) => layers.push(MapLayer {
            layer,
            fill: Some(jurassic_fill),
            outline: Some(Stroke::new(1.0, Color32::BLACK)),
            tooltip: jurassic_tooltip,
        }),
        Some(Err(e)) => error_label(ui, e),
        None => {}
    }

    let extent = layers
        .iter()
        .filter(|l| !l.layer.is_empty())
        .filter_map(|l| l.layer.bounds())
        .reduce(|a, b| (a.0.min(b.0), a.1.min(b.1), a.2.max(b.2), a.3.max(b.3)));
    if ui
        .add_enabled(extent.is_some(), egui::Button::new("Fit to layers"))
        .clicked()
    {
        if let Some((min_lon, min_lat, max_lon, max_lat)) = extent {
            let fallback = state.config.map.overview_center;
            state
                .overview_map
                .focus(Some(((min_lat + max_lat) / 2.0, (min_lon + max_lon) / 2.0)), (fallback[0], fallback[1]));
        }
    }

    let view = &mut state.overview_map;
    let config = &state.config.map;
    ui.horizontal_top(|ui: &mut Ui| {
        ui.vertical(|ui: &mut Ui| {
            ui.set_width((ui.available_width() - 180.0).max(300.0));
            map_view(ui, "shrink_swell_map", view, config, &layers, &[], false);
        });
        risk_legend(ui);
    });
}
