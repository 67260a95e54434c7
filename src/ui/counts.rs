use eframe::egui::Ui;

use crate::state::AppState;
use crate::ui::{choice_combo, plot, require_dataset, table};

pub fn show(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Plasticity Index vs. Geology Sample Counts");
    let Some(dataset) = require_dataset(ui, state.dated.as_ref(), "dated dataset") else {
        return;
    };
    let Some(view) = state.counts.as_mut() else {
        return;
    };

    ui.horizontal(|ui: &mut Ui| {
        let options = view.geology_options.clone();
        if let Some(g) = choice_combo(ui, "counts_geology", "Geology", &view.geology, &options, None) {
            view.select_geology(dataset, &g);
        }
    });

    ui.strong(view.title());
    if view.counts.is_empty() {
        ui.label("No samples with a plasticity index for this geology.");
    }
    plot::counts_chart(ui, view);
    ui.separator();

    let rows: Vec<Vec<String>> = view
        .ranked
        .iter()
        .map(|c| vec![c.value.to_string(), c.count.to_string()])
        .collect();
    table::text_table(ui, "counts_table", &["PlasticityIndex", "Count"], &rows);
}
