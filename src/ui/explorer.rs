use eframe::egui::{self, Ui};

use crate::data::export::export_csv;
use crate::data::model::{Field, SampleSet};
use crate::state::explorer::{ChartKind, ExplorerView};
use crate::state::AppState;
use crate::ui::{plot, require_dataset, table};

fn field_combo(ui: &mut Ui, id: &str, label: &str, current: Field, options: &[Field]) -> Field {
    let mut picked = current;
    ui.label(label);
    egui::ComboBox::from_id_salt(id)
        .selected_text(current.header())
        .show_ui(ui, |ui: &mut Ui| {
            for &field in options {
                ui.selectable_value(&mut picked, field, field.header());
            }
        });
    picked
}

pub fn show(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Data Visualiser");
    let Some(dataset) = require_dataset(ui, state.dated.as_ref(), "dated dataset") else {
        return;
    };
    let Some(view) = state.explorer.as_mut() else {
        return;
    };

    chart_controls(ui, dataset, view);
    plot::explorer_chart(ui, dataset, view);
    ui.separator();

    let mut export_result = None;
    ui.horizontal_wrapped(|ui: &mut Ui| {
        ui.label("Columns:");
        for field in view.fields.clone() {
            let mut on = view.shown.contains(&field);
            if ui.checkbox(&mut on, field.header()).changed() {
                view.toggle_column(field);
            }
        }
        ui.separator();
        if ui.button("Export CSV…").clicked() {
            export_result = export_table(dataset, view);
        }
    });
    match export_result {
        Some(Ok(path)) => state.status_message = Some(format!("Exported {path}")),
        Some(Err(e)) => {
            log::error!("Export failed: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
        None => {}
    }

    ui.label(format!("{} of {} samples", view.visible.len(), dataset.len()));
    let columns = view.table_columns(dataset);
    table::sample_table(ui, "explorer_table", dataset, &view.visible, &columns);
}

fn chart_controls(ui: &mut Ui, dataset: &SampleSet, view: &mut ExplorerView) {
    ui.horizontal_wrapped(|ui: &mut Ui| {
        let x = field_combo(ui, "explorer_x", "X", view.x, &view.fields.clone());
        let y = field_combo(ui, "explorer_y", "Y", view.y, &view.numeric_fields());
        view.set_axes(dataset, x, y);

        ui.separator();
        for kind in ChartKind::ALL {
            if ui.selectable_label(view.chart == kind, kind.label()).clicked() {
                view.set_chart(dataset, kind);
            }
        }

        ui.separator();
        let categorical = view.categorical_fields();
        let mut color = view.color_column;
        ui.label("Color by");
        egui::ComboBox::from_id_salt("explorer_color")
            .selected_text(color.map_or("None", Field::header))
            .show_ui(ui, |ui: &mut Ui| {
                ui.selectable_value(&mut color, None, "None");
                for &field in &categorical {
                    ui.selectable_value(&mut color, Some(field), field.header());
                }
            });
        if color != view.color_column {
            view.set_color_column(dataset, color);
        }

        ui.separator();
        let mut filter = view.filter_field;
        let mut value = view.filter_value.clone();
        ui.label("Where");
        egui::ComboBox::from_id_salt("explorer_filter")
            .selected_text(filter.map_or("(no filter)", Field::header))
            .show_ui(ui, |ui: &mut Ui| {
                ui.selectable_value(&mut filter, None, "(no filter)");
                for &field in &categorical {
                    ui.selectable_value(&mut filter, Some(field), field.header());
                }
            });
        if filter != view.filter_field {
            value.clear();
        }
        if let Some(field) = filter {
            ui.label("=");
            egui::ComboBox::from_id_salt("explorer_filter_value")
                .selected_text(if value.is_empty() { "(any)" } else { value.as_str() })
                .show_ui(ui, |ui: &mut Ui| {
                    ui.selectable_value(&mut value, String::new(), "(any)");
                    for v in dataset.distinct(field) {
                        let label = v.clone();
                        ui.selectable_value(&mut value, v, label);
                    }
                });
        }
        if filter != view.filter_field || value != view.filter_value {
            view.set_filter(dataset, filter, &value);
        }
    });
}

/// Ask for a target file and write the current table view there.
fn export_table(dataset: &SampleSet, view: &ExplorerView) -> Option<anyhow::Result<String>> {
    let path = rfd::FileDialog::new()
        .set_title("Export table")
        .add_filter("CSV", &["csv"])
        .set_file_name("export.csv")
        .save_file()?;
    let columns = view.table_columns(dataset);
    Some(export_csv(&path, dataset, &view.visible, &columns).map(|()| path.display().to_string()))
}
