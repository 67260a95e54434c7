use eframe::egui::{self, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::model::SampleSet;
use crate::data::table::TableColumn;

const ROW_HEIGHT: f32 = 18.0;

/// Scrollable table of `rows` (sample indices) with the given columns.
pub fn sample_table(ui: &mut Ui, id: &str, dataset: &SampleSet, rows: &[usize], columns: &[TableColumn]) {
    if columns.is_empty() {
        ui.label("No columns selected.");
        return;
    }
    ui.push_id(id, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .max_scroll_height(320.0)
            .columns(Column::auto().at_least(60.0), columns.len())
            .header(ROW_HEIGHT + 2.0, |mut header| {
                for c in columns {
                    header.col(|ui| {
                        ui.strong(c.title.as_str());
                    });
                }
            })
            .body(|body| {
                body.rows(ROW_HEIGHT, rows.len(), |mut row| {
                    let Some(sample) = dataset.samples.get(rows[row.index()]) else {
                        return;
                    };
                    for c in columns {
                        row.col(|ui| {
                            ui.label(c.cell(sample).to_string());
                        });
                    }
                });
            });
    });
}

/// Table over pre-formatted rows, for aggregates that are not samples.
pub fn text_table(ui: &mut Ui, id: &str, headers: &[&str], rows: &[Vec<String>]) {
    ui.push_id(id, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .max_scroll_height(320.0)
            .columns(Column::auto().at_least(80.0), headers.len())
            .header(ROW_HEIGHT + 2.0, |mut header| {
                for h in headers {
                    header.col(|ui| {
                        ui.strong(*h);
                    });
                }
            })
            .body(|body| {
                body.rows(ROW_HEIGHT, rows.len(), |mut row| {
                    let cells = &rows[row.index()];
                    for cell in cells {
                        row.col(|ui| {
                            ui.label(egui::RichText::new(cell).monospace());
                        });
                    }
                });
            });
    });
}
