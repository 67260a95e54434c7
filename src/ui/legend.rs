use eframe::egui::{self, Color32, RichText, Ui};

use crate::color::{risk_color, severity_color};
use crate::data::boundary::RiskClass;
use crate::data::classify::{Measure, Severity};

const SWATCH: f32 = 16.0;
const TEXT: Color32 = Color32::from_rgb(0xfa, 0xfa, 0xfa);

/// Framed legend: a bold title, then one colour swatch per entry.
pub fn legend(ui: &mut Ui, title: &str, entries: &[(String, Color32)]) {
    egui::Frame::group(ui.style())
        .fill(Color32::BLACK)
        .show(ui, |ui: &mut Ui| {
            ui.label(RichText::new(title).strong().color(TEXT));
            ui.add_space(4.0);
            for (label, color) in entries {
                ui.horizontal(|ui: &mut Ui| {
                    let (rect, _) = ui.allocate_exact_size(egui::vec2(SWATCH, SWATCH), egui::Sense::hover());
                    ui.painter().rect_filled(rect, 2.0, *color);
                    ui.label(RichText::new(label).color(TEXT));
                });
            }
        });
}

/// The four classifier buckets for a measure.
pub fn severity_legend(ui: &mut Ui, measure: Measure) {
    let entries: Vec<(String, Color32)> = Severity::ALL
        .into_iter()
        .map(|s| (s.label().to_string(), severity_color(s)))
        .collect();
    legend(ui, measure.title(), &entries);
}

pub fn risk_legend(ui: &mut Ui) {
    let entries: Vec<(String, Color32)> = RiskClass::LEGEND
        .into_iter()
        .map(|r| (r.label().to_string(), risk_color(r)))
        .collect();
    legend(ui, "Shrink Swell Risk", &entries);
}
