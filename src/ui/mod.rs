use eframe::egui::{Color32, RichText, Ui};

use crate::data::model::SampleSet;
use crate::state::Loaded;

pub mod counts;
pub mod explorer;
pub mod home;
pub mod legend;
pub mod map;
pub mod moisture;
pub mod panels;
pub mod plot;
pub mod postcode;
pub mod shrink_swell;
pub mod table;

pub fn error_label(ui: &mut Ui, message: &str) {
    ui.label(RichText::new(message).color(Color32::RED));
}

/// The dataset a page reads, or an inline note explaining why it is missing.
pub fn require_dataset<'a>(ui: &mut Ui, loaded: Option<&'a Loaded<SampleSet>>, what: &str) -> Option<&'a SampleSet> {
    match loaded.map(|l| &l.result) {
        Some(Ok(dataset)) => {
            if dataset.is_empty() {
                ui.label(format!("The {what} has no rows."));
            }
            Some(dataset)
        }
        Some(Err(e)) => {
            error_label(ui, &format!("Error loading {what}: {e}"));
            None
        }
        None => {
            ui.label(format!("No {what} loaded (File → Open…)."));
            None
        }
    }
}

/// Single-choice combo box over string options. `any` adds a leading
/// empty choice shown with that label. Returns the new choice when it
/// changed.
pub fn choice_combo(ui: &mut Ui, id: &str, label: &str, current: &str, options: &[String], any: Option<&str>) -> Option<String> {
    let mut picked = None;
    ui.label(label);
    let shown = if current.is_empty() { any.unwrap_or("") } else { current };
    eframe::egui::ComboBox::from_id_salt(id)
        .selected_text(shown)
        .show_ui(ui, |ui: &mut Ui| {
            if let Some(any) = any {
                if ui.selectable_label(current.is_empty(), any).clicked() {
                    picked = Some(String::new());
                }
            }
            for option in options {
                if ui.selectable_label(current == option, option.as_str()).clicked() {
                    picked = Some(option.clone());
                }
            }
        });
    picked.filter(|p| p != current)
}
