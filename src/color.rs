use std::collections::{BTreeMap, BTreeSet};

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::boundary::RiskClass;
use crate::data::classify::Severity;
use crate::data::model::CellValue;

// ---------------------------------------------------------------------------
// Fixed legend colours
// ---------------------------------------------------------------------------

pub const GREEN: Color32 = Color32::from_rgb(0, 128, 0);
pub const BEIGE: Color32 = Color32::from_rgb(0xee, 0xd9, 0xc4);
pub const ORANGE: Color32 = Color32::from_rgb(255, 165, 0);
pub const RED: Color32 = Color32::from_rgb(255, 0, 0);
pub const YELLOW: Color32 = Color32::from_rgb(255, 255, 0);
pub const TREND: Color32 = Color32::from_rgb(0x7a, 0xb2, 0xf7);
pub const POINTS: Color32 = Color32::from_rgb(0x00, 0xff, 0xff);

pub fn severity_color(severity: Severity) -> Color32 {
    match severity {
        Severity::Low => GREEN,
        Severity::Medium => BEIGE,
        Severity::High => ORANGE,
        Severity::Highest => RED,
    }
}

pub fn risk_color(class: RiskClass) -> Color32 {
    match class {
        RiskClass::Low => YELLOW,
        RiskClass::Moderate => ORANGE,
        RiskClass::Significant => RED,
        RiskClass::Unknown => Color32::GRAY,
    }
}

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Categorical colour mapping: cell value → Color32
// ---------------------------------------------------------------------------

/// Maps the distinct values of a categorical column to distinct colours.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<CellValue, Color32>,
    default_color: Color32,
}

impl ColorMap {
    pub fn new(values: &BTreeSet<CellValue>) -> Self {
        let palette = generate_palette(values.len());
        let mapping = values.iter().cloned().zip(palette).collect();
        ColorMap {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    pub fn color_for(&self, value: &CellValue) -> Color32 {
        self.mapping
            .get(value)
            .copied()
            .unwrap_or(self.default_color)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_size_and_distinct_colours() {
        let p = generate_palette(5);
        assert_eq!(p.len(), 5);
        let unique: BTreeSet<[u8; 4]> = p.iter().map(|c| c.to_array()).collect();
        assert_eq!(unique.len(), 5);
        assert!(generate_palette(0).is_empty());
    }

    #[test]
    fn unknown_values_fall_back_to_grey() {
        let values = BTreeSet::from([CellValue::Text("A".into()), CellValue::Text("B".into())]);
        let map = ColorMap::new(&values);
        assert_ne!(map.color_for(&CellValue::Text("A".into())), Color32::GRAY);
        assert_eq!(map.color_for(&CellValue::Text("Z".into())), Color32::GRAY);
        assert_ne!(
            map.color_for(&CellValue::Text("A".into())),
            map.color_for(&CellValue::Text("B".into()))
        );
    }

    #[test]
    fn severity_colours_follow_the_legend() {
        assert_eq!(severity_color(Severity::Low), GREEN);
        assert_eq!(severity_color(Severity::Highest), RED);
        assert_eq!(risk_color(RiskClass::Unknown), Color32::GRAY);
    }
}
