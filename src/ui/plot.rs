use std::collections::BTreeMap;

use eframe::egui::{Color32, Stroke, Ui};
use egui_plot::{
    Bar, BarChart, BoxElem, BoxPlot, BoxSpread, Legend, Line, LineStyle, MarkerShape, Plot, Points,
};

use crate::color::{POINTS, RED, TREND};
use crate::data::aggregate::{date_to_days, days_to_date};
use crate::data::model::{FieldKind, SampleSet};
use crate::state::counts::CountsView;
use crate::state::explorer::{ChartKind, ExplorerView};
use crate::state::moisture::MoistureView;

const CHART_HEIGHT: f32 = 380.0;

fn date_label(days: f64) -> String {
    days_to_date(days)
        .map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Plasticity index counts
// ---------------------------------------------------------------------------

pub fn counts_chart(ui: &mut Ui, view: &CountsView) {
    let points: Vec<[f64; 2]> = view.counts.iter().map(|c| [c.value, c.count as f64]).collect();

    Plot::new("pi_counts")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label("Plasticity Index")
        .y_axis_label("Count of Samples")
        .show(ui, |plot_ui| {
            plot_ui.points(
                Points::new(points)
                    .name("Count")
                    .shape(MarkerShape::Circle)
                    .radius(4.0)
                    .color(POINTS),
            );
            plot_ui.line(Line::new(view.trend.clone()).name("Trendline").color(TREND).width(2.0));
        });
}

// ---------------------------------------------------------------------------
// Moisture content over time
// ---------------------------------------------------------------------------

fn scatter_title(geology: &str) -> String {
    format!("Moisture Content vs. Date with Trendline for {geology}")
}

fn box_title(geology: &str) -> String {
    format!("Box Plot of Moisture Content by Year for {geology}")
}

/// Every visible reading, the wettest reading of each year, and the trend.
pub fn moisture_scatter(ui: &mut Ui, dataset: &SampleSet, view: &MoistureView) {
    let reading = |i: usize| {
        let s = &dataset.samples[i];
        Some([date_to_days(s.date?), s.moisture_content?])
    };
    let points: Vec<[f64; 2]> = view.visible.iter().filter_map(|&i| reading(i)).collect();
    let maxima: Vec<[f64; 2]> = view.maxima.iter().filter_map(|&(_, i)| reading(i)).collect();

    ui.strong(scatter_title(&view.geology));
    Plot::new("moisture_scatter")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label("Date")
        .y_axis_label("Moisture Content")
        .x_axis_formatter(|mark, _range| date_label(mark.value))
        .label_formatter(|_name, p| format!("Date: {}\nMoisture Content: {:.2}", date_label(p.x), p.y))
        .show(ui, |plot_ui| {
            plot_ui.points(
                Points::new(points)
                    .name("Moisture Content")
                    .radius(3.0)
                    .color(POINTS),
            );
            plot_ui.points(
                Points::new(maxima)
                    .name("Yearly Max")
                    .shape(MarkerShape::Asterisk)
                    .radius(6.0)
                    .color(RED),
            );
            plot_ui.line(Line::new(view.trend.clone()).name("Trendline").color(TREND).width(2.0));
        });
}

/// One box per year with mean and ±1 standard deviation markers.
pub fn moisture_boxes(ui: &mut Ui, view: &MoistureView) {
    let boxes: Vec<BoxElem> = view
        .boxes
        .iter()
        .map(|(year, b)| {
            BoxElem::new(
                f64::from(*year),
                BoxSpread::new(b.lower_whisker, b.q1, b.median, b.q3, b.upper_whisker),
            )
            .name(format!("{year} (n={})", b.count))
            .box_width(0.6)
            .whisker_width(0.4)
            .fill(POINTS.gamma_multiply(0.3))
            .stroke(Stroke::new(1.5, POINTS))
        })
        .collect();
    let means: Vec<[f64; 2]> = view.boxes.iter().map(|(y, b)| [f64::from(*y), b.mean]).collect();

    ui.strong(box_title(&view.geology));
    Plot::new("moisture_boxes")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label("Year")
        .y_axis_label("Moisture Content")
        .x_axis_formatter(|mark, _range| {
            if mark.value.fract() == 0.0 {
                format!("{}", mark.value as i64)
            } else {
                String::new()
            }
        })
        .show(ui, |plot_ui| {
            plot_ui.box_plot(BoxPlot::new(boxes).name("Moisture Content"));
            plot_ui.points(
                Points::new(means)
                    .name("Mean")
                    .shape(MarkerShape::Diamond)
                    .radius(4.0)
                    .color(TREND),
            );
            for (year, b) in &view.boxes {
                let x = f64::from(*year);
                plot_ui.line(
                    Line::new(vec![[x, b.mean - b.std_dev], [x, b.mean + b.std_dev]])
                        .name("±1 SD")
                        .color(TREND)
                        .style(LineStyle::dashed_loose()),
                );
            }
        });
}

// ---------------------------------------------------------------------------
// Field explorer
// ---------------------------------------------------------------------------

pub fn explorer_chart(ui: &mut Ui, dataset: &SampleSet, view: &ExplorerView) {
    match view.chart {
        ChartKind::Scatter => explorer_scatter(ui, dataset, view),
        ChartKind::Bar => explorer_bars(ui, view),
    }
}

fn explorer_scatter(ui: &mut Ui, dataset: &SampleSet, view: &ExplorerView) {
    // Legend name → (colour, points).
    let mut series: BTreeMap<String, (Color32, Vec<[f64; 2]>)> = BTreeMap::new();
    for (row, point) in view.scatter_points(dataset) {
        let sample = &dataset.samples[row];
        let (name, color) = match (view.color_column, &view.color_map) {
            (Some(field), Some(map)) => {
                let value = field.value(sample);
                (value.to_string(), map.color_for(&value))
            }
            _ => (view.y.header().to_string(), POINTS),
        };
        series.entry(name).or_insert_with(|| (color, Vec::new())).1.push(point);
    }

    let categories = dataset.distinct(view.x);
    let x_kind = view.x.kind();

    Plot::new("explorer_scatter")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label(view.x.header())
        .y_axis_label(view.y.header())
        .x_axis_formatter(move |mark, _range| axis_label(x_kind, &categories, mark.value))
        .show(ui, |plot_ui| {
            for (name, (color, points)) in series {
                plot_ui.points(Points::new(points).name(name).radius(3.0).color(color));
            }
        });
}

fn explorer_bars(ui: &mut Ui, view: &ExplorerView) {
    let bars: Vec<Bar> = view
        .means
        .iter()
        .enumerate()
        .map(|(i, g)| Bar::new(i as f64, g.mean).name(format!("{} (n={})", g.key, g.count)).fill(POINTS))
        .collect();
    let keys: Vec<String> = view.means.iter().map(|g| g.key.clone()).collect();

    Plot::new("explorer_bars")
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label(view.x.header())
        .y_axis_label(format!("mean {}", view.y.header()))
        .x_axis_formatter(move |mark, _range| axis_label(FieldKind::Text, &keys, mark.value))
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).name(view.y.header()));
        });
}

/// Tick text for an explorer axis: dates for day numbers, category names
/// for category ranks.
fn axis_label(kind: FieldKind, categories: &[String], value: f64) -> String {
    match kind {
        FieldKind::Number => format!("{value}"),
        FieldKind::Date => date_label(value),
        FieldKind::Text => {
            if value.fract() != 0.0 || value < 0.0 {
                return String::new();
            }
            categories.get(value as usize).cloned().unwrap_or_default()
        }
    }
}
