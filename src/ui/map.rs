use std::collections::BTreeMap;
use std::f64::consts::PI;

use eframe::egui::{Color32, RichText, Stroke, Ui};
use egui_plot::{Line, MarkerShape, Plot, PlotBounds, PlotPoint, PlotPoints, PlotUi, Points, Polygon, Text};

use crate::config::MapConfig;
use crate::data::boundary::{BoundaryFeature, BoundaryLayer};
use crate::state::MapView;

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

const MAX_LAT: f64 = 85.051_128_78;

/// Web-Mercator northing in degree units, so one degree of longitude and
/// one unit of `y` have the same length on screen.
pub fn mercator_y(lat: f64) -> f64 {
    let phi = lat.clamp(-MAX_LAT, MAX_LAT).to_radians();
    (PI / 4.0 + phi / 2.0).tan().ln().to_degrees()
}

pub fn latitude_from_y(y: f64) -> f64 {
    (2.0 * y.to_radians().exp().atan() - PI / 2.0).to_degrees()
}

/// Longitude span visible at a slippy-map zoom level on a ~700 px canvas.
pub fn span_for_zoom(zoom: u8) -> f64 {
    360.0 * 2.7 / 2f64.powi(i32::from(zoom))
}

// ---------------------------------------------------------------------------
// Map content
// ---------------------------------------------------------------------------

/// How to draw one boundary layer.
pub struct MapLayer<'a> {
    pub layer: &'a BoundaryLayer,
    pub fill: Option<fn(&BoundaryFeature) -> Color32>,
    pub outline: Option<Stroke>,
    pub tooltip: fn(&BoundaryFeature) -> Option<String>,
}

/// A circle marker tied to a table row.
#[derive(Debug, Clone)]
pub struct Marker {
    pub row: usize,
    pub lat: f64,
    pub lon: f64,
    pub color: Color32,
    pub summary: String,
}

impl Marker {
    fn plot_point(&self) -> [f64; 2] {
        [self.lon, mercator_y(self.lat)]
    }
}

// ---------------------------------------------------------------------------
// Clustering
// ---------------------------------------------------------------------------

/// Markers merged because they sit close together on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    /// Indices into the input positions.
    pub members: Vec<usize>,
}

/// Grid clustering in screen space: positions falling into the same
/// `cell`-sized square merge. Every input index appears in exactly one
/// cluster. A non-positive cell size disables merging.
pub fn cluster_positions(positions: &[[f64; 2]], cell: f64) -> Vec<Cluster> {
    if cell.is_nan() || cell <= 0.0 {
        return (0..positions.len())
            .map(|i| Cluster { members: vec![i] })
            .collect();
    }
    let mut grid: BTreeMap<(i64, i64), Vec<usize>> = BTreeMap::new();
    for (i, p) in positions.iter().enumerate() {
        let key = ((p[0] / cell).floor() as i64, (p[1] / cell).floor() as i64);
        grid.entry(key).or_default().push(i);
    }
    grid.into_values().map(|members| Cluster { members }).collect()
}

// ---------------------------------------------------------------------------
// Widget
// ---------------------------------------------------------------------------

const CLUSTER_FILL: Color32 = Color32::from_rgb(110, 204, 57);
const MAP_HEIGHT: f32 = 460.0;

enum Hover {
    Marker(usize),
    Cluster(usize),
    Feature(String),
}

/// Draw layers and markers on a Mercator canvas.
///
/// Hovering a marker shows its summary, clicking pins it in `view`.
/// Hovering a layer feature shows that layer's tooltip.
pub fn map_view(
    ui: &mut Ui,
    id: &str,
    view: &mut MapView,
    config: &MapConfig,
    layers: &[MapLayer<'_>],
    markers: &[Marker],
    cluster: bool,
) {
    let recenter = std::mem::take(&mut view.recenter);
    if recenter {
        // Clustering reads the screen transform of the previous frame.
        ui.ctx().request_repaint();
    }
    let (lat, lon) = view.center;
    let half = span_for_zoom(view.zoom) / 2.0;
    let cy = mercator_y(lat);
    let radius = config.marker_radius;
    let cell = if cluster { f64::from(config.cluster_radius_px) } else { 0.0 };
    let pinned = view.pinned;

    let response = Plot::new(id)
        .height(MAP_HEIGHT)
        .data_aspect(1.0)
        .show_grid(false)
        .show_x(false)
        .show_y(false)
        .x_axis_formatter(|mark, _range| format!("{:.1}°", mark.value))
        .y_axis_formatter(|mark, _range| format!("{:.1}°", latitude_from_y(mark.value)))
        .show(ui, |plot_ui| {
            if recenter {
                plot_ui.set_plot_bounds(PlotBounds::from_min_max(
                    [lon - half, cy - half * 0.6],
                    [lon + half, cy + half * 0.6],
                ));
            }

            for map_layer in layers {
                draw_layer(plot_ui, map_layer);
            }

            let screen: Vec<[f64; 2]> = markers
                .iter()
                .map(|m| {
                    let [x, y] = m.plot_point();
                    let p = plot_ui.screen_from_plot(PlotPoint::new(x, y));
                    [f64::from(p.x), f64::from(p.y)]
                })
                .collect();
            let clusters = cluster_positions(&screen, cell);
            draw_markers(plot_ui, markers, &clusters, radius, pinned);

            let pointer = plot_ui.pointer_coordinate()?;
            let at = plot_ui.screen_from_plot(pointer);
            let reach = f64::from(radius) + 3.0;
            for c in &clusters {
                let hit = c.members.iter().any(|&i| {
                    let [sx, sy] = screen[i];
                    (sx - f64::from(at.x)).hypot(sy - f64::from(at.y)) <= reach
                });
                if hit {
                    return Some(match c.members.as_slice() {
                        [only] => Hover::Marker(*only),
                        many => Hover::Cluster(many.len()),
                    });
                }
            }

            let pointer_lat = latitude_from_y(pointer.y);
            layers.iter().rev().find_map(|l| {
                let feature = l.layer.feature_at(pointer.x, pointer_lat)?;
                (l.tooltip)(feature).map(Hover::Feature)
            })
        });

    let hover_text = match response.inner {
        Some(Hover::Marker(i)) => {
            if response.response.clicked() {
                view.pinned = Some(markers[i].row);
            }
            Some(markers[i].summary.clone())
        }
        Some(Hover::Cluster(n)) => Some(format!("{n} samples (zoom in to separate)")),
        Some(Hover::Feature(text)) => Some(text),
        None => None,
    };
    if let Some(text) = hover_text {
        response.response.on_hover_text_at_pointer(text);
    }

    if let Some(row) = view.pinned {
        if let Some(marker) = markers.iter().find(|m| m.row == row) {
            ui.horizontal(|ui: &mut Ui| {
                ui.label(RichText::new(&marker.summary).monospace());
                if ui.small_button("Unpin").clicked() {
                    view.pinned = None;
                }
            });
        }
    }
}

fn draw_layer(plot_ui: &mut PlotUi, map_layer: &MapLayer<'_>) {
    for feature in &map_layer.layer.features {
        if let Some(fill) = map_layer.fill {
            let color = fill(feature);
            for tri in &feature.triangles {
                let points: Vec<[f64; 2]> = tri.iter().map(|[x, y]| [*x, mercator_y(*y)]).collect();
                plot_ui.polygon(
                    Polygon::new(PlotPoints::from(points))
                        .fill_color(color)
                        .stroke(Stroke::NONE),
                );
            }
        }
        if let Some(stroke) = map_layer.outline {
            for polygon in &feature.geometry.0 {
                let ring: Vec<[f64; 2]> = polygon
                    .exterior()
                    .coords()
                    .map(|c| [c.x, mercator_y(c.y)])
                    .collect();
                plot_ui.line(Line::new(PlotPoints::from(ring)).stroke(stroke));
            }
        }
    }
}

fn draw_markers(
    plot_ui: &mut PlotUi,
    markers: &[Marker],
    clusters: &[Cluster],
    radius: f32,
    pinned: Option<usize>,
) {
    // One plot item per colour keeps the item count small.
    let mut by_color: BTreeMap<[u8; 4], (Color32, Vec<[f64; 2]>)> = BTreeMap::new();
    for c in clusters {
        match c.members.as_slice() {
            [only] => {
                let m = &markers[*only];
                by_color
                    .entry(m.color.to_array())
                    .or_insert_with(|| (m.color, Vec::new()))
                    .1
                    .push(m.plot_point());
            }
            many => {
                let n = many.len() as f64;
                let (sx, sy) = many.iter().fold((0.0, 0.0), |(ax, ay), &i| {
                    let [x, y] = markers[i].plot_point();
                    (ax + x, ay + y)
                });
                let at = [sx / n, sy / n];
                let size = radius * 1.8 + (n as f32).log10() * 6.0;
                plot_ui.points(
                    Points::new(vec![at])
                        .shape(MarkerShape::Circle)
                        .radius(size)
                        .filled(true)
                        .color(CLUSTER_FILL.gamma_multiply(0.8)),
                );
                plot_ui.text(Text::new(
                    PlotPoint::new(at[0], at[1]),
                    RichText::new(many.len().to_string()).strong().color(Color32::BLACK),
                ));
            }
        }
    }
    for (color, points) in by_color.into_values() {
        plot_ui.points(
            Points::new(points)
                .shape(MarkerShape::Circle)
                .radius(radius)
                .filled(true)
                .color(color),
        );
    }

    if let Some(marker) = pinned.and_then(|row| markers.iter().find(|m| m.row == row)) {
        plot_ui.points(
            Points::new(vec![marker.plot_point()])
                .shape(MarkerShape::Circle)
                .radius(radius + 3.0)
                .filled(false)
                .color(Color32::WHITE),
        );
    }
}
