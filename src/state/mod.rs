use std::path::{Path, PathBuf};

use crate::config::AppConfig;
use crate::data::boundary::BoundaryLayer;
use crate::data::loader::{self, DATED_REQUIRED, POINTS_REQUIRED};
use crate::data::model::{Field, SampleSet};

pub mod counts;
pub mod explorer;
pub mod moisture;
pub mod postcode;

use counts::CountsView;
use explorer::ExplorerView;
use moisture::MoistureView;
use postcode::PostcodeView;

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Home,
    PostcodeData,
    DataVisualiser,
    PlasticityCounts,
    MoistureOverTime,
    ShrinkSwell,
}

impl Page {
    pub const ALL: [Page; 6] = [
        Page::Home,
        Page::PostcodeData,
        Page::DataVisualiser,
        Page::PlasticityCounts,
        Page::MoistureOverTime,
        Page::ShrinkSwell,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Page::Home => "Home",
            Page::PostcodeData => "Postcode Data",
            Page::DataVisualiser => "Data Visualiser",
            Page::PlasticityCounts => "Plasticity Index vs. Geology Sample Counts",
            Page::MoistureOverTime => "Moisture Content over Time",
            Page::ShrinkSwell => "Shrink Swell Risk and Geology",
        }
    }
}

// ---------------------------------------------------------------------------
// Loaded inputs
// ---------------------------------------------------------------------------

/// Outcome of reading one input file. Failures are kept as text so the
/// page that needs the file can show them inline.
#[derive(Debug)]
pub struct Loaded<T> {
    pub path: PathBuf,
    pub result: Result<T, String>,
}

impl<T> Loaded<T> {
    pub fn get(&self) -> Option<&T> {
        self.result.as_ref().ok()
    }

    pub fn error(&self) -> Option<&str> {
        self.result.as_ref().err().map(String::as_str)
    }
}

/// Map camera for one page: where to centre next, plus a pinned marker.
#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    /// `(lat, lon)`.
    pub center: (f64, f64),
    pub zoom: u8,
    /// Set when the centre changed and the widget should move the camera.
    pub recenter: bool,
    /// Sample index whose summary stays visible after a click.
    pub pinned: Option<usize>,
}

impl MapView {
    pub fn new(center: (f64, f64), zoom: u8) -> Self {
        MapView {
            center,
            zoom,
            recenter: true,
            pinned: None,
        }
    }

    /// Move to a new centre, or the fallback when there is nothing to show.
    pub fn focus(&mut self, center: Option<(f64, f64)>, fallback: (f64, f64)) {
        self.center = center.unwrap_or(fallback);
        self.recenter = true;
        self.pinned = None;
    }
}

/// Geology codes offered on the time-series pages.
pub fn geology_options(config: &AppConfig, dataset: &SampleSet) -> Vec<String> {
    if config.pages.geology_options.is_empty() {
        dataset.distinct(Field::GeologyCode)
    } else {
        config.pages.geology_options.clone()
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: AppConfig,
    pub page: Page,

    /// Point samples for the postcode page.
    pub points: Option<Loaded<SampleSet>>,
    /// Dated samples for the time-series pages, sorted by date.
    pub dated: Option<Loaded<SampleSet>>,

    pub postcode_layer: Option<Loaded<BoundaryLayer>>,
    pub shrink_swell_layer: Option<Loaded<BoundaryLayer>>,
    pub jurassic_layer: Option<Loaded<BoundaryLayer>>,

    pub postcode: Option<PostcodeView>,
    pub explorer: Option<ExplorerView>,
    pub counts: Option<CountsView>,
    pub moisture: Option<MoistureView>,
    /// Camera of the shrink-swell overview, which has no dataset of its own.
    pub overview_map: MapView,

    /// Status / error message shown in the top bar.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let [lat, lon] = config.map.overview_center;
        let overview_map = MapView::new((lat, lon), config.map.zoom);
        Self {
            config,
            page: Page::Home,
            points: None,
            dated: None,
            postcode_layer: None,
            shrink_swell_layer: None,
            jurassic_layer: None,
            postcode: None,
            explorer: None,
            counts: None,
            moisture: None,
            overview_map,
            status_message: None,
        }
    }

    /// Read every configured input. Each file fails independently.
    pub fn load_all(&mut self) {
        let data = self.config.data.clone();
        self.load_points(&data.resolve(&data.points));
        self.load_dated(&data.resolve(&data.dated_samples));
        self.reload_layers();
    }

    pub fn load_points(&mut self, path: &Path) {
        let result = loader::load_file(path, POINTS_REQUIRED);
        self.set_points(path, result.map_err(|e| format!("{}: {e}", path.display())));
    }

    pub fn load_dated(&mut self, path: &Path) {
        let result = loader::load_file(path, DATED_REQUIRED).map(|mut set| {
            set.sort_by_date();
            set
        });
        self.set_dated(path, result.map_err(|e| format!("{}: {e}", path.display())));
    }

    /// Ingest a points table and rebuild the postcode page around it.
    pub fn set_points(&mut self, path: &Path, result: Result<SampleSet, String>) {
        self.postcode = match &result {
            Ok(set) => {
                log::info!("Loaded {} point samples from {}", set.len(), path.display());
                Some(PostcodeView::new(set, &self.config.map))
            }
            Err(e) => {
                log::error!("Failed to load point samples: {e}");
                self.status_message = Some(format!("Error: {e}"));
                None
            }
        };
        self.points = Some(Loaded {
            path: path.to_path_buf(),
            result,
        });
    }

    /// Ingest a dated table and rebuild the three pages that read it.
    pub fn set_dated(&mut self, path: &Path, result: Result<SampleSet, String>) {
        match &result {
            Ok(set) => {
                log::info!("Loaded {} dated samples from {}", set.len(), path.display());
                let options = geology_options(&self.config, set);
                self.explorer = Some(ExplorerView::new(set));
                self.counts = Some(CountsView::new(set, &options, &self.config.pages));
                self.moisture = Some(MoistureView::new(set, &options, &self.config));
            }
            Err(e) => {
                log::error!("Failed to load dated samples: {e}");
                self.status_message = Some(format!("Error: {e}"));
                self.explorer = None;
                self.counts = None;
                self.moisture = None;
            }
        }
        self.dated = Some(Loaded {
            path: path.to_path_buf(),
            result,
        });
    }

    /// Re-read the boundary files from disk.
    pub fn reload_layers(&mut self) {
        let data = self.config.data.clone();
        self.postcode_layer = Some(load_layer("Postcode Boundaries", &data.resolve(&data.postcode_boundaries)));
        self.shrink_swell_layer = Some(load_layer("Shrink Swell", &data.resolve(&data.shrink_swell)));
        self.jurassic_layer = Some(load_layer("Jurassic", &data.resolve(&data.jurassic)));
    }
}

fn load_layer(name: &str, path: &Path) -> Loaded<BoundaryLayer> {
    let result = BoundaryLayer::load(name, path).map_err(|e| {
        log::warn!("Boundary layer '{name}' unavailable: {e}");
        format!("Error loading GeoJSON file {}: {e}", path.display())
    });
    Loaded {
        path: path.to_path_buf(),
        result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POINTS: &str = "\
ProjectID,LocationID,Postcode,GeologyCode,PlasticityIndex,MoistureContent,Latitude,Longitude
P1,BH1,LE1,CLAY,12,20,52.0,-1.0
P2,BH2,LE2,TILL,45,30,53.0,-2.0
";

    #[test]
    fn broken_boundary_file_does_not_block_samples() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Points.csv"), POINTS).unwrap();
        std::fs::write(dir.path().join("postcodes.geojson"), "").unwrap();

        let mut config = AppConfig::default();
        config.data.data_dir = dir.path().to_path_buf();
        let mut state = AppState::new(config);
        state.load_all();

        let points = state.points.as_ref().unwrap();
        assert_eq!(points.get().map(SampleSet::len), Some(2));
        assert!(state.postcode.is_some());

        let layer = state.postcode_layer.as_ref().unwrap();
        assert!(layer.error().unwrap().contains("GeoJSON"));

        // No dated table in the directory: only those pages are affected.
        assert!(state.dated.as_ref().unwrap().error().is_some());
        assert!(state.moisture.is_none());
    }

    #[test]
    fn map_focus_falls_back_and_unpins() {
        let mut view = MapView::new((1.0, 1.0), 6);
        view.recenter = false;
        view.pinned = Some(3);
        view.focus(None, (0.0, 0.0));
        assert_eq!(view.center, (0.0, 0.0));
        assert!(view.recenter);
        assert_eq!(view.pinned, None);
    }
}
