use std::collections::BTreeSet;

use crate::config::MapConfig;
use crate::data::aggregate::mean_center;
use crate::data::classify::{Measure, Severity};
use crate::data::filter::{filtered_indices, FilterSet};
use crate::data::model::{Field, SampleSet};
use crate::data::table::{present_columns, rename, TableColumn};

use super::MapView;

const ALWAYS_SHOWN: [Field; 9] = [
    Field::ProjectId,
    Field::LocationId,
    Field::Postcode,
    Field::GeologyCode,
    Field::Fines,
    Field::PlasticLimit,
    Field::LiquidLimit,
    Field::PlasticityIndex,
    Field::MoistureContent,
];
const UTM: [Field; 2] = [Field::Easting, Field::Northing];
const LATLONG: [Field; 2] = [Field::Latitude, Field::Longitude];

const SHORT_TITLES: [(Field, &str); 9] = [
    (Field::GeologyCode, "Geology"),
    (Field::MoistureContent, "MC (%)"),
    (Field::PlasticityIndex, "PI (%)"),
    (Field::PlasticLimit, "PL (%)"),
    (Field::LiquidLimit, "LL (%)"),
    (Field::Easting, "E"),
    (Field::Northing, "N"),
    (Field::Latitude, "Lat"),
    (Field::Longitude, "Lon"),
];

/// Selections and derived rows of the postcode page.
#[derive(Debug, Clone)]
pub struct PostcodeView {
    /// Whole-number slider limits taken from the data.
    pub pi_limits: (i64, i64),
    pub pi_range: (i64, i64),
    pub severities: BTreeSet<Severity>,
    /// `""` means any project.
    pub project_id: String,
    /// `""` means any geology.
    pub geology_code: String,
    pub show_utm: bool,
    pub show_latlong: bool,
    /// Rows passing the current filters.
    pub visible: Vec<usize>,
    pub map: MapView,
    fallback: (f64, f64),
}

impl PostcodeView {
    pub fn new(dataset: &SampleSet, map: &MapConfig) -> Self {
        let pi_limits = dataset
            .numeric_range(Field::PlasticityIndex)
            .map(|(lo, hi)| (lo.floor() as i64, hi.ceil() as i64))
            .unwrap_or((0, 0));
        let fallback = (map.fallback_center[0], map.fallback_center[1]);

        let mut view = PostcodeView {
            pi_limits,
            pi_range: pi_limits,
            severities: Severity::ALL.into_iter().collect(),
            project_id: String::new(),
            geology_code: String::new(),
            show_utm: true,
            show_latlong: true,
            visible: Vec::new(),
            map: MapView::new(fallback, map.zoom),
            fallback,
        };
        view.refilter(dataset);
        view
    }

    pub fn filters(&self) -> FilterSet {
        FilterSet::new()
            .range(
                Field::PlasticityIndex,
                self.pi_range.0 as f64,
                self.pi_range.1 as f64,
            )
            .severity(Measure::PlasticityIndex, self.severities.clone())
            .equals(Field::ProjectId, Some(self.project_id.as_str()))
            .equals(Field::GeologyCode, Some(self.geology_code.as_str()))
    }

    /// Recompute `visible` and recentre the map on it.
    pub fn refilter(&mut self, dataset: &SampleSet) {
        let filters = self.filters();
        self.visible = filtered_indices(dataset, &filters);
        let center = mean_center(
            self.visible
                .iter()
                .filter_map(|&i| dataset.samples[i].position()),
        );
        self.map.focus(center, self.fallback);
        log::debug!(
            "Postcode page: {} of {} samples visible under {} predicates",
            self.visible.len(),
            dataset.len(),
            filters.predicates().len()
        );
    }

    /// Changing the project clears the geology selection, whose options
    /// depend on the project.
    pub fn select_project(&mut self, dataset: &SampleSet, project_id: &str) {
        if project_id != self.project_id {
            self.project_id = project_id.to_string();
            self.geology_code.clear();
            self.refilter(dataset);
        }
    }

    pub fn select_geology(&mut self, dataset: &SampleSet, geology_code: &str) {
        if geology_code != self.geology_code {
            self.geology_code = geology_code.to_string();
            self.refilter(dataset);
        }
    }

    pub fn set_pi_range(&mut self, dataset: &SampleSet, lo: i64, hi: i64) {
        let lo = lo.clamp(self.pi_limits.0, self.pi_limits.1);
        let hi = hi.clamp(lo, self.pi_limits.1);
        if (lo, hi) != self.pi_range {
            self.pi_range = (lo, hi);
            self.refilter(dataset);
        }
    }

    pub fn toggle_severity(&mut self, dataset: &SampleSet, severity: Severity) {
        if !self.severities.remove(&severity) {
            self.severities.insert(severity);
        }
        self.refilter(dataset);
    }

    pub fn project_options(&self, dataset: &SampleSet) -> Vec<String> {
        dataset.distinct(Field::ProjectId)
    }

    /// Geology codes of the selected project, or of every project.
    pub fn geology_options(&self, dataset: &SampleSet) -> Vec<String> {
        if self.project_id.is_empty() {
            return dataset.distinct(Field::GeologyCode);
        }
        let codes: BTreeSet<&str> = dataset
            .samples
            .iter()
            .filter(|s| s.project_id == self.project_id)
            .map(|s| s.geology_code.as_str())
            .collect();
        codes.into_iter().map(str::to_string).collect()
    }

    /// Fixed lab columns, then whichever coordinate pairs are toggled on,
    /// restricted to the columns the file has.
    pub fn table_columns(&self, dataset: &SampleSet) -> Vec<TableColumn> {
        let mut fields: Vec<Field> = ALWAYS_SHOWN.to_vec();
        if self.show_utm {
            fields.extend(UTM);
        }
        if self.show_latlong {
            fields.extend(LATLONG);
        }
        rename(present_columns(dataset, &fields), &SHORT_TITLES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::{load_csv, POINTS_REQUIRED};

    const CSV: &str = "\
ProjectID,LocationID,Postcode,GeologyCode,PlasticityIndex,MoistureContent,Easting,Northing,Latitude,Longitude
P1,BH1,LE1,CLAY,5,20,1,1,52.0,-1.0
P1,BH2,LE1,TILL,15,22,1,1,52.2,-1.2
P2,BH3,NW3,CLAY,25,30,1,1,51.5,-0.2
P2,BH4,NW3,SAND,45.5,35,1,1,51.6,-0.1
";

    fn setup() -> (SampleSet, PostcodeView) {
        let ds = load_csv(CSV.as_bytes(), POINTS_REQUIRED).unwrap();
        let view = PostcodeView::new(&ds, &MapConfig::default());
        (ds, view)
    }

    #[test]
    fn defaults_show_every_sample() {
        let (_, view) = setup();
        assert_eq!(view.pi_limits, (5, 46));
        assert_eq!(view.visible, vec![0, 1, 2, 3]);
    }

    #[test]
    fn project_selection_filters_and_resets_geology() {
        let (ds, mut view) = setup();
        view.select_geology(&ds, "CLAY");
        assert_eq!(view.visible, vec![0, 2]);

        view.select_project(&ds, "P1");
        assert_eq!(view.geology_code, "");
        assert_eq!(view.visible, vec![0, 1]);
        assert_eq!(view.geology_options(&ds), vec!["CLAY", "TILL"]);

        view.select_project(&ds, "");
        assert_eq!(view.geology_options(&ds), vec!["CLAY", "SAND", "TILL"]);
    }

    #[test]
    fn reselecting_same_project_keeps_geology() {
        let (ds, mut view) = setup();
        view.select_project(&ds, "P2");
        view.select_geology(&ds, "SAND");
        view.select_project(&ds, "P2");
        assert_eq!(view.geology_code, "SAND");
        assert_eq!(view.visible, vec![3]);
    }

    #[test]
    fn range_and_severity_filters_combine() {
        let (ds, mut view) = setup();
        view.set_pi_range(&ds, 10, 46);
        assert_eq!(view.visible, vec![1, 2, 3]);
        view.toggle_severity(&ds, Severity::High);
        assert_eq!(view.visible, vec![1, 3]);
    }

    #[test]
    fn empty_result_recentres_on_fallback() {
        let (ds, mut view) = setup();
        view.select_project(&ds, "P1");
        view.select_geology(&ds, "SAND");
        assert!(view.visible.is_empty());
        assert_eq!(view.map.center, (0.0, 0.0));
    }

    #[test]
    fn map_centres_on_visible_samples() {
        let (ds, mut view) = setup();
        view.select_project(&ds, "P1");
        let (lat, lon) = view.map.center;
        assert!((lat - 52.1).abs() < 1e-9 && (lon + 1.1).abs() < 1e-9);
    }

    #[test]
    fn coordinate_toggles_pick_table_columns() {
        let (ds, mut view) = setup();
        let titles = |v: &PostcodeView| -> Vec<String> {
            v.table_columns(&ds).into_iter().map(|c| c.title).collect()
        };
        // No Fines / PL / LL in this file.
        assert_eq!(
            titles(&view),
            vec!["ProjectID", "LocationID", "Postcode", "Geology", "PI (%)", "MC (%)", "E", "N", "Lat", "Lon"]
        );
        view.show_utm = false;
        assert!(!titles(&view).contains(&"E".to_string()));
        view.show_latlong = false;
        assert_eq!(titles(&view).last().map(String::as_str), Some("MC (%)"));
    }
}
