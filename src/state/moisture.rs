use chrono::NaiveDate;

use crate::config::AppConfig;
use crate::data::aggregate::{
    date_to_days, mean_center, site_averages, yearly_box_stats, yearly_maxima, BoxStats, SiteAverage,
};
use crate::data::filter::{filtered_indices, refine, FilterSet, Predicate};
use crate::data::trend::{lowess_trend, DEFAULT_ITERATIONS};
use crate::data::model::{Field, SampleSet};

use super::MapView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphKind {
    Scatter,
    Box,
}

impl GraphKind {
    pub const ALL: [GraphKind; 2] = [GraphKind::Scatter, GraphKind::Box];

    pub fn label(self) -> &'static str {
        match self {
            GraphKind::Scatter => "Scatter Plot",
            GraphKind::Box => "Box Plot",
        }
    }
}

/// Moisture content of one geology over a date window.
#[derive(Debug, Clone)]
pub struct MoistureView {
    pub geology_options: Vec<String>,
    pub geology: String,
    pub graph: GraphKind,
    /// First and last sample date of the selected geology.
    pub date_bounds: Option<(NaiveDate, NaiveDate)>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Rows of the selected geology.
    pub geology_rows: Vec<usize>,
    /// Rows of the selected geology inside the window, in date order.
    pub visible: Vec<usize>,
    pub sites: Vec<SiteAverage>,
    /// `(year, row)` of each year's wettest sample.
    pub maxima: Vec<(i32, usize)>,
    /// Trend over `(days since epoch, moisture)`.
    pub trend: Vec<[f64; 2]>,
    pub boxes: Vec<(i32, BoxStats)>,
    pub map: MapView,
    trend_fraction: f64,
    fallback: (f64, f64),
}

impl MoistureView {
    pub fn new(dataset: &SampleSet, geology_options: &[String], config: &AppConfig) -> Self {
        let fallback = (config.map.fallback_center[0], config.map.fallback_center[1]);
        let mut view = MoistureView {
            geology_options: geology_options.to_vec(),
            geology: geology_options.first().cloned().unwrap_or_default(),
            graph: GraphKind::Scatter,
            date_bounds: None,
            start: NaiveDate::default(),
            end: NaiveDate::default(),
            geology_rows: Vec::new(),
            visible: Vec::new(),
            sites: Vec::new(),
            maxima: Vec::new(),
            trend: Vec::new(),
            boxes: Vec::new(),
            map: MapView::new(fallback, config.map.zoom),
            trend_fraction: config.pages.trend_fraction,
            fallback,
        };
        view.reset_geology(dataset);
        view
    }

    /// Switch geology; the date window snaps back to the new subset's span.
    pub fn select_geology(&mut self, dataset: &SampleSet, geology: &str) {
        if geology != self.geology {
            self.geology = geology.to_string();
            self.reset_geology(dataset);
        }
    }

    /// Set the date window, clamped to the geology's bounds.
    pub fn set_window(&mut self, dataset: &SampleSet, start: NaiveDate, end: NaiveDate) {
        let (lo, hi) = self.date_bounds.unwrap_or((start, end));
        let start = start.clamp(lo, hi);
        let end = end.clamp(start, hi);
        if (start, end) != (self.start, self.end) {
            self.start = start;
            self.end = end;
            self.recompute(dataset);
        }
    }

    fn reset_geology(&mut self, dataset: &SampleSet) {
        // A single-choice selector: an empty choice matches nothing.
        let filters = FilterSet::new().with(Predicate::Equals {
            field: Field::GeologyCode,
            value: self.geology.clone(),
        });
        self.geology_rows = filtered_indices(dataset, &filters);

        let mut dates = self
            .geology_rows
            .iter()
            .filter_map(|&i| dataset.samples[i].date);
        self.date_bounds = dates.next().map(|first| {
            dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)))
        });
        if let Some((lo, hi)) = self.date_bounds {
            self.start = lo;
            self.end = hi;
        }
        self.recompute(dataset);
    }

    fn recompute(&mut self, dataset: &SampleSet) {
        self.visible = match self.date_bounds {
            Some(_) => refine(
                dataset,
                &self.geology_rows,
                &FilterSet::new().date_window(self.start, self.end),
            ),
            None => Vec::new(),
        };

        let field = Field::MoistureContent;
        self.sites = site_averages(dataset, &self.visible, field);
        self.maxima = yearly_maxima(dataset, &self.visible, field);
        // Boxes cover the whole geology; the window only narrows the table.
        self.boxes = yearly_box_stats(dataset, &self.geology_rows, field);

        let (x, y): (Vec<f64>, Vec<f64>) = self
            .visible
            .iter()
            .filter_map(|&i| {
                let s = &dataset.samples[i];
                Some((date_to_days(s.date?), field.number(s)?))
            })
            .unzip();
        self.trend = lowess_trend(&x, &y, self.trend_fraction, DEFAULT_ITERATIONS);

        let center = mean_center(self.sites.iter().map(|s| (s.latitude, s.longitude)));
        self.map.focus(center, self.fallback);
        log::debug!(
            "Moisture page: {} rows for {} between {} and {}",
            self.visible.len(),
            self.geology,
            self.start,
            self.end
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::{load_csv, DATED_REQUIRED};

    const CSV: &str = "\
GeologyCode,PlasticityIndex,MoistureContent,Latitude,Longitude,Date,DepthValue
CLAY,20,18,52.0,-1.0,2019-03-01,1.0
CLAY,20,22,52.0,-1.0,2019-03-01,2.0
CLAY,20,41,52.2,-1.2,2019-07-01,1.5
CLAY,20,15,52.0,-1.0,2020-02-01,1.0
CLAY,20,25,52.0,-1.0,2021-06-01,1.0
TILL,20,30,53.0,-2.0,2018-01-01,1.0
";

    fn setup() -> (SampleSet, MoistureView) {
        let mut ds = load_csv(CSV.as_bytes(), DATED_REQUIRED).unwrap();
        ds.sort_by_date();
        let options = vec!["CLAY".to_string(), "TILL".to_string()];
        let view = MoistureView::new(&ds, &options, &AppConfig::default());
        (ds, view)
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn window_defaults_to_geology_span() {
        let (_, view) = setup();
        assert_eq!(view.date_bounds, Some((ymd(2019, 3, 1), ymd(2021, 6, 1))));
        assert_eq!(view.visible.len(), 5);
        assert_eq!(view.boxes.len(), 3);
        assert_eq!(view.trend.len(), 5);
    }

    #[test]
    fn sites_average_same_day_readings() {
        let (_, view) = setup();
        let first = &view.sites[0];
        assert_eq!(first.date, ymd(2019, 3, 1));
        assert_eq!(first.mean, 20.0);
        assert_eq!(first.count, 2);
    }

    #[test]
    fn narrowing_window_drops_rows() {
        let (ds, mut view) = setup();
        view.set_window(&ds, ymd(2019, 6, 1), ymd(2020, 12, 31));
        assert_eq!(view.visible.len(), 2);
        let years: Vec<i32> = view.maxima.iter().map(|(y, _)| *y).collect();
        assert_eq!(years, vec![2019, 2020]);
    }

    #[test]
    fn boxes_ignore_the_date_window() {
        let (ds, mut view) = setup();
        let before = view.boxes.clone();
        view.set_window(&ds, ymd(2019, 6, 1), ymd(2020, 12, 31));
        assert_eq!(view.boxes, before);
        let years: Vec<i32> = view.boxes.iter().map(|(y, _)| *y).collect();
        assert_eq!(years, vec![2019, 2020, 2021]);
    }

    #[test]
    fn empty_geology_choice_matches_nothing() {
        let (ds, _) = setup();
        let view = MoistureView::new(&ds, &[], &AppConfig::default());
        assert!(view.geology.is_empty());
        assert!(view.geology_rows.is_empty() && view.visible.is_empty());
        assert!(view.boxes.is_empty() && view.trend.is_empty());
    }

    #[test]
    fn window_is_clamped_to_bounds() {
        let (ds, mut view) = setup();
        view.set_window(&ds, ymd(2000, 1, 1), ymd(2030, 1, 1));
        assert_eq!((view.start, view.end), (ymd(2019, 3, 1), ymd(2021, 6, 1)));
    }

    #[test]
    fn geology_change_resets_window() {
        let (ds, mut view) = setup();
        view.set_window(&ds, ymd(2020, 1, 1), ymd(2020, 12, 31));
        view.select_geology(&ds, "TILL");
        assert_eq!((view.start, view.end), (ymd(2018, 1, 1), ymd(2018, 1, 1)));
        assert_eq!(view.visible.len(), 1);
        assert_eq!(view.map.center, (53.0, -2.0));
    }

    #[test]
    fn geology_without_rows_is_empty() {
        let (ds, mut view) = setup();
        view.select_geology(&ds, "SAND");
        assert_eq!(view.date_bounds, None);
        assert!(view.visible.is_empty() && view.sites.is_empty());
        assert_eq!(view.map.center, (0.0, 0.0));
    }
}
