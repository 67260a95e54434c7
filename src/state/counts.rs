use crate::config::PagesConfig;
use crate::data::aggregate::{by_count_desc, value_counts, ValueCount};
use crate::data::filter::{filtered_indices, FilterSet, Predicate};
use crate::data::trend::{lowess_trend, DEFAULT_ITERATIONS};
use crate::data::model::{Field, SampleSet};

/// Plasticity-index frequency for one geology, with its trend line.
#[derive(Debug, Clone)]
pub struct CountsView {
    pub geology_options: Vec<String>,
    pub geology: String,
    /// Ascending by plasticity index.
    pub counts: Vec<ValueCount>,
    /// Most frequent first, for the table.
    pub ranked: Vec<ValueCount>,
    pub trend: Vec<[f64; 2]>,
    trend_fraction: f64,
}

impl CountsView {
    pub fn new(dataset: &SampleSet, geology_options: &[String], pages: &PagesConfig) -> Self {
        let mut view = CountsView {
            geology_options: geology_options.to_vec(),
            geology: geology_options.first().cloned().unwrap_or_default(),
            counts: Vec::new(),
            ranked: Vec::new(),
            trend: Vec::new(),
            trend_fraction: pages.trend_fraction,
        };
        view.recompute(dataset);
        view
    }

    pub fn select_geology(&mut self, dataset: &SampleSet, geology: &str) {
        if geology != self.geology {
            self.geology = geology.to_string();
            self.recompute(dataset);
        }
    }

    pub fn title(&self) -> String {
        format!(
            "Plasticity Index vs. Count of Samples with Trendline for {}",
            self.geology
        )
    }

    fn recompute(&mut self, dataset: &SampleSet) {
        // A single-choice selector: an empty choice matches nothing.
        let filters = FilterSet::new().with(Predicate::Equals {
            field: Field::GeologyCode,
            value: self.geology.clone(),
        });
        let rows = filtered_indices(dataset, &filters);

        self.counts = value_counts(dataset, &rows, Field::PlasticityIndex);
        self.ranked = by_count_desc(&self.counts);

        let x: Vec<f64> = self.counts.iter().map(|c| c.value).collect();
        let y: Vec<f64> = self.counts.iter().map(|c| c.count as f64).collect();
        self.trend = lowess_trend(&x, &y, self.trend_fraction, DEFAULT_ITERATIONS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::{load_csv, DATED_REQUIRED};

    const CSV: &str = "\
GeologyCode,PlasticityIndex,MoistureContent,Latitude,Longitude,Date,DepthValue
LONDON CLAY FORMATION,30,25,51.5,-0.1,2020-01-01,1
LONDON CLAY FORMATION,30,25,51.5,-0.1,2020-01-02,1
LONDON CLAY FORMATION,0,25,51.5,-0.1,2020-01-03,1
LONDON CLAY FORMATION,35,25,51.5,-0.1,2020-01-04,1
GLACIAL DEPOSITS,12,25,52.5,-1.1,2020-01-05,1
";

    #[test]
    fn counts_follow_selected_geology() {
        let ds = load_csv(CSV.as_bytes(), DATED_REQUIRED).unwrap();
        let options = vec!["LONDON CLAY FORMATION".to_string(), "GLACIAL DEPOSITS".to_string()];
        let mut view = CountsView::new(&ds, &options, &PagesConfig::default());

        assert_eq!(view.counts.len(), 2);
        assert_eq!(view.ranked[0], ValueCount { value: 30.0, count: 2 });
        assert_eq!(view.trend.len(), 2);
        assert!(view.title().ends_with("LONDON CLAY FORMATION"));

        view.select_geology(&ds, "GLACIAL DEPOSITS");
        assert_eq!(view.counts, vec![ValueCount { value: 12.0, count: 1 }]);
    }

    #[test]
    fn unknown_geology_gives_empty_chart() {
        let ds = load_csv(CSV.as_bytes(), DATED_REQUIRED).unwrap();
        let mut view = CountsView::new(&ds, &[], &PagesConfig::default());
        assert!(view.counts.is_empty() && view.geology.is_empty());
        assert!(view.ranked.is_empty());
        view.select_geology(&ds, "MERCIA MUDSTONE GROUP");
        assert!(view.counts.is_empty() && view.trend.is_empty());
    }
}
