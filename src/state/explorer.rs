use std::collections::BTreeSet;

use crate::color::ColorMap;
use crate::data::aggregate::{date_to_days, grouped_mean, GroupMean};
use crate::data::filter::{filtered_indices, FilterSet};
use crate::data::model::{CellValue, Field, FieldKind, Sample, SampleSet};
use crate::data::table::{present_columns, TableColumn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Scatter,
    /// Mean of Y per distinct value of X.
    Bar,
}

impl ChartKind {
    pub const ALL: [ChartKind; 2] = [ChartKind::Scatter, ChartKind::Bar];

    pub fn label(self) -> &'static str {
        match self {
            ChartKind::Scatter => "Scatter",
            ChartKind::Bar => "Bar (mean)",
        }
    }
}

/// Free-form field explorer over the dated table.
#[derive(Debug, Clone)]
pub struct ExplorerView {
    /// Columns present in the loaded file, in display order.
    pub fields: Vec<Field>,
    pub x: Field,
    pub y: Field,
    pub chart: ChartKind,

    /// Categorical column used for colouring.
    pub color_column: Option<Field>,
    pub color_map: Option<ColorMap>,

    /// Optional `field == value` restriction.
    pub filter_field: Option<Field>,
    pub filter_value: String,

    /// Columns shown in the table and written by the export.
    pub shown: BTreeSet<Field>,

    pub visible: Vec<usize>,
    pub means: Vec<GroupMean>,
}

impl ExplorerView {
    pub fn new(dataset: &SampleSet) -> Self {
        let fields: Vec<Field> = Field::ALL.into_iter().filter(|f| dataset.has(*f)).collect();
        let pick = |preferred: Field, kind: Option<FieldKind>| {
            if fields.contains(&preferred) {
                return preferred;
            }
            fields
                .iter()
                .copied()
                .find(|f| kind.is_none_or(|k| f.kind() == k))
                .unwrap_or(preferred)
        };
        let x = pick(Field::Date, None);
        let y = pick(Field::MoistureContent, Some(FieldKind::Number));

        let mut view = ExplorerView {
            shown: fields.iter().copied().collect(),
            fields,
            x,
            y,
            chart: ChartKind::Scatter,
            color_column: None,
            color_map: None,
            filter_field: None,
            filter_value: String::new(),
            visible: Vec::new(),
            means: Vec::new(),
        };
        view.refilter(dataset);
        view
    }

    /// Fields usable as the Y axis.
    pub fn numeric_fields(&self) -> Vec<Field> {
        self.fields
            .iter()
            .copied()
            .filter(|f| f.kind() == FieldKind::Number)
            .collect()
    }

    /// Fields usable for colouring and equality filtering.
    pub fn categorical_fields(&self) -> Vec<Field> {
        self.fields
            .iter()
            .copied()
            .filter(|f| f.kind() == FieldKind::Text)
            .collect()
    }

    pub fn set_axes(&mut self, dataset: &SampleSet, x: Field, y: Field) {
        if (x, y) != (self.x, self.y) {
            self.x = x;
            self.y = y;
            self.recompute(dataset);
        }
    }

    pub fn set_chart(&mut self, dataset: &SampleSet, chart: ChartKind) {
        if chart != self.chart {
            self.chart = chart;
            self.recompute(dataset);
        }
    }

    pub fn set_color_column(&mut self, dataset: &SampleSet, column: Option<Field>) {
        self.color_column = column;
        self.color_map = column.map(|field| {
            let values: BTreeSet<CellValue> = dataset.samples.iter().map(|s| field.value(s)).collect();
            ColorMap::new(&values)
        });
    }

    /// Restrict rows to `field == value`; `None` or an empty value clears it.
    pub fn set_filter(&mut self, dataset: &SampleSet, field: Option<Field>, value: &str) {
        self.filter_field = field;
        self.filter_value = if field.is_some() { value.to_string() } else { String::new() };
        self.refilter(dataset);
    }

    pub fn toggle_column(&mut self, field: Field) {
        if !self.shown.remove(&field) {
            self.shown.insert(field);
        }
    }

    pub fn filters(&self) -> FilterSet {
        match self.filter_field {
            Some(field) => FilterSet::new().equals(field, Some(self.filter_value.as_str())),
            None => FilterSet::new(),
        }
    }

    pub fn refilter(&mut self, dataset: &SampleSet) {
        self.visible = filtered_indices(dataset, &self.filters());
        self.recompute(dataset);
    }

    fn recompute(&mut self, dataset: &SampleSet) {
        self.means = match self.chart {
            ChartKind::Bar => grouped_mean(dataset, &self.visible, self.x, self.y),
            ChartKind::Scatter => Vec::new(),
        };
        log::debug!(
            "Explorer: {} rows, {} vs {} as {:?}",
            self.visible.len(),
            self.y,
            self.x,
            self.chart
        );
    }

    /// `(row, [x, y])` for every visible sample with both coordinates.
    /// Dates map to days since the epoch, text to its rank among the
    /// distinct values.
    pub fn scatter_points(&self, dataset: &SampleSet) -> Vec<(usize, [f64; 2])> {
        let categories = dataset.distinct(self.x);
        self.visible
            .iter()
            .filter_map(|&i| {
                let sample = &dataset.samples[i];
                let x = axis_value(self.x, sample, &categories)?;
                let y = self.y.number(sample).filter(|v| v.is_finite())?;
                Some((i, [x, y]))
            })
            .collect()
    }

    /// Table columns in file order, restricted to the shown set.
    pub fn table_columns(&self, dataset: &SampleSet) -> Vec<TableColumn> {
        let fields: Vec<Field> = self.fields.iter().copied().filter(|f| self.shown.contains(f)).collect();
        present_columns(dataset, &fields)
    }
}

fn axis_value(field: Field, sample: &Sample, categories: &[String]) -> Option<f64> {
    match field.kind() {
        FieldKind::Number => field.value(sample).as_f64().filter(|v| v.is_finite()),
        FieldKind::Date => sample.date.map(date_to_days),
        FieldKind::Text => {
            let text = field.text(sample)?;
            categories.iter().position(|c| c == text).map(|p| p as f64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::{load_csv, DATED_REQUIRED};

    const CSV: &str = "\
GeologyCode,PlasticityIndex,MoistureContent,Latitude,Longitude,Date,DepthValue
CLAY,20,18,52.0,-1.0,2019-03-01,1.0
TILL,12,22,52.0,-1.0,2019-04-01,2.0
CLAY,30,40,52.2,-1.2,2019-07-01,
";

    fn setup() -> (SampleSet, ExplorerView) {
        let ds = load_csv(CSV.as_bytes(), DATED_REQUIRED).unwrap();
        let view = ExplorerView::new(&ds);
        (ds, view)
    }

    #[test]
    fn defaults_plot_moisture_over_date() {
        let (ds, view) = setup();
        assert_eq!((view.x, view.y), (Field::Date, Field::MoistureContent));
        assert_eq!(view.visible, vec![0, 1, 2]);
        assert_eq!(view.scatter_points(&ds).len(), 3);
        assert_eq!(view.table_columns(&ds).len(), 7);
    }

    #[test]
    fn bar_chart_means_per_category() {
        let (ds, mut view) = setup();
        view.set_axes(&ds, Field::GeologyCode, Field::MoistureContent);
        view.set_chart(&ds, ChartKind::Bar);
        assert_eq!(view.means.len(), 2);
        assert_eq!(view.means[0].key, "CLAY");
        assert_eq!(view.means[0].mean, 29.0);
    }

    #[test]
    fn text_axis_uses_category_rank() {
        let (ds, mut view) = setup();
        view.set_axes(&ds, Field::GeologyCode, Field::PlasticityIndex);
        let xs: Vec<f64> = view.scatter_points(&ds).iter().map(|(_, p)| p[0]).collect();
        assert_eq!(xs, vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn missing_y_values_are_skipped() {
        let (ds, mut view) = setup();
        view.set_axes(&ds, Field::Date, Field::Depth);
        let rows: Vec<usize> = view.scatter_points(&ds).iter().map(|(i, _)| *i).collect();
        assert_eq!(rows, vec![0, 1]);
    }

    #[test]
    fn equality_filter_and_colouring() {
        let (ds, mut view) = setup();
        view.set_filter(&ds, Some(Field::GeologyCode), "TILL");
        assert_eq!(view.visible, vec![1]);
        view.set_filter(&ds, None, "ignored");
        assert_eq!(view.visible.len(), 3);

        view.set_color_column(&ds, Some(Field::GeologyCode));
        let map = view.color_map.as_ref().unwrap();
        assert_ne!(
            map.color_for(&CellValue::Text("TILL".into())),
            map.color_for(&CellValue::Text("CLAY".into()))
        );
    }

    #[test]
    fn hidden_columns_leave_the_table() {
        let (ds, mut view) = setup();
        view.toggle_column(Field::Latitude);
        let titles: Vec<String> = view.table_columns(&ds).into_iter().map(|c| c.title).collect();
        assert!(!titles.contains(&"Latitude".to_string()));
        assert_eq!(titles[0], "GeologyCode");
    }
}
