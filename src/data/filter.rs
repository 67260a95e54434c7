use std::collections::BTreeSet;

use chrono::NaiveDate;

use super::classify::{Measure, Severity};
use super::model::{Field, Sample, SampleSet};

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

/// One active constraint. A constraint that is not in the [`FilterSet`]
/// imposes nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Text form of `field` equals `value`.
    Equals { field: Field, value: String },
    /// Numeric `field` is present and within `min..=max`.
    Range { field: Field, min: f64, max: f64 },
    /// Sample date is present and within `start..=end`.
    DateWindow { start: NaiveDate, end: NaiveDate },
    /// The measure's bucket is one of `buckets` (missing reads as zero).
    Severity {
        measure: Measure,
        buckets: BTreeSet<Severity>,
    },
}

impl Predicate {
    pub fn matches(&self, sample: &Sample) -> bool {
        match self {
            Predicate::Equals { field, value } => match field.text(sample) {
                Some(text) => text == value,
                None => field.value(sample).to_string() == *value,
            },
            Predicate::Range { field, min, max } => field
                .number(sample)
                .is_some_and(|v| *min <= v && v <= *max),
            Predicate::DateWindow { start, end } => {
                sample.date.is_some_and(|d| *start <= d && d <= *end)
            }
            Predicate::Severity { measure, buckets } => buckets.contains(&measure.classify(sample)),
        }
    }
}

/// A conjunction of predicates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    predicates: Vec<Predicate>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Add an equality constraint; `None` or `""` means unconstrained.
    pub fn equals(self, field: Field, value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.is_empty() => self.with(Predicate::Equals {
                field,
                value: v.to_string(),
            }),
            _ => self,
        }
    }

    pub fn range(self, field: Field, min: f64, max: f64) -> Self {
        self.with(Predicate::Range { field, min, max })
    }

    pub fn date_window(self, start: NaiveDate, end: NaiveDate) -> Self {
        self.with(Predicate::DateWindow { start, end })
    }

    pub fn severity(self, measure: Measure, buckets: BTreeSet<Severity>) -> Self {
        self.with(Predicate::Severity { measure, buckets })
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn matches(&self, sample: &Sample) -> bool {
        self.predicates.iter().all(|p| p.matches(sample))
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Return indices of samples that pass all active filters, in file order.
pub fn filtered_indices(dataset: &SampleSet, filters: &FilterSet) -> Vec<usize> {
    if filters.is_empty() {
        return (0..dataset.len()).collect();
    }
    dataset
        .samples
        .iter()
        .enumerate()
        .filter(|(_, s)| filters.matches(s))
        .map(|(i, _)| i)
        .collect()
}

/// Narrow an existing subset further.
pub fn refine(dataset: &SampleSet, indices: &[usize], filters: &FilterSet) -> Vec<usize> {
    indices
        .iter()
        .copied()
        .filter(|&i| dataset.samples.get(i).is_some_and(|s| filters.matches(s)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(project: &str, geology: &str, pi: f64, date: Option<(i32, u32, u32)>) -> Sample {
        Sample {
            project_id: project.into(),
            geology_code: geology.into(),
            plasticity_index: Some(pi),
            date: date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
            ..Default::default()
        }
    }

    fn dataset() -> SampleSet {
        let samples = vec![
            sample("P1", "LONDON CLAY FORMATION", 5.0, Some((2019, 3, 1))),
            sample("P1", "GLACIAL DEPOSITS", 15.0, Some((2020, 6, 12))),
            sample("P2", "LONDON CLAY FORMATION", 25.0, None),
            sample("P2", "OADBY TILL MEMBER", 45.0, Some((2021, 1, 30))),
            sample("P3", "GLACIAL DEPOSITS", 40.0, Some((2020, 1, 1))),
        ];
        SampleSet::new(
            samples,
            BTreeSet::from([
                Field::ProjectId,
                Field::GeologyCode,
                Field::PlasticityIndex,
                Field::Date,
            ]),
        )
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn no_constraints_returns_everything() {
        let ds = dataset();
        assert_eq!(filtered_indices(&ds, &FilterSet::new()), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn project_filter_keeps_only_that_project() {
        let ds = dataset();
        let f = FilterSet::new().equals(Field::ProjectId, Some("P1"));
        assert_eq!(filtered_indices(&ds, &f), vec![0, 1]);
    }

    #[test]
    fn blank_selection_is_unconstrained() {
        let f = FilterSet::new()
            .equals(Field::ProjectId, Some(""))
            .equals(Field::GeologyCode, None);
        assert!(f.is_empty());
    }

    #[test]
    fn ranges_are_inclusive() {
        let ds = dataset();
        let f = FilterSet::new().range(Field::PlasticityIndex, 15.0, 40.0);
        assert_eq!(filtered_indices(&ds, &f), vec![1, 2, 4]);
    }

    #[test]
    fn date_window_drops_undated_rows() {
        let ds = dataset();
        let f = FilterSet::new().date_window(ymd(2019, 1, 1), ymd(2020, 6, 12));
        assert_eq!(filtered_indices(&ds, &f), vec![0, 1, 4]);
    }

    #[test]
    fn severity_buckets_form_a_disjunction() {
        let ds = dataset();
        let f = FilterSet::new().severity(
            Measure::PlasticityIndex,
            BTreeSet::from([Severity::Low, Severity::Highest]),
        );
        assert_eq!(filtered_indices(&ds, &f), vec![0, 3, 4]);

        let none = FilterSet::new().severity(Measure::PlasticityIndex, BTreeSet::new());
        assert!(filtered_indices(&ds, &none).is_empty());
    }

    #[test]
    fn conjunction_is_order_independent() {
        let ds = dataset();
        let p1 = FilterSet::new()
            .range(Field::PlasticityIndex, 10.0, 50.0)
            .equals(Field::GeologyCode, Some("GLACIAL DEPOSITS"));
        let p2 = FilterSet::new().date_window(ymd(2020, 1, 1), ymd(2021, 12, 31));

        let a = refine(&ds, &filtered_indices(&ds, &p1), &p2);
        let b = refine(&ds, &filtered_indices(&ds, &p2), &p1);
        assert_eq!(a, b);
        assert_eq!(a, vec![1, 4]);

        let mut both = p1.clone();
        for p in p2.predicates() {
            both = both.with(p.clone());
        }
        assert_eq!(filtered_indices(&ds, &both), a);
    }

    #[test]
    fn empty_inputs_give_empty_results() {
        let empty = SampleSet::default();
        let f = FilterSet::new().equals(Field::ProjectId, Some("P1"));
        assert!(filtered_indices(&empty, &f).is_empty());

        let ds = dataset();
        let nothing = FilterSet::new().equals(Field::ProjectId, Some("P9"));
        assert!(filtered_indices(&ds, &nothing).is_empty());
    }

    #[test]
    fn equals_on_numeric_column_compares_text_form() {
        let ds = dataset();
        let f = FilterSet::new().with(Predicate::Equals {
            field: Field::PlasticityIndex,
            value: "45".into(),
        });
        assert_eq!(filtered_indices(&ds, &f), vec![3]);
    }
}
