use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use ordered_float::OrderedFloat;

use super::model::{CellValue, Field, SampleSet};

// ---------------------------------------------------------------------------
// Date axis helpers
// ---------------------------------------------------------------------------

/// Days since 1970-01-01, used as the numeric x axis for time charts.
pub fn date_to_days(date: NaiveDate) -> f64 {
    date.signed_duration_since(NaiveDate::default()).num_days() as f64
}

pub fn days_to_date(days: f64) -> Option<NaiveDate> {
    if !days.is_finite() {
        return None;
    }
    NaiveDate::default().checked_add_signed(chrono::Duration::days(days.round() as i64))
}

// ---------------------------------------------------------------------------
// Map centre
// ---------------------------------------------------------------------------

/// Mean of `(lat, lon)` pairs; `None` for an empty input.
pub fn mean_center(points: impl IntoIterator<Item = (f64, f64)>) -> Option<(f64, f64)> {
    let (mut lat, mut lon, mut n) = (0.0, 0.0, 0usize);
    for (a, b) in points {
        lat += a;
        lon += b;
        n += 1;
    }
    (n > 0).then(|| (lat / n as f64, lon / n as f64))
}

// ---------------------------------------------------------------------------
// Plasticity index value counts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueCount {
    pub value: f64,
    pub count: usize,
}

/// Count samples per distinct value of `field`, ascending by value.
/// Zero and missing values are dropped.
pub fn value_counts(dataset: &SampleSet, indices: &[usize], field: Field) -> Vec<ValueCount> {
    let mut counts: BTreeMap<OrderedFloat<f64>, usize> = BTreeMap::new();
    for &i in indices {
        let Some(v) = dataset.samples.get(i).and_then(|s| field.number(s)) else {
            continue;
        };
        if v == 0.0 || !v.is_finite() {
            continue;
        }
        *counts.entry(OrderedFloat(v)).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(value, count)| ValueCount {
            value: value.into_inner(),
            count,
        })
        .collect()
}

/// Most frequent first; ties keep ascending value order.
pub fn by_count_desc(counts: &[ValueCount]) -> Vec<ValueCount> {
    let mut sorted = counts.to_vec();
    sorted.sort_by(|a, b| b.count.cmp(&a.count));
    sorted
}

// ---------------------------------------------------------------------------
// Per-site averages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct SiteAverage {
    pub date: NaiveDate,
    pub geology: String,
    pub latitude: f64,
    pub longitude: f64,
    pub mean: f64,
    pub count: usize,
}

/// Mean of `field` per (date, geology, latitude, longitude), sorted by
/// that key. Rows missing any key part or the value are skipped.
pub fn site_averages(dataset: &SampleSet, indices: &[usize], field: Field) -> Vec<SiteAverage> {
    type Key = (NaiveDate, String, OrderedFloat<f64>, OrderedFloat<f64>);
    let mut groups: BTreeMap<Key, (f64, usize)> = BTreeMap::new();

    for &i in indices {
        let Some(s) = dataset.samples.get(i) else { continue };
        let (Some(date), Some((lat, lon)), Some(v)) = (s.date, s.position(), field.number(s))
        else {
            continue;
        };
        let entry = groups
            .entry((date, s.geology_code.clone(), OrderedFloat(lat), OrderedFloat(lon)))
            .or_insert((0.0, 0));
        entry.0 += v;
        entry.1 += 1;
    }

    groups
        .into_iter()
        .map(|((date, geology, lat, lon), (sum, n))| SiteAverage {
            date,
            geology,
            latitude: lat.into_inner(),
            longitude: lon.into_inner(),
            mean: sum / n as f64,
            count: n,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Yearly summaries
// ---------------------------------------------------------------------------

/// Index of the sample with the largest `field` in each calendar year.
/// Ties go to the first sample in `indices` order. Sorted by year.
pub fn yearly_maxima(dataset: &SampleSet, indices: &[usize], field: Field) -> Vec<(i32, usize)> {
    let mut best: BTreeMap<i32, (usize, f64)> = BTreeMap::new();
    for &i in indices {
        let Some(s) = dataset.samples.get(i) else { continue };
        let (Some(date), Some(v)) = (s.date, field.number(s)) else {
            continue;
        };
        if !v.is_finite() {
            continue;
        }
        best.entry(date.year())
            .and_modify(|cur| {
                if v > cur.1 {
                    *cur = (i, v);
                }
            })
            .or_insert((i, v));
    }
    best.into_iter().map(|(year, (i, _))| (year, i)).collect()
}

/// Five-number summary plus mean and standard deviation, as drawn by a box
/// plot with mean/sd markers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxStats {
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
    pub mean: f64,
    pub std_dev: f64,
    pub count: usize,
}

impl BoxStats {
    /// Quartiles use linear interpolation between order statistics.
    /// Whiskers reach the furthest points within 1.5 IQR of the box.
    pub fn from_values(values: &[f64]) -> Option<BoxStats> {
        let mut v: Vec<f64> = values.iter().copied().filter(|x| x.is_finite()).collect();
        if v.is_empty() {
            return None;
        }
        v.sort_by(|a, b| a.total_cmp(b));

        let q1 = quantile(&v, 0.25);
        let median = quantile(&v, 0.5);
        let q3 = quantile(&v, 0.75);
        let iqr = q3 - q1;
        let lo_fence = q1 - 1.5 * iqr;
        let hi_fence = q3 + 1.5 * iqr;

        let lower_whisker = v.iter().copied().find(|x| *x >= lo_fence).unwrap_or(q1);
        let upper_whisker = v.iter().rev().copied().find(|x| *x <= hi_fence).unwrap_or(q3);

        let n = v.len();
        let mean = v.iter().sum::<f64>() / n as f64;
        let std_dev = if n > 1 {
            (v.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64).sqrt()
        } else {
            0.0
        };

        Some(BoxStats {
            lower_whisker,
            q1,
            median,
            q3,
            upper_whisker,
            mean,
            std_dev,
            count: n,
        })
    }
}

/// `p`-quantile of sorted data, linear interpolation.
fn quantile(sorted: &[f64], p: f64) -> f64 {
    let pos = p * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// One box per calendar year, sorted by year.
pub fn yearly_box_stats(dataset: &SampleSet, indices: &[usize], field: Field) -> Vec<(i32, BoxStats)> {
    let mut by_year: BTreeMap<i32, Vec<f64>> = BTreeMap::new();
    for &i in indices {
        let Some(s) = dataset.samples.get(i) else { continue };
        if let (Some(date), Some(v)) = (s.date, field.number(s)) {
            by_year.entry(date.year()).or_default().push(v);
        }
    }
    by_year
        .into_iter()
        .filter_map(|(year, values)| BoxStats::from_values(&values).map(|b| (year, b)))
        .collect()
}

// ---------------------------------------------------------------------------
// Grouped means (field explorer)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct GroupMean {
    pub key: String,
    pub mean: f64,
    pub count: usize,
}

/// Mean of numeric `value` per distinct rendering of `group`, sorted by key.
pub fn grouped_mean(dataset: &SampleSet, indices: &[usize], group: Field, value: Field) -> Vec<GroupMean> {
    let mut groups: BTreeMap<CellValue, (f64, usize)> = BTreeMap::new();
    for &i in indices {
        let Some(s) = dataset.samples.get(i) else { continue };
        let Some(v) = value.number(s).filter(|v| v.is_finite()) else {
            continue;
        };
        let entry = groups.entry(group.value(s)).or_insert((0.0, 0));
        entry.0 += v;
        entry.1 += 1;
    }
    groups
        .into_iter()
        .map(|(key, (sum, n))| GroupMean {
            key: key.to_string(),
            mean: sum / n as f64,
            count: n,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::data::model::Sample;

    fn dated(date: (i32, u32, u32), geology: &str, pos: (f64, f64), mc: f64, pi: f64) -> Sample {
        Sample {
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2),
            geology_code: geology.into(),
            latitude: Some(pos.0),
            longitude: Some(pos.1),
            moisture_content: Some(mc),
            plasticity_index: Some(pi),
            ..Default::default()
        }
    }

    fn set(samples: Vec<Sample>) -> SampleSet {
        SampleSet::new(
            samples,
            BTreeSet::from([
                Field::Date,
                Field::GeologyCode,
                Field::Latitude,
                Field::Longitude,
                Field::MoistureContent,
                Field::PlasticityIndex,
            ]),
        )
    }

    fn all(ds: &SampleSet) -> Vec<usize> {
        (0..ds.len()).collect()
    }

    #[test]
    fn value_counts_drop_zero_and_sort_by_value() {
        let ds = set(vec![
            dated((2020, 1, 1), "G", (1.0, 1.0), 1.0, 20.0),
            dated((2020, 1, 1), "G", (1.0, 1.0), 1.0, 0.0),
            dated((2020, 1, 1), "G", (1.0, 1.0), 1.0, 12.0),
            dated((2020, 1, 1), "G", (1.0, 1.0), 1.0, 20.0),
            Sample::default(),
        ]);
        let counts = value_counts(&ds, &all(&ds), Field::PlasticityIndex);
        assert_eq!(
            counts,
            vec![
                ValueCount { value: 12.0, count: 1 },
                ValueCount { value: 20.0, count: 2 },
            ]
        );
        let desc = by_count_desc(&counts);
        assert_eq!(desc[0].value, 20.0);
    }

    #[test]
    fn site_averages_group_by_date_geology_and_position() {
        let ds = set(vec![
            dated((2020, 5, 1), "CLAY", (52.0, -1.0), 20.0, 1.0),
            dated((2020, 5, 1), "CLAY", (52.0, -1.0), 30.0, 1.0),
            dated((2020, 5, 1), "CLAY", (52.5, -1.0), 8.0, 1.0),
            dated((2020, 5, 2), "CLAY", (52.0, -1.0), 50.0, 1.0),
        ]);
        let avg = site_averages(&ds, &all(&ds), Field::MoistureContent);
        assert_eq!(avg.len(), 3);
        assert_eq!(avg[0].mean, 25.0);
        assert_eq!(avg[0].count, 2);
        assert_eq!(avg[1].latitude, 52.5);
        assert_eq!(avg[2].mean, 50.0);
    }

    #[test]
    fn yearly_maxima_keep_first_tie() {
        let ds = set(vec![
            dated((2019, 2, 1), "G", (0.0, 0.0), 30.0, 1.0),
            dated((2019, 8, 1), "G", (0.0, 0.0), 35.0, 1.0),
            dated((2019, 9, 1), "G", (0.0, 0.0), 35.0, 1.0),
            dated((2020, 1, 1), "G", (0.0, 0.0), 12.0, 1.0),
        ]);
        let max = yearly_maxima(&ds, &all(&ds), Field::MoistureContent);
        assert_eq!(max, vec![(2019, 1), (2020, 3)]);
    }

    #[test]
    fn box_stats_interpolate_and_clip_whiskers() {
        let b = BoxStats::from_values(&[1.0, 2.0, 3.0, 4.0, 100.0]).unwrap();
        assert_eq!(b.q1, 2.0);
        assert_eq!(b.median, 3.0);
        assert_eq!(b.q3, 4.0);
        assert_eq!(b.lower_whisker, 1.0);
        // 100 is beyond q3 + 1.5 * IQR = 7.
        assert_eq!(b.upper_whisker, 4.0);
        assert_eq!(b.mean, 22.0);
        assert_eq!(b.count, 5);

        let even = BoxStats::from_values(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(even.median, 2.5);
        assert_eq!(even.q1, 1.75);

        let single = BoxStats::from_values(&[7.0]).unwrap();
        assert_eq!(single.std_dev, 0.0);
        assert!(BoxStats::from_values(&[]).is_none());
    }

    #[test]
    fn yearly_boxes_are_sorted_by_year() {
        let ds = set(vec![
            dated((2021, 2, 1), "G", (0.0, 0.0), 10.0, 1.0),
            dated((2019, 2, 1), "G", (0.0, 0.0), 20.0, 1.0),
            dated((2021, 3, 1), "G", (0.0, 0.0), 30.0, 1.0),
        ]);
        let boxes = yearly_box_stats(&ds, &all(&ds), Field::MoistureContent);
        let years: Vec<i32> = boxes.iter().map(|(y, _)| *y).collect();
        assert_eq!(years, vec![2019, 2021]);
        assert_eq!(boxes[1].1.mean, 20.0);
    }

    #[test]
    fn mean_center_of_nothing_is_none() {
        assert_eq!(mean_center(std::iter::empty()), None);
        assert_eq!(mean_center([(50.0, -2.0), (52.0, 0.0)]), Some((51.0, -1.0)));
    }

    #[test]
    fn grouped_mean_per_category() {
        let ds = set(vec![
            dated((2020, 1, 1), "A", (0.0, 0.0), 10.0, 1.0),
            dated((2020, 1, 1), "B", (0.0, 0.0), 40.0, 1.0),
            dated((2020, 1, 1), "A", (0.0, 0.0), 20.0, 1.0),
        ]);
        let g = grouped_mean(&ds, &all(&ds), Field::GeologyCode, Field::MoistureContent);
        assert_eq!(g.len(), 2);
        assert_eq!(g[0].key, "A");
        assert_eq!(g[0].mean, 15.0);
        assert_eq!(g[1].count, 1);
    }

    #[test]
    fn day_axis_round_trips() {
        let d = NaiveDate::from_ymd_opt(2022, 3, 14).unwrap();
        assert_eq!(days_to_date(date_to_days(d)), Some(d));
        assert_eq!(days_to_date(f64::NAN), None);
    }
}
