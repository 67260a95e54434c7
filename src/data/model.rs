use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::NaiveDate;

// ---------------------------------------------------------------------------
// CellValue – a single cell of the loaded table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell, used wherever columns are handled generically
/// (tables, exports, the field explorer).
/// Using `BTreeMap` / `BTreeSet` downstream so `CellValue` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Null,
}

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Number(_) => 1,
                Date(_) => 2,
                Text(_) => 3,
            }
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Number(a), Number(b)) => a.total_cmp(b),
            (Date(a), Date(b)) => a.cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            _ => discriminant(self).cmp(&discriminant(other)),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Number(v) => write!(f, "{v}"),
            CellValue::Date(d) => write!(f, "{}", d.format("%d/%m/%Y")),
            CellValue::Null => Ok(()),
        }
    }
}

impl CellValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(v) => Some(*v),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Field – the closed set of columns the dashboard understands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldKind {
    Text,
    Number,
    Date,
}

/// A known column of the sample tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    ProjectId,
    LocationId,
    Postcode,
    GeologyCode,
    Fines,
    PlasticLimit,
    LiquidLimit,
    PlasticityIndex,
    MoistureContent,
    Easting,
    Northing,
    Latitude,
    Longitude,
    Date,
    Depth,
}

impl Field {
    pub const ALL: [Field; 15] = [
        Field::ProjectId,
        Field::LocationId,
        Field::Postcode,
        Field::GeologyCode,
        Field::Fines,
        Field::PlasticLimit,
        Field::LiquidLimit,
        Field::PlasticityIndex,
        Field::MoistureContent,
        Field::Easting,
        Field::Northing,
        Field::Latitude,
        Field::Longitude,
        Field::Date,
        Field::Depth,
    ];

    /// Canonical column header, as written by the survey exports.
    pub fn header(self) -> &'static str {
        match self {
            Field::ProjectId => "ProjectID",
            Field::LocationId => "LocationID",
            Field::Postcode => "Postcode",
            Field::GeologyCode => "GeologyCode",
            Field::Fines => "Fines",
            Field::PlasticLimit => "PlasticLimit",
            Field::LiquidLimit => "LiquidLimit",
            Field::PlasticityIndex => "PlasticityIndex",
            Field::MoistureContent => "MoistureContent",
            Field::Easting => "Easting",
            Field::Northing => "Northing",
            Field::Latitude => "Latitude",
            Field::Longitude => "Longitude",
            Field::Date => "Date",
            Field::Depth => "DepthValue",
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            Field::ProjectId | Field::LocationId | Field::Postcode | Field::GeologyCode => {
                FieldKind::Text
            }
            Field::Date => FieldKind::Date,
            _ => FieldKind::Number,
        }
    }

    /// Resolve a file header to a field.
    ///
    /// Matching ignores case, spaces, underscores and hyphens, so
    /// `Geology Code`, `GeologyCode` and `geology_code` all land on
    /// [`Field::GeologyCode`].
    pub fn from_header(header: &str) -> Option<Field> {
        let key: String = header
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .flat_map(char::to_lowercase)
            .collect();

        let field = match key.as_str() {
            "projectid" | "project" => Field::ProjectId,
            "locationid" | "location" => Field::LocationId,
            "postcode" => Field::Postcode,
            "geologycode" | "geology" => Field::GeologyCode,
            "fines" => Field::Fines,
            "plasticlimit" => Field::PlasticLimit,
            "liquidlimit" => Field::LiquidLimit,
            "plasticityindex" => Field::PlasticityIndex,
            "moisturecontent" => Field::MoistureContent,
            "easting" => Field::Easting,
            "northing" => Field::Northing,
            "latitude" | "lat" => Field::Latitude,
            "longitude" | "lon" | "long" => Field::Longitude,
            "date" | "sampledate" => Field::Date,
            "depthvalue" | "depth" => Field::Depth,
            _ => return None,
        };
        Some(field)
    }

    /// Read this field from a sample as a generic cell.
    pub fn value(self, sample: &Sample) -> CellValue {
        match self.kind() {
            FieldKind::Text => self
                .text(sample)
                .map(|s| CellValue::Text(s.to_string()))
                .unwrap_or(CellValue::Null),
            FieldKind::Number => self
                .number(sample)
                .map(CellValue::Number)
                .unwrap_or(CellValue::Null),
            FieldKind::Date => sample.date.map(CellValue::Date).unwrap_or(CellValue::Null),
        }
    }

    pub fn number(self, sample: &Sample) -> Option<f64> {
        match self {
            Field::Fines => sample.fines,
            Field::PlasticLimit => sample.plastic_limit,
            Field::LiquidLimit => sample.liquid_limit,
            Field::PlasticityIndex => sample.plasticity_index,
            Field::MoistureContent => sample.moisture_content,
            Field::Easting => sample.easting,
            Field::Northing => sample.northing,
            Field::Latitude => sample.latitude,
            Field::Longitude => sample.longitude,
            Field::Depth => sample.depth,
            _ => None,
        }
    }

    pub fn text(self, sample: &Sample) -> Option<&str> {
        let s = match self {
            Field::ProjectId => &sample.project_id,
            Field::LocationId => &sample.location_id,
            Field::Postcode => &sample.postcode,
            Field::GeologyCode => &sample.geology_code,
            _ => return None,
        };
        Some(s.as_str())
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

// ---------------------------------------------------------------------------
// Sample – one laboratory measurement at a location
// ---------------------------------------------------------------------------

/// One row of a survey table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sample {
    pub project_id: String,
    pub location_id: String,
    pub postcode: String,
    pub geology_code: String,
    pub fines: Option<f64>,
    pub plastic_limit: Option<f64>,
    pub liquid_limit: Option<f64>,
    pub plasticity_index: Option<f64>,
    pub moisture_content: Option<f64>,
    pub easting: Option<f64>,
    pub northing: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub date: Option<NaiveDate>,
    pub depth: Option<f64>,
}

impl Sample {
    /// `(latitude, longitude)` when both are present and finite.
    pub fn position(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Some((lat, lon)),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// SampleSet – the complete loaded table
// ---------------------------------------------------------------------------

/// The full parsed table with pre-computed column indices.
#[derive(Debug, Clone, Default)]
pub struct SampleSet {
    /// All samples (rows), in file order.
    pub samples: Vec<Sample>,
    /// Columns present in the source file.
    pub columns: BTreeSet<Field>,
    /// For each text column the sorted set of distinct values.
    pub unique_values: BTreeMap<Field, BTreeSet<String>>,
}

impl SampleSet {
    /// Build column indices from the loaded samples.
    pub fn new(samples: Vec<Sample>, columns: BTreeSet<Field>) -> Self {
        let mut unique_values: BTreeMap<Field, BTreeSet<String>> = BTreeMap::new();

        for field in columns.iter().filter(|f| f.kind() == FieldKind::Text) {
            let values = unique_values.entry(*field).or_default();
            for sample in &samples {
                if let Some(v) = field.text(sample) {
                    values.insert(v.to_string());
                }
            }
        }

        SampleSet {
            samples,
            columns,
            unique_values,
        }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Stable sort by sample date, undated rows first.
    pub fn sort_by_date(&mut self) {
        self.samples.sort_by_key(|s| s.date);
    }

    pub fn has(&self, field: Field) -> bool {
        self.columns.contains(&field)
    }

    /// Sorted distinct values of a text column (empty if absent).
    pub fn distinct(&self, field: Field) -> Vec<String> {
        self.unique_values
            .get(&field)
            .map(|v| v.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// `(min, max)` of a numeric column over all samples.
    pub fn numeric_range(&self, field: Field) -> Option<(f64, f64)> {
        self.samples
            .iter()
            .filter_map(|s| field.number(s))
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}
