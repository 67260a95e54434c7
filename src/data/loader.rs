use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{Array, AsArray};
use arrow::compute::{cast_with_options, CastOptions};
use arrow::datatypes::{DataType, Date32Type, Float64Type};
use chrono::{NaiveDate, NaiveDateTime};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::model::{CellValue, Field, FieldKind, Sample, SampleSet};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("parsing JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("reading parquet: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
    #[error("reading parquet column: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),
    #[error("unexpected layout: {0}")]
    Layout(String),
    #[error("missing required column(s): {}", .0.iter().map(|f| f.header()).collect::<Vec<_>>().join(", "))]
    MissingColumns(Vec<Field>),
    #[error("row {row}, column {column}: '{text}' is not a valid {expected}")]
    InvalidValue {
        row: usize,
        column: Field,
        text: String,
        expected: &'static str,
    },
}

// ---------------------------------------------------------------------------
// Required columns per dataset role
// ---------------------------------------------------------------------------

/// Columns the postcode page cannot work without.
pub const POINTS_REQUIRED: &[Field] = &[
    Field::ProjectId,
    Field::LocationId,
    Field::Postcode,
    Field::GeologyCode,
    Field::PlasticityIndex,
    Field::MoistureContent,
    Field::Latitude,
    Field::Longitude,
];

/// Columns the time-series pages cannot work without.
pub const DATED_REQUIRED: &[Field] = &[
    Field::GeologyCode,
    Field::PlasticityIndex,
    Field::MoistureContent,
    Field::Latitude,
    Field::Longitude,
    Field::Date,
    Field::Depth,
];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a sample table from a file. Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one sample per row
/// * `.parquet` – one column per field (as written by pandas or polars)
/// * `.json`    – `[{ "ProjectID": ..., "PlasticityIndex": ..., ... }, ...]`
///
/// Every column in `required` must be present; all missing ones are
/// reported together.
pub fn load_file(path: &Path, required: &[Field]) -> Result<SampleSet, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let io_err = |source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    };

    match ext.as_str() {
        "csv" => {
            let file = std::fs::File::open(path).map_err(io_err)?;
            load_csv(file, required)
        }
        "json" => {
            let text = std::fs::read_to_string(path).map_err(io_err)?;
            load_json(&text, required)
        }
        "parquet" | "pq" => {
            let file = std::fs::File::open(path).map_err(io_err)?;
            load_parquet(file, required)
        }
        other => Err(LoadError::UnsupportedFormat(other.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Row assembly shared by all formats
// ---------------------------------------------------------------------------

fn check_required(columns: &BTreeSet<Field>, required: &[Field]) -> Result<(), LoadError> {
    let missing: Vec<Field> = required
        .iter()
        .copied()
        .filter(|f| !columns.contains(f))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(LoadError::MissingColumns(missing))
    }
}

/// Map each header to a field. The first occurrence wins if two headers
/// normalise to the same field.
fn resolve_headers<'a>(headers: impl Iterator<Item = &'a str>) -> Vec<Option<Field>> {
    let mut seen = BTreeSet::new();
    headers
        .map(|h| match Field::from_header(h) {
            Some(f) if seen.insert(f) => Some(f),
            Some(f) => {
                log::debug!("Ignoring duplicate column '{h}' (already have {f})");
                None
            }
            None => {
                log::debug!("Ignoring unknown column '{h}'");
                None
            }
        })
        .collect()
}

fn build_sample(row: usize, cells: Vec<(Field, CellValue)>) -> Result<Sample, LoadError> {
    let mut sample = Sample::default();
    for (field, cell) in cells {
        match field.kind() {
            FieldKind::Text => {
                let text = cell_to_text(cell);
                match field {
                    Field::ProjectId => sample.project_id = text,
                    Field::LocationId => sample.location_id = text,
                    Field::Postcode => sample.postcode = text,
                    Field::GeologyCode => sample.geology_code = text,
                    _ => {}
                }
            }
            FieldKind::Number => {
                let v = cell_to_number(row, field, cell)?;
                match field {
                    Field::Fines => sample.fines = v,
                    Field::PlasticLimit => sample.plastic_limit = v,
                    Field::LiquidLimit => sample.liquid_limit = v,
                    Field::PlasticityIndex => sample.plasticity_index = v,
                    Field::MoistureContent => sample.moisture_content = v,
                    Field::Easting => sample.easting = v,
                    Field::Northing => sample.northing = v,
                    Field::Latitude => sample.latitude = v,
                    Field::Longitude => sample.longitude = v,
                    Field::Depth => sample.depth = v,
                    _ => {}
                }
            }
            FieldKind::Date => sample.date = cell_to_date(row, field, cell)?,
        }
    }
    Ok(sample)
}

fn cell_to_text(cell: CellValue) -> String {
    match cell {
        CellValue::Text(s) => s.trim().to_string(),
        CellValue::Null => String::new(),
        other => other.to_string(),
    }
}

fn cell_to_number(row: usize, column: Field, cell: CellValue) -> Result<Option<f64>, LoadError> {
    match cell {
        CellValue::Number(v) if v.is_nan() => Ok(None),
        CellValue::Number(v) => Ok(Some(v)),
        CellValue::Null => Ok(None),
        CellValue::Text(s) => {
            let t = s.trim();
            if t.is_empty() || t.eq_ignore_ascii_case("nan") {
                return Ok(None);
            }
            t.parse::<f64>()
                .map(Some)
                .map_err(|_| LoadError::InvalidValue {
                    row,
                    column,
                    text: s.clone(),
                    expected: "number",
                })
        }
        CellValue::Date(d) => Err(LoadError::InvalidValue {
            row,
            column,
            text: d.to_string(),
            expected: "number",
        }),
    }
}

fn cell_to_date(row: usize, column: Field, cell: CellValue) -> Result<Option<NaiveDate>, LoadError> {
    match cell {
        CellValue::Date(d) => Ok(Some(d)),
        CellValue::Null => Ok(None),
        CellValue::Text(s) => {
            if s.trim().is_empty() {
                return Ok(None);
            }
            parse_date(&s).map(Some).ok_or(LoadError::InvalidValue {
                row,
                column,
                text: s,
                expected: "date",
            })
        }
        CellValue::Number(v) => Err(LoadError::InvalidValue {
            row,
            column,
            text: v.to_string(),
            expected: "date",
        }),
    }
}

/// Accepts ISO dates, UK `dd/mm/yyyy`, and ISO date-times (time dropped).
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let t = text.trim();
    for fmt in ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(t, fmt) {
            return Some(d);
        }
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(t, fmt) {
            return Some(dt.date());
        }
    }
    None
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one sample per row.
/// Cells are kept as text here and typed per field in `build_sample`.
pub fn load_csv<R: Read>(input: R, required: &[Field]) -> Result<SampleSet, LoadError> {
    let mut reader = csv::Reader::from_reader(input);
    let fields = resolve_headers(reader.headers()?.iter());

    let columns: BTreeSet<Field> = fields.iter().flatten().copied().collect();
    check_required(&columns, required)?;

    let mut samples = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result?;
        let cells: Vec<(Field, CellValue)> = fields
            .iter()
            .zip(record.iter())
            .filter_map(|(f, text)| f.map(|f| (f, CellValue::Text(text.to_string()))))
            .collect();
        samples.push(build_sample(row_no, cells)?);
    }

    Ok(SampleSet::new(samples, columns))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, the default `df.to_json(orient='records')`:
///
/// ```json
/// [
///   { "ProjectID": "P1", "PlasticityIndex": 23.0, "Date": "2020-05-01", ... },
///   ...
/// ]
/// ```
pub fn load_json(text: &str, required: &[Field]) -> Result<SampleSet, LoadError> {
    let root: JsonValue = serde_json::from_str(text)?;
    let records = root
        .as_array()
        .ok_or_else(|| LoadError::Layout("expected top-level JSON array".into()))?;

    let mut columns = BTreeSet::new();
    let mut rows = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .ok_or_else(|| LoadError::Layout(format!("row {i} is not a JSON object")))?;

        let fields = resolve_headers(obj.keys().map(String::as_str));
        let cells: Vec<(Field, CellValue)> = fields
            .into_iter()
            .zip(obj.values())
            .filter_map(|(f, v)| f.map(|f| (f, json_to_cell(v))))
            .collect();
        columns.extend(cells.iter().map(|(f, _)| *f));
        rows.push(cells);
    }

    check_required(&columns, required)?;

    let samples = rows
        .into_iter()
        .enumerate()
        .map(|(i, cells)| build_sample(i, cells))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SampleSet::new(samples, columns))
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::Text(s.clone()),
        JsonValue::Number(n) => match n.as_f64() {
            Some(f) => CellValue::Number(f),
            None => CellValue::Text(n.to_string()),
        },
        JsonValue::Null => CellValue::Null,
        other => CellValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one column per field.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`). String columns are read as text and
/// typed like CSV cells, so `dd/mm/yyyy` dates and bad numbers behave the
/// same in every format. Other columns are cast to the arrow type matching
/// their field (Utf8, Float64, Date32), so integer ids, float measurements
/// and timestamp dates are all accepted. A cast that would lose a value
/// fails the load.
pub fn load_parquet(file: std::fs::File, required: &[Field]) -> Result<SampleSet, LoadError> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

    let fields = resolve_headers(builder.schema().fields().iter().map(|f| f.name().as_str()));
    let columns: BTreeSet<Field> = fields.iter().flatten().copied().collect();
    check_required(&columns, required)?;

    let reader = builder.build()?;
    let mut samples = Vec::new();

    for batch_result in reader {
        let batch = batch_result?;

        // Cast each known column once per batch.
        let mut typed: BTreeMap<Field, (FieldKind, Arc<dyn Array>)> = BTreeMap::new();
        for (idx, field) in fields.iter().enumerate() {
            let Some(field) = field else { continue };
            let source = batch.column(idx);
            let kind = if is_string(source.data_type()) {
                FieldKind::Text
            } else {
                field.kind()
            };
            let target = match kind {
                FieldKind::Text => DataType::Utf8,
                FieldKind::Number => DataType::Float64,
                FieldKind::Date => DataType::Date32,
            };
            let options = CastOptions {
                safe: false,
                ..Default::default()
            };
            typed.insert(*field, (kind, cast_with_options(source, &target, &options)?));
        }

        for row in 0..batch.num_rows() {
            let cells: Vec<(Field, CellValue)> = typed
                .iter()
                .map(|(field, (kind, col))| (*field, extract_cell(*kind, col, row)))
                .collect();
            samples.push(build_sample(samples.len(), cells)?);
        }
    }

    Ok(SampleSet::new(samples, columns))
}

fn is_string(data_type: &DataType) -> bool {
    matches!(data_type, DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View)
}

/// Extract a single cell from a column already cast to `kind`'s type.
fn extract_cell(kind: FieldKind, col: &Arc<dyn Array>, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    match kind {
        FieldKind::Text => CellValue::Text(col.as_string::<i32>().value(row).to_string()),
        FieldKind::Number => CellValue::Number(col.as_primitive::<Float64Type>().value(row)),
        FieldKind::Date => col
            .as_primitive::<Date32Type>()
            .value_as_date(row)
            .map(CellValue::Date)
            .unwrap_or(CellValue::Null),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POINTS_CSV: &str = "\
ProjectID,LocationID,Postcode,Geology Code,Fines,PlasticLimit,LiquidLimit,PlasticityIndex,MoistureContent,Easting,Northing,Latitude,Longitude,Remarks
101,BH1,LE1 5,OADBY TILL MEMBER,55,18,40,22,19.5,458000,304000,52.63,-1.13,ok
102,BH2,NW3 2,LONDON CLAY FORMATION,,25,75,50,31,,,51.55,-0.17,
";

    #[test]
    fn csv_with_drifted_headers_loads() {
        let set = load_csv(POINTS_CSV.as_bytes(), POINTS_REQUIRED).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.has(Field::GeologyCode));
        assert!(set.has(Field::Easting));

        let first = &set.samples[0];
        assert_eq!(first.project_id, "101");
        assert_eq!(first.geology_code, "OADBY TILL MEMBER");
        assert_eq!(first.plasticity_index, Some(22.0));
        assert_eq!(first.position(), Some((52.63, -1.13)));

        let second = &set.samples[1];
        assert_eq!(second.fines, None);
        assert_eq!(second.easting, None);
    }

    #[test]
    fn all_missing_required_columns_are_reported() {
        let csv = "ProjectID,PlasticityIndex\nP1,12\n";
        let err = load_csv(csv.as_bytes(), POINTS_REQUIRED).unwrap_err();
        match &err {
            LoadError::MissingColumns(missing) => {
                assert!(missing.contains(&Field::Latitude));
                assert!(missing.contains(&Field::GeologyCode));
                assert!(!missing.contains(&Field::ProjectId));
            }
            other => panic!("unexpected error: {other}"),
        }
        let msg = err.to_string();
        assert!(msg.contains("Latitude") && msg.contains("GeologyCode"), "{msg}");
    }

    #[test]
    fn bad_number_names_row_and_column() {
        let csv = "GeologyCode,PlasticityIndex\nCLAY,12\nCLAY,twelve\n";
        let err = load_csv(csv.as_bytes(), &[]).unwrap_err();
        match err {
            LoadError::InvalidValue { row, column, text, .. } => {
                assert_eq!(row, 1);
                assert_eq!(column, Field::PlasticityIndex);
                assert_eq!(text, "twelve");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn dates_in_several_layouts() {
        assert_eq!(parse_date("2020-05-01"), NaiveDate::from_ymd_opt(2020, 5, 1));
        assert_eq!(parse_date("01/05/2020"), NaiveDate::from_ymd_opt(2020, 5, 1));
        assert_eq!(
            parse_date("2020-05-01 13:45:00"),
            NaiveDate::from_ymd_opt(2020, 5, 1)
        );
        assert_eq!(parse_date("yesterday"), None);
    }

    #[test]
    fn json_records_load() {
        let json = r#"[
            {"GeologyCode": "GLACIAL DEPOSITS", "PlasticityIndex": 18, "MoistureContent": 21.5,
             "Latitude": 52.1, "Longitude": -1.5, "Date": "2021-07-04", "DepthValue": 1.5},
            {"GeologyCode": "GLACIAL DEPOSITS", "PlasticityIndex": null, "MoistureContent": 12,
             "Latitude": 52.2, "Longitude": -1.4, "Date": "05/08/2022", "DepthValue": 2}
        ]"#;
        let set = load_json(json, DATED_REQUIRED).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.samples[0].date, NaiveDate::from_ymd_opt(2021, 7, 4));
        assert_eq!(set.samples[1].plasticity_index, None);
        assert_eq!(set.samples[1].depth, Some(2.0));
    }

    #[test]
    fn json_must_be_an_array() {
        let err = load_json(r#"{"rows": []}"#, &[]).unwrap_err();
        assert!(matches!(err, LoadError::Layout(_)));
    }

    #[test]
    fn file_dispatch_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.xlsx");
        std::fs::write(&path, b"").unwrap();
        let err = load_file(&path, &[]).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat(ext) if ext == "xlsx"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_file(Path::new("/definitely/not/here.csv"), &[]).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn csv_file_on_disk_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Points.csv");
        std::fs::write(&path, POINTS_CSV).unwrap();
        let set = load_file(&path, POINTS_REQUIRED).unwrap();
        assert_eq!(set.distinct(Field::ProjectId), vec!["101", "102"]);
    }

    #[test]
    fn parquet_round_trip_with_integer_ids_and_dates() {
        use arrow::array::{Date32Array, Float64Array, Int64Array, StringArray};
        use arrow::datatypes::{Field as ArrowField, Schema};
        use arrow::record_batch::RecordBatch;
        use parquet::arrow::ArrowWriter;

        let schema = Arc::new(Schema::new(vec![
            ArrowField::new("ProjectID", DataType::Int64, false),
            ArrowField::new("GeologyCode", DataType::Utf8, false),
            ArrowField::new("PlasticityIndex", DataType::Float64, true),
            ArrowField::new("Date", DataType::Date32, true),
        ]));
        // 18_262 days after the epoch is 2020-01-01.
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int64Array::from(vec![7, 8])),
                Arc::new(StringArray::from(vec!["CLAY", "TILL"])),
                Arc::new(Float64Array::from(vec![Some(12.0), None])),
                Arc::new(Date32Array::from(vec![Some(18_262), None])),
            ],
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("samples.parquet");
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let set = load_file(&path, &[Field::ProjectId, Field::Date]).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.samples[0].project_id, "7");
        assert_eq!(set.samples[0].date, NaiveDate::from_ymd_opt(2020, 1, 1));
        assert_eq!(set.samples[1].plasticity_index, None);
        assert_eq!(set.samples[1].date, None);
    }

    fn write_text_parquet(dir: &Path, pi: &[&str], dates: &[&str]) -> PathBuf {
        use arrow::array::StringArray;
        use arrow::datatypes::{Field as ArrowField, Schema};
        use arrow::record_batch::RecordBatch;
        use parquet::arrow::ArrowWriter;

        let schema = Arc::new(Schema::new(vec![
            ArrowField::new("GeologyCode", DataType::Utf8, false),
            ArrowField::new("PlasticityIndex", DataType::Utf8, true),
            ArrowField::new("Date", DataType::Utf8, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["CLAY"; pi.len()])),
                Arc::new(StringArray::from(pi.to_vec())),
                Arc::new(StringArray::from(dates.to_vec())),
            ],
        )
        .unwrap();

        let path = dir.join("text.parquet");
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
        path
    }

    #[test]
    fn parquet_text_cells_parse_like_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_text_parquet(dir.path(), &["12", ""], &["01/05/2020", "2021-02-03"]);
        let set = load_file(&path, &[Field::Date]).unwrap();
        assert_eq!(set.samples[0].plasticity_index, Some(12.0));
        assert_eq!(set.samples[0].date, NaiveDate::from_ymd_opt(2020, 5, 1));
        assert_eq!(set.samples[1].plasticity_index, None);
        assert_eq!(set.samples[1].date, NaiveDate::from_ymd_opt(2021, 2, 3));
    }

    #[test]
    fn parquet_bad_text_names_row_and_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_text_parquet(dir.path(), &["12", "twelve"], &["2020-01-01", "2020-01-02"]);
        match load_file(&path, &[]).unwrap_err() {
            LoadError::InvalidValue { row, column, text, .. } => {
                assert_eq!(row, 1);
                assert_eq!(column, Field::PlasticityIndex);
                assert_eq!(text, "twelve");
            }
            other => panic!("unexpected error: {other}"),
        }

        let path = write_text_parquet(dir.path(), &["12"], &["32/13/2020"]);
        match load_file(&path, &[]).unwrap_err() {
            LoadError::InvalidValue { column, text, .. } => {
                assert_eq!(column, Field::Date);
                assert_eq!(text, "32/13/2020");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
