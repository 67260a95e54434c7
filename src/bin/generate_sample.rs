use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Date32Array, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, NaiveDate};
use parquet::arrow::ArrowWriter;
use serde_json::{json, Value};

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

// ---------------------------------------------------------------------------
// Survey layout
// ---------------------------------------------------------------------------

/// `(postcode, project, centre lat, centre lon)`.
const AREAS: [(&str, &str, f64, f64); 4] = [
    ("LE1", "P1001", 52.634, -1.132),
    ("NW3", "P1002", 51.553, -0.174),
    ("B15", "P1003", 52.463, -1.923),
    ("NG7", "P1004", 52.953, -1.186),
];

/// `(geology, mean PI, mean moisture content)`.
const GEOLOGIES: [(&str, f64, f64); 4] = [
    ("GLACIAL DEPOSITS", 18.0, 21.0),
    ("LONDON CLAY FORMATION", 36.0, 30.0),
    ("MERCIA MUDSTONE GROUP", 22.0, 19.0),
    ("OADBY TILL MEMBER", 15.0, 17.0),
];

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

/// Rough national-grid style coordinates, good enough for demo tables.
fn easting_northing(lat: f64, lon: f64) -> (f64, f64) {
    ((400_000.0 + (lon + 2.0) * 69_000.0).round(), ((lat - 49.0) * 111_000.0).round())
}

struct DatedRow {
    project: String,
    location: String,
    geology: &'static str,
    pi: f64,
    mc: f64,
    lat: f64,
    lon: f64,
    date: NaiveDate,
    depth: f64,
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

fn write_points(path: &Path, rng: &mut SimpleRng) -> Result<usize> {
    let mut w = csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    w.write_record([
        "ProjectID",
        "LocationID",
        "Postcode",
        "GeologyCode",
        "Fines",
        "PlasticLimit",
        "LiquidLimit",
        "PlasticityIndex",
        "MoistureContent",
        "Easting",
        "Northing",
        "Latitude",
        "Longitude",
    ])?;

    let mut rows = 0;
    for (postcode, project, lat0, lon0) in AREAS {
        for n in 0..30 {
            let (geology, pi_mean, mc_mean) = GEOLOGIES[rng.below(GEOLOGIES.len())];
            let pi = rng.gauss(pi_mean, 9.0).clamp(2.0, 70.0).round();
            let pl = round1(rng.gauss(20.0, 3.0).clamp(10.0, 35.0));
            let lat = lat0 + rng.gauss(0.0, 0.02);
            let lon = lon0 + rng.gauss(0.0, 0.03);
            let (e, north) = easting_northing(lat, lon);
            w.write_record([
                project.to_string(),
                format!("BH{:02}", n + 1),
                postcode.to_string(),
                geology.to_string(),
                format!("{:.0}", rng.gauss(70.0, 15.0).clamp(5.0, 100.0)),
                pl.to_string(),
                round1(pl + pi).to_string(),
                pi.to_string(),
                round1(rng.gauss(mc_mean, 5.0).clamp(3.0, 60.0)).to_string(),
                e.to_string(),
                north.to_string(),
                format!("{lat:.5}"),
                format!("{lon:.5}"),
            ])?;
            rows += 1;
        }
    }
    w.flush()?;
    Ok(rows)
}

fn dated_rows(rng: &mut SimpleRng) -> Result<Vec<DatedRow>> {
    let first = NaiveDate::from_ymd_opt(2015, 1, 1).context("start date")?;
    let mut rows = Vec::new();
    for (g, (geology, pi_mean, mc_mean)) in GEOLOGIES.into_iter().enumerate() {
        let (_, project, lat0, lon0) = AREAS[g];
        for site in 0..4 {
            let lat = ((lat0 + rng.gauss(0.0, 0.3)) * 1000.0).round() / 1000.0;
            let lon = ((lon0 + rng.gauss(0.0, 0.3)) * 1000.0).round() / 1000.0;
            for _ in 0..40 {
                let date = first + chrono::Duration::days(rng.below(9 * 365) as i64);
                let season = (2.0 * std::f64::consts::PI * f64::from(date.ordinal()) / 365.0).cos();
                // Wetter in winter, slight drying trend over the years.
                let drift = -0.4 * f64::from(date.year() - 2015);
                rows.push(DatedRow {
                    project: project.to_string(),
                    location: format!("WS{:02}", site + 1),
                    geology,
                    pi: rng.gauss(pi_mean, 7.0).clamp(0.0, 70.0).round(),
                    mc: round1((mc_mean + 5.0 * season + drift + rng.gauss(0.0, 3.0)).max(2.0)),
                    lat,
                    lon,
                    date,
                    depth: round1(rng.gauss(1.5, 0.6).clamp(0.3, 4.0)),
                });
            }
        }
    }
    rows.sort_by_key(|r| r.date);
    Ok(rows)
}

const DATED_HEADERS: [&str; 9] = [
    "ProjectID",
    "LocationID",
    "GeologyCode",
    "PlasticityIndex",
    "MoistureContent",
    "Latitude",
    "Longitude",
    "Date",
    "DepthValue",
];

fn write_dated_csv(path: &Path, rows: &[DatedRow]) -> Result<()> {
    let mut w = csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    w.write_record(DATED_HEADERS)?;
    for r in rows {
        w.write_record([
            r.project.clone(),
            r.location.clone(),
            r.geology.to_string(),
            r.pi.to_string(),
            r.mc.to_string(),
            r.lat.to_string(),
            r.lon.to_string(),
            r.date.format("%Y-%m-%d").to_string(),
            r.depth.to_string(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

fn write_dated_parquet(path: &Path, rows: &[DatedRow]) -> Result<()> {
    let epoch = NaiveDate::default();
    let text = |f: fn(&DatedRow) -> &str| -> ArrayRef {
        Arc::new(StringArray::from(rows.iter().map(f).collect::<Vec<_>>()))
    };
    let number = |f: fn(&DatedRow) -> f64| -> ArrayRef {
        Arc::new(Float64Array::from(rows.iter().map(f).collect::<Vec<_>>()))
    };
    let dates: ArrayRef = Arc::new(Date32Array::from(
        rows.iter()
            .map(|r| r.date.signed_duration_since(epoch).num_days() as i32)
            .collect::<Vec<_>>(),
    ));

    let schema = Arc::new(Schema::new(vec![
        Field::new("ProjectID", DataType::Utf8, false),
        Field::new("LocationID", DataType::Utf8, false),
        Field::new("GeologyCode", DataType::Utf8, false),
        Field::new("PlasticityIndex", DataType::Float64, false),
        Field::new("MoistureContent", DataType::Float64, false),
        Field::new("Latitude", DataType::Float64, false),
        Field::new("Longitude", DataType::Float64, false),
        Field::new("Date", DataType::Date32, false),
        Field::new("DepthValue", DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            text(|r| &r.project),
            text(|r| &r.location),
            text(|r| r.geology),
            number(|r| r.pi),
            number(|r| r.mc),
            number(|r| r.lat),
            number(|r| r.lon),
            dates,
            number(|r| r.depth),
        ],
    )
    .context("building record batch")?;

    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Boundary layers
// ---------------------------------------------------------------------------

fn square(lon: f64, lat: f64, half_lon: f64, half_lat: f64) -> Value {
    json!({
        "type": "Polygon",
        "coordinates": [[
            [lon - half_lon, lat - half_lat],
            [lon + half_lon, lat - half_lat],
            [lon + half_lon, lat + half_lat],
            [lon - half_lon, lat + half_lat],
            [lon - half_lon, lat - half_lat]
        ]]
    })
}

fn feature(properties: Value, geometry: Value) -> Value {
    json!({ "type": "Feature", "properties": properties, "geometry": geometry })
}

fn write_collection(path: &Path, features: Vec<Value>) -> Result<usize> {
    let n = features.len();
    let fc = json!({ "type": "FeatureCollection", "features": features });
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer(file, &fc)?;
    Ok(n)
}

fn postcode_features() -> Vec<Value> {
    AREAS
        .iter()
        .map(|(postcode, _, lat, lon)| feature(json!({ "name": postcode }), square(*lon, *lat, 0.08, 0.05)))
        .collect()
}

fn shrink_swell_features(rng: &mut SimpleRng) -> Vec<Value> {
    let classes = ["Low", "Low", "Moderate", "Significant", "None"];
    let mut features = Vec::new();
    for i in 0..14 {
        for j in 0..11 {
            let lon = -5.75 + 0.5 * f64::from(i);
            let lat = 50.25 + 0.5 * f64::from(j);
            let legend = classes[rng.below(classes.len())];
            features.push(feature(json!({ "Legend": legend }), square(lon, lat, 0.25, 0.25)));
        }
    }
    features
}

fn jurassic_features() -> Vec<Value> {
    // A diagonal band of formations from Dorset to Yorkshire.
    let units = [
        ("LIAS GROUP", -2.9, 50.8),
        ("INFERIOR OOLITE GROUP", -2.1, 51.7),
        ("GREAT OOLITE GROUP", -1.3, 52.3),
        ("ANCHOLME GROUP", -0.6, 53.2),
        ("RAVENSCAR GROUP", -0.8, 54.3),
    ];
    units
        .iter()
        .map(|(name, lon, lat)| feature(json!({ "LEX_D": name }), square(*lon, *lat, 0.45, 0.3)))
        .collect()
}

fn main() -> Result<()> {
    let out = std::env::args().nth(1).map_or_else(|| PathBuf::from("."), PathBuf::from);
    std::fs::create_dir_all(&out).with_context(|| format!("creating {}", out.display()))?;
    let mut rng = SimpleRng::new(42);

    let points = write_points(&out.join("Points.csv"), &mut rng)?;
    println!("Wrote {points} point samples to Points.csv");

    let dated = dated_rows(&mut rng)?;
    write_dated_csv(&out.join("Pointdate.csv"), &dated)?;
    write_dated_parquet(&out.join("Pointdate.parquet"), &dated)?;
    println!("Wrote {} dated samples to Pointdate.csv and Pointdate.parquet", dated.len());

    let n = write_collection(&out.join("postcodes.geojson"), postcode_features())?;
    println!("Wrote {n} postcode boundaries");
    let n = write_collection(&out.join("ShrinkSwell.geojson"), shrink_swell_features(&mut rng))?;
    println!("Wrote {n} shrink-swell cells");
    let n = write_collection(&out.join("jurassic.geojson"), jurassic_features())?;
    println!("Wrote {n} Jurassic formations");

    Ok(())
}
