use std::convert::TryInto;
use std::path::{Path, PathBuf};

use geo::algorithm::bounding_rect::BoundingRect;
use geo::algorithm::contains::Contains;
use geo::{MultiPolygon, Point, Rect, TriangulateEarcut};
use geojson::GeoJson;
use rstar::{RTree, RTreeObject, AABB};
use serde_json::{Map as JsonMap, Value as JsonValue};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BoundaryError {
    #[error("opening {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing GeoJSON: {0}")]
    Parse(#[from] geojson::Error),
    #[error("GeoJSON must be a FeatureCollection")]
    NotFeatureCollection,
    #[error("feature {index}: {message}")]
    Geometry { index: usize, message: String },
}

// ---------------------------------------------------------------------------
// Features
// ---------------------------------------------------------------------------

/// One polygon feature with its property map.
#[derive(Debug, Clone)]
pub struct BoundaryFeature {
    pub geometry: MultiPolygon<f64>,
    pub properties: JsonMap<String, JsonValue>,
    /// Ear-cut triangulation of the polygons, holes respected. Filled
    /// rendering needs convex pieces.
    pub triangles: Vec<[[f64; 2]; 3]>,
}

impl BoundaryFeature {
    /// Property rendered as display text (`None` when absent or null).
    pub fn property(&self, key: &str) -> Option<String> {
        match self.properties.get(key)? {
            JsonValue::Null => None,
            JsonValue::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }
}

// Envelope entry for the hover index.
struct FeatureEnvelope {
    index: usize,
    aabb: AABB<[f64; 2]>,
}

impl RTreeObject for FeatureEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.aabb
    }
}

fn to_aabb(rect: Rect<f64>) -> AABB<[f64; 2]> {
    AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y])
}

// ---------------------------------------------------------------------------
// BoundaryLayer
// ---------------------------------------------------------------------------

/// A read-only polygon collection (postcodes, risk zones, formations).
/// Coordinates are `x = longitude`, `y = latitude`.
pub struct BoundaryLayer {
    pub name: String,
    pub features: Vec<BoundaryFeature>,
    index: RTree<FeatureEnvelope>,
}

impl std::fmt::Debug for BoundaryLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundaryLayer")
            .field("name", &self.name)
            .field("features", &self.features.len())
            .finish()
    }
}

impl BoundaryLayer {
    pub fn load(name: &str, path: &Path) -> Result<Self, BoundaryError> {
        let text = std::fs::read_to_string(path).map_err(|source| BoundaryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let layer = Self::parse(name, &text)?;
        log::info!(
            "Loaded boundary layer '{name}' with {} features from {}",
            layer.features.len(),
            path.display()
        );
        Ok(layer)
    }

    pub fn parse(name: &str, text: &str) -> Result<Self, BoundaryError> {
        let geojson: GeoJson = text.parse()?;
        Self::from_geojson(name, geojson)
    }

    pub fn from_geojson(name: &str, geojson: GeoJson) -> Result<Self, BoundaryError> {
        let collection = match geojson {
            GeoJson::FeatureCollection(fc) => fc,
            _ => return Err(BoundaryError::NotFeatureCollection),
        };

        let mut features = Vec::with_capacity(collection.features.len());
        for (index, feature) in collection.features.into_iter().enumerate() {
            // Features without polygon geometry cannot be drawn or hit-tested.
            let Some(geom) = feature.geometry else { continue };
            let geometry: geo::Geometry<f64> =
                geom.value
                    .try_into()
                    .map_err(|e: geojson::Error| BoundaryError::Geometry {
                        index,
                        message: e.to_string(),
                    })?;
            let geometry = match geometry {
                geo::Geometry::MultiPolygon(mp) => mp,
                geo::Geometry::Polygon(p) => MultiPolygon::new(vec![p]),
                _ => continue,
            };
            let triangles = geometry
                .0
                .iter()
                .flat_map(|polygon| polygon.earcut_triangles_iter())
                .map(|t| t.to_array().map(|c| [c.x, c.y]))
                .collect();
            features.push(BoundaryFeature {
                geometry,
                properties: feature.properties.unwrap_or_default(),
                triangles,
            });
        }

        let entries: Vec<FeatureEnvelope> = features
            .iter()
            .enumerate()
            .filter_map(|(index, f)| {
                f.geometry.bounding_rect().map(|rect| FeatureEnvelope {
                    index,
                    aabb: to_aabb(rect),
                })
            })
            .collect();

        Ok(BoundaryLayer {
            name: name.to_string(),
            features,
            index: RTree::bulk_load(entries),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// First feature containing the point.
    pub fn feature_at(&self, lon: f64, lat: f64) -> Option<&BoundaryFeature> {
        let point = Point::new(lon, lat);
        self.index
            .locate_in_envelope_intersecting(&AABB::from_point([lon, lat]))
            .filter_map(|entry| self.features.get(entry.index))
            .find(|f| f.geometry.contains(&point))
    }

    /// Bounding box of every feature as `(min_lon, min_lat, max_lon, max_lat)`.
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        if self.index.size() == 0 {
            return None;
        }
        let env = self.index.root().envelope();
        let (lo, hi) = (env.lower(), env.upper());
        Some((lo[0], lo[1], hi[0], hi[1]))
    }
}

// ---------------------------------------------------------------------------
// Shrink-swell risk classes
// ---------------------------------------------------------------------------

/// Shrink-swell hazard class read from a feature's `Legend` property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RiskClass {
    Low,
    Moderate,
    Significant,
    Unknown,
}

impl RiskClass {
    pub const LEGEND: [RiskClass; 3] = [RiskClass::Low, RiskClass::Moderate, RiskClass::Significant];

    pub fn from_legend(value: Option<&str>) -> RiskClass {
        match value.map(str::trim) {
            Some("Low") => RiskClass::Low,
            Some("Moderate") => RiskClass::Moderate,
            Some("Significant") => RiskClass::Significant,
            _ => RiskClass::Unknown,
        }
    }

    pub fn of(feature: &BoundaryFeature) -> RiskClass {
        RiskClass::from_legend(feature.property("Legend").as_deref())
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskClass::Low => "Low",
            RiskClass::Moderate => "Moderate",
            RiskClass::Significant => "Significant",
            RiskClass::Unknown => "Unclassified",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARES: &str = r#"{
      "type": "FeatureCollection",
      "features": [
        {"type": "Feature", "properties": {"name": "LE1", "Legend": "Moderate"},
         "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,1],[0,0]]]}},
        {"type": "Feature", "properties": {"name": "LE2", "Legend": "Significant", "LEX_D": null},
         "geometry": {"type": "MultiPolygon", "coordinates": [[[[2,0],[3,0],[3,1],[2,1],[2,0]]]]}},
        {"type": "Feature", "properties": {"name": "pin"},
         "geometry": {"type": "Point", "coordinates": [5, 5]}}
      ]
    }"#;

    #[test]
    fn polygons_load_and_points_are_skipped() {
        let layer = BoundaryLayer::parse("postcodes", SQUARES).unwrap();
        assert_eq!(layer.features.len(), 2);
        assert_eq!(layer.bounds(), Some((0.0, 0.0, 3.0, 1.0)));
    }

    #[test]
    fn squares_triangulate_into_two_pieces() {
        let layer = BoundaryLayer::parse("postcodes", SQUARES).unwrap();
        for feature in &layer.features {
            assert_eq!(feature.triangles.len(), 2);
        }
    }

    #[test]
    fn hit_test_finds_the_containing_feature() {
        let layer = BoundaryLayer::parse("postcodes", SQUARES).unwrap();
        let hit = layer.feature_at(2.5, 0.5).unwrap();
        assert_eq!(hit.property("name").as_deref(), Some("LE2"));
        assert!(layer.feature_at(1.5, 0.5).is_none());
        assert_eq!(hit.property("LEX_D"), None);
    }

    #[test]
    fn empty_file_is_an_error() {
        let err = BoundaryLayer::parse("postcodes", "").unwrap_err();
        assert!(matches!(err, BoundaryError::Parse(_)));
    }

    #[test]
    fn bare_geometry_is_rejected() {
        let json = r#"{"type": "Point", "coordinates": [1, 2]}"#;
        let err = BoundaryLayer::parse("x", json).unwrap_err();
        assert!(matches!(err, BoundaryError::NotFeatureCollection));
    }

    #[test]
    fn empty_collection_is_a_valid_empty_layer() {
        let json = r#"{"type": "FeatureCollection", "features": []}"#;
        let layer = BoundaryLayer::parse("x", json).unwrap();
        assert!(layer.is_empty());
        assert_eq!(layer.bounds(), None);
    }

    #[test]
    fn risk_classes_from_legend() {
        let layer = BoundaryLayer::parse("swell", SQUARES).unwrap();
        assert_eq!(RiskClass::of(&layer.features[0]), RiskClass::Moderate);
        assert_eq!(RiskClass::of(&layer.features[1]), RiskClass::Significant);
        assert_eq!(RiskClass::from_legend(Some("High")), RiskClass::Unknown);
        assert_eq!(RiskClass::from_legend(None), RiskClass::Unknown);
    }
}
