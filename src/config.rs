use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Environment variable naming an alternative config file.
pub const CONFIG_ENV: &str = "RUSTY_CLAY_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "rusty-clay.toml";

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataConfig,
    pub map: MapConfig,
    pub pages: PagesConfig,
}

/// Input files. Relative paths resolve against `data_dir`.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct DataConfig {
    pub data_dir: PathBuf,
    pub points: PathBuf,
    pub dated_samples: PathBuf,
    pub postcode_boundaries: PathBuf,
    pub shrink_swell: PathBuf,
    pub jurassic: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            points: PathBuf::from("Points.csv"),
            dated_samples: PathBuf::from("Pointdate.csv"),
            postcode_boundaries: PathBuf::from("postcodes.geojson"),
            shrink_swell: PathBuf::from("ShrinkSwell.geojson"),
            jurassic: PathBuf::from("jurassic.geojson"),
        }
    }
}

impl DataConfig {
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.data_dir.join(path)
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct MapConfig {
    /// Web-map style zoom level for freshly centred maps.
    pub zoom: u8,
    /// `[lat, lon]` used when there is nothing to centre on.
    pub fallback_center: [f64; 2],
    /// `[lat, lon]` of the shrink-swell overview.
    pub overview_center: [f64; 2],
    /// Markers closer than this many screen pixels merge into a cluster.
    pub cluster_radius_px: f32,
    pub marker_radius: f32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            zoom: 6,
            fallback_center: [0.0, 0.0],
            overview_center: [54.0, -2.0],
            cluster_radius_px: 24.0,
            marker_radius: 5.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct PagesConfig {
    /// Geology codes offered on the time-series pages. Empty means every
    /// code found in the dated dataset.
    pub geology_options: Vec<String>,
    /// Window share of the LOWESS trend lines.
    pub trend_fraction: f64,
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            geology_options: Vec::new(),
            trend_fraction: 0.2,
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse TOML configuration in {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// `$RUSTY_CLAY_CONFIG`, then `rusty-clay.toml`, then built-in defaults.
    /// A named file that is missing or broken is an error; a missing
    /// default file is not.
    pub fn discover() -> Result<Self> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Self::load_from_file(Path::new(&path));
        }
        let default = Path::new(DEFAULT_CONFIG_FILE);
        if default.exists() {
            Self::load_from_file(default)
        } else {
            log::info!("No {DEFAULT_CONFIG_FILE} found, using built-in defaults");
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = AppConfig::parse("").unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.map.zoom, 6);
        assert_eq!(cfg.pages.trend_fraction, 0.2);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = AppConfig::parse(
            r#"
            [data]
            data_dir = "/srv/survey"
            points = "Points.parquet"

            [pages]
            geology_options = ["LONDON CLAY FORMATION"]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.data.points, PathBuf::from("Points.parquet"));
        assert_eq!(cfg.data.jurassic, PathBuf::from("jurassic.geojson"));
        assert_eq!(
            cfg.data.resolve(&cfg.data.points),
            PathBuf::from("/srv/survey/Points.parquet")
        );
        assert_eq!(cfg.pages.geology_options.len(), 1);
        assert_eq!(cfg.map.overview_center, [54.0, -2.0]);
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rusty-clay.toml");
        std::fs::write(&path, "[map\nzoom = ").unwrap();
        let err = AppConfig::load_from_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("rusty-clay.toml"));
    }
}
