/// Data layer: core types, loading, filtering, and the derived views pages
/// draw from.
///
/// Architecture:
/// ```text
///  .csv / .parquet / .json            .geojson
///        │                               │
///        ▼                               ▼
///   ┌──────────┐                   ┌──────────┐
///   │  loader   │ → SampleSet       │ boundary  │ → BoundaryLayer
///   └──────────┘                   └──────────┘
///        │
///        ▼
///   ┌──────────┐     ┌──────────┐
///   │  filter   │ ──▶ │ classify  │  predicates → indices → severity
///   └──────────┘     └──────────┘
///        │
///        ▼
///   ┌───────────┐ ┌────────┐ ┌───────┐ ┌────────┐
///   │ aggregate │ │ trend  │ │ table │ │ export │
///   └───────────┘ └────────┘ └───────┘ └────────┘
/// ```

pub mod aggregate;
pub mod boundary;
pub mod classify;
pub mod export;
pub mod filter;
pub mod loader;
pub mod model;
pub mod table;
pub mod trend;
