//! Raster Aggregation and Choropleth Synthesis
//!
//! This crate turns weighted grayscale layers, color-legend images and
//! tabular point/polygon data into normalized rasters aligned to a fixed
//! overlay mask. It enables:
//!
//! - **Layer aggregation**: block-sample several layers and combine them
//!   with normalized weights
//! - **Image choropleths**: resolve pixels against a legend, then repair
//!   unmatched border cells from neighbouring islands
//! - **Polygon choropleths**: bind CSV values to GeoJSON features by name
//!   and fill each cell from the feature containing it
//! - **Heat fields**: value each cell by its weighted distance to the
//!   nearest point of interest
//!
//! # Architecture
//!
//! ```text
//! Request
//!    │
//!    ├─► aggregate_layers ──► sampling (per layer, per row)
//!    │
//!    ├─► synthesize_from_image ──► ColorMatcher ──► smooth_borders
//!    │                                               └─► build_island_sizes
//!    │
//!    ├─► synthesize_from_polygons ──► resolve_names ──► contains(point)
//!    │
//!    └─► synthesize_heat_from_points ──► nearest weighted distance
//!              │
//!              ▼
//!        Raster<ColorValue> ──► render_color_values ──► RgbaImage
//! ```
//!
//! Every operation addresses cells through the shared [`OverlayGrid`].

pub mod aggregate;
pub mod choropleth;
pub mod config;
pub mod distance;
pub mod islands;
pub mod legend;
pub mod names;
pub mod polygons;
pub mod raster;
pub mod render;
pub mod sampling;
pub mod smoothing;
pub mod tabular;

// Re-export commonly used types at crate root
pub use aggregate::{
    aggregate_layers, check_sample_budget, filter_tags, AggregatedCell, ComponentData,
    LayerSample, MapAggregation, TagWeight,
};
pub use choropleth::{synthesize_from_image, ColorValue, ImageAlignment, ImageChoroplethParams};
pub use config::{EngineConfig, LayerChannel};
pub use distance::{
    clamped_inverse_lerp, synthesize_heat_from_points, HeatFieldParams, PointOfInterest,
};
pub use islands::build_island_sizes;
pub use legend::{ColorMatcher, LegendEntry};
pub use names::{normalize_name, resolve_names, LocationValue, NameMatching};
pub use polygons::{
    parse_features, synthesize_from_polygons, ChoroplethFeature, PolygonChoroplethParams,
};
pub use raster::Raster;
pub use render::{render_color_values, ValueRamp, UNRESOLVED_COLOR};
pub use smoothing::smooth_borders;
pub use tabular::{read_location_values, read_points_of_interest};

pub use overlay_common::{
    GridTransform, HeatmapError, HeatmapResult, LatLong, OverlayBounds, OverlayGrid, Rgba,
};
