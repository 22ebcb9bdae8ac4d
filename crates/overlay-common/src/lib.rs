//! Common types and utilities shared across the heatmap workspace.

pub mod bounds;
pub mod color;
pub mod error;
pub mod grid;

pub use bounds::{LatLong, OverlayBounds};
pub use color::Rgba;
pub use error::{HeatmapError, HeatmapResult};
pub use grid::{GridTransform, OverlayGrid};
