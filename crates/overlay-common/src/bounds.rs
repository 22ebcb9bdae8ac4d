//! Geographic bounds of the overlay.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{HeatmapError, HeatmapResult};

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLong {
    pub lat: f64,
    pub long: f64,
}

impl LatLong {
    pub fn new(lat: f64, long: f64) -> Self {
        Self { lat, long }
    }
}

/// Corners of the overlay in latitude/longitude.
///
/// The top-left corner has the largest latitude and the smallest longitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayBounds {
    pub top_left: LatLong,
    pub bottom_right: LatLong,
}

impl OverlayBounds {
    /// Create bounds from the two corners.
    pub fn new(top_left: LatLong, bottom_right: LatLong) -> Self {
        Self {
            top_left,
            bottom_right,
        }
    }

    /// Load bounds from a JSON document shaped like
    /// `{"topLeft":{"lat":..,"long":..},"bottomRight":{..}}`.
    pub fn from_file(path: impl AsRef<Path>) -> HeatmapResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse bounds from a JSON string.
    pub fn from_json(json: &str) -> HeatmapResult<Self> {
        let bounds: Self = serde_json::from_str(json)
            .map_err(|e| HeatmapError::decode("overlay bounds", e))?;
        bounds.validate()?;
        Ok(bounds)
    }

    /// Reject inverted or degenerate boxes.
    pub fn validate(&self) -> HeatmapResult<()> {
        if !(self.top_left.lat > self.bottom_right.lat) {
            return Err(HeatmapError::invalid_parameter(
                "bounds",
                format!(
                    "top-left latitude {} must be north of bottom-right latitude {}",
                    self.top_left.lat, self.bottom_right.lat
                ),
            ));
        }

        if !(self.bottom_right.long > self.top_left.long) {
            return Err(HeatmapError::invalid_parameter(
                "bounds",
                format!(
                    "bottom-right longitude {} must be east of top-left longitude {}",
                    self.bottom_right.long, self.top_left.long
                ),
            ));
        }

        Ok(())
    }

    /// Latitude span in degrees.
    pub fn lat_span(&self) -> f64 {
        self.top_left.lat - self.bottom_right.lat
    }

    /// Longitude span in degrees.
    pub fn long_span(&self) -> f64 {
        self.bottom_right.long - self.top_left.long
    }
}
