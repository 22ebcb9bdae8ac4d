//! Heat fields from weighted points of interest.

use serde::{Deserialize, Serialize};
use tracing::debug;

use overlay_common::{HeatmapError, HeatmapResult, LatLong, OverlayGrid};

use crate::choropleth::ColorValue;
use crate::config::EngineConfig;
use crate::raster::Raster;

fn default_weight() -> f64 {
    1.0
}

/// An attraction centre. A larger weight shrinks the effective distance to
/// it, widening its influence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointOfInterest {
    pub lat_long: LatLong,
    #[serde(default = "default_weight")]
    pub weight: f64,
}

impl PointOfInterest {
    pub fn new(lat: f64, long: f64, weight: f64) -> Self {
        Self {
            lat_long: LatLong::new(lat, long),
            weight,
        }
    }
}

/// Radius window for a heat field, in miles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatFieldParams {
    pub min_threshold_radius_miles: f64,
    pub max_threshold_radius_miles: f64,
}

/// Normalize `val` into `[0, 1]` relative to `[min, max]`, clamping values
/// outside the window.
pub fn clamped_inverse_lerp(min: f64, max: f64, val: f64) -> f64 {
    let clamped = val.min(max).max(min);
    (clamped - min) / (max - min)
}

/// Value every in-region cell by its weighted distance to the nearest
/// point of interest.
///
/// For each cell the nearest point is the one minimising
/// `sqrt(((lat - p.lat) / w)^2 + ((long - p.long) / w)^2)`; the radius
/// window is then scaled by that point's weight before normalizing the
/// distance into `[0, 1]` (0 at or inside the minimum radius, 1 at or
/// beyond the maximum).
pub fn synthesize_heat_from_points(
    overlay: &OverlayGrid,
    points: &[PointOfInterest],
    params: &HeatFieldParams,
    config: &EngineConfig,
) -> HeatmapResult<Raster<ColorValue>> {
    if points.is_empty() {
        return Err(HeatmapError::NoPointsOfInterest);
    }

    validate(points, params)?;

    let min_radius_deg = params.min_threshold_radius_miles / config.miles_per_degree;
    let max_radius_deg = params.max_threshold_radius_miles / config.miles_per_degree;
    let transform = overlay.transform();

    debug!(
        points = points.len(),
        min_radius_deg,
        max_radius_deg,
        "Synthesizing heat field"
    );

    let raster = Raster::par_build(
        overlay.width(),
        overlay.height(),
        ColorValue::OUTSIDE,
        |y, row| {
            for (x, cell) in row.iter_mut().enumerate() {
                if !overlay.is_in_region(x, y) {
                    continue;
                }

                let here = transform.lat_long(x, y);
                let (distance, weight) = nearest_weighted(here, points);
                let value = clamped_inverse_lerp(
                    min_radius_deg * weight,
                    max_radius_deg * weight,
                    distance,
                );
                *cell = ColorValue::resolved(value);
            }
        },
    );

    Ok(raster)
}

fn validate(points: &[PointOfInterest], params: &HeatFieldParams) -> HeatmapResult<()> {
    let (min, max) = (
        params.min_threshold_radius_miles,
        params.max_threshold_radius_miles,
    );
    if !(min >= 0.0) || !(max > min) {
        return Err(HeatmapError::invalid_parameter(
            "thresholdRadiusMiles",
            format!("expected 0 <= min < max, got min {} and max {}", min, max),
        ));
    }

    if let Some(point) = points.iter().find(|p| !(p.weight > 0.0) || !p.weight.is_finite()) {
        return Err(HeatmapError::invalid_parameter(
            "weight",
            format!(
                "weight of point ({}, {}) must be positive, got {}",
                point.lat_long.lat, point.lat_long.long, point.weight
            ),
        ));
    }

    Ok(())
}

/// Smallest weighted distance from `here` to any point, and the weight of
/// the point achieving it. `points` must not be empty.
#[inline]
fn nearest_weighted(here: LatLong, points: &[PointOfInterest]) -> (f64, f64) {
    let mut min_distance = f64::MAX;
    let mut min_weight = points[0].weight;

    for point in points {
        let d_lat = (here.lat - point.lat_long.lat) / point.weight;
        let d_long = (here.long - point.lat_long.long) / point.weight;
        let distance = (d_lat * d_lat + d_long * d_long).sqrt();

        if distance < min_distance {
            min_distance = distance;
            min_weight = point.weight;
        }
    }

    (min_distance, min_weight)
}
