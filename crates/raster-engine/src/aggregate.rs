//! Weighted aggregation of tagged raster layers.
//!
//! Each layer is block-sampled, oriented so that higher is better, and
//! scaled by its share of the total weight. The aggregate is the per-cell
//! sum of those contributions. Layers are processed in parallel, and rows
//! within a layer are too (see [`sample_layer`]).

use image::RgbaImage;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use overlay_common::{HeatmapError, HeatmapResult, OverlayGrid};

use crate::config::EngineConfig;
use crate::raster::Raster;
use crate::sampling::{sample_layer, sampled_dimensions};

fn default_high_is_good() -> bool {
    true
}

/// A requested layer and its weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagWeight {
    pub tag: String,
    pub weight: f64,
    /// When false, layer values are inverted (`1 - v`) before weighting.
    #[serde(default = "default_high_is_good")]
    pub high_is_good: bool,
}

/// A decoded layer ready for aggregation.
#[derive(Debug, Clone)]
pub struct LayerSample {
    pub tag: String,
    pub weight: f64,
    pub high_is_good: bool,
    pub raster: RgbaImage,
}

impl LayerSample {
    pub fn new(request: TagWeight, raster: RgbaImage) -> Self {
        Self {
            tag: request.tag,
            weight: request.weight,
            high_is_good: request.high_is_good,
            raster,
        }
    }
}

/// One positive cell of the aggregate, in sampled-grid coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedCell {
    pub row: usize,
    pub col: usize,
    pub lat: f64,
    pub long: f64,
    pub value: f64,
}

/// Dense weighted contribution of a single layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentData {
    pub tag: String,
    pub data: Vec<Vec<f64>>,
}

/// Result of aggregating several layers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapAggregation {
    /// Cells with a positive aggregate value, in row-major order.
    pub aggregate_data: Vec<AggregatedCell>,
    /// Per-layer dense contributions, in layer order.
    pub components_data: Vec<ComponentData>,
    /// Sampled cell width in degrees of longitude: the full bounds span
    /// divided by the floored sampled width, so when the rate does not
    /// divide the overlay width, reported longitudes drift from the sampled
    /// pixel blocks.
    pub gap_x: f64,
    /// Sampled cell height in degrees of latitude.
    pub gap_y: f64,
    pub width: usize,
    pub height: usize,
}

/// Keep the requested tags that have a stored layer, in request order.
/// Repeated tags keep their first occurrence.
pub fn filter_tags(requested: &[TagWeight], available: &[String]) -> Vec<TagWeight> {
    let mut valid: Vec<TagWeight> = Vec::with_capacity(requested.len());

    for tag in requested {
        if !available.iter().any(|a| a == &tag.tag) {
            continue;
        }
        if valid.iter().any(|v| v.tag == tag.tag) {
            continue;
        }
        valid.push(tag.clone());
    }

    valid
}

/// Reject sampling rates that would produce more than `max_samples` cells.
///
/// Returns the estimated number of samples on success.
pub fn check_sample_budget(
    overlay_pixels: usize,
    sampling_rate: usize,
    max_samples: usize,
) -> HeatmapResult<usize> {
    if sampling_rate == 0 {
        return Err(HeatmapError::invalid_parameter(
            "samplingRate",
            "sampling rate must be at least 1",
        ));
    }

    // Blocks too large to count cover the whole overlay.
    let block = sampling_rate.checked_mul(sampling_rate).unwrap_or(usize::MAX);
    let samples = overlay_pixels / block;
    if samples > max_samples {
        return Err(HeatmapError::TooManySamples {
            requested: samples,
            max: max_samples,
        });
    }

    Ok(samples)
}

/// Aggregate `layers` over `overlay` at the given sampling rate.
pub fn aggregate_layers(
    overlay: &OverlayGrid,
    layers: &[LayerSample],
    sampling_rate: usize,
    config: &EngineConfig,
) -> HeatmapResult<MapAggregation> {
    let samples = check_sample_budget(overlay.len(), sampling_rate, config.max_samples)?;

    if layers.is_empty() {
        return Err(HeatmapError::NoLayers);
    }

    let (sampled_width, sampled_height) =
        sampled_dimensions(overlay.width(), overlay.height(), sampling_rate);
    if sampled_width == 0 || sampled_height == 0 {
        return Err(HeatmapError::invalid_parameter(
            "samplingRate",
            format!(
                "sampling rate {} leaves no cells on the {}x{} overlay",
                sampling_rate,
                overlay.width(),
                overlay.height()
            ),
        ));
    }

    let total_weight = total_weight(layers)?;

    debug!(
        layers = layers.len(),
        sampling_rate,
        samples,
        total_weight,
        "Aggregating layers"
    );

    let contributions: Vec<Raster<f64>> = layers
        .par_iter()
        .map(|layer| layer_contribution(layer, overlay, sampling_rate, total_weight, config))
        .collect::<HeatmapResult<_>>()?;

    let (width, height) = ensure_same_shape(layers, &contributions)?;

    let transform = overlay.transform_for(width, height);
    let mut aggregate_data = Vec::new();

    for row in 0..height {
        for col in 0..width {
            let value: f64 = contributions
                .iter()
                .filter_map(|c| c.get(col, row))
                .sum();

            if value > 0.0 {
                let point = transform.lat_long(col, row);
                aggregate_data.push(AggregatedCell {
                    row,
                    col,
                    lat: point.lat,
                    long: point.long,
                    value,
                });
            }
        }
    }

    let components_data = layers
        .iter()
        .zip(&contributions)
        .map(|(layer, raster)| ComponentData {
            tag: layer.tag.clone(),
            data: raster.to_rows(),
        })
        .collect();

    debug!(cells = aggregate_data.len(), width, height, "Aggregation complete");

    Ok(MapAggregation {
        aggregate_data,
        components_data,
        gap_x: transform.gap_x(),
        gap_y: transform.gap_y(),
        width,
        height,
    })
}

fn total_weight(layers: &[LayerSample]) -> HeatmapResult<f64> {
    for layer in layers {
        if !layer.weight.is_finite() || layer.weight < 0.0 {
            return Err(HeatmapError::invalid_parameter(
                "weight",
                format!("weight of '{}' must be non-negative, got {}", layer.tag, layer.weight),
            ));
        }
    }

    let total: f64 = layers.iter().map(|l| l.weight).sum();
    if total <= 0.0 {
        return Err(HeatmapError::invalid_parameter(
            "weight",
            "weights must not all be zero",
        ));
    }

    Ok(total)
}

/// Sampled, oriented and weighted values of one layer. Blocks outside the
/// region contribute 0 whatever the polarity.
fn layer_contribution(
    layer: &LayerSample,
    overlay: &OverlayGrid,
    sampling_rate: usize,
    total_weight: f64,
    config: &EngineConfig,
) -> HeatmapResult<Raster<f64>> {
    let sampled = sample_layer(&layer.raster, overlay, sampling_rate, config.layer_channel)?;
    let share = layer.weight / total_weight;

    let data = sampled
        .data()
        .iter()
        .map(|cell| match cell {
            Some(v) if layer.high_is_good => v * share,
            Some(v) => (1.0 - v) * share,
            None => 0.0,
        })
        .collect();

    Raster::from_vec(sampled.width(), sampled.height(), data)
}

fn ensure_same_shape(
    layers: &[LayerSample],
    contributions: &[Raster<f64>],
) -> HeatmapResult<(usize, usize)> {
    let first = &contributions[0];
    let (width, height) = (first.width(), first.height());

    for (layer, raster) in layers.iter().zip(contributions).skip(1) {
        if raster.height() != height {
            return Err(HeatmapError::ShapeMismatch(format!(
                "heights do not match: '{}' has {} rows, '{}' has {}",
                layer.tag,
                raster.height(),
                layers[0].tag,
                height
            )));
        }
        if raster.width() != width {
            return Err(HeatmapError::ShapeMismatch(format!(
                "widths do not match: '{}' has {} columns, '{}' has {}",
                layer.tag,
                raster.width(),
                layers[0].tag,
                width
            )));
        }
    }

    Ok((width, height))
}
