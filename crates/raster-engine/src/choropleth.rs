//! Choropleth synthesis from a submitted legend image.

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

use overlay_common::{HeatmapError, HeatmapResult, OverlayGrid, Rgba};

use crate::legend::{ColorMatcher, LegendEntry};
use crate::raster::Raster;
use crate::smoothing::smooth_borders;

/// Per-cell state of a synthesized choropleth.
///
/// Three states matter: outside the region, inside but unresolved, and
/// inside with a resolved value. `value` is meaningful only in the last.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ColorValue {
    pub value: f64,
    pub is_within_overlay: bool,
    pub is_value_found: bool,
}

impl ColorValue {
    /// A cell outside the overlay region.
    pub const OUTSIDE: ColorValue = ColorValue {
        value: 0.0,
        is_within_overlay: false,
        is_value_found: false,
    };

    /// A cell inside the region without a value yet.
    pub const UNRESOLVED: ColorValue = ColorValue {
        value: 0.0,
        is_within_overlay: true,
        is_value_found: false,
    };

    /// A cell inside the region holding `value`.
    pub fn resolved(value: f64) -> Self {
        Self {
            value,
            is_within_overlay: true,
            is_value_found: true,
        }
    }

    /// Inside the region but still waiting for a value.
    pub fn is_unresolved(&self) -> bool {
        self.is_within_overlay && !self.is_value_found
    }
}

/// Where the overlay sits inside the submitted image, in submitted-image
/// pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAlignment {
    pub top_left_x: i64,
    pub top_left_y: i64,
    pub bottom_right_x: i64,
    pub bottom_right_y: i64,
}

impl ImageAlignment {
    /// Submitted-image pixels per overlay pixel, derived from the vertical
    /// extent and applied to both axes.
    pub fn scale(&self, overlay_height: usize) -> HeatmapResult<f64> {
        if self.bottom_right_y <= self.top_left_y || self.bottom_right_x <= self.top_left_x {
            return Err(HeatmapError::invalid_parameter(
                "alignment",
                format!(
                    "bottom-right ({}, {}) must lie below and right of top-left ({}, {})",
                    self.bottom_right_x, self.bottom_right_y, self.top_left_x, self.top_left_y
                ),
            ));
        }

        let extent = self.bottom_right_y.checked_sub(self.top_left_y).ok_or_else(|| {
            HeatmapError::invalid_parameter(
                "alignment",
                format!(
                    "vertical extent from {} to {} is out of range",
                    self.top_left_y, self.bottom_right_y
                ),
            )
        })?;

        Ok(extent as f64 / overlay_height as f64)
    }

    /// Submitted-image pixel sampled for overlay cell (`x`, `y`). Saturates
    /// instead of wrapping; saturated pixels land outside any image.
    #[inline]
    fn source_pixel(&self, x: usize, y: usize, scale: f64) -> (i64, i64) {
        (
            self.top_left_x.saturating_add((x as f64 * scale).floor() as i64),
            self.top_left_y.saturating_add((y as f64 * scale).floor() as i64),
        )
    }
}

/// Parameters for [`synthesize_from_image`].
#[derive(Debug, Clone)]
pub struct ImageChoroplethParams {
    pub alignment: ImageAlignment,
    pub legend: Vec<LegendEntry>,
    /// Per-channel tolerance; differences must be strictly below it.
    pub color_tolerance: u16,
    /// Number of border smoothing passes.
    pub border_passes: usize,
}

/// Resolve every in-region overlay cell against the legend, then repair
/// unresolved cells with `border_passes` smoothing passes.
///
/// In-region cells that map outside the submitted image, match no legend
/// entry, or match a no-data entry stay unresolved.
pub fn synthesize_from_image(
    overlay: &OverlayGrid,
    submitted: &RgbaImage,
    params: &ImageChoroplethParams,
) -> HeatmapResult<Raster<ColorValue>> {
    let scale = params.alignment.scale(overlay.height())?;
    let matcher = ColorMatcher::new(&params.legend, params.color_tolerance);
    let (image_width, image_height) = (submitted.width() as i64, submitted.height() as i64);

    let mut raster = Raster::par_build(
        overlay.width(),
        overlay.height(),
        ColorValue::OUTSIDE,
        |y, row| {
            for (x, cell) in row.iter_mut().enumerate() {
                if !overlay.is_in_region(x, y) {
                    continue;
                }

                let (sx, sy) = params.alignment.source_pixel(x, y, scale);
                let in_image = sx >= 0 && sx < image_width && sy >= 0 && sy < image_height;

                *cell = if in_image {
                    let observed = Rgba::from(*submitted.get_pixel(sx as u32, sy as u32));
                    match matcher.resolve(observed) {
                        Some(value) => ColorValue::resolved(value),
                        None => ColorValue::UNRESOLVED,
                    }
                } else {
                    ColorValue::UNRESOLVED
                };
            }
        },
    );

    debug!(
        scale,
        legend_entries = params.legend.len(),
        resolved = count_resolved(&raster),
        "Matched submitted image against legend"
    );

    smooth_borders(&mut raster, params.border_passes);

    Ok(raster)
}

/// Number of cells holding a value.
pub fn count_resolved(raster: &Raster<ColorValue>) -> usize {
    raster.data().iter().filter(|c| c.is_value_found).count()
}
