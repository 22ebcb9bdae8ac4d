//! Rendering synthesized rasters as RGBA images.

use image::RgbaImage;
use rayon::prelude::*;

use overlay_common::Rgba;

use crate::choropleth::ColorValue;
use crate::raster::Raster;

/// Marker color for in-region cells left without a value.
pub const UNRESOLVED_COLOR: Rgba = Rgba::new(220, 0, 0, 255);

/// How a `[0, 1]` value maps onto the green channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueRamp {
    /// 0 is dark, 1 is bright. Used for choropleths.
    Ascending,
    /// 0 is bright, 1 is dark. Used for heat fields, so cells near a point
    /// of interest light up.
    Inverted,
}

impl ValueRamp {
    /// Color of a resolved cell holding `value`. Values are clamped to
    /// `[0, 1]`.
    pub fn color(&self, value: f64) -> Rgba {
        let t = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
        let t = match self {
            ValueRamp::Ascending => t,
            ValueRamp::Inverted => 1.0 - t,
        };
        Rgba::new(0, (t * 255.0).round() as u8, 0, 255)
    }
}

/// Paint one pixel per cell: resolved cells through `ramp`, unresolved
/// in-region cells as [`UNRESOLVED_COLOR`], and cells outside the region
/// transparent.
pub fn render_color_values(raster: &Raster<ColorValue>, ramp: ValueRamp) -> RgbaImage {
    let width = raster.width();
    let mut image = RgbaImage::new(width as u32, raster.height() as u32);

    if width > 0 {
        image
            .par_chunks_mut(width * 4)
            .zip(raster.data().par_chunks(width))
            .for_each(|(out, cells)| {
                for (px, cell) in out.chunks_exact_mut(4).zip(cells) {
                    let color = if cell.is_value_found {
                        ramp.color(cell.value)
                    } else if cell.is_within_overlay {
                        UNRESOLVED_COLOR
                    } else {
                        Rgba::TRANSPARENT
                    };
                    px.copy_from_slice(&<[u8; 4]>::from(color));
                }
            });
    }

    image
}
