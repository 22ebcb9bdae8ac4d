//! Block sampling of layer rasters against the overlay mask.
//!
//! A layer is reduced by an integer stride `s`: every `s`x`s` block of
//! layer pixels becomes one sampled cell holding the mean of a single
//! channel over the block's in-region pixels. Partial blocks at the right
//! and bottom edges are dropped, matching integer division of the
//! dimensions.

use image::RgbaImage;

use overlay_common::{HeatmapError, HeatmapResult, OverlayGrid};

use crate::config::LayerChannel;
use crate::raster::Raster;

/// Dimensions of a raster sampled with `stride`, rounded down.
pub fn sampled_dimensions(width: usize, height: usize, stride: usize) -> (usize, usize) {
    if stride == 0 {
        return (0, 0);
    }
    (width / stride, height / stride)
}

/// Sample one layer, normalizing the chosen channel to `[0, 1]`.
///
/// Blocks with no in-region pixel sample to `None` rather than NaN.
pub fn sample_layer(
    layer: &RgbaImage,
    overlay: &OverlayGrid,
    stride: usize,
    channel: LayerChannel,
) -> HeatmapResult<Raster<Option<f64>>> {
    if stride == 0 {
        return Err(HeatmapError::invalid_parameter(
            "samplingRate",
            "sampling rate must be at least 1",
        ));
    }

    overlay.ensure_dimensions("layer", layer.width() as usize, layer.height() as usize)?;

    let (out_width, out_height) = sampled_dimensions(overlay.width(), overlay.height(), stride);
    let channel = channel.index();

    let raster = Raster::par_build(out_width, out_height, None, |out_y, row| {
        for (out_x, cell) in row.iter_mut().enumerate() {
            *cell = mean_of_block(layer, overlay, out_x * stride, out_y * stride, stride, channel);
        }
    });

    Ok(raster)
}

/// Mean of `channel` over the in-region pixels of the block whose top-left
/// pixel is (`left`, `top`), scaled to `[0, 1]`. `None` when the block has
/// no in-region pixel.
#[inline]
fn mean_of_block(
    layer: &RgbaImage,
    overlay: &OverlayGrid,
    left: usize,
    top: usize,
    stride: usize,
    channel: usize,
) -> Option<f64> {
    let mut sum = 0u64;
    let mut count = 0u64;

    for y in top..top + stride {
        for x in left..left + stride {
            if overlay.is_in_region(x, y) {
                sum += layer.get_pixel(x as u32, y as u32).0[channel] as u64;
                count += 1;
            }
        }
    }

    if count == 0 {
        None
    } else {
        Some((sum as f64 / count as f64) / 255.0)
    }
}
