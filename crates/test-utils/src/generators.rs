//! Generators for synthetic overlays, layers and legend images.
//!
//! Bounds produced here map one overlay cell to one degree: cell (x, y)
//! sits at lat `height - y`, long `x`. That keeps expected coordinates in
//! tests easy to read.

use image::RgbaImage;
use overlay_common::{LatLong, OverlayBounds, OverlayGrid};

/// Bounds where every cell of a `width`x`height` grid spans one degree.
///
/// # Example
///
/// ```
/// use test_utils::unit_bounds;
///
/// let bounds = unit_bounds(4, 3);
/// assert_eq!(bounds.top_left.lat, 3.0);
/// assert_eq!(bounds.bottom_right.long, 4.0);
/// ```
pub fn unit_bounds(width: usize, height: usize) -> OverlayBounds {
    OverlayBounds::new(
        LatLong::new(height as f64, 0.0),
        LatLong::new(0.0, width as f64),
    )
}

/// Mask image with opaque black where `in_region` holds, transparent
/// elsewhere.
pub fn mask_image<F>(width: u32, height: u32, in_region: F) -> RgbaImage
where
    F: Fn(u32, u32) -> bool,
{
    RgbaImage::from_fn(width, height, |x, y| {
        if in_region(x, y) {
            image::Rgba([0, 0, 0, 255])
        } else {
            image::Rgba([0, 0, 0, 0])
        }
    })
}

/// Overlay with every cell in region.
pub fn solid_overlay(width: usize, height: usize) -> OverlayGrid {
    overlay_with(width, height, |_, _| true)
}

/// Overlay whose in-region cells are those where `in_region` holds.
pub fn overlay_with<F>(width: usize, height: usize, in_region: F) -> OverlayGrid
where
    F: Fn(usize, usize) -> bool,
{
    let mask = (0..height)
        .flat_map(|y| (0..width).map(move |x| (x, y)))
        .map(|(x, y)| in_region(x, y))
        .collect();

    OverlayGrid::new(width, height, mask, unit_bounds(width, height))
        .expect("generated overlay is valid")
}

/// Grayscale layer with the intensity produced by `value` in every color
/// channel and full alpha.
pub fn layer_image<F>(width: u32, height: u32, value: F) -> RgbaImage
where
    F: Fn(u32, u32) -> u8,
{
    RgbaImage::from_fn(width, height, |x, y| {
        let v = value(x, y);
        image::Rgba([v, v, v, 255])
    })
}

/// Layer with the same intensity everywhere.
pub fn uniform_layer(width: u32, height: u32, value: u8) -> RgbaImage {
    layer_image(width, height, |_, _| value)
}

/// Image painted from a per-pixel RGBA function, used to fake submitted
/// legend maps.
pub fn painted_image<F>(width: u32, height: u32, color: F) -> RgbaImage
where
    F: Fn(u32, u32) -> [u8; 4],
{
    RgbaImage::from_fn(width, height, |x, y| image::Rgba(color(x, y)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_overlay() {
        let overlay = solid_overlay(5, 4);
        assert_eq!(overlay.in_region_count(), 20);
    }

    #[test]
    fn test_overlay_with_predicate() {
        let overlay = overlay_with(4, 4, |x, _| x < 2);
        assert_eq!(overlay.in_region_count(), 8);
        assert!(overlay.is_in_region(1, 3));
        assert!(!overlay.is_in_region(2, 0));
    }

    #[test]
    fn test_mask_image_round_trips_through_overlay() {
        let mask = mask_image(3, 2, |x, y| x == y);
        let overlay = OverlayGrid::from_mask_image(&mask, unit_bounds(3, 2)).unwrap();

        assert_eq!(overlay.in_region_count(), 2);
        assert!(overlay.is_in_region(1, 1));
    }

    #[test]
    fn test_layer_image_channels() {
        let layer = layer_image(2, 1, |x, _| if x == 0 { 10 } else { 200 });
        assert_eq!(layer.get_pixel(0, 0).0, [10, 10, 10, 255]);
        assert_eq!(layer.get_pixel(1, 0).0, [200, 200, 200, 255]);
    }
}
