//! The overlay grid: which pixels are in region, and where they are.

use image::RgbaImage;

use crate::bounds::{LatLong, OverlayBounds};
use crate::color::Rgba;
use crate::error::{HeatmapError, HeatmapResult};

/// Affine mapping from grid cells to latitude/longitude.
///
/// Row 0 sits at the top-left latitude and latitude decreases with the row
/// index; column 0 sits at the top-left longitude and longitude increases with
/// the column index. Build one per request and reuse it for every cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridTransform {
    top_left: LatLong,
    gap_x: f64,
    gap_y: f64,
}

impl GridTransform {
    /// Compute the transform for a `width`x`height` grid spanning `bounds`.
    pub fn new(width: usize, height: usize, bounds: &OverlayBounds) -> Self {
        Self {
            top_left: bounds.top_left,
            gap_x: bounds.long_span() / width as f64,
            gap_y: bounds.lat_span() / height as f64,
        }
    }

    /// Cell width in degrees of longitude.
    pub fn gap_x(&self) -> f64 {
        self.gap_x
    }

    /// Cell height in degrees of latitude.
    pub fn gap_y(&self) -> f64 {
        self.gap_y
    }

    /// Latitude/longitude of the cell at column `x`, row `y`.
    #[inline]
    pub fn lat_long(&self, x: usize, y: usize) -> LatLong {
        LatLong {
            lat: self.top_left.lat - y as f64 * self.gap_y,
            long: self.top_left.long + x as f64 * self.gap_x,
        }
    }
}

/// Fixed-resolution mask defining the region of interest, plus its bounds.
///
/// Loaded once at startup and shared read-only by every request.
#[derive(Debug, Clone)]
pub struct OverlayGrid {
    width: usize,
    height: usize,
    in_region: Vec<bool>,
    bounds: OverlayBounds,
}

impl OverlayGrid {
    /// Build a grid from a row-major in-region mask.
    pub fn new(
        width: usize,
        height: usize,
        in_region: Vec<bool>,
        bounds: OverlayBounds,
    ) -> HeatmapResult<Self> {
        if width == 0 || height == 0 {
            return Err(HeatmapError::invalid_parameter(
                "overlay",
                format!("overlay must not be empty, got {}x{}", width, height),
            ));
        }

        if in_region.len() != width * height {
            return Err(HeatmapError::invalid_parameter(
                "overlay",
                format!(
                    "mask has {} cells, expected {}x{}",
                    in_region.len(),
                    width,
                    height
                ),
            ));
        }

        bounds.validate()?;

        Ok(Self {
            width,
            height,
            in_region,
            bounds,
        })
    }

    /// Build a grid from a mask image. A pixel is in region iff it is
    /// exactly opaque black.
    pub fn from_mask_image(mask: &RgbaImage, bounds: OverlayBounds) -> HeatmapResult<Self> {
        let in_region = mask
            .pixels()
            .map(|px| Rgba::from(*px) == Rgba::OPAQUE_BLACK)
            .collect();

        Self::new(
            mask.width() as usize,
            mask.height() as usize,
            in_region,
            bounds,
        )
    }

    /// Convert a raw map image into the canonical mask: land pixels (nearly
    /// opaque, or nearly white) become opaque black, the rest transparent.
    pub fn mask_from_source_map(source: &RgbaImage) -> RgbaImage {
        let mut mask = RgbaImage::new(source.width(), source.height());

        for (x, y, px) in source.enumerate_pixels() {
            let [r, g, b, a] = px.0;
            let is_land = a > 240 || (r > 240 && g > 240 && b > 240);
            let color = if is_land {
                Rgba::OPAQUE_BLACK
            } else {
                Rgba::TRANSPARENT
            };
            mask.put_pixel(x, y, color.into());
        }

        mask
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn bounds(&self) -> &OverlayBounds {
        &self.bounds
    }

    /// Total number of overlay pixels.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    /// Check if grid is empty.
    pub fn is_empty(&self) -> bool {
        self.in_region.is_empty()
    }

    /// Whether the cell at column `x`, row `y` is in region. Cells outside
    /// the grid are never in region.
    #[inline]
    pub fn is_in_region(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.in_region[y * self.width + x]
    }

    /// Number of in-region cells.
    pub fn in_region_count(&self) -> usize {
        self.in_region.iter().filter(|&&v| v).count()
    }

    /// Transform at the overlay's native resolution.
    pub fn transform(&self) -> GridTransform {
        GridTransform::new(self.width, self.height, &self.bounds)
    }

    /// Transform for a grid of different resolution over the same bounds,
    /// e.g. a downsampled raster.
    pub fn transform_for(&self, width: usize, height: usize) -> GridTransform {
        GridTransform::new(width, height, &self.bounds)
    }

    /// Fail unless `width`x`height` equals the overlay's native resolution.
    pub fn ensure_dimensions(&self, what: &str, width: usize, height: usize) -> HeatmapResult<()> {
        if width != self.width || height != self.height {
            return Err(HeatmapError::DimensionMismatch {
                what: what.to_string(),
                width,
                height,
                expected_width: self.width,
                expected_height: self.height,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> OverlayBounds {
        OverlayBounds::new(LatLong::new(41.0, -75.0), LatLong::new(40.0, -73.0))
    }

    #[test]
    fn test_transform_corners() {
        let t = GridTransform::new(200, 100, &bounds());

        assert!((t.gap_x() - 0.01).abs() < 1e-12);
        assert!((t.gap_y() - 0.01).abs() < 1e-12);

        let origin = t.lat_long(0, 0);
        assert_eq!(origin, LatLong::new(41.0, -75.0));

        let p = t.lat_long(100, 50);
        assert!((p.lat - 40.5).abs() < 1e-9);
        assert!((p.long - -74.0).abs() < 1e-9);
    }

    #[test]
    fn test_mask_predicate_is_exact_opaque_black() {
        let mut mask = RgbaImage::new(3, 1);
        mask.put_pixel(0, 0, image::Rgba([0, 0, 0, 255]));
        mask.put_pixel(1, 0, image::Rgba([0, 0, 0, 254]));
        mask.put_pixel(2, 0, image::Rgba([1, 0, 0, 255]));

        let grid = OverlayGrid::from_mask_image(&mask, bounds()).unwrap();
        assert!(grid.is_in_region(0, 0));
        assert!(!grid.is_in_region(1, 0));
        assert!(!grid.is_in_region(2, 0));
        assert!(!grid.is_in_region(3, 0));
        assert_eq!(grid.in_region_count(), 1);
    }

    #[test]
    fn test_mask_from_source_map() {
        let mut source = RgbaImage::new(3, 1);
        source.put_pixel(0, 0, image::Rgba([10, 10, 10, 250]));
        source.put_pixel(1, 0, image::Rgba([250, 250, 250, 0]));
        source.put_pixel(2, 0, image::Rgba([250, 10, 250, 100]));

        let mask = OverlayGrid::mask_from_source_map(&source);
        assert_eq!(mask.get_pixel(0, 0).0, [0, 0, 0, 255]);
        assert_eq!(mask.get_pixel(1, 0).0, [0, 0, 0, 255]);
        assert_eq!(mask.get_pixel(2, 0).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_dimension_mismatch() {
        let grid = OverlayGrid::new(2, 2, vec![true; 4], bounds()).unwrap();
        assert!(grid.ensure_dimensions("layer", 2, 2).is_ok());

        let err = grid.ensure_dimensions("layer", 3, 2).unwrap_err();
        assert!(matches!(err, HeatmapError::DimensionMismatch { width: 3, .. }));
    }

    #[test]
    fn test_mask_length_checked() {
        assert!(OverlayGrid::new(2, 2, vec![true; 3], bounds()).is_err());
    }
}
