//! Dense row-major rasters.

use rayon::prelude::*;
use serde::Serialize;

use overlay_common::{HeatmapError, HeatmapResult};

/// A dense `width`x`height` raster stored in row-major order
/// (row 0 first, then row 1, etc.).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Raster<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

impl<T> Raster<T> {
    /// Wrap row-major data.
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> HeatmapResult<Self> {
        if data.len() != width * height {
            return Err(HeatmapError::Internal(format!(
                "raster data has {} cells, expected {}x{}",
                data.len(),
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Raw row-major cells.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Get the cell at column `x`, row `y`.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x)
    }

    /// Get a mutable reference to the cell at column `x`, row `y`.
    #[inline]
    pub fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get_mut(y * self.width + x)
    }

    /// Iterate rows top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[T]> {
        // chunks(0) panics, and an empty raster has no rows anyway
        self.data.chunks(self.width.max(1)).take(self.height)
    }

    /// Cells the 4-connected neighbourhood of (x, y) reaches, in
    /// left, up, right, down order.
    pub fn neighbours(&self, x: usize, y: usize) -> impl Iterator<Item = (usize, usize)> {
        let (w, h) = (self.width, self.height);
        [
            (x > 0).then(|| (x - 1, y)),
            (y > 0).then(|| (x, y - 1)),
            (x + 1 < w).then(|| (x + 1, y)),
            (y + 1 < h).then(|| (x, y + 1)),
        ]
        .into_iter()
        .flatten()
    }
}

impl<T: Clone> Raster<T> {
    /// A raster with every cell set to `value`.
    pub fn filled(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Copy rows out as nested vectors.
    pub fn to_rows(&self) -> Vec<Vec<T>> {
        self.rows().map(|row| row.to_vec()).collect()
    }
}

impl<T: Clone + Send + Sync> Raster<T> {
    /// Build a raster row by row in parallel. `fill_row` receives the row
    /// index and that row's cells, initialised to `init`.
    pub fn par_build<F>(width: usize, height: usize, init: T, fill_row: F) -> Self
    where
        F: Fn(usize, &mut [T]) + Send + Sync,
    {
        let mut raster = Self::filled(width, height, init);
        if width > 0 {
            raster
                .data
                .par_chunks_mut(width)
                .enumerate()
                .for_each(|(y, row)| fill_row(y, row));
        }
        raster
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_par_build_row_major() {
        let raster = Raster::par_build(3, 2, 0usize, |y, row| {
            for (x, cell) in row.iter_mut().enumerate() {
                *cell = y * 10 + x;
            }
        });

        assert_eq!(raster.data(), &[0, 1, 2, 10, 11, 12]);
        assert_eq!(raster.get(2, 1), Some(&12));
        assert_eq!(raster.get(3, 0), None);
        assert_eq!(raster.to_rows(), vec![vec![0, 1, 2], vec![10, 11, 12]]);
    }

    #[test]
    fn test_neighbours_at_corner_and_centre() {
        let raster = Raster::filled(3, 3, 0u8);

        let corner: Vec<_> = raster.neighbours(0, 0).collect();
        assert_eq!(corner, vec![(1, 0), (0, 1)]);

        let centre: Vec<_> = raster.neighbours(1, 1).collect();
        assert_eq!(centre, vec![(0, 1), (1, 0), (2, 1), (1, 2)]);
    }

    #[test]
    fn test_from_vec_checks_length() {
        assert!(Raster::from_vec(2, 2, vec![0; 3]).is_err());
        assert!(Raster::from_vec(2, 2, vec![0; 4]).is_ok());
    }

    #[test]
    fn test_empty_raster_has_no_rows() {
        let raster: Raster<u8> = Raster::par_build(0, 0, 0, |_, _| {});
        assert_eq!(raster.rows().count(), 0);
    }
}
