//! Border smoothing: repairing unresolved in-region cells.
//!
//! Each pass rebuilds the islands, then lets every unresolved in-region
//! cell inherit the value of the largest island among its resolved
//! 4-neighbours. Updates are staged while the pass reads the pre-pass state
//! and committed together afterwards, so the result does not depend on the
//! order cells are visited in.

use rayon::prelude::*;
use tracing::debug;

use crate::choropleth::ColorValue;
use crate::islands::build_island_sizes;
use crate::raster::Raster;

/// Run `passes` smoothing passes over `raster`. Zero passes is a no-op.
/// Cells still unresolved afterwards stay unresolved.
pub fn smooth_borders(raster: &mut Raster<ColorValue>, passes: usize) {
    for pass in 0..passes {
        let staged = stage_pass(raster);

        debug!(pass, repaired = staged.len(), "Border smoothing pass");

        if staged.is_empty() {
            // Nothing changed, so later passes would stage nothing either.
            break;
        }

        for (x, y, value) in staged {
            if let Some(cell) = raster.get_mut(x, y) {
                *cell = ColorValue::resolved(value);
            }
        }
    }
}

/// Compute one pass's updates against the current state without applying
/// them.
fn stage_pass(raster: &Raster<ColorValue>) -> Vec<(usize, usize, f64)> {
    let sizes = build_island_sizes(raster);
    let width = raster.width();

    (0..raster.height())
        .into_par_iter()
        .flat_map_iter(|y| {
            let sizes = &sizes;
            (0..width).filter_map(move |x| {
                let cell = raster.get(x, y)?;
                if !cell.is_unresolved() {
                    return None;
                }
                inherit_largest_neighbour(raster, sizes, x, y).map(|value| (x, y, value))
            })
        })
        .collect()
}

/// Value of the largest island among the cell itself and its 4-neighbours,
/// considering resolved cells only. Ties go to the first candidate in
/// self, left, up, right, down order.
fn inherit_largest_neighbour(
    raster: &Raster<ColorValue>,
    sizes: &Raster<usize>,
    x: usize,
    y: usize,
) -> Option<f64> {
    let mut best: Option<f64> = None;
    let mut largest = 0usize;

    for (cx, cy) in std::iter::once((x, y)).chain(raster.neighbours(x, y)) {
        let (Some(cell), Some(&size)) = (raster.get(cx, cy), sizes.get(cx, cy)) else {
            continue;
        };

        if cell.is_value_found && size > largest {
            largest = size;
            best = Some(cell.value);
        }
    }

    best
}
