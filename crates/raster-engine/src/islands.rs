//! Connected-component ("island") sizing over resolved cells.
//!
//! An island is a maximal 4-connected set of resolved cells holding exactly
//! the same value. Floating-point values are compared with `==`: cells only
//! join when they were assigned the identical value.

use std::collections::VecDeque;

use crate::choropleth::ColorValue;
use crate::raster::Raster;

/// For every cell, the size of the island it belongs to. Unresolved and
/// out-of-region cells get 0.
pub fn build_island_sizes(raster: &Raster<ColorValue>) -> Raster<usize> {
    let (width, height) = (raster.width(), raster.height());
    let mut sizes = Raster::filled(width, height, 0usize);
    let mut visited = vec![false; width * height];

    let mut queue: VecDeque<(usize, usize)> = VecDeque::new();
    let mut members: Vec<(usize, usize)> = Vec::new();

    for y in 0..height {
        for x in 0..width {
            let seed = raster.data()[y * width + x];
            if !seed.is_value_found || visited[y * width + x] {
                continue;
            }

            visited[y * width + x] = true;
            queue.push_back((x, y));
            members.clear();

            while let Some((cx, cy)) = queue.pop_front() {
                members.push((cx, cy));

                for (nx, ny) in raster.neighbours(cx, cy) {
                    let idx = ny * width + nx;
                    let cell = raster.data()[idx];
                    if !visited[idx] && cell.is_value_found && cell.value == seed.value {
                        visited[idx] = true;
                        queue.push_back((nx, ny));
                    }
                }
            }

            let island_size = members.len();
            for &(mx, my) in &members {
                if let Some(size) = sizes.get_mut(mx, my) {
                    *size = island_size;
                }
            }
        }
    }

    sizes
}
