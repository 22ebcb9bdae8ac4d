//! Common test fixtures: GeoJSON, CSV text and on-disk data directories.

use std::path::Path;

use image::RgbaImage;
use overlay_common::OverlayBounds;
use serde_json::json;
use tempfile::TempDir;

/// Feature collection of axis-aligned squares.
///
/// Each entry is `(name, min_long, min_lat, max_long, max_lat)`; the name is
/// stored under the `NAME` property.
pub fn square_features(squares: &[(&str, f64, f64, f64, f64)]) -> String {
    let features: Vec<_> = squares
        .iter()
        .map(|&(name, min_long, min_lat, max_long, max_lat)| {
            json!({
                "type": "Feature",
                "properties": { "NAME": name },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[
                        [min_long, min_lat],
                        [max_long, min_lat],
                        [max_long, max_lat],
                        [min_long, max_lat],
                        [min_long, min_lat]
                    ]]
                }
            })
        })
        .collect();

    json!({ "type": "FeatureCollection", "features": features }).to_string()
}

/// CSV with a `name,value` header.
pub fn location_csv(rows: &[(&str, f64)]) -> String {
    let mut csv = String::from("name,value\n");
    for (name, value) in rows {
        csv.push_str(&format!("{},{}\n", name, value));
    }
    csv
}

/// CSV with a `lat,long,weight` header.
pub fn points_csv(rows: &[(f64, f64, f64)]) -> String {
    let mut csv = String::from("lat,long,weight\n");
    for (lat, long, weight) in rows {
        csv.push_str(&format!("{},{},{}\n", lat, long, weight));
    }
    csv
}

/// Lay out a service data directory:
///
/// ```text
/// overlay/mask.png
/// overlay/bounds.json
/// maps/<tag>.png
/// ```
pub fn write_data_dir(
    mask: &RgbaImage,
    bounds: &OverlayBounds,
    layers: &[(&str, &RgbaImage)],
) -> TempDir {
    let dir = TempDir::new().expect("create temp dir");
    populate(dir.path(), mask, bounds, layers);
    dir
}

fn populate(root: &Path, mask: &RgbaImage, bounds: &OverlayBounds, layers: &[(&str, &RgbaImage)]) {
    let overlay_dir = root.join("overlay");
    let maps_dir = root.join("maps");
    std::fs::create_dir_all(&overlay_dir).expect("create overlay dir");
    std::fs::create_dir_all(&maps_dir).expect("create maps dir");

    mask.save(overlay_dir.join("mask.png")).expect("write mask");
    std::fs::write(
        overlay_dir.join("bounds.json"),
        serde_json::to_string(bounds).expect("serialize bounds"),
    )
    .expect("write bounds");

    for (tag, layer) in layers {
        layer
            .save(maps_dir.join(format!("{}.png", tag)))
            .expect("write layer");
    }
}
