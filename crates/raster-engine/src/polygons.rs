//! Polygon choropleths: GeoJSON features valued from named locations.

use geo::{Contains, Geometry, MultiPolygon, Point};
use geojson::GeoJson;
use serde::{Deserialize, Serialize};
use tracing::debug;

use overlay_common::{HeatmapError, HeatmapResult, OverlayGrid};

use crate::choropleth::{count_resolved, ColorValue};
use crate::distance::clamped_inverse_lerp;
use crate::names::{resolve_names, LocationValue, NameMatching};
use crate::raster::Raster;

/// A named region with its outline in long/lat degrees.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoroplethFeature {
    pub name: String,
    pub geometry: MultiPolygon<f64>,
}

/// Parameters for [`synthesize_from_polygons`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolygonChoroplethParams {
    #[serde(default)]
    pub name_matching: NameMatching,
    #[serde(default)]
    pub skip_missing: bool,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

/// Parse a GeoJSON feature collection (or a single feature).
///
/// Every feature must carry a string `name_property` and a Polygon or
/// MultiPolygon geometry; the first feature that does not fails the parse.
pub fn parse_features(geojson_text: &str, name_property: &str) -> HeatmapResult<Vec<ChoroplethFeature>> {
    let parsed: GeoJson = geojson_text
        .parse()
        .map_err(|e| HeatmapError::decode("GeoJSON", e))?;

    let features = match parsed {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(_) => {
            return Err(HeatmapError::decode(
                "GeoJSON",
                "expected a Feature or FeatureCollection, found a bare geometry",
            ))
        }
    };

    if features.is_empty() {
        return Err(HeatmapError::EmptyInput("GeoJSON has no features".to_string()));
    }

    features
        .into_iter()
        .enumerate()
        .map(|(index, feature)| {
            let name = feature
                .property(name_property)
                .and_then(|v| v.as_str())
                .ok_or(HeatmapError::MissingFeatureName(index))?
                .to_string();

            let value = feature
                .geometry
                .map(|g| g.value)
                .ok_or_else(|| HeatmapError::InvalidGeometry {
                    feature: name.clone(),
                    kind: "null".to_string(),
                })?;

            let kind = geometry_kind(&value);
            let geometry: Geometry<f64> = value
                .try_into()
                .map_err(|e| HeatmapError::decode("GeoJSON geometry", e))?;

            let geometry = match geometry {
                Geometry::Polygon(p) => MultiPolygon::from(p),
                Geometry::MultiPolygon(mp) => mp,
                _ => {
                    return Err(HeatmapError::InvalidGeometry {
                        feature: name,
                        kind: kind.to_string(),
                    })
                }
            };

            Ok(ChoroplethFeature { name, geometry })
        })
        .collect()
}

fn geometry_kind(value: &geojson::Value) -> &'static str {
    match value {
        geojson::Value::Point(_) => "Point",
        geojson::Value::MultiPoint(_) => "MultiPoint",
        geojson::Value::LineString(_) => "LineString",
        geojson::Value::MultiLineString(_) => "MultiLineString",
        geojson::Value::Polygon(_) => "Polygon",
        geojson::Value::MultiPolygon(_) => "MultiPolygon",
        geojson::Value::GeometryCollection(_) => "GeometryCollection",
    }
}

/// Value every in-region cell from the first feature (in input order)
/// containing its lat/long.
///
/// Feature names are bound to `locations` first; the bound value is then
/// normalized into `[0, 1]` over `[lower_bound, upper_bound]`. Cells no
/// feature contains, or whose feature was skipped as unmatched, stay
/// unresolved.
pub fn synthesize_from_polygons(
    overlay: &OverlayGrid,
    features: &[ChoroplethFeature],
    locations: &[LocationValue],
    params: &PolygonChoroplethParams,
) -> HeatmapResult<Raster<ColorValue>> {
    let (lower, upper) = (params.lower_bound, params.upper_bound);
    if !lower.is_finite() || !upper.is_finite() || lower >= upper {
        return Err(HeatmapError::invalid_parameter(
            "bounds",
            format!("lower bound {} must be below upper bound {}", lower, upper),
        ));
    }

    let names: Vec<&str> = features.iter().map(|f| f.name.as_str()).collect();
    let bound = resolve_names(&names, locations, params.name_matching, params.skip_missing)?;

    // Unmatched features are dropped here so they cannot shadow later ones.
    let valued: Vec<(&MultiPolygon<f64>, f64)> = features
        .iter()
        .filter_map(|f| {
            bound
                .get(&f.name)
                .map(|loc| (&f.geometry, clamped_inverse_lerp(lower, upper, loc.value)))
        })
        .collect();

    let transform = overlay.transform();

    let raster = Raster::par_build(
        overlay.width(),
        overlay.height(),
        ColorValue::OUTSIDE,
        |y, row| {
            for (x, cell) in row.iter_mut().enumerate() {
                if !overlay.is_in_region(x, y) {
                    continue;
                }

                let here = transform.lat_long(x, y);
                let point = Point::new(here.long, here.lat);

                *cell = valued
                    .iter()
                    .find(|(geometry, _)| geometry.contains(&point))
                    .map(|&(_, value)| ColorValue::resolved(value))
                    .unwrap_or(ColorValue::UNRESOLVED);
            }
        },
    );

    debug!(
        features = features.len(),
        bound = valued.len(),
        resolved = count_resolved(&raster),
        "Synthesized polygon choropleth"
    );

    Ok(raster)
}
