//! Choropleths from legend images and from GeoJSON + CSV uploads.

use std::sync::Arc;

use axum::{
    extract::{Extension, Multipart},
    response::Response,
};
use serde::Deserialize;
use tracing::{info, instrument};

use overlay_common::Rgba;
use raster_engine::{
    parse_features, read_location_values, render_color_values, synthesize_from_image,
    synthesize_from_polygons, ImageAlignment, ImageChoroplethParams, LegendEntry,
    PolygonChoroplethParams, ValueRamp,
};

use crate::handlers::common::{decode_image, png_response, run_blocking, ApiResult, MultipartFields};
use crate::metrics::observe;
use crate::state::AppState;

/// A legend row as submitted. Rows without a color are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct LegendItem {
    #[serde(default)]
    pub color: Option<Rgba>,
    #[serde(default)]
    pub value: Option<f64>,
}

/// `data` field of POST /choropleth.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageChoroplethRequest {
    #[serde(flatten)]
    pub alignment: ImageAlignment,
    pub legend: Vec<LegendItem>,
    pub color_tolerance: u16,
    #[serde(default)]
    pub border_tolerance: usize,
}

impl ImageChoroplethRequest {
    pub fn into_params(self) -> ImageChoroplethParams {
        let legend = self
            .legend
            .into_iter()
            .filter_map(|item| item.color.map(|color| LegendEntry::new(color, item.value)))
            .collect();

        ImageChoroplethParams {
            alignment: self.alignment,
            legend,
            color_tolerance: self.color_tolerance,
            border_passes: self.border_tolerance,
        }
    }
}

fn default_name_property() -> String {
    "NAME".to_string()
}

/// `data` field of POST /choropleth-from-csv.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolygonChoroplethRequest {
    /// Feature property holding the region name.
    #[serde(default = "default_name_property")]
    pub name_property: String,
    pub location_column: String,
    pub value_column: String,
    #[serde(flatten)]
    pub params: PolygonChoroplethParams,
}

/// POST /choropleth - Resolve a submitted legend map onto the overlay
///
/// Multipart fields: `file` (the image) and `data` (JSON parameters).
#[instrument(skip(state, multipart))]
pub async fn image_choropleth_handler(
    Extension(state): Extension<Arc<AppState>>,
    multipart: Multipart,
) -> ApiResult<Response> {
    observe("choropleth", async move {
        let mut fields = MultipartFields::read(multipart).await?;
        let request: ImageChoroplethRequest = fields.take_json("data")?;
        let file = fields.take("file")?;

        info!(
            legend_entries = request.legend.len(),
            color_tolerance = request.color_tolerance,
            border_tolerance = request.border_tolerance,
            "Received choropleth request"
        );

        let image = run_blocking(move || {
            let submitted = decode_image(&file)?;
            let raster = synthesize_from_image(&state.overlay, &submitted, &request.into_params())?;
            Ok(render_color_values(&raster, ValueRamp::Ascending))
        })
        .await?;

        png_response(&image)
    })
    .await
}

/// POST /choropleth-from-csv - Fill GeoJSON regions with CSV values
///
/// Multipart fields: `geojson`, `csv` and `data` (JSON parameters).
#[instrument(skip(state, multipart))]
pub async fn polygon_choropleth_handler(
    Extension(state): Extension<Arc<AppState>>,
    multipart: Multipart,
) -> ApiResult<Response> {
    observe("choropleth_from_csv", async move {
        let mut fields = MultipartFields::read(multipart).await?;
        let request: PolygonChoroplethRequest = fields.take_json("data")?;
        let geojson = fields.take_text("geojson")?;
        let csv = fields.take("csv")?;

        info!(
            name_property = %request.name_property,
            location_column = %request.location_column,
            value_column = %request.value_column,
            matching = ?request.params.name_matching,
            "Received polygon choropleth request"
        );

        let image = run_blocking(move || {
            let features = parse_features(&geojson, &request.name_property)?;
            let locations = read_location_values(
                &csv,
                &request.location_column,
                &request.value_column,
                &state.engine,
            )?;
            let raster =
                synthesize_from_polygons(&state.overlay, &features, &locations, &request.params)?;
            Ok(render_color_values(&raster, ValueRamp::Ascending))
        })
        .await?;

        png_response(&image)
    })
    .await
}
