//! Heat fields from points of interest.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Extension, Multipart},
    response::Response,
};
use serde::Deserialize;
use tracing::{info, instrument};

use raster_engine::{
    read_points_of_interest, render_color_values, synthesize_heat_from_points, HeatFieldParams,
    PointOfInterest, ValueRamp,
};

use crate::handlers::common::{parse_json, png_response, run_blocking, ApiResult, MultipartFields};
use crate::metrics::observe;
use crate::state::AppState;

/// Body of POST /points-of-interest.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsRequest {
    pub points_of_interest: Vec<PointOfInterest>,
    #[serde(flatten)]
    pub params: HeatFieldParams,
}

/// `data` field of POST /points-of-interest-from-csv.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsCsvRequest {
    pub lat_column: String,
    pub long_column: String,
    #[serde(default)]
    pub weight_column: Option<String>,
    #[serde(flatten)]
    pub params: HeatFieldParams,
}

/// POST /points-of-interest - Heat field from a JSON list of points
#[instrument(skip(state, body))]
pub async fn points_handler(
    Extension(state): Extension<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<Response> {
    observe("points_of_interest", async move {
        let request: PointsRequest = parse_json(&body)?;

        info!(points = request.points_of_interest.len(), "Received points of interest request");

        let image = run_blocking(move || {
            let raster = synthesize_heat_from_points(
                &state.overlay,
                &request.points_of_interest,
                &request.params,
                &state.engine,
            )?;
            Ok(render_color_values(&raster, ValueRamp::Inverted))
        })
        .await?;

        png_response(&image)
    })
    .await
}

/// POST /points-of-interest-from-csv - Heat field from uploaded CSV points
///
/// Multipart fields: `file` (the CSV) and `data` (JSON parameters).
#[instrument(skip(state, multipart))]
pub async fn points_from_csv_handler(
    Extension(state): Extension<Arc<AppState>>,
    multipart: Multipart,
) -> ApiResult<Response> {
    observe("points_of_interest_from_csv", async move {
        let mut fields = MultipartFields::read(multipart).await?;
        let request: PointsCsvRequest = fields.take_json("data")?;
        let csv = fields.take("file")?;

        info!(
            lat_column = %request.lat_column,
            long_column = %request.long_column,
            weight_column = ?request.weight_column,
            bytes = csv.len(),
            "Received points of interest CSV"
        );

        let image = run_blocking(move || {
            let points = read_points_of_interest(
                &csv,
                &request.lat_column,
                &request.long_column,
                request.weight_column.as_deref(),
                &state.engine,
            )?;
            let raster =
                synthesize_heat_from_points(&state.overlay, &points, &request.params, &state.engine)?;
            Ok(render_color_values(&raster, ValueRamp::Inverted))
        })
        .await?;

        png_response(&image)
    })
    .await
}
