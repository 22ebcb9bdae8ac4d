//! Weighted layer aggregation.

use std::sync::Arc;

use axum::{body::Bytes, extract::Extension, response::Response};
use serde::Deserialize;
use tracing::{info, instrument};

use overlay_common::{HeatmapError, HeatmapResult};
use raster_engine::{
    aggregate_layers, check_sample_budget, filter_tags, LayerSample, MapAggregation, TagWeight,
};

use crate::handlers::common::{json_ok, parse_json, run_blocking, ApiResult};
use crate::metrics::observe;
use crate::state::AppState;

/// Body of POST /aggregate.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateRequest {
    pub tags: Vec<TagWeight>,
    pub sampling_rate: usize,
}

/// POST /aggregate - Combine stored layers into one weighted raster
#[instrument(skip(state, body))]
pub async fn aggregate_handler(
    Extension(state): Extension<Arc<AppState>>,
    body: Bytes,
) -> ApiResult<Response> {
    observe("aggregate", async move {
        let request: AggregateRequest = parse_json(&body)?;

        info!(
            tags = request.tags.len(),
            sampling_rate = request.sampling_rate,
            "Received aggregate request"
        );

        let aggregation = run_blocking(move || aggregate(&state, &request)).await?;
        Ok(json_ok(aggregation))
    })
    .await
}

fn aggregate(state: &AppState, request: &AggregateRequest) -> HeatmapResult<MapAggregation> {
    // Reject oversized requests before touching any layer file.
    check_sample_budget(
        state.overlay.len(),
        request.sampling_rate,
        state.engine.max_samples,
    )?;

    let available = state.layers.available_tags()?;
    let valid = filter_tags(&request.tags, &available);
    if valid.is_empty() {
        return Err(HeatmapError::NoLayers);
    }

    let layers = valid
        .into_iter()
        .map(|tag| {
            let raster = state.layers.load(&tag.tag)?;
            Ok(LayerSample::new(tag, raster))
        })
        .collect::<HeatmapResult<Vec<_>>>()?;

    aggregate_layers(&state.overlay, &layers, request.sampling_rate, &state.engine)
}
