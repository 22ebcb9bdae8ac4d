//! Overlay bounds and layer tag listing.

use std::sync::Arc;

use axum::{extract::Extension, response::Response};
use tracing::instrument;

use crate::handlers::common::{json_ok, run_blocking, ApiResult};
use crate::state::AppState;

/// GET /overlay-bounds - Corners of the overlay in lat/long
pub async fn bounds_handler(Extension(state): Extension<Arc<AppState>>) -> Response {
    json_ok(*state.overlay.bounds())
}

/// GET /tags - Tags with a stored layer
#[instrument(skip(state))]
pub async fn tags_handler(Extension(state): Extension<Arc<AppState>>) -> ApiResult<Response> {
    let tags = run_blocking(move || state.layers.available_tags()).await?;
    Ok(json_ok(tags))
}
