//! Heatmap API Service Library
//!
//! HTTP transport for the raster engine: JSON and multipart binding, file
//! loading, PNG encoding and the response envelope.

pub mod config;
pub mod handlers;
pub mod layers;
pub mod metrics;
pub mod state;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use state::AppState;

/// Build the HTTP router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = state.max_body_bytes;

    Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/metrics", get(handlers::health::metrics_handler))
        .route("/overlay-bounds", get(handlers::overlay::bounds_handler))
        .route("/tags", get(handlers::overlay::tags_handler))
        .route("/aggregate", post(handlers::aggregate::aggregate_handler))
        .route("/choropleth", post(handlers::choropleth::image_choropleth_handler))
        .route(
            "/choropleth-from-csv",
            post(handlers::choropleth::polygon_choropleth_handler),
        )
        .route("/points-of-interest", post(handlers::points::points_handler))
        .route(
            "/points-of-interest-from-csv",
            post(handlers::points::points_from_csv_handler),
        )
        // Middleware
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
