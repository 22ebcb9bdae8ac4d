//! Tests for the heatmap API router.
//!
//! Each test lays out a small data directory on disk, loads the state from
//! it and drives the router directly with `oneshot`.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use tempfile::TempDir;
use tower::ServiceExt;

use heatmap_api::build_router;
use heatmap_api::config::ServiceConfig;
use heatmap_api::metrics::install_recorder;
use heatmap_api::state::{prepare_mask, AppState};
use test_utils::{
    location_csv, mask_image, painted_image, points_csv, square_features, uniform_layer,
    unit_bounds, write_data_dir,
};

const BOUNDARY: &str = "heatmap-test-boundary";

/// 4x4 overlay, all in region, one degree per cell, two stored layers.
fn setup() -> (TempDir, Router) {
    let parks = uniform_layer(4, 4, 204);
    let noise = uniform_layer(4, 4, 51);
    let dir = write_data_dir(
        &mask_image(4, 4, |_, _| true),
        &unit_bounds(4, 4),
        &[("parks", &parks), ("noise", &noise)],
    );

    let state = AppState::load(&ServiceConfig::new(dir.path()), install_recorder().unwrap()).unwrap();
    (dir, build_router(Arc::new(state)))
}

async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.unwrap()
}

async fn body_json(response: Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_png(response: Response) -> image::RgbaImage {
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    image::load_from_memory(&bytes).unwrap().to_rgba8()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_multipart(uri: &str, parts: &[(&str, Vec<u8>)]) -> Request<Body> {
    let mut body = Vec::new();
    for (name, content) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\r\n",
                name, name
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

fn encode_png(image: &image::RgbaImage) -> Vec<u8> {
    let mut bytes = std::io::Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, image::ImageOutputFormat::Png)
        .unwrap();
    bytes.into_inner()
}

// ============================================================================
// Metadata endpoints
// ============================================================================

#[tokio::test]
async fn test_health() {
    let (_dir, app) = setup();
    let response = send(app, get("/health")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["status"], "ok");
}

#[tokio::test]
async fn test_overlay_bounds() {
    let (_dir, app) = setup();
    let json = body_json(send(app, get("/overlay-bounds")).await).await;

    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["topLeft"]["lat"], 4.0);
    assert_eq!(json["data"]["bottomRight"]["long"], 4.0);
}

#[tokio::test]
async fn test_tags() {
    let (_dir, app) = setup();
    let json = body_json(send(app, get("/tags")).await).await;

    assert_eq!(json["data"], serde_json::json!(["noise", "parks"]));
}

// ============================================================================
// Aggregation
// ============================================================================

#[tokio::test]
async fn test_aggregate() {
    let (_dir, app) = setup();
    let request = post_json(
        "/aggregate",
        serde_json::json!({
            "tags": [
                {"tag": "parks", "weight": 3},
                {"tag": "noise", "weight": 1, "highIsGood": false},
                {"tag": "unknown", "weight": 10}
            ],
            "samplingRate": 2
        }),
    );

    let response = send(app, request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let data = &json["data"];
    assert_eq!(data["width"], 2);
    assert_eq!(data["aggregateData"].as_array().unwrap().len(), 4);
    assert_eq!(data["componentsData"].as_array().unwrap().len(), 2);

    // 0.75 * 0.8 + 0.25 * (1 - 0.2)
    let value = data["aggregateData"][0]["value"].as_f64().unwrap();
    assert!((value - 0.8).abs() < 1e-9);
}

#[tokio::test]
async fn test_aggregate_with_huge_sampling_rate() {
    let (_dir, app) = setup();
    let request = post_json(
        "/aggregate",
        serde_json::json!({"tags": [{"tag": "parks", "weight": 1}], "samplingRate": 4294967296u64}),
    );

    let response = send(app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["success"], false);
}

#[tokio::test]
async fn test_aggregate_without_known_layers() {
    let (_dir, app) = setup();
    let request = post_json(
        "/aggregate",
        serde_json::json!({"tags": [{"tag": "unknown", "weight": 1}], "samplingRate": 1}),
    );

    let response = send(app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "None of the requested layers are available");
}

#[tokio::test]
async fn test_aggregate_malformed_json() {
    let (_dir, app) = setup();
    let request = Request::builder()
        .method("POST")
        .uri("/aggregate")
        .body(Body::from("{\"tags\": "))
        .unwrap();

    let response = send(app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["success"], false);
}

// ============================================================================
// Choropleths
// ============================================================================

#[tokio::test]
async fn test_image_choropleth() {
    let (_dir, app) = setup();
    let submitted = painted_image(4, 4, |x, _| {
        if x < 2 {
            [10, 200, 10, 255]
        } else {
            [255, 255, 255, 255]
        }
    });
    let data = serde_json::json!({
        "topLeftX": 0, "topLeftY": 0, "bottomRightX": 4, "bottomRightY": 4,
        "legend": [{"color": [10, 200, 10, 255], "value": 1.0}],
        "colorTolerance": 10,
        "borderTolerance": 1
    });

    let request = post_multipart(
        "/choropleth",
        &[("data", data.to_string().into_bytes()), ("file", encode_png(&submitted))],
    );
    let response = send(app, request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let image = body_png(response).await;
    assert_eq!(image.dimensions(), (4, 4));
    assert_eq!(image.get_pixel(0, 0).0, [0, 255, 0, 255]);
    // Column 2 inherits from the island next to it, column 3 stays unresolved.
    assert_eq!(image.get_pixel(2, 1).0, [0, 255, 0, 255]);
    assert_eq!(image.get_pixel(3, 1).0, [220, 0, 0, 255]);
}

#[tokio::test]
async fn test_image_choropleth_requires_file() {
    let (_dir, app) = setup();
    let data = serde_json::json!({
        "topLeftX": 0, "topLeftY": 0, "bottomRightX": 4, "bottomRightY": 4,
        "legend": [], "colorTolerance": 10
    });

    let response = send(
        app,
        post_multipart("/choropleth", &[("data", data.to_string().into_bytes())]),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_polygon_choropleth() {
    let (_dir, app) = setup();
    let geojson = square_features(&[
        ("West", -0.5, -1.0, 1.5, 5.0),
        ("East", 1.5, -1.0, 3.5, 5.0),
    ]);
    let csv = location_csv(&[("west", 0.0), ("EAST", 10.0)]);
    let data = serde_json::json!({
        "locationColumn": "name",
        "valueColumn": "value",
        "lowerBound": 0,
        "upperBound": 10
    });

    let request = post_multipart(
        "/choropleth-from-csv",
        &[
            ("geojson", geojson.into_bytes()),
            ("csv", csv.into_bytes()),
            ("data", data.to_string().into_bytes()),
        ],
    );
    let response = send(app, request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let image = body_png(response).await;
    assert_eq!(image.get_pixel(0, 0).0, [0, 0, 0, 255]);
    assert_eq!(image.get_pixel(3, 0).0, [0, 255, 0, 255]);
}

#[tokio::test]
async fn test_polygon_choropleth_unmatched_names() {
    let (_dir, app) = setup();
    let geojson = square_features(&[
        ("West", -0.5, -1.0, 1.5, 5.0),
        ("East", 1.5, -1.0, 3.5, 5.0),
    ]);
    let csv = location_csv(&[("West", 1.0)]);
    let data = serde_json::json!({
        "locationColumn": "name", "valueColumn": "value", "lowerBound": 0, "upperBound": 1
    });

    let request = post_multipart(
        "/choropleth-from-csv",
        &[
            ("geojson", geojson.into_bytes()),
            ("csv", csv.into_bytes()),
            ("data", data.to_string().into_bytes()),
        ],
    );
    let response = send(app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "No matches found for locations East"
    );
}

// ============================================================================
// Points of interest
// ============================================================================

#[tokio::test]
async fn test_points_of_interest() {
    let (_dir, app) = setup();
    let request = post_json(
        "/points-of-interest",
        serde_json::json!({
            "pointsOfInterest": [{"latLong": {"lat": 4.0, "long": 0.0}}],
            "minThresholdRadiusMiles": 0,
            "maxThresholdRadiusMiles": 207
        }),
    );

    let response = send(app, request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let image = body_png(response).await;
    // On top of the point: bright. Three degrees away: dark.
    assert_eq!(image.get_pixel(0, 0).0, [0, 255, 0, 255]);
    assert_eq!(image.get_pixel(3, 0).0, [0, 0, 0, 255]);
}

#[tokio::test]
async fn test_points_of_interest_empty() {
    let (_dir, app) = setup();
    let request = post_json(
        "/points-of-interest",
        serde_json::json!({
            "pointsOfInterest": [],
            "minThresholdRadiusMiles": 0,
            "maxThresholdRadiusMiles": 10
        }),
    );

    let response = send(app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "No points of interest provided");
}

#[tokio::test]
async fn test_points_from_csv() {
    let (_dir, app) = setup();
    let csv = points_csv(&[(4.0, 0.0, 1.0)]);
    let data = serde_json::json!({
        "latColumn": "lat",
        "longColumn": "long",
        "weightColumn": "weight",
        "minThresholdRadiusMiles": 0,
        "maxThresholdRadiusMiles": 207
    });

    let request = post_multipart(
        "/points-of-interest-from-csv",
        &[("file", csv.into_bytes()), ("data", data.to_string().into_bytes())],
    );
    let response = send(app, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_png(response).await.get_pixel(0, 0).0, [0, 255, 0, 255]);
}

#[tokio::test]
async fn test_points_from_csv_missing_column() {
    let (_dir, app) = setup();
    let data = serde_json::json!({
        "latColumn": "latitude",
        "longColumn": "long",
        "minThresholdRadiusMiles": 0,
        "maxThresholdRadiusMiles": 10
    });

    let request = post_multipart(
        "/points-of-interest-from-csv",
        &[
            ("file", points_csv(&[(1.0, 1.0, 1.0)]).into_bytes()),
            ("data", data.to_string().into_bytes()),
        ],
    );
    let response = send(app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "Column 'latitude' not found. Found lat, long, weight"
    );
}

#[tokio::test]
async fn test_metrics_count_engine_requests() {
    let (_dir, app) = setup();
    let request = post_json(
        "/aggregate",
        serde_json::json!({"tags": [{"tag": "parks", "weight": 1}], "samplingRate": 1}),
    );
    assert_eq!(send(app.clone(), request).await.status(), StatusCode::OK);

    let failing = post_json("/points-of-interest", serde_json::json!({"pointsOfInterest": []}));
    assert_eq!(send(app.clone(), failing).await.status(), StatusCode::BAD_REQUEST);

    let response = send(app, get("/metrics")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain; version=0.0.4");

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains(r#"heatmap_requests_total{operation="aggregate"}"#));
    assert!(text.contains(r#"heatmap_operation_duration_ms"#));
    assert!(text.contains(r#"heatmap_request_errors_total{operation="points_of_interest"}"#));
}

// ============================================================================
// Startup
// ============================================================================

#[test]
fn test_state_load_fails_without_overlay() {
    let dir = tempfile::tempdir().unwrap();
    assert!(AppState::load(&ServiceConfig::new(dir.path()), install_recorder().unwrap()).is_err());
}

#[test]
fn test_prepare_mask_from_source_map() {
    let dir = tempfile::tempdir().unwrap();
    let source_path = dir.path().join("source.png");
    painted_image(2, 2, |x, y| match (x, y) {
        (0, 0) => [255, 255, 255, 100],
        (1, 0) => [40, 40, 40, 100],
        (0, 1) => [200, 30, 30, 255],
        _ => [0, 0, 0, 0],
    })
    .save(&source_path)
    .unwrap();

    let config = ServiceConfig::new(dir.path().join("data"));
    let mask_path = prepare_mask(&source_path, &config).unwrap();
    assert_eq!(mask_path, config.mask_path());

    let mask = image::open(&mask_path).unwrap().to_rgba8();
    assert_eq!(mask.get_pixel(0, 0).0, [0, 0, 0, 255]);
    assert_eq!(mask.get_pixel(1, 0).0, [0, 0, 0, 0]);
    assert_eq!(mask.get_pixel(0, 1).0, [0, 0, 0, 255]);
    assert_eq!(mask.get_pixel(1, 1).0, [0, 0, 0, 0]);

    std::fs::write(
        config.bounds_path(),
        serde_json::to_string(&unit_bounds(2, 2)).unwrap(),
    )
    .unwrap();
    let state = AppState::load(&config, install_recorder().unwrap()).unwrap();
    assert_eq!(state.overlay.in_region_count(), 2);
}
