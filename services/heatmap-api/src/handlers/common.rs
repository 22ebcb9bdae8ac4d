//! Shared response envelope, error mapping and request helpers.

use std::collections::HashMap;
use std::io::Cursor;

use axum::{
    extract::Multipart,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use image::{codecs::png::PngEncoder, ImageEncoder, RgbaImage};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{error, warn};

use overlay_common::{HeatmapError, HeatmapResult};

/// JSON envelope: `{"success":true,"data":..}` or
/// `{"success":false,"error":".."}`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Envelope a successful result.
pub fn json_ok<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(ApiResponse::ok(data))).into_response()
}

/// An engine error on its way to the client.
#[derive(Debug)]
pub struct ApiError(pub HeatmapError);

impl From<HeatmapError> for ApiError {
    fn from(err: HeatmapError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            error!(error = %self.0, "Request failed");
        } else {
            warn!(error = %self.0, "Request rejected");
        }

        (status, Json(ApiResponse::failure(self.0.to_string()))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Run CPU-bound engine work off the async runtime.
pub async fn run_blocking<T, F>(work: F) -> ApiResult<T>
where
    F: FnOnce() -> HeatmapResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| HeatmapError::Internal(format!("worker task failed: {}", e)))?
        .map_err(ApiError::from)
}

/// Encode `image` as a PNG response.
pub fn png_response(image: &RgbaImage) -> ApiResult<Response> {
    let mut png = Cursor::new(Vec::new());
    PngEncoder::new(&mut png)
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ColorType::Rgba8,
        )
        .map_err(|e| HeatmapError::Internal(format!("PNG encoding failed: {}", e)))?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "image/png")],
        png.into_inner(),
    )
        .into_response())
}

/// Parse a JSON request body.
pub fn parse_json<T: DeserializeOwned>(bytes: &[u8]) -> HeatmapResult<T> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Multipart fields keyed by name.
#[derive(Debug, Default)]
pub struct MultipartFields {
    fields: HashMap<String, Vec<u8>>,
}

impl MultipartFields {
    /// Drain every named field. Unnamed fields are skipped.
    pub async fn read(mut multipart: Multipart) -> ApiResult<Self> {
        let mut fields = HashMap::new();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| HeatmapError::decode("multipart body", e))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            let bytes = field
                .bytes()
                .await
                .map_err(|e| HeatmapError::decode("multipart body", e))?;
            fields.insert(name, bytes.to_vec());
        }

        Ok(Self { fields })
    }

    /// Take a field that must be present.
    pub fn take(&mut self, name: &str) -> HeatmapResult<Vec<u8>> {
        self.fields.remove(name).ok_or_else(|| {
            HeatmapError::invalid_parameter(name, format!("multipart field '{}' is required", name))
        })
    }

    /// Take a required field holding JSON.
    pub fn take_json<T: DeserializeOwned>(&mut self, name: &str) -> HeatmapResult<T> {
        let bytes = self.take(name)?;
        parse_json(&bytes)
    }

    /// Take a required field holding UTF-8 text.
    pub fn take_text(&mut self, name: &str) -> HeatmapResult<String> {
        let bytes = self.take(name)?;
        String::from_utf8(bytes).map_err(|e| HeatmapError::decode(name, e))
    }
}

/// Decode an uploaded image into RGBA pixels.
pub fn decode_image(bytes: &[u8]) -> HeatmapResult<RgbaImage> {
    Ok(image::load_from_memory(bytes)
        .map_err(|e| HeatmapError::decode("image", e))?
        .to_rgba8())
}
