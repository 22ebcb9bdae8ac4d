//! Error types for heatmap synthesis.

use thiserror::Error;

/// Result type alias using HeatmapError.
pub type HeatmapResult<T> = Result<T, HeatmapError>;

/// Primary error type for aggregation and choropleth operations.
#[derive(Debug, Error)]
pub enum HeatmapError {
    // === Input Validation Errors ===
    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    #[error("Column '{column}' not found. Found {found}")]
    MissingColumn { column: String, found: String },

    #[error("Failed to parse '{value}' in column '{column}' as a number")]
    InvalidNumber { column: String, value: String },

    #[error("Max input size of {limit} bytes exceeded ({actual} bytes)")]
    InputTooLarge { limit: usize, actual: usize },

    #[error("Max row count of {limit} exceeded")]
    TooManyRows { limit: usize },

    #[error("Input unexpectedly empty: {0}")]
    EmptyInput(String),

    #[error(
        "Requested sampling rate too low and would generate {requested} samples, \
         exceeding the maximum allowed of {max}, please specify a higher value"
    )]
    TooManySamples { requested: usize, max: usize },

    #[error("Feature {0} has no string name property")]
    MissingFeatureName(usize),

    #[error("Geometry of feature '{feature}' is {kind}, expected Polygon or MultiPolygon")]
    InvalidGeometry { feature: String, kind: String },

    #[error("No points of interest provided")]
    NoPointsOfInterest,

    // === Shape Consistency Errors ===
    #[error("{what} is {width}x{height}, expected {expected_width}x{expected_height}")]
    DimensionMismatch {
        what: String,
        width: usize,
        height: usize,
        expected_width: usize,
        expected_height: usize,
    },

    #[error("Sampled layers disagree on shape: {0}")]
    ShapeMismatch(String),

    // === Resolution Errors ===
    #[error("No matches found for locations {}", .0.join(", "))]
    UnmatchedLocations(Vec<String>),

    #[error("None of the requested layers are available")]
    NoLayers,

    #[error("Layer not found: {0}")]
    LayerNotFound(String),

    // === Decode Errors ===
    #[error("Failed to decode {stage}: {message}")]
    Decode { stage: String, message: String },

    // === Infrastructure Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HeatmapError {
    /// Create an InvalidParameter error.
    pub fn invalid_parameter(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }

    /// Create a Decode error for the named input stage.
    pub fn decode(stage: impl Into<String>, message: impl ToString) -> Self {
        Self::Decode {
            stage: stage.into(),
            message: message.to_string(),
        }
    }

    /// Get the HTTP status code for this error.
    pub fn http_status_code(&self) -> u16 {
        match self {
            HeatmapError::LayerNotFound(_) => 404,

            HeatmapError::Internal(_) => 500,

            _ => 400,
        }
    }
}

// Conversion from common error types
impl From<std::io::Error> for HeatmapError {
    fn from(err: std::io::Error) -> Self {
        HeatmapError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for HeatmapError {
    fn from(err: serde_json::Error) -> Self {
        HeatmapError::decode("JSON", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmatched_locations_names_every_feature() {
        let err = HeatmapError::UnmatchedLocations(vec!["Kings".into(), "Queens".into()]);
        assert_eq!(err.to_string(), "No matches found for locations Kings, Queens");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(HeatmapError::NoPointsOfInterest.http_status_code(), 400);
        assert_eq!(HeatmapError::LayerNotFound("x".into()).http_status_code(), 404);
        assert_eq!(HeatmapError::Internal("boom".into()).http_status_code(), 500);
    }
}
