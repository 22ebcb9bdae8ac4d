//! Configuration for the raster engine.

use serde::{Deserialize, Serialize};

/// Limits and constants shared by every engine operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum number of sampled cells an aggregation may produce.
    pub max_samples: usize,

    /// Maximum size of a tabular upload in bytes.
    pub max_input_bytes: usize,

    /// Maximum number of data rows in a tabular upload.
    pub max_csv_rows: usize,

    /// Conversion between radius thresholds in miles and degrees.
    pub miles_per_degree: f64,

    /// Channel read from layer rasters during aggregation.
    pub layer_channel: LayerChannel,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_samples: 200_000,
            max_input_bytes: 10_000_000,
            max_csv_rows: 1_000_000,
            miles_per_degree: 69.0,
            layer_channel: LayerChannel::Green,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("HEATMAP_MAX_SAMPLES") {
            if let Ok(max) = val.parse() {
                config.max_samples = max;
            }
        }

        if let Ok(val) = std::env::var("HEATMAP_MAX_INPUT_BYTES") {
            if let Ok(max) = val.parse() {
                config.max_input_bytes = max;
            }
        }

        if let Ok(val) = std::env::var("HEATMAP_MAX_CSV_ROWS") {
            if let Ok(max) = val.parse() {
                config.max_csv_rows = max;
            }
        }

        if let Ok(val) = std::env::var("HEATMAP_MILES_PER_DEGREE") {
            if let Ok(miles) = val.parse() {
                config.miles_per_degree = miles;
            }
        }

        if let Ok(val) = std::env::var("HEATMAP_LAYER_CHANNEL") {
            config.layer_channel = LayerChannel::from_str(&val);
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_samples == 0 {
            return Err("max_samples must be > 0".to_string());
        }

        if self.max_input_bytes == 0 {
            return Err("max_input_bytes must be > 0".to_string());
        }

        if self.max_csv_rows == 0 {
            return Err("max_csv_rows must be > 0".to_string());
        }

        if !(self.miles_per_degree > 0.0) {
            return Err("miles_per_degree must be > 0".to_string());
        }

        Ok(())
    }
}

/// A single channel of an RGBA pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LayerChannel {
    Red,
    #[default]
    Green,
    Blue,
    Alpha,
}

impl LayerChannel {
    /// Parse from string (case-insensitive), defaulting to green.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "red" | "r" => Self::Red,
            "blue" | "b" => Self::Blue,
            "alpha" | "a" => Self::Alpha,
            _ => Self::Green,
        }
    }

    /// Byte offset of this channel within an RGBA pixel.
    pub fn index(&self) -> usize {
        match self {
            Self::Red => 0,
            Self::Green => 1,
            Self::Blue => 2,
            Self::Alpha => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_samples, 200_000);
        assert_eq!(config.max_input_bytes, 10_000_000);
        assert_eq!(config.layer_channel, LayerChannel::Green);
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        let config = EngineConfig {
            max_samples: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_layer_channel_parse() {
        assert_eq!(LayerChannel::from_str("RED"), LayerChannel::Red);
        assert_eq!(LayerChannel::from_str("a"), LayerChannel::Alpha);
        assert_eq!(LayerChannel::from_str("bogus"), LayerChannel::Green);
        assert_eq!(LayerChannel::Blue.index(), 2);
    }
}
