//! Service configuration.

use std::path::PathBuf;

use raster_engine::EngineConfig;

/// Default request body ceiling. Multipart uploads carry an image or a
/// GeoJSON document next to the CSV, so this sits above the tabular limit.
pub const DEFAULT_MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

/// Everything needed to build the application state.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Directory holding `overlay/mask.png`, `overlay/bounds.json` and
    /// `maps/<tag>.png`.
    pub data_dir: PathBuf,

    /// Largest accepted request body in bytes.
    pub max_body_bytes: usize,

    /// Limits passed to every engine operation.
    pub engine: EngineConfig,
}

impl ServiceConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            engine: EngineConfig::default(),
        }
    }

    /// Paths of the overlay files under the data directory.
    pub fn mask_path(&self) -> PathBuf {
        self.data_dir.join("overlay").join("mask.png")
    }

    pub fn bounds_path(&self) -> PathBuf {
        self.data_dir.join("overlay").join("bounds.json")
    }

    pub fn maps_dir(&self) -> PathBuf {
        self.data_dir.join("maps")
    }
}
