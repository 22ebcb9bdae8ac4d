//! Application state for the heatmap API.

use anyhow::{Context, Result};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use overlay_common::{OverlayBounds, OverlayGrid};
use raster_engine::EngineConfig;

use crate::config::ServiceConfig;
use crate::layers::LayerStore;

/// Shared application state. Loaded once at startup and never mutated.
pub struct AppState {
    /// The overlay mask and bounds every operation is addressed against.
    pub overlay: Arc<OverlayGrid>,

    /// Stored layer rasters, one PNG per tag.
    pub layers: LayerStore,

    /// Engine limits.
    pub engine: EngineConfig,

    /// Largest accepted request body in bytes.
    pub max_body_bytes: usize,

    /// Renders the Prometheus scrape served at /metrics.
    pub metrics: PrometheusHandle,
}

impl AppState {
    /// Load the overlay from the data directory.
    pub fn load(config: &ServiceConfig, metrics: PrometheusHandle) -> Result<Self> {
        config
            .engine
            .validate()
            .map_err(anyhow::Error::msg)
            .context("Invalid engine configuration")?;

        let bounds_path = config.bounds_path();
        let bounds = OverlayBounds::from_file(&bounds_path)
            .with_context(|| format!("Failed to load overlay bounds from {}", bounds_path.display()))?;

        let mask_path = config.mask_path();
        let mask = image::open(&mask_path)
            .with_context(|| format!("Failed to open overlay mask {}", mask_path.display()))?
            .to_rgba8();

        let overlay = OverlayGrid::from_mask_image(&mask, bounds)
            .context("Failed to build overlay grid")?;

        info!(
            width = overlay.width(),
            height = overlay.height(),
            in_region = overlay.in_region_count(),
            "Loaded overlay"
        );

        Ok(Self {
            overlay: Arc::new(overlay),
            layers: LayerStore::new(config.maps_dir()),
            engine: config.engine.clone(),
            max_body_bytes: config.max_body_bytes,
            metrics,
        })
    }
}

/// Convert a raw map image into `overlay/mask.png` under the data directory.
pub fn prepare_mask(source: &Path, config: &ServiceConfig) -> Result<PathBuf> {
    let raw = image::open(source)
        .with_context(|| format!("Failed to open source map {}", source.display()))?
        .to_rgba8();
    let mask = OverlayGrid::mask_from_source_map(&raw);

    let mask_path = config.mask_path();
    if let Some(parent) = mask_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    mask.save(&mask_path)
        .with_context(|| format!("Failed to write overlay mask {}", mask_path.display()))?;

    info!(
        source = %source.display(),
        mask = %mask_path.display(),
        width = mask.width(),
        height = mask.height(),
        "Prepared overlay mask"
    );

    Ok(mask_path)
}
