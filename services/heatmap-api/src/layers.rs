//! Stored layer rasters.

use std::path::PathBuf;

use image::RgbaImage;
use tracing::debug;

use overlay_common::{HeatmapError, HeatmapResult};

/// Directory of layer PNGs named `<tag>.png`.
#[derive(Debug, Clone)]
pub struct LayerStore {
    dir: PathBuf,
}

impl LayerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Tags with a stored layer, sorted. A missing directory has no tags.
    pub fn available_tags(&self) -> HeatmapResult<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut tags = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_png = path
                .extension()
                .map(|ext| ext.eq_ignore_ascii_case("png"))
                .unwrap_or(false);
            if !is_png {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                tags.push(stem.to_string());
            }
        }

        tags.sort();
        Ok(tags)
    }

    /// Decode the layer stored for `tag`.
    pub fn load(&self, tag: &str) -> HeatmapResult<RgbaImage> {
        if !is_valid_tag(tag) {
            return Err(HeatmapError::invalid_parameter(
                "tag",
                format!("'{}' is not a valid layer tag", tag),
            ));
        }

        let path = self.dir.join(format!("{}.png", tag));
        if !path.exists() {
            return Err(HeatmapError::LayerNotFound(tag.to_string()));
        }

        let layer = image::open(&path)
            .map_err(|e| HeatmapError::decode("layer image", e))?
            .to_rgba8();

        debug!(tag, width = layer.width(), height = layer.height(), "Loaded layer");
        Ok(layer)
    }
}

/// Tags are file stems; anything that could step outside the directory is
/// refused.
fn is_valid_tag(tag: &str) -> bool {
    !tag.is_empty()
        && tag
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_validation() {
        assert!(is_valid_tag("parks"));
        assert!(is_valid_tag("crime_rate-2023"));
        assert!(!is_valid_tag(""));
        assert!(!is_valid_tag("../secrets"));
        assert!(!is_valid_tag("a/b"));
    }

    #[test]
    fn test_listing_and_loading() {
        let dir = tempfile::tempdir().unwrap();
        RgbaImage::new(2, 2).save(dir.path().join("parks.png")).unwrap();
        RgbaImage::new(2, 2).save(dir.path().join("transit.png")).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let store = LayerStore::new(dir.path());
        assert_eq!(store.available_tags().unwrap(), vec!["parks", "transit"]);
        assert_eq!(store.load("parks").unwrap().dimensions(), (2, 2));
        assert!(matches!(store.load("noise"), Err(HeatmapError::LayerNotFound(_))));
    }

    #[test]
    fn test_missing_directory_has_no_tags() {
        let store = LayerStore::new("/nonexistent/heatmap/maps");
        assert!(store.available_tags().unwrap().is_empty());
    }
}
