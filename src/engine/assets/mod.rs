// Asset pipeline
//
// Loads image descriptors through the host engine, derives crops, grid slices
// and nine-slices, and caches their portable encodings.

mod cache;
mod descriptor;
mod gate;
mod loader;
mod nine_slice;
mod pipeline;
mod raster;

pub use cache::ArtifactCache;
pub use descriptor::{
    Fill, ImageDescriptor, NineSliceData, NineSliceOverride, NineSlicePatch, NineSliceSpec,
    ParseDescriptor, RectSpec, SliceSpec,
};
pub use gate::{GateState, ReadinessGate};
pub use loader::{AssetLoader, LoadOutcome};
pub use nine_slice::{nine_slice_rects, NineSliceComposer};
pub use pipeline::{ImagePipeline, LoadReport};
pub use raster::{decode_data_url, PngDataUrlRasterizer, Rasterizer, EMPTY_DATA_URL};

/// Asset pipeline errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AssetError {
    #[error("Asset not found: {0}")]
    NotFound(String),

    #[error("Unsupported pixel source for {key}: {kind}")]
    UnsupportedSource { key: String, kind: String },

    #[error("Load stalled after {timeout_ms}ms, still pending: {}", pending.join(", "))]
    StalledLoad { pending: Vec<String>, timeout_ms: u64 },

    #[error("Batch load was cancelled")]
    Cancelled,

    #[error("Failed to load asset: {0}")]
    LoadFailed(String),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("Batch aborted before becoming ready")]
    BatchAborted,
}

impl From<image::ImageError> for AssetError {
    fn from(err: image::ImageError) -> Self {
        AssetError::Encode(err.to_string())
    }
}

/// Derived variant of a loaded image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImageVariant {
    #[default]
    Base,
    Extruded,
    Normal,
}

impl ImageVariant {
    pub const ALL: [ImageVariant; 3] = [
        ImageVariant::Base,
        ImageVariant::Extruded,
        ImageVariant::Normal,
    ];

    /// Key suffix appended after an underscore, if any
    pub fn suffix(&self) -> Option<&'static str> {
        match self {
            ImageVariant::Base => None,
            ImageVariant::Extruded => Some("extruded"),
            ImageVariant::Normal => Some("normal"),
        }
    }

    /// Cache key for this variant of `key`
    pub fn key_for(&self, key: &str) -> String {
        match self.suffix() {
            Some(suffix) => format!("{}_{}", key, suffix),
            None => key.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_error_display() {
        let err = AssetError::NotFound("tile_0".to_string());
        assert_eq!(err.to_string(), "Asset not found: tile_0");
    }

    #[test]
    fn test_stalled_load_lists_pending_keys() {
        let err = AssetError::StalledLoad {
            pending: vec!["a".to_string(), "b_normal".to_string()],
            timeout_ms: 250,
        };
        assert_eq!(
            err.to_string(),
            "Load stalled after 250ms, still pending: a, b_normal"
        );
    }

    #[test]
    fn test_variant_keys() {
        assert_eq!(ImageVariant::Base.key_for("hero"), "hero");
        assert_eq!(ImageVariant::Extruded.key_for("hero"), "hero_extruded");
        assert_eq!(ImageVariant::Normal.key_for("hero"), "hero_normal");
    }
}
