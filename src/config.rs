use crate::core::GridSize;
use crate::engine::assets::ImageDescriptor;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How derived rects that reach past their source are treated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BoundsPolicy {
    /// Accept them; pixels outside the source encode as transparent
    #[default]
    Lenient,
    /// Reject them with an invalid-geometry fault
    Strict,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Grid used when neither the slice nor its descriptor names one
    pub default_grid: GridSize,
    /// Deadline for a whole batch of loads; `None` waits forever
    pub load_timeout_ms: Option<u64>,
    pub bounds: BoundsPolicy,
    /// Also encode loaded `_extruded` and `_normal` variants
    pub encode_variants: bool,
    /// Largest region, in pixels, a single fragment may cover
    pub max_region_pixels: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_grid: GridSize::default(),
            load_timeout_ms: Some(Self::DEFAULT_LOAD_TIMEOUT_MS),
            bounds: BoundsPolicy::default(),
            encode_variants: true,
            max_region_pixels: Self::DEFAULT_MAX_REGION_PIXELS,
        }
    }
}

impl PipelineConfig {
    const DEFAULT_LOAD_TIMEOUT_MS: u64 = 30_000;
    const DEFAULT_MAX_REGION_PIXELS: u64 = 16_384 * 16_384;

    pub fn load_timeout(&self) -> Option<Duration> {
        self.load_timeout_ms.map(Duration::from_millis)
    }

    pub fn with_default_grid(mut self, grid: GridSize) -> Self {
        self.default_grid = grid;
        self
    }

    pub fn with_load_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.load_timeout_ms = timeout.map(|t| t.as_millis() as u64);
        self
    }

    pub fn with_bounds(mut self, bounds: BoundsPolicy) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_encode_variants(mut self, encode: bool) -> Self {
        self.encode_variants = encode;
        self
    }

    pub fn with_max_region_pixels(mut self, pixels: u64) -> Self {
        self.max_region_pixels = pixels;
        self
    }
}

/// A batch of image descriptors with the settings to process them
#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub config: PipelineConfig,
    /// Directory relative URLs resolve against; defaults to the manifest's directory
    #[serde(default)]
    pub asset_root: Option<PathBuf>,
    pub images: Vec<ImageDescriptor>,
}

impl Manifest {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading manifest {}", path.display()))?;
        Self::from_json_str(&contents)
            .with_context(|| format!("parsing manifest {}", path.display()))
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Asset root, resolving a relative root against the manifest's directory
    pub fn resolve_asset_root(&self, manifest_path: &Path) -> PathBuf {
        let manifest_dir = manifest_path.parent().unwrap_or_else(|| Path::new("."));
        match &self.asset_root {
            Some(root) => manifest_dir.join(root),
            None => manifest_dir.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.default_grid, GridSize::new(16, 16));
        assert_eq!(config.load_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.bounds, BoundsPolicy::Lenient);
        assert!(config.encode_variants);
        assert_eq!(config.max_region_pixels, 16_384 * 16_384);
    }

    #[test]
    fn test_builder_setters() {
        let config = PipelineConfig::default()
            .with_default_grid(GridSize::new(8, 8))
            .with_load_timeout(None)
            .with_bounds(BoundsPolicy::Strict)
            .with_encode_variants(false)
            .with_max_region_pixels(1024);

        assert_eq!(config.default_grid, GridSize::new(8, 8));
        assert_eq!(config.load_timeout(), None);
        assert_eq!(config.bounds, BoundsPolicy::Strict);
        assert!(!config.encode_variants);
        assert_eq!(config.max_region_pixels, 1024);
    }

    #[test]
    fn test_manifest_from_json() {
        let manifest = Manifest::from_json_str(
            r#"{
                "config": { "bounds": "strict", "load_timeout_ms": null },
                "images": [ { "key": "ui", "url": "ui.png", "grid": [8, 8] } ]
            }"#,
        )
        .unwrap();

        assert_eq!(manifest.config.bounds, BoundsPolicy::Strict);
        assert_eq!(manifest.config.load_timeout(), None);
        assert_eq!(manifest.config.default_grid, GridSize::new(16, 16));
        assert_eq!(manifest.images[0].key, "ui");
    }

    #[test]
    fn test_manifest_asset_root() {
        let manifest = Manifest::from_json_str(r#"{ "images": [] }"#).unwrap();
        assert_eq!(
            manifest.resolve_asset_root(Path::new("/packs/ui/manifest.json")),
            PathBuf::from("/packs/ui")
        );

        let manifest =
            Manifest::from_json_str(r#"{ "asset_root": "png", "images": [] }"#).unwrap();
        assert_eq!(
            manifest.resolve_asset_root(Path::new("/packs/ui/manifest.json")),
            PathBuf::from("/packs/ui/png")
        );
    }

    #[test]
    fn test_manifest_missing_file() {
        let err = Manifest::load("/nonexistent/manifest.json").unwrap_err();
        assert!(err.to_string().contains("reading manifest"));
    }
}
