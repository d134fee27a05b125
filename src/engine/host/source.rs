// Resolving image URLs to bytes

use crate::engine::assets::AssetError;
use anyhow::Result;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::{Path, PathBuf};

/// Finds image bytes for a URL
///
/// `data:` URLs are decoded inline; anything else is a path relative to the
/// asset root (absolute paths are used as-is).
#[derive(Debug, Clone)]
pub struct SourceResolver {
    base_path: PathBuf,
}

impl SourceResolver {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    /// Get the full path for a URL
    pub fn resolve_path(&self, url: &str) -> PathBuf {
        self.base_path.join(url)
    }

    /// Load the bytes behind a URL
    pub fn load_bytes(&self, url: &str) -> Result<Vec<u8>> {
        if let Some(rest) = url.strip_prefix("data:") {
            let (_, payload) = rest
                .split_once(";base64,")
                .ok_or_else(|| AssetError::LoadFailed(format!("unsupported data URL for {:.32}", url)))?;
            return STANDARD
                .decode(payload)
                .map_err(|e| AssetError::LoadFailed(format!("invalid data URL: {}", e)).into());
        }

        let path = self.resolve_path(url);

        if !path.exists() {
            return Err(AssetError::NotFound(path.to_string_lossy().to_string()).into());
        }

        std::fs::read(&path)
            .map_err(|e| AssetError::LoadFailed(format!("Failed to read {}: {}", url, e)).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_resolver_path_resolution() {
        let resolver = SourceResolver::new("/game/assets");
        let path = resolver.resolve_path("ui/panel.png");

        assert_eq!(path.to_str().unwrap(), "/game/assets/ui/panel.png");
    }

    #[test]
    fn test_resolver_absolute_path() {
        let resolver = SourceResolver::new("/game/assets");
        assert_eq!(
            resolver.resolve_path("/tmp/panel.png"),
            PathBuf::from("/tmp/panel.png")
        );
    }

    #[test]
    fn test_load_data_url() {
        let resolver = SourceResolver::new(".");
        let url = format!("data:image/png;base64,{}", STANDARD.encode(b"pixels"));

        assert_eq!(resolver.load_bytes(&url).unwrap(), b"pixels");
    }

    #[test]
    fn test_load_missing_file() {
        let resolver = SourceResolver::new("/nonexistent");
        let err = resolver.load_bytes("missing.png").unwrap_err();

        assert!(matches!(
            err.downcast_ref::<AssetError>(),
            Some(AssetError::NotFound(_))
        ));
    }

    #[test]
    fn test_load_real_file() {
        let temp_dir = std::env::temp_dir();
        let name = "slicekit_source_test.bin";
        let temp_file = temp_dir.join(name);

        {
            let mut file = std::fs::File::create(&temp_file).unwrap();
            file.write_all(b"test").unwrap();
        }

        let resolver = SourceResolver::new(&temp_dir);
        assert_eq!(resolver.load_bytes(name).unwrap(), b"test");

        // Clean up
        let _ = std::fs::remove_file(temp_file);
    }
}
