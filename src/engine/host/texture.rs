// In-memory texture store implementing the host engine boundary

use super::{HostEngine, LoadSignal, NineSliceNode, NodePlacement, PixelSource, SourceResolver};
use crate::engine::assets::{decode_data_url, AssetError, NineSliceSpec};
use anyhow::Result;
use log::{debug, error};
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::oneshot;

/// Host engine without a GPU
///
/// Textures live in memory as decoded pixels. Loads complete as soon as the
/// bytes are decoded; URLs can also be staged with an arbitrary
/// [`PixelSource`] to stand in for render targets or video.
pub struct HeadlessEngine {
    resolver: SourceResolver,

    /// Sources served for a URL instead of reading it
    staged: HashMap<String, PixelSource>,

    /// Texture namespace
    textures: HashMap<String, PixelSource>,
}

impl HeadlessEngine {
    /// Create an engine reading relative URLs from `asset_root`
    pub fn new<P: AsRef<Path>>(asset_root: P) -> Self {
        Self {
            resolver: SourceResolver::new(asset_root),
            staged: HashMap::new(),
            textures: HashMap::new(),
        }
    }

    /// Serve `source` whenever `url` is loaded
    pub fn stage(&mut self, url: impl Into<String>, source: PixelSource) {
        self.staged.insert(url.into(), source);
    }

    /// Get a texture by key
    pub fn texture(&self, key: &str) -> Option<&PixelSource> {
        self.textures.get(key)
    }

    pub fn has_texture(&self, key: &str) -> bool {
        self.textures.contains_key(key)
    }

    /// Get the number of textures
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    fn fetch(&self, url: &str) -> Result<PixelSource> {
        if let Some(source) = self.staged.get(url) {
            return Ok(source.clone());
        }

        let bytes = self.resolver.load_bytes(url)?;
        let image = image::load_from_memory(&bytes)?;
        Ok(PixelSource::bitmap(image.to_rgba8()))
    }
}

impl HostEngine for HeadlessEngine {
    fn load_image(&mut self, key: &str, url: &str) -> LoadSignal {
        let (done, signal) = oneshot::channel();

        match self.fetch(url) {
            Ok(source) => {
                debug!("Loaded {} from {} ({})", key, url, source.kind());
                self.textures.insert(key.to_string(), source);
                let _ = done.send(());
            }
            Err(e) => {
                // Dropping the sender reports the failure to the waiter
                error!("Failed to load {} from {}: {:#}", key, url, e);
            }
        }

        signal
    }

    fn loaded_image(&self, key: &str) -> Option<PixelSource> {
        self.textures.get(key).cloned()
    }

    fn register_encoded_texture(&mut self, key: &str, encoded: &str) -> Result<(), AssetError> {
        let image = decode_data_url(encoded)?;
        self.textures
            .insert(key.to_string(), PixelSource::bitmap(image));
        Ok(())
    }

    fn remove_texture(&mut self, key: &str) {
        self.textures.remove(key);
    }

    fn create_nine_slice_node(
        &mut self,
        key: &str,
        placement: NodePlacement,
        spec: &NineSliceSpec,
    ) -> Result<NineSliceNode, AssetError> {
        if !self.textures.contains_key(key) {
            return Err(AssetError::NotFound(key.to_string()));
        }
        Ok(NineSliceNode::new(key, placement, spec))
    }
}
