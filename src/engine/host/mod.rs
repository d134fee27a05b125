// Host rendering engine boundary
//
// The pipeline only needs a narrow capability surface from the engine that
// owns textures: start loads, hand back loaded pixels, accept derived
// textures, and build nine-slice display nodes.

mod nine_slice_node;
mod source;
mod texture;

pub use nine_slice_node::{NinePatch, NineSliceNode, NodePlacement};
pub use source::SourceResolver;
pub use texture::HeadlessEngine;

use crate::engine::assets::{AssetError, NineSliceSpec};
use image::RgbaImage;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Completion signal for a single image load
///
/// Resolves with `Ok(())` once the engine has the image. A dropped sender
/// means the engine gave up on the load.
pub type LoadSignal = oneshot::Receiver<()>;

/// Raw pixel backing of a loaded texture
#[derive(Debug, Clone)]
pub enum PixelSource {
    /// Addressable RGBA pixels
    Bitmap(Arc<RgbaImage>),
    /// GPU render target, not readable from the CPU
    RenderTarget { width: u32, height: u32 },
    /// Streaming video frame
    Video { width: u32, height: u32 },
}

impl PixelSource {
    pub fn bitmap(image: RgbaImage) -> Self {
        PixelSource::Bitmap(Arc::new(image))
    }

    /// Short name of the backing kind
    pub fn kind(&self) -> &'static str {
        match self {
            PixelSource::Bitmap(_) => "bitmap",
            PixelSource::RenderTarget { .. } => "render target",
            PixelSource::Video { .. } => "video",
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            PixelSource::Bitmap(image) => image.dimensions(),
            PixelSource::RenderTarget { width, height } | PixelSource::Video { width, height } => {
                (*width, *height)
            }
        }
    }

    /// Pixels, if this source can be rasterized
    pub fn as_bitmap(&self) -> Option<&Arc<RgbaImage>> {
        match self {
            PixelSource::Bitmap(image) => Some(image),
            _ => None,
        }
    }
}

/// Capability surface the pipeline requires from the host engine
pub trait HostEngine {
    /// Begin loading `url` under `key`; the returned signal fires on completion
    fn load_image(&mut self, key: &str, url: &str) -> LoadSignal;

    /// Raw backing of a previously loaded texture
    fn loaded_image(&self, key: &str) -> Option<PixelSource>;

    /// Make a derived fragment addressable in the engine's texture namespace
    fn register_encoded_texture(&mut self, key: &str, encoded: &str) -> Result<(), AssetError>;

    fn remove_texture(&mut self, key: &str);

    /// Instantiate a renderable nine-slice over the texture registered as `key`
    fn create_nine_slice_node(
        &mut self,
        key: &str,
        placement: NodePlacement,
        spec: &NineSliceSpec,
    ) -> Result<NineSliceNode, AssetError>;
}
