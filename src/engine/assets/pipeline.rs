// Image pipeline: batch load, derivation pass, and lookups

use super::{
    ArtifactCache, AssetError, AssetLoader, ImageDescriptor, ImageVariant, NineSliceComposer,
    NineSliceData, NineSliceOverride, NineSliceSpec, ParseDescriptor, PngDataUrlRasterizer,
    Rasterizer, ReadinessGate,
};
use crate::config::{BoundsPolicy, PipelineConfig};
use crate::core::{slice_to_rect, Rect};
use crate::engine::host::{HostEngine, NineSliceNode, NodePlacement};
use glam::UVec2;
use image::RgbaImage;
use log::{debug, error, info, warn};
use tokio_util::sync::CancellationToken;

/// What a finished batch produced
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Keys with a freshly encoded image, in derivation order
    pub derived: Vec<String>,
    /// Per-key problems that did not stop the batch
    pub faults: Vec<(String, AssetError)>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.faults.is_empty()
    }

    pub fn fault(&self, key: &str) -> Option<&AssetError> {
        self.faults
            .iter()
            .find(|(faulted, _)| faulted == key)
            .map(|(_, err)| err)
    }
}

/// Image pipeline context for one scene or session
///
/// Owns the host engine handle, the artifact cache and the readiness gate.
/// Batches are submitted with [`load`](Self::load); `&mut self` keeps two
/// batches from overlapping on the same pipeline.
pub struct ImagePipeline<E: HostEngine, R: Rasterizer = PngDataUrlRasterizer> {
    engine: E,
    rasterizer: R,
    config: PipelineConfig,

    /// Captures raw pixels between load and derivation
    loader: AssetLoader,

    cache: ArtifactCache,
    gate: ReadinessGate,

    /// Every descriptor ever submitted, for `clear`
    descriptors: Vec<ImageDescriptor>,
}

impl<E: HostEngine> ImagePipeline<E> {
    pub fn new(engine: E, config: PipelineConfig) -> Self {
        Self::with_rasterizer(engine, PngDataUrlRasterizer, config)
    }
}

impl<E: HostEngine, R: Rasterizer> ImagePipeline<E, R> {
    pub fn with_rasterizer(engine: E, rasterizer: R, config: PipelineConfig) -> Self {
        Self {
            engine,
            rasterizer,
            config,
            loader: AssetLoader::new(),
            cache: ArtifactCache::new(),
            gate: ReadinessGate::new(),
            descriptors: Vec::new(),
        }
    }

    /// Handle for waiting on the current batch
    pub fn gate(&self) -> ReadinessGate {
        self.gate.clone()
    }

    pub fn is_ready(&self) -> bool {
        self.gate.is_ready()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Swap the host engine, returning the previous one
    pub fn update_engine(&mut self, engine: E) -> E {
        std::mem::replace(&mut self.engine, engine)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn cache(&self) -> &ArtifactCache {
        &self.cache
    }

    /// Every descriptor submitted since the last `clear`
    pub fn descriptors(&self) -> &[ImageDescriptor] {
        &self.descriptors
    }

    /// Load a batch and derive all of its artifacts
    pub async fn load(&mut self, descriptors: Vec<ImageDescriptor>) -> Result<LoadReport, AssetError> {
        self.load_with_cancel(descriptors, CancellationToken::new())
            .await
    }

    /// [`load`](Self::load) that stops early when `cancel` fires
    ///
    /// Artifacts from earlier batches stay cached; new ones are merged in.
    pub async fn load_with_cancel(
        &mut self,
        descriptors: Vec<ImageDescriptor>,
        cancel: CancellationToken,
    ) -> Result<LoadReport, AssetError> {
        self.gate.begin_batch();

        let outcome = self
            .loader
            .load_all(
                &mut self.engine,
                &descriptors,
                self.config.load_timeout(),
                &cancel,
            )
            .await;

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Batch of {} images failed: {}", descriptors.len(), e);
                self.loader.clear();
                self.descriptors.extend(descriptors);
                self.gate.mark_failed();
                return Err(e);
            }
        };

        let mut report = LoadReport {
            derived: Vec::new(),
            faults: outcome.faults,
        };
        for descriptor in &descriptors {
            self.derive(descriptor, &mut report);
        }

        self.loader.clear();
        self.descriptors.extend(descriptors);
        self.gate.mark_ready();

        info!(
            "Image batch ready: {} derived, {} faults",
            report.derived.len(),
            report.faults.len()
        );

        Ok(report)
    }

    /// Derive everything for one descriptor; faults stay local to it
    fn derive(&mut self, descriptor: &ImageDescriptor, report: &mut LoadReport) {
        let Some(source) = self.loader.raw(&descriptor.key).cloned() else {
            debug!("No pixels captured for {}, skipping", descriptor.key);
            return;
        };
        let full = Rect::from_size(source.width(), source.height());

        match self.rasterizer.encode(&source, full) {
            Ok(encoded) => {
                self.cache.insert_image(descriptor.key.clone(), encoded);
                report.derived.push(descriptor.key.clone());
            }
            Err(e) => {
                warn!("Failed to encode {}: {}", descriptor.key, e);
                report.faults.push((descriptor.key.clone(), e));
                return;
            }
        }

        if self.config.encode_variants {
            for variant in [ImageVariant::Extruded, ImageVariant::Normal] {
                let key = variant.key_for(&descriptor.key);
                let Some(pixels) = self.loader.raw(&key).cloned() else {
                    continue;
                };
                let whole = Rect::from_size(pixels.width(), pixels.height());
                match self.rasterizer.encode(&pixels, whole) {
                    Ok(encoded) => {
                        self.cache.insert_image(key.clone(), encoded);
                        report.derived.push(key);
                    }
                    Err(e) => report.faults.push((key, e)),
                }
            }
        }

        for parse in &descriptor.parse {
            match self.derive_fragment(descriptor, parse, &source) {
                Ok(()) => report.derived.push(parse.key.clone()),
                Err(e) => {
                    warn!("Failed to derive {} from {}: {}", parse.key, descriptor.key, e);
                    report.faults.push((parse.key.clone(), e));
                }
            }
        }

        if let Some(spec) = &descriptor.nine_slice {
            match self.compose_nine_slice(&source, spec, UVec2::ZERO) {
                Ok(data) => self.cache.insert_nine_slice(descriptor.key.clone(), data),
                Err(e) => {
                    warn!("Failed to nine-slice {}: {}", descriptor.key, e);
                    report.faults.push((descriptor.key.clone(), e));
                }
            }
        }
    }

    fn derive_fragment(
        &mut self,
        descriptor: &ImageDescriptor,
        parse: &ParseDescriptor,
        source: &RgbaImage,
    ) -> Result<(), AssetError> {
        let rect = if let Some(slice) = &parse.slice {
            let grid = slice
                .grid
                .or(descriptor.grid)
                .unwrap_or(self.config.default_grid);
            slice_to_rect(source.width(), &slice.pos, grid)?
        } else if let Some(rect) = parse.rect {
            if rect.is_empty() {
                return Err(AssetError::InvalidGeometry(format!(
                    "rect for {} has zero area",
                    parse.key
                )));
            }
            rect
        } else {
            Rect::from_size(source.width(), source.height())
        };

        self.check_region(rect, source)?;

        // Everything that can fail runs before the cache or engine is touched
        let nine_slice = match &parse.nine_slice {
            Some(nine_slice) => match nine_slice.resolve(descriptor.nine_slice.as_ref())? {
                Some(spec) => Some(self.compose_nine_slice(source, &spec, rect.origin())?),
                None => {
                    if matches!(nine_slice, NineSliceOverride::Inherit(true)) {
                        warn!(
                            "{} inherits a nine-slice but {} defines none",
                            parse.key, descriptor.key
                        );
                    }
                    None
                }
            },
            None => None,
        };
        let encoded = self.rasterizer.encode(source, rect)?;

        self.engine.register_encoded_texture(&parse.key, &encoded)?;
        self.cache.insert_image(parse.key.clone(), encoded);
        if let Some(data) = nine_slice {
            self.cache.insert_nine_slice(parse.key.clone(), data);
        }
        debug!("Derived {} at {:?}", parse.key, rect);

        Ok(())
    }

    fn compose_nine_slice(
        &self,
        source: &RgbaImage,
        spec: &NineSliceSpec,
        offset: UVec2,
    ) -> Result<NineSliceData, AssetError> {
        let (width, height) = spec.extent();
        let region = Rect::new(
            offset.x,
            offset.y,
            u32::try_from(width).unwrap_or(u32::MAX),
            u32::try_from(height).unwrap_or(u32::MAX),
        );
        self.check_region(region, source)?;

        NineSliceComposer::new(&self.rasterizer).compose_data(source, spec, offset)
    }

    /// Reject regions too large to rasterize, and out-of-source regions under `Strict`
    fn check_region(&self, rect: Rect, source: &RgbaImage) -> Result<(), AssetError> {
        if rect.area() > self.config.max_region_pixels {
            return Err(AssetError::InvalidGeometry(format!(
                "{:?} exceeds the {} pixel region limit",
                rect, self.config.max_region_pixels
            )));
        }

        if self.config.bounds == BoundsPolicy::Strict
            && !rect.fits_within(source.width(), source.height())
        {
            return Err(AssetError::InvalidGeometry(format!(
                "{:?} exceeds {}x{} source",
                rect,
                source.width(),
                source.height()
            )));
        }
        Ok(())
    }

    /// Encoded image for a key
    pub fn get(&self, key: &str) -> Result<&str, AssetError> {
        self.cache.get(key)
    }

    /// Encoded image for a variant of a key, or `""` when missing
    pub fn url(&self, key: &str, variant: ImageVariant) -> &str {
        match self.cache.get_variant(key, variant) {
            Ok(encoded) => encoded,
            Err(e) => {
                error!("Image data not found for key {}: {}", key, e);
                ""
            }
        }
    }

    pub fn get_nine_slice(&self, key: &str) -> Result<&NineSliceData, AssetError> {
        self.cache.get_nine_slice(key)
    }

    /// Nine-slice data for overlay use, or an all-zero spec with no fragments
    pub fn nine_slice_data(&self, key: &str) -> NineSliceData {
        match self.cache.get_nine_slice(key) {
            Ok(data) => data.clone(),
            Err(e) => {
                error!("Nine slice data not found for key {}: {}", key, e);
                NineSliceData::default()
            }
        }
    }

    /// Create a nine-slice display node from stored border measurements
    pub fn nine_slice(&mut self, key: &str, placement: Option<NodePlacement>) -> Option<NineSliceNode> {
        let spec = match self.cache.get_nine_slice(key) {
            Ok(data) => data.spec.clone(),
            Err(e) => {
                error!("Nine slice data not found for key {}: {}", key, e);
                return None;
            }
        };

        match self
            .engine
            .create_nine_slice_node(key, placement.unwrap_or_default(), &spec)
        {
            Ok(node) => Some(node),
            Err(e) => {
                error!("Failed to create nine slice node for {}: {}", key, e);
                None
            }
        }
    }

    /// Remove a key, its variants, its nine-slice, and its engine textures
    pub fn remove(&mut self, key: &str) {
        for variant in ImageVariant::ALL {
            let variant_key = variant.key_for(key);
            self.engine.remove_texture(&variant_key);
            self.loader.remove(&variant_key);
        }
        let dropped = self.cache.remove(key);
        debug!("Removed {} ({} cache entries)", key, dropped);
    }

    /// Remove everything ever loaded and reset all caches
    pub fn clear(&mut self) {
        let descriptors = std::mem::take(&mut self.descriptors);
        for descriptor in &descriptors {
            for parse in &descriptor.parse {
                self.remove(&parse.key);
            }
            self.remove(&descriptor.key);
        }

        self.cache.clear();
        self.loader.clear();
        info!("Cleared {} image descriptors", descriptors.len());
    }
}
