//! Image resource pipeline
//!
//! Loads source images through a host engine, derives grid-sliced fragments
//! and nine-slice pieces from them, and caches every result as a portable
//! encoded image keyed by name.

pub mod config;
pub mod core;
pub mod engine;

pub use config::{BoundsPolicy, Manifest, PipelineConfig};
pub use core::{slice_to_rect, GridSize, Rect, SlicePos};
pub use engine::assets::{
    ArtifactCache, AssetError, ImageDescriptor, ImagePipeline, ImageVariant, LoadReport,
    NineSliceData, NineSliceOverride, NineSliceSpec, ParseDescriptor, ReadinessGate, SliceSpec,
};
pub use engine::host::{HeadlessEngine, HostEngine, NineSliceNode, NodePlacement, PixelSource};
